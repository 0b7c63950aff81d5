mod support;

use std::collections::HashMap;
use std::io::Write;

use mapsforge_core::{MapFile, MapFileError};
use support::{build_map_file_bytes, write_temp_map_file, HeaderSpec, SubFileSpec};

fn golden_header_spec() -> HeaderSpec {
    HeaderSpec {
        min_lat_micro: 100_000,
        min_lon_micro: 200_000,
        max_lat_micro: 300_000,
        max_lon_micro: 400_000,
        map_date: 1_332_081_126_944,
        poi_tags: Vec::new(),
        way_tags: Vec::new(),
        start_position_micro: Some((150_000, 250_000)),
        start_zoom_level: Some(16),
        languages_preference: Some("en"),
        comment: Some("testcomment"),
        created_by: Some("mapsforge-map-writer-0.3.0-SNAPSHOT"),
        sub_files: vec![
            SubFileSpec {
                base_zoom_level: 6,
                zoom_level_min: 0,
                zoom_level_max: 7,
                blocks: HashMap::new(),
            },
            SubFileSpec {
                base_zoom_level: 10,
                zoom_level_min: 8,
                zoom_level_max: 11,
                blocks: HashMap::new(),
            },
            SubFileSpec {
                base_zoom_level: 14,
                zoom_level_min: 12,
                zoom_level_max: 21,
                blocks: HashMap::new(),
            },
        ],
    }
}

#[test]
fn header_decodes_golden_fields() {
    let bytes = build_map_file_bytes(&golden_header_spec());
    let file = write_temp_map_file(&bytes);

    let map_file = MapFile::new(file.path()).expect("valid synthetic map file opens");
    let info = map_file.map_file_info().expect("header decoded");

    assert_eq!(info.file_version, 3);
    assert_eq!(info.map_date, 1_332_081_126_944);
    assert!((info.bounding_box.min_latitude - 0.1).abs() < 1e-9);
    assert!((info.bounding_box.min_longitude - 0.2).abs() < 1e-9);
    assert!((info.bounding_box.max_latitude - 0.3).abs() < 1e-9);
    assert!((info.bounding_box.max_longitude - 0.4).abs() < 1e-9);
    assert_eq!(info.tile_pixel_size, 256);
    assert_eq!(info.projection_name, "Mercator");
    assert!(!info.debug_file);
    assert_eq!(info.number_of_sub_files, 3);
    assert_eq!(info.zoom_level_min, 0);
    assert_eq!(info.zoom_level_max, 21);
    assert_eq!(info.poi_tags.len(), 0);
    assert_eq!(info.way_tags.len(), 0);

    let start_position = info.start_position.as_ref().expect("start position present");
    assert!((start_position.latitude - 0.15).abs() < 1e-9);
    assert!((start_position.longitude - 0.25).abs() < 1e-9);
    assert_eq!(info.start_zoom_level, Some(16));
    assert_eq!(info.languages_preference.as_deref(), Some("en"));
    assert_eq!(info.comment.as_deref(), Some("testcomment"));
    assert_eq!(
        info.created_by.as_deref(),
        Some("mapsforge-map-writer-0.3.0-SNAPSHOT")
    );

    assert_eq!(info.file_size, bytes.len() as i64);
}

#[test]
fn rejects_wrong_magic_byte() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not a mapsforge file at all!!!!!!!!").unwrap();
    file.flush().unwrap();

    let result = MapFile::new(file.path());
    assert!(matches!(result, Err(MapFileError::InvalidMagic { .. })));
}

#[test]
fn rejects_unsupported_file_version() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"mapsforge binary OSM");
    let remaining_header_size = 70i32;
    bytes.extend_from_slice(&remaining_header_size.to_be_bytes());
    bytes.extend_from_slice(&4i32.to_be_bytes()); // file_version = 4, unsupported
    bytes.resize(bytes.len() + (remaining_header_size as usize - 4), 0);

    let file = write_temp_map_file(&bytes);
    let result = MapFile::new(file.path());
    assert!(matches!(result, Err(MapFileError::UnsupportedVersion(4))));
}

#[test]
fn rejects_file_size_mismatch() {
    let mut bytes = build_map_file_bytes(&golden_header_spec());
    let true_len = bytes.len() as i64;
    let corrupted = true_len + 1;
    // file_size sits right after file_version (4 bytes) inside the remaining-header
    // region, which itself starts at byte 24 (20-byte magic + 4-byte size prefix).
    bytes[24 + 4..24 + 4 + 8].copy_from_slice(&corrupted.to_be_bytes());

    let file = write_temp_map_file(&bytes);
    let result = MapFile::new(file.path());
    assert!(matches!(result, Err(MapFileError::InvalidFileSize(_))));
}

#[test]
fn open_checked_reports_failure_without_propagating_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"garbage").unwrap();
    file.flush().unwrap();

    let outcome = MapFile::open_checked(file.path());
    assert!(!outcome.ok);
    assert!(outcome.message.is_some());
}

//! Hand-rolled Mapsforge byte-stream construction for hermetic tests.
//!
//! Every integration test builds its own tiny `.map` file in memory and writes it to a
//! `tempfile::NamedTempFile` rather than shipping a binary fixture, so the test suite has
//! no dependency on any file outside the checkout.

use std::collections::HashMap;
use std::io::Write;

use mapsforge_core::MercatorProjection;

pub fn encode_unsigned_varint(value: u32) -> Vec<u8> {
    let mut remaining = value;
    let mut bytes = Vec::new();
    loop {
        let mut byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining != 0 {
            byte |= 0x80;
            bytes.push(byte);
        } else {
            bytes.push(byte);
            break;
        }
    }
    bytes
}

pub fn encode_signed_varint(value: i32) -> Vec<u8> {
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut bytes = Vec::new();
    loop {
        if magnitude <= 0x3f {
            let mut last = (magnitude as u8) & 0x3f;
            if negative {
                last |= 0x40;
            }
            bytes.push(last);
            break;
        }
        bytes.push(((magnitude & 0x7f) as u8) | 0x80);
        magnitude >>= 7;
    }
    bytes
}

fn push_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend(encode_unsigned_varint(s.len() as u32));
    buf.extend_from_slice(s.as_bytes());
}

/// One POI or way record's header-vocabulary-referencing tag list, name/elevation/etc, as
/// raw bytes ready to append directly into a tile block's POI or way section.
pub fn encode_poi(
    lat_delta_micro: i32,
    lon_delta_micro: i32,
    layer: u8,
    tag_ids: &[u8],
    name: Option<&str>,
    elevation: Option<i32>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend(encode_signed_varint(lat_delta_micro));
    buf.extend(encode_signed_varint(lon_delta_micro));
    buf.push((layer << 4) | (tag_ids.len() as u8 & 0x0f));
    for &id in tag_ids {
        buf.extend(encode_unsigned_varint(id as u32));
    }
    let mut feature = 0u8;
    if name.is_some() {
        feature |= 0x80;
    }
    if elevation.is_some() {
        feature |= 0x20;
    }
    buf.push(feature);
    if let Some(n) = name {
        push_string(&mut buf, n);
    }
    if let Some(e) = elevation {
        buf.extend(encode_signed_varint(e));
    }
    buf
}

/// A way with exactly one data block and one coordinate ring, no label position and no
/// house number/ref feature bytes (the decoder assumes a single data block whenever the
/// data-blocks-byte feature bit is clear).
pub fn encode_way(
    layer: u8,
    tag_ids: &[u8],
    name: Option<&str>,
    ring: &[(i32, i32)],
    double_delta: bool,
) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend(encode_unsigned_varint(0)); // way_data_size: unused on the non-bitmask path
    buf.extend_from_slice(&[0u8, 0u8]); // subtile bitmask: unused on the non-bitmask path
    buf.push((layer << 4) | (tag_ids.len() as u8 & 0x0f));
    for &id in tag_ids {
        buf.extend(encode_unsigned_varint(id as u32));
    }
    let mut feature = 0u8;
    if name.is_some() {
        feature |= 0x80;
    }
    if double_delta {
        feature |= 0x04;
    }
    buf.push(feature);
    if let Some(n) = name {
        push_string(&mut buf, n);
    }
    buf.extend(encode_unsigned_varint(1)); // one coordinate block
    buf.extend(encode_unsigned_varint(ring.len() as u32));
    for &(d_lat, d_lon) in ring {
        buf.extend(encode_signed_varint(d_lat));
        buf.extend(encode_signed_varint(d_lon));
    }
    buf
}

/// Assembles a tile block: zoom table (one row per zoom covered by the sub-file), the
/// first-way-offset field, then the POI and way sections back to back.
pub fn encode_block(zoom_rows: &[(u32, u32)], poi_bytes: &[u8], way_bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    for &(cumulative_pois, cumulative_ways) in zoom_rows {
        buf.extend(encode_unsigned_varint(cumulative_pois));
        buf.extend(encode_unsigned_varint(cumulative_ways));
    }
    buf.extend(encode_unsigned_varint(poi_bytes.len() as u32));
    buf.extend_from_slice(poi_bytes);
    buf.extend_from_slice(way_bytes);
    buf
}

pub struct SubFileSpec {
    pub base_zoom_level: u8,
    pub zoom_level_min: u8,
    pub zoom_level_max: u8,
    /// Keyed by (row, column) within the sub-file's boundary rect; a block with no entry
    /// here gets a zero index pointer, i.e. "no data for this area".
    pub blocks: HashMap<(i64, i64), Vec<u8>>,
}

#[derive(Default)]
pub struct HeaderSpec {
    pub min_lat_micro: i32,
    pub min_lon_micro: i32,
    pub max_lat_micro: i32,
    pub max_lon_micro: i32,
    pub map_date: i64,
    pub poi_tags: Vec<&'static str>,
    pub way_tags: Vec<&'static str>,
    pub start_position_micro: Option<(i32, i32)>,
    pub start_zoom_level: Option<u8>,
    pub languages_preference: Option<&'static str>,
    pub comment: Option<&'static str>,
    pub created_by: Option<&'static str>,
    pub sub_files: Vec<SubFileSpec>,
}

/// Builds a complete, internally-consistent `.map` byte stream: header followed by one
/// index + block region per sub-file, with every length-dependent field (remaining header
/// size, file size, start addresses, sub-file sizes) computed from the content rather than
/// hand-picked.
pub fn build_map_file_bytes(spec: &HeaderSpec) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&3i32.to_be_bytes()); // file_version

    let file_size_offset = body.len();
    body.extend_from_slice(&0i64.to_be_bytes()); // file_size placeholder

    body.extend_from_slice(&spec.map_date.to_be_bytes());
    body.extend_from_slice(&spec.min_lat_micro.to_be_bytes());
    body.extend_from_slice(&spec.min_lon_micro.to_be_bytes());
    body.extend_from_slice(&spec.max_lat_micro.to_be_bytes());
    body.extend_from_slice(&spec.max_lon_micro.to_be_bytes());
    body.extend_from_slice(&256i16.to_be_bytes());
    push_string(&mut body, "Mercator");

    let mut flags = 0u8;
    if spec.start_position_micro.is_some() {
        flags |= 0x40;
    }
    if spec.start_zoom_level.is_some() {
        flags |= 0x20;
    }
    if spec.languages_preference.is_some() {
        flags |= 0x10;
    }
    if spec.comment.is_some() {
        flags |= 0x08;
    }
    if spec.created_by.is_some() {
        flags |= 0x04;
    }
    body.push(flags);

    if let Some((lat, lon)) = spec.start_position_micro {
        body.extend_from_slice(&lat.to_be_bytes());
        body.extend_from_slice(&lon.to_be_bytes());
    }
    if let Some(zoom) = spec.start_zoom_level {
        body.push(zoom);
    }
    if let Some(langs) = spec.languages_preference {
        push_string(&mut body, langs);
    }
    if let Some(comment) = spec.comment {
        push_string(&mut body, comment);
    }
    if let Some(created_by) = spec.created_by {
        push_string(&mut body, created_by);
    }

    body.extend_from_slice(&(spec.poi_tags.len() as i16).to_be_bytes());
    for tag in &spec.poi_tags {
        push_string(&mut body, tag);
    }
    body.extend_from_slice(&(spec.way_tags.len() as i16).to_be_bytes());
    for tag in &spec.way_tags {
        push_string(&mut body, tag);
    }

    body.push(spec.sub_files.len() as u8);

    let mut start_address_offsets = Vec::new();
    let mut sub_file_size_offsets = Vec::new();
    for sub_file in &spec.sub_files {
        body.push(sub_file.base_zoom_level);
        body.push(sub_file.zoom_level_min);
        body.push(sub_file.zoom_level_max);
        start_address_offsets.push(body.len());
        body.extend_from_slice(&0i64.to_be_bytes());
        sub_file_size_offsets.push(body.len());
        body.extend_from_slice(&0i64.to_be_bytes());
    }

    assert!(
        (70..=1_000_000).contains(&(body.len() as i32)),
        "synthetic header body size {} out of bounds",
        body.len()
    );

    let mut header = Vec::new();
    header.extend_from_slice(b"mapsforge binary OSM");
    header.extend_from_slice(&(body.len() as i32).to_be_bytes());
    header.extend_from_slice(&body);

    let min_lat = spec.min_lat_micro as f64 / 1_000_000.0;
    let min_lon = spec.min_lon_micro as f64 / 1_000_000.0;
    let max_lat = spec.max_lat_micro as f64 / 1_000_000.0;
    let max_lon = spec.max_lon_micro as f64 / 1_000_000.0;

    let mut sub_file_bytes = Vec::new();
    let mut current_offset = header.len() as i64;

    for (i, sub_file) in spec.sub_files.iter().enumerate() {
        let boundary_left =
            MercatorProjection::longitude_to_tile_x(min_lon, sub_file.base_zoom_level);
        let boundary_right =
            MercatorProjection::longitude_to_tile_x(max_lon, sub_file.base_zoom_level);
        let boundary_top =
            MercatorProjection::latitude_to_tile_y(max_lat, sub_file.base_zoom_level);
        let boundary_bottom =
            MercatorProjection::latitude_to_tile_y(min_lat, sub_file.base_zoom_level);
        let blocks_width = boundary_right - boundary_left + 1;
        let blocks_height = boundary_bottom - boundary_top + 1;
        let number_of_blocks = blocks_width * blocks_height;

        let index_size = (number_of_blocks * 5) as usize;
        let mut index_bytes = vec![0u8; index_size];
        let mut block_data = Vec::new();

        for block_number in 0..number_of_blocks {
            let row = block_number / blocks_width;
            let col = block_number % blocks_width;
            let entry_offset = (block_number as usize) * 5;
            if let Some(payload) = sub_file.blocks.get(&(row, col)) {
                let pointer = index_size as i64 + block_data.len() as i64;
                let pointer_bytes = pointer.to_be_bytes();
                index_bytes[entry_offset..entry_offset + 5].copy_from_slice(&pointer_bytes[3..8]);
                block_data.extend_from_slice(payload);
            }
        }

        let sub_file_size = index_size as i64 + block_data.len() as i64;
        let start_address = current_offset;

        header[24 + start_address_offsets[i]..24 + start_address_offsets[i] + 8]
            .copy_from_slice(&start_address.to_be_bytes());
        header[24 + sub_file_size_offsets[i]..24 + sub_file_size_offsets[i] + 8]
            .copy_from_slice(&sub_file_size.to_be_bytes());

        sub_file_bytes.extend_from_slice(&index_bytes);
        sub_file_bytes.extend_from_slice(&block_data);
        current_offset += sub_file_size;
    }

    let mut full = header;
    full.extend_from_slice(&sub_file_bytes);

    let total_len = full.len() as i64;
    full[24 + file_size_offset..24 + file_size_offset + 8].copy_from_slice(&total_len.to_be_bytes());

    full
}

/// Writes the bytes to a fresh temp file and returns the handle (dropping it deletes the
/// file), keeping every test's fixture private to its own process.
pub fn write_temp_map_file(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

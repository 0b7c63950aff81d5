//! Opens a `.map` file named on the command line and prints its decoded header.
//!
//! Usage: `cargo run --example inspect -- path/to/file.map`

use std::env;
use std::process::ExitCode;

use mapsforge_core::MapFile;

fn main() -> ExitCode {
    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: inspect <path-to-map-file>");
        return ExitCode::FAILURE;
    };

    let mut map_file = match MapFile::new(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("failed to open {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let info = match map_file.map_file_info() {
        Ok(info) => info,
        Err(e) => {
            eprintln!("failed to read header: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("file size:          {}", info.file_size);
    println!("file version:       {}", info.file_version);
    println!("map date:           {}", info.map_date);
    println!("projection:         {}", info.projection_name);
    println!("tile pixel size:    {}", info.tile_pixel_size);
    println!(
        "bounding box:       ({}, {}) .. ({}, {})",
        info.bounding_box.min_latitude,
        info.bounding_box.min_longitude,
        info.bounding_box.max_latitude,
        info.bounding_box.max_longitude
    );
    println!("number of sub-files: {}", info.number_of_sub_files);
    println!("zoom range:         {}..={}", info.zoom_level_min, info.zoom_level_max);
    println!("poi tags:           {}", info.poi_tags.len());
    println!("way tags:           {}", info.way_tags.len());
    println!("debug file:         {}", info.debug_file);

    if let Some(pos) = &info.start_position {
        println!("start position:     ({}, {})", pos.latitude, pos.longitude);
    }
    if let Some(zoom) = info.start_zoom_level {
        println!("start zoom level:   {zoom}");
    }
    if let Some(langs) = &info.languages_preference {
        println!("languages:          {langs}");
    }
    if let Some(comment) = &info.comment {
        println!("comment:            {comment}");
    }
    if let Some(created_by) = &info.created_by {
        println!("created by:         {created_by}");
    }

    ExitCode::SUCCESS
}

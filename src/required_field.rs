use crate::errors::MapFileError;
use crate::header::MapFileInfoBuilder;
use crate::reader::ReadBuffer;
use crate::types::{BoundingBox, LatLongUtils, Tag};
use std::io::{Read, Seek};

const BINARY_OSM_MAGIC_BYTE: &str = "mapsforge binary OSM";
const HEADER_SIZE_MAX: i32 = 1000000;
const HEADER_SIZE_MIN: i32 = 70;
const MERCATOR: &str = "Mercator";
const SUPPORTED_FILE_VERSION: i32 = 3;
const TILE_SIZE: i32 = 256;

pub struct RequiredFields;

impl RequiredFields {
    pub fn read_magic_byte<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
    ) -> Result<(), MapFileError> {
        let magic_byte_length = BINARY_OSM_MAGIC_BYTE.len();

        if !read_buffer.read_from_file(magic_byte_length + 4)? {
            return Err(MapFileError::InvalidMagic {
                found: String::new(),
                expected: BINARY_OSM_MAGIC_BYTE,
            });
        }

        let magic_byte = read_buffer.read_utf8_encoded_string_with_length(magic_byte_length)?;

        if magic_byte != BINARY_OSM_MAGIC_BYTE {
            return Err(MapFileError::InvalidMagic {
                found: magic_byte,
                expected: BINARY_OSM_MAGIC_BYTE,
            });
        }

        Ok(())
    }

    pub fn read_remaining_header<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
    ) -> Result<(), MapFileError> {
        let remaining_header_size = read_buffer.read_int()?;
        if !(HEADER_SIZE_MIN..=HEADER_SIZE_MAX).contains(&remaining_header_size) {
            return Err(MapFileError::InvalidHeaderSize(remaining_header_size));
        }

        if !read_buffer.read_from_file(remaining_header_size as usize)? {
            return Err(MapFileError::InvalidHeaderSize(remaining_header_size));
        }

        Ok(())
    }

    pub fn read_file_version<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let file_version = read_buffer.read_int()?;
        if file_version != SUPPORTED_FILE_VERSION {
            return Err(MapFileError::UnsupportedVersion(file_version));
        }
        map_file_info_builder.file_version = file_version;
        Ok(())
    }

    pub fn read_file_size<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        file_size: i64,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let header_file_size = read_buffer.read_long()?;
        if header_file_size != file_size {
            return Err(MapFileError::InvalidFileSize(header_file_size));
        }
        map_file_info_builder.file_size = file_size;
        Ok(())
    }

    pub fn read_bounding_box<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let min_latitude_micro = read_buffer.read_int()?;
        let min_longitude_micro = read_buffer.read_int()?;
        let max_latitude_micro = read_buffer.read_int()?;
        let max_longitude_micro = read_buffer.read_int()?;

        for (value, is_latitude) in [
            (min_latitude_micro, true),
            (max_latitude_micro, true),
            (min_longitude_micro, false),
            (max_longitude_micro, false),
        ] {
            let valid = if is_latitude {
                LatLongUtils::is_valid_latitude(value)
            } else {
                LatLongUtils::is_valid_longitude(value)
            };
            if !valid {
                return Err(MapFileError::InvalidBoundingBox(format!(
                    "coordinate out of range: {value}"
                )));
            }
        }

        let min_latitude = LatLongUtils::microdegrees_to_degrees(min_latitude_micro);
        let min_longitude = LatLongUtils::microdegrees_to_degrees(min_longitude_micro);
        let max_latitude = LatLongUtils::microdegrees_to_degrees(max_latitude_micro);
        let max_longitude = LatLongUtils::microdegrees_to_degrees(max_longitude_micro);

        map_file_info_builder.bounding_box = Some(BoundingBox::new(
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        )?);
        Ok(())
    }

    pub fn read_tile_pixel_size<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let tile_pixel_size = read_buffer.read_short()? as i32;
        if tile_pixel_size != TILE_SIZE {
            return Err(MapFileError::InvalidTilePixelSize(tile_pixel_size));
        }
        map_file_info_builder.tile_pixel_size = tile_pixel_size;
        Ok(())
    }

    pub fn read_map_date<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let map_date = read_buffer.read_long()?;
        if map_date < 1200000000000 {
            return Err(MapFileError::InvalidMapDate(map_date));
        }
        map_file_info_builder.map_date = map_date;
        Ok(())
    }

    pub fn read_poi_tags<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let number_of_poi_tags = read_buffer.read_short()? as i32;
        if number_of_poi_tags < 0 {
            return Err(MapFileError::InvalidTagCount {
                kind: "POI",
                count: number_of_poi_tags,
            });
        }

        let mut poi_tags = Vec::with_capacity(number_of_poi_tags as usize);
        for current_tag_id in 0..number_of_poi_tags {
            let tag = read_buffer.read_utf8_encoded_string()?;
            if tag.is_empty() {
                return Err(MapFileError::NullTag {
                    kind: "POI",
                    index: current_tag_id,
                });
            }
            poi_tags.push(Tag::from_string(tag));
        }
        map_file_info_builder.poi_tags = poi_tags;
        Ok(())
    }

    pub fn read_projection_name<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let projection_name = read_buffer.read_utf8_encoded_string()?;
        if projection_name != MERCATOR {
            return Err(MapFileError::UnsupportedProjection(projection_name));
        }
        map_file_info_builder.projection_name = projection_name;
        Ok(())
    }

    pub fn read_way_tags<R: Read + Seek>(
        read_buffer: &mut ReadBuffer<R>,
        map_file_info_builder: &mut MapFileInfoBuilder,
    ) -> Result<(), MapFileError> {
        let number_of_way_tags = read_buffer.read_short()? as i32;
        if number_of_way_tags < 0 {
            return Err(MapFileError::InvalidTagCount {
                kind: "way",
                count: number_of_way_tags,
            });
        }

        let mut way_tags = Vec::with_capacity(number_of_way_tags as usize);
        for current_tag_id in 0..number_of_way_tags {
            let tag = read_buffer.read_utf8_encoded_string()?;
            if tag.is_empty() {
                return Err(MapFileError::NullTag {
                    kind: "way",
                    index: current_tag_id,
                });
            }
            way_tags.push(Tag::from_string(tag));
        }
        map_file_info_builder.way_tags = way_tags;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn buffer_from(bytes: Vec<u8>) -> ReadBuffer<Cursor<Vec<u8>>> {
        let len = bytes.len();
        let mut rb = ReadBuffer::new(Cursor::new(bytes));
        rb.read_from_file(len).unwrap();
        rb
    }

    #[test]
    fn rejects_wrong_magic_byte() {
        let mut bytes = b"not the right magic byte here......!".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let mut rb = buffer_from(bytes);
        assert!(matches!(
            RequiredFields::read_magic_byte(&mut rb),
            Err(MapFileError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_non_version_3() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4i32.to_be_bytes());
        let mut rb = buffer_from(bytes);
        let mut builder = MapFileInfoBuilder::default();
        assert!(matches!(
            RequiredFields::read_file_version(&mut rb, &mut builder),
            Err(MapFileError::UnsupportedVersion(4))
        ));
    }

    #[test]
    fn accepts_version_3() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3i32.to_be_bytes());
        let mut rb = buffer_from(bytes);
        let mut builder = MapFileInfoBuilder::default();
        assert!(RequiredFields::read_file_version(&mut rb, &mut builder).is_ok());
        assert_eq!(builder.file_version, 3);
    }

    #[test]
    fn rejects_tile_pixel_size_other_than_256() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&512i16.to_be_bytes());
        let mut rb = buffer_from(bytes);
        let mut builder = MapFileInfoBuilder::default();
        assert!(matches!(
            RequiredFields::read_tile_pixel_size(&mut rb, &mut builder),
            Err(MapFileError::InvalidTilePixelSize(512))
        ));
    }

    #[test]
    fn rejects_out_of_range_bounding_box() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&91_000_000i32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&(-91_000_000i32).to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        let mut rb = buffer_from(bytes);
        let mut builder = MapFileInfoBuilder::default();
        assert!(matches!(
            RequiredFields::read_bounding_box(&mut rb, &mut builder),
            Err(MapFileError::InvalidBoundingBox(_))
        ));
    }
}

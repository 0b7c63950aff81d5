use crate::errors::MapFileError;
use crate::types::Tag;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor, Read, Seek, SeekFrom};

const MAXIMUM_BUFFER_SIZE: usize = 1024 * 1024 * 10;

/// A bounded, file-backed byte buffer with its own read cursor.
///
/// Mirrors the Mapsforge reader's two-level model: an outer file-position cursor (the
/// `input_channel`'s own seek position) and an inner in-memory buffer cursor used for
/// structured decoding of whatever region was last pulled in with `read_from_file` /
/// `read_from_file_at_offset`.
pub struct ReadBuffer<R: Read + Seek> {
    buffer_data: Vec<u8>,
    buffer_position: usize,
    input_channel: R,
    tag_ids: Vec<i32>,
}

impl<R: Read + Seek> ReadBuffer<R> {
    pub fn new(input_channel: R) -> Self {
        Self {
            buffer_data: Vec::new(),
            buffer_position: 0,
            input_channel,
            tag_ids: Vec::new(),
        }
    }

    fn cursor(&mut self) -> Cursor<&[u8]> {
        let mut cursor = Cursor::new(self.buffer_data.as_slice());
        cursor.set_position(self.buffer_position as u64);
        cursor
    }

    fn advance(&mut self, cursor: Cursor<&[u8]>) {
        self.buffer_position = cursor.position() as usize;
    }

    pub fn read_byte(&mut self) -> Result<u8, MapFileError> {
        if self.buffer_position >= self.buffer_data.len() {
            return Err(MapFileError::BufferUnderflow("byte"));
        }
        let byte = self.buffer_data[self.buffer_position];
        self.buffer_position += 1;
        Ok(byte)
    }

    pub fn read_float(&mut self) -> Result<f32, MapFileError> {
        Ok(f32::from_bits(self.read_int()? as u32))
    }

    pub fn read_from_file(&mut self, length: usize) -> Result<bool, MapFileError> {
        if length > MAXIMUM_BUFFER_SIZE {
            return Ok(false);
        }

        self.buffer_data.resize(length, 0);
        self.buffer_position = 0;

        match self.input_channel.read_exact(&mut self.buffer_data[..length]) {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    pub fn read_from_file_at_offset(
        &mut self,
        offset: u64,
        length: usize,
    ) -> Result<bool, MapFileError> {
        if length > MAXIMUM_BUFFER_SIZE {
            return Ok(false);
        }

        self.buffer_data.resize(length, 0);
        self.buffer_position = 0;

        self.input_channel.seek(SeekFrom::Start(offset))?;
        match self.input_channel.read_exact(&mut self.buffer_data[..length]) {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    pub fn read_int(&mut self) -> Result<i32, MapFileError> {
        if self.buffer_position + 4 > self.buffer_data.len() {
            return Err(MapFileError::BufferUnderflow("int"));
        }
        let mut cursor = self.cursor();
        let value = cursor
            .read_i32::<BigEndian>()
            .map_err(|_: io::Error| MapFileError::BufferUnderflow("int"))?;
        self.advance(cursor);
        Ok(value)
    }

    pub fn read_long(&mut self) -> Result<i64, MapFileError> {
        if self.buffer_position + 8 > self.buffer_data.len() {
            return Err(MapFileError::BufferUnderflow("long"));
        }
        let mut cursor = self.cursor();
        let value = cursor
            .read_i64::<BigEndian>()
            .map_err(|_: io::Error| MapFileError::BufferUnderflow("long"))?;
        self.advance(cursor);
        Ok(value)
    }

    pub fn read_short(&mut self) -> Result<i16, MapFileError> {
        if self.buffer_position + 2 > self.buffer_data.len() {
            return Err(MapFileError::BufferUnderflow("short"));
        }
        let mut cursor = self.cursor();
        let value = cursor
            .read_i16::<BigEndian>()
            .map_err(|_: io::Error| MapFileError::BufferUnderflow("short"))?;
        self.advance(cursor);
        Ok(value)
    }

    pub fn read_signed_int(&mut self) -> Result<i32, MapFileError> {
        let mut variable_byte_decode: i32 = 0;
        let mut variable_byte_shift = 0;

        loop {
            if self.buffer_position >= self.buffer_data.len() {
                return Err(MapFileError::BufferUnderflow("signed int"));
            }
            let byte = self.buffer_data[self.buffer_position];
            if byte & 0x80 == 0 {
                break;
            }
            variable_byte_decode |= ((byte & 0x7f) as i32) << variable_byte_shift;
            self.buffer_position += 1;
            variable_byte_shift += 7;
        }

        let byte = self.buffer_data[self.buffer_position];
        let result = if (byte & 0x40) != 0 {
            -(variable_byte_decode | ((byte & 0x3f) as i32) << variable_byte_shift)
        } else {
            variable_byte_decode | ((byte & 0x3f) as i32) << variable_byte_shift
        };
        self.buffer_position += 1;
        Ok(result)
    }

    pub fn read_tags(
        &mut self,
        tags_array: &[Tag],
        number_of_tags: u8,
    ) -> Result<Vec<Tag>, MapFileError> {
        self.tag_ids.clear();
        let max_tag = tags_array.len();

        for _ in 0..number_of_tags {
            let tag_id = self.read_unsigned_int()? as usize;
            if tag_id >= max_tag {
                return Err(MapFileError::InvalidTagId(tag_id));
            }
            self.tag_ids.push(tag_id as i32);
        }

        let mut result = Vec::with_capacity(self.tag_ids.len());
        for &tag_id in &self.tag_ids {
            result.push(tags_array[tag_id as usize].clone());
        }

        Ok(result)
    }

    pub fn read_unsigned_int(&mut self) -> Result<u32, MapFileError> {
        let mut variable_byte_decode: u32 = 0;
        let mut variable_byte_shift = 0;

        loop {
            if self.buffer_position >= self.buffer_data.len() {
                return Err(MapFileError::BufferUnderflow("unsigned int"));
            }
            let byte = self.buffer_data[self.buffer_position];
            if byte & 0x80 == 0 {
                break;
            }
            variable_byte_decode |= ((byte & 0x7f) as u32) << variable_byte_shift;
            self.buffer_position += 1;
            variable_byte_shift += 7;
        }

        let byte = self.buffer_data[self.buffer_position];
        let result = variable_byte_decode | ((byte as u32) << variable_byte_shift);
        self.buffer_position += 1;
        Ok(result)
    }

    pub fn read_utf8_encoded_string(&mut self) -> Result<String, MapFileError> {
        let length = self.read_unsigned_int()? as usize;
        self.read_utf8_encoded_string_with_length(length)
    }

    pub fn read_utf8_encoded_string_with_length(
        &mut self,
        string_length: usize,
    ) -> Result<String, MapFileError> {
        if string_length > 0 && self.buffer_position + string_length <= self.buffer_data.len() {
            self.buffer_position += string_length;
            String::from_utf8(
                self.buffer_data[self.buffer_position - string_length..self.buffer_position]
                    .to_vec(),
            )
            .map_err(MapFileError::from)
        } else {
            Err(MapFileError::InvalidStringLength(string_length))
        }
    }

    pub fn get_buffer_position(&self) -> usize {
        self.buffer_position
    }

    pub fn get_buffer_size(&self) -> usize {
        self.buffer_data.len()
    }

    pub fn set_buffer_position(&mut self, position: usize) {
        self.buffer_position = position;
    }

    pub fn skip_bytes(&mut self, bytes: usize) {
        self.buffer_position += bytes;
    }
}

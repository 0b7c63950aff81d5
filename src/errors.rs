use thiserror::Error;

/// The full error taxonomy for map-file header and tile-block decoding.
///
/// Each variant corresponds to one of the failing clauses in the header decode sequence,
/// or to a structural problem discovered while decoding a tile block.
#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("invalid magic byte: {found} (expected: {expected})")]
    InvalidMagic { found: String, expected: &'static str },

    #[error("unsupported file version: {0}")]
    UnsupportedVersion(i32),

    #[error("invalid remaining header size: {0}")]
    InvalidHeaderSize(i32),

    #[error("invalid file size: {0}")]
    InvalidFileSize(i64),

    #[error("invalid map date: {0}")]
    InvalidMapDate(i64),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("unsupported tile pixel size: {0}")]
    InvalidTilePixelSize(i32),

    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("invalid number of {kind} tags: {count}")]
    InvalidTagCount { kind: &'static str, count: i32 },

    #[error("{kind} tag must not be null: {index}")]
    NullTag { kind: &'static str, index: i32 },

    #[error("invalid tag ID: {0}")]
    InvalidTagId(usize),

    #[error("buffer underflow: {0}")]
    BufferUnderflow(&'static str),

    #[error("truncated tile block: {0}")]
    TruncatedTileBlock(String),

    #[error("invalid number of sub-files: {0}")]
    InvalidSubFileCount(u8),

    #[error("invalid base zoom level: {0}")]
    InvalidBaseZoomLevel(u8),

    #[error("invalid map start zoom level: {0}")]
    InvalidStartZoomLevel(u8),

    #[error("invalid zoom level range: {min} {max}")]
    InvalidZoomLevelRange { min: u8, max: u8 },

    #[error("invalid start address: {0}")]
    InvalidStartAddress(i64),

    #[error("invalid sub-file size: {0}")]
    InvalidSubFileSize(i64),

    #[error("invalid string length: {0}")]
    InvalidStringLength(usize),

    #[error("invalid block number: {0}")]
    InvalidBlockNumber(i64),

    #[error("missing map file info")]
    MissingMapFileInfo,

    #[error("missing index cache")]
    MissingIndexCache,

    #[error("no sub-file for zoom level: {0}")]
    NoSubFileForZoomLevel(i32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("system time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result of `MapFile::open_checked`, matching the external-interface shape described for
/// the reader: a boolean outcome plus a human-readable message naming the first-failing
/// clause.
#[derive(Debug, Clone)]
pub struct FileOpenResult {
    pub ok: bool,
    pub message: Option<String>,
}

impl FileOpenResult {
    pub fn success() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    pub fn failure(error: &MapFileError) -> Self {
        Self {
            ok: false,
            message: Some(error.to_string()),
        }
    }
}

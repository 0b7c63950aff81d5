mod dependency_cache;
mod deserializer;
mod errors;
mod geometry;
mod header;
mod index_cache;
mod map_data;
pub mod map_file;
mod mercator;
mod optional_field;
mod placement;
mod query_calculations;
mod query_parameters;
mod reader;
mod required_field;
mod tile;
mod types;

// Create a single, consistent public API
pub use dependency_cache::{
    Dependency, DependencyCache, DependencyOnTile, DependencySymbol, DependencyText,
};
pub use deserializer::Deserializer;
pub use errors::{FileOpenResult, MapFileError};
pub use geometry::{PaintRef, Rectangle, SymbolRef};
pub use header::{MapFileHeader, MapFileInfo, SubFileParameter};
pub use map_file::MapFile;
pub use map_file::Selector;
pub use mercator::MercatorProjection;
pub use placement::{LabelCandidate, LabelPlacement, PlacementResult, PointTextContainer, SymbolContainer};
pub use query_parameters::QueryParameters;
pub use tile::Tile;
pub use types::{BoundingBox, LatLong, Tag};

// Re-export these types ONLY from map_data, not from multiple places
pub use map_data::{MapReadResult, PoiWayBundle, PointOfInterest, Way};

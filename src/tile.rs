use crate::errors::MapFileError;
use crate::mercator::MercatorProjection;
use crate::types::BoundingBox;

/// A single map tile identified by `(tile_x, tile_y, zoom_level)`.
///
/// `tile_size` is carried for pixel-space conversions but deliberately excluded from
/// equality and hashing: two tiles addressing the same `(x, y, zoom)` are the same tile
/// regardless of the pixel size they happen to be rendered at, which matters for the
/// dependency cache's tile-keyed lookups.
#[derive(Debug, Clone)]
pub struct Tile {
    pub tile_x: i64,
    pub tile_y: i64,
    pub zoom_level: u8,
    pub tile_size: i32,
}

impl Tile {
    pub fn new(tile_x: i64, tile_y: i64, zoom_level: u8, tile_size: i32) -> Self {
        Self {
            tile_x,
            tile_y,
            zoom_level,
            tile_size,
        }
    }

    pub fn get_bounding_box(&self) -> BoundingBox {
        let min_lon = MercatorProjection::tile_x_to_longitude(self.tile_x, self.zoom_level);
        let max_lon = MercatorProjection::tile_x_to_longitude(self.tile_x + 1, self.zoom_level);
        let min_lat = MercatorProjection::tile_y_to_latitude(self.tile_y + 1, self.zoom_level);
        let max_lat = MercatorProjection::tile_y_to_latitude(self.tile_y, self.zoom_level);

        BoundingBox {
            min_latitude: min_lat,
            min_longitude: min_lon,
            max_latitude: max_lat,
            max_longitude: max_lon,
        }
    }

    pub fn get_bounding_box_range(
        upper_left: &Tile,
        lower_right: &Tile,
    ) -> Result<BoundingBox, MapFileError> {
        let min_latitude = MercatorProjection::tile_y_to_latitude(
            lower_right.tile_y.min(upper_left.tile_y),
            upper_left.zoom_level,
        );

        let max_latitude = MercatorProjection::tile_y_to_latitude(
            lower_right.tile_y.max(upper_left.tile_y),
            upper_left.zoom_level,
        );

        let min_longitude = MercatorProjection::tile_x_to_longitude(
            lower_right.tile_x.min(upper_left.tile_x),
            upper_left.zoom_level,
        );

        let max_longitude = MercatorProjection::tile_x_to_longitude(
            lower_right.tile_x.max(upper_left.tile_x),
            upper_left.zoom_level,
        );

        BoundingBox::new(min_latitude, min_longitude, max_latitude, max_longitude)
    }

    /// The 8 unit-offset neighbours sharing this tile's zoom level, in
    /// up/down/left/right/up-left/up-right/down-left/down-right order.
    pub fn neighbours(&self) -> [Tile; 8] {
        let (x, y, z, s) = (self.tile_x, self.tile_y, self.zoom_level, self.tile_size);
        [
            Tile::new(x, y - 1, z, s),
            Tile::new(x, y + 1, z, s),
            Tile::new(x - 1, y, z, s),
            Tile::new(x + 1, y, z, s),
            Tile::new(x - 1, y - 1, z, s),
            Tile::new(x + 1, y - 1, z, s),
            Tile::new(x - 1, y + 1, z, s),
            Tile::new(x + 1, y + 1, z, s),
        ]
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.tile_x == other.tile_x
            && self.tile_y == other.tile_y
            && self.zoom_level == other.zoom_level
    }
}

impl Eq for Tile {}

impl std::hash::Hash for Tile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tile_x.hash(state);
        self.tile_y.hash(state);
        self.zoom_level.hash(state);
    }
}

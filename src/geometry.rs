/// Local tile-pixel rectangle used by the label and dependency-cache modules.
///
/// `(x, y)` is the top-left corner; coordinates are `f64` pixel offsets within a tile of
/// side `TILE_SIZE`, and may be negative or exceed `TILE_SIZE` for candidates that spill
/// into a neighbouring tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.intersects_with_margin(other, 0.0)
    }

    /// Intersection test inflating `self` by `margin` pixels on every side, used by the
    /// dependency cache's overlap removal (a 2px margin there).
    pub fn intersects_with_margin(&self, other: &Rectangle, margin: f64) -> bool {
        let left = self.x - margin;
        let right = self.x + self.width + margin;
        let top = self.y - margin;
        let bottom = self.y + self.height + margin;

        let other_left = other.x;
        let other_right = other.x + other.width;
        let other_top = other.y;
        let other_bottom = other.y + other.height;

        left < other_right && right > other_left && top < other_bottom && bottom > other_top
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rectangle {
        Rectangle::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Opaque handle to an external paint/canvas resource. The rendering backend that owns
/// the real paint object is out of scope for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaintRef(pub u64);

/// Opaque handle to an external symbol bitmap resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolRef(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_rectangles_do_not_intersect() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(20.0, 20.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn touching_edges_intersect_with_margin() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(11.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects_with_margin(&b, 2.0));
    }

    #[test]
    fn translated_shifts_origin_only() {
        let a = Rectangle::new(5.0, 5.0, 10.0, 20.0);
        let b = a.translated(-256.0, 0.0);
        assert_eq!(b, Rectangle::new(-251.0, 5.0, 10.0, 20.0));
    }
}

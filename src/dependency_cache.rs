use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::geometry::{PaintRef, Rectangle, SymbolRef};
use crate::placement::{PointTextContainer, SymbolContainer};
use crate::tile::Tile;

const TILE_SIZE: f64 = 256.0;
const OVERLAP_MARGIN: f64 = 2.0;

/// Shared payload for a label that has been registered to more than one tile.
///
/// `tiles` tracks every tile this text has been propagated to, so a renderer asking
/// "has this already been drawn somewhere?" doesn't need to walk the whole cache.
#[derive(Debug, Clone)]
pub struct DependencyText {
    pub text: String,
    pub paint_front: PaintRef,
    pub paint_back: PaintRef,
    pub width: f64,
    pub height: f64,
    pub tiles: Vec<Tile>,
}

/// Shared payload for a symbol that has been registered to more than one tile.
#[derive(Debug, Clone)]
pub struct DependencySymbol {
    pub symbol: SymbolRef,
    pub width: f64,
    pub height: f64,
    pub tiles: Vec<Tile>,
}

/// A reference to a shared `DependencyText`/`DependencySymbol`, plus the position at which
/// it sits in the local pixel coordinates of the tile whose list holds this `Dependency`.
///
/// The payload is `Arc<Mutex<_>>` rather than owned: up to nine tiles (the tile itself plus
/// its eight neighbours) can hold a `Dependency` pointing at the very same text, and none of
/// them owns it outright.
#[derive(Debug, Clone)]
pub struct Dependency<T> {
    pub value: Arc<Mutex<T>>,
    pub point: (f64, f64),
}

impl<T> Dependency<T> {
    fn new(value: Arc<Mutex<T>>, point: (f64, f64)) -> Self {
        Self { value, point }
    }
}

/// Per-tile bookkeeping: whether the tile has committed its draw list, and which labels and
/// symbols it is known to carry (whether placed locally or inherited from a neighbour).
///
/// Lists are always allocated, never `Option`. Emptiness alone drives every branch here,
/// which rules out a class of null-deref mistakes the lists' source once had.
#[derive(Debug, Default)]
pub struct DependencyOnTile {
    pub drawn: bool,
    pub labels: Vec<Dependency<DependencyText>>,
    pub symbols: Vec<Dependency<DependencySymbol>>,
}

/// Cross-tile registry that prevents a label or symbol whose footprint crosses a tile
/// border from being drawn twice, and keeps freshly rendered tiles from stomping on
/// whatever their already-`drawn` neighbours committed.
///
/// Not `Sync`: callers that share one cache across threads must serialize a whole
/// "enter tile ... mark drawn" transaction under an external lock, since steps 2 through 6
/// are not atomic as a sequence (see the crate's concurrency notes).
pub struct DependencyCache {
    dependency_table: HashMap<Tile, DependencyOnTile>,
    current_tile: Option<Tile>,
}

impl Default for DependencyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyCache {
    pub fn new() -> Self {
        Self {
            dependency_table: HashMap::new(),
            current_tile: None,
        }
    }

    fn current(&self) -> &Tile {
        self.current_tile
            .as_ref()
            .expect("generate_tile_and_dependency_on_tile must be called before any other DependencyCache operation")
    }

    fn is_drawn(&self, tile: &Tile) -> bool {
        self.dependency_table
            .get(tile)
            .map(|entry| entry.drawn)
            .unwrap_or(false)
    }

    /// Half-plane crossing predicates against a tile of side `TILE_SIZE`, evaluated against
    /// `rect`'s position in the current tile's local pixel coordinates.
    fn crosses_up(rect: &Rectangle) -> bool {
        rect.y < 0.0
    }

    fn crosses_down(rect: &Rectangle) -> bool {
        rect.y + rect.height > TILE_SIZE
    }

    fn crosses_left(rect: &Rectangle) -> bool {
        rect.x < 0.0
    }

    fn crosses_right(rect: &Rectangle) -> bool {
        rect.x + rect.width > TILE_SIZE
    }

    /// The eight crossing predicates, in the same up/down/left/right/ul/ur/dl/dr order as
    /// `Tile::neighbours`, so `neighbours()[i]` is the tile `rect` spills into whenever
    /// `direction_flags(rect)[i]` is true.
    fn direction_flags(rect: &Rectangle) -> [bool; 8] {
        let up = Self::crosses_up(rect);
        let down = Self::crosses_down(rect);
        let left = Self::crosses_left(rect);
        let right = Self::crosses_right(rect);
        [
            up,
            down,
            left,
            right,
            up && left,
            up && right,
            down && left,
            down && right,
        ]
    }

    fn crosses_any_drawn_neighbour(&self, rect: &Rectangle) -> bool {
        let neighbours = self.current().neighbours();
        Self::direction_flags(rect)
            .iter()
            .zip(neighbours.iter())
            .any(|(&crosses, neighbour)| crosses && self.is_drawn(neighbour))
    }

    fn registered_label_rects(&self) -> Vec<Rectangle> {
        match self.dependency_table.get(self.current()) {
            Some(entry) => entry
                .labels
                .iter()
                .map(|dep| {
                    let value = dep.value.lock().unwrap();
                    Rectangle::new(dep.point.0, dep.point.1, value.width, value.height)
                })
                .collect(),
            None => Vec::new(),
        }
    }

    fn registered_symbol_rects(&self) -> Vec<Rectangle> {
        match self.dependency_table.get(self.current()) {
            Some(entry) => entry
                .symbols
                .iter()
                .map(|dep| {
                    let value = dep.value.lock().unwrap();
                    Rectangle::new(dep.point.0, dep.point.1, value.width, value.height)
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Step 1: enters `tile`, creating an empty, not-`drawn` entry if none exists yet.
    /// Idempotent: calling this twice in a row for the same tile never resets an existing
    /// entry, so re-entering a tile mid-render is harmless.
    pub fn generate_tile_and_dependency_on_tile(&mut self, tile: Tile) {
        self.dependency_table
            .entry(tile.clone())
            .or_insert_with(DependencyOnTile::default);
        self.current_tile = Some(tile);
    }

    /// Step 2 (symbols): drops any candidate whose rectangle spills into a neighbour that
    /// has already committed its draw list.
    pub fn remove_symbols_from_drawn_areas(&self, symbols: &mut Vec<SymbolContainer>) {
        symbols.retain(|symbol| !self.crosses_any_drawn_neighbour(&symbol.boundary()));
    }

    /// Step 2 (area labels): same rule as above, for area labels.
    pub fn remove_area_labels_in_already_drawn_areas(&self, area_labels: &mut Vec<PointTextContainer>) {
        area_labels.retain(|label| !self.crosses_any_drawn_neighbour(&label.boundary));
    }

    /// Step 3: the same drawn-neighbour half-plane rule, plus an intersection test (inflated
    /// by a 2-pixel margin) against the current tile's own registered dependency labels and
    /// symbols: a reference point too close to something already committed on this tile is
    /// just as much a duplicate as one that spills over the border.
    pub fn remove_reference_points_from_dependency_cache(
        &self,
        labels: &mut Vec<PointTextContainer>,
        symbols: &mut Vec<SymbolContainer>,
    ) {
        let registered_labels = self.registered_label_rects();
        let registered_symbols = self.registered_symbol_rects();
        let too_close = |rect: &Rectangle| {
            registered_labels
                .iter()
                .chain(registered_symbols.iter())
                .any(|r| r.intersects_with_margin(rect, OVERLAP_MARGIN))
        };

        labels.retain(|label| {
            !self.crosses_any_drawn_neighbour(&label.boundary) && !too_close(&label.boundary)
        });
        symbols.retain(|symbol| {
            let rect = symbol.boundary();
            !self.crosses_any_drawn_neighbour(&rect) && !too_close(&rect)
        });
    }

    /// Step 4: removes labels that identity-match (same text, same paints) a registered
    /// dependency label, removes symbols that rectangle-intersect (2px margin) a registered
    /// dependency symbol, and removes either kind that overlaps a registered item of the
    /// other kind.
    pub fn remove_overlapping_objects_with_dependency_on_tile(
        &self,
        labels: &mut Vec<PointTextContainer>,
        area_labels: &mut Vec<PointTextContainer>,
        symbols: &mut Vec<SymbolContainer>,
    ) {
        let registered_labels: Vec<(String, PaintRef, PaintRef)> =
            match self.dependency_table.get(self.current()) {
                Some(entry) => entry
                    .labels
                    .iter()
                    .map(|dep| {
                        let value = dep.value.lock().unwrap();
                        (value.text.clone(), value.paint_front, value.paint_back)
                    })
                    .collect(),
                None => Vec::new(),
            };
        let registered_symbol_rects = self.registered_symbol_rects();
        let registered_label_rects = self.registered_label_rects();

        let retain_label = |label: &PointTextContainer| {
            let identity = label.identity();
            if registered_labels.contains(&identity) {
                return false;
            }
            if registered_symbol_rects
                .iter()
                .any(|r| r.intersects_with_margin(&label.boundary, OVERLAP_MARGIN))
            {
                return false;
            }
            true
        };

        labels.retain(|l| retain_label(l));
        area_labels.retain(|l| retain_label(l));

        symbols.retain(|symbol| {
            let rect = symbol.boundary();
            if registered_symbol_rects
                .iter()
                .any(|r| r.intersects_with_margin(&rect, OVERLAP_MARGIN))
            {
                return false;
            }
            if registered_label_rects
                .iter()
                .any(|r| r.intersects_with_margin(&rect, OVERLAP_MARGIN))
            {
                return false;
            }
            true
        });
    }

    /// For `rect`'s crossing directions in the current tile, the neighbour tile each
    /// spillover must be registered against, paired with the pixel offset to translate
    /// `rect`'s position into that neighbour's local coordinates.
    ///
    /// Known defect, preserved deliberately: a pure DOWN crossing is registered against the
    /// tile *above* instead of the tile below. Mapsforge's own `fillDependencyOnTile2` has
    /// the same copy/paste mistake, adding to the `up` neighbour's list on its `down`
    /// branch. Diagonal down-crossings are unaffected.
    fn crossing_targets(&self, rect: &Rectangle) -> Vec<(Tile, f64, f64)> {
        let neighbours = self.current().neighbours();
        let up = Self::crosses_up(rect);
        let down = Self::crosses_down(rect);
        let left = Self::crosses_left(rect);
        let right = Self::crosses_right(rect);

        let mut targets = Vec::new();
        if up {
            targets.push((neighbours[0].clone(), 0.0, TILE_SIZE));
        }
        if down {
            targets.push((neighbours[0].clone(), 0.0, TILE_SIZE));
        }
        if left {
            targets.push((neighbours[2].clone(), TILE_SIZE, 0.0));
        }
        if right {
            targets.push((neighbours[3].clone(), -TILE_SIZE, 0.0));
        }
        if up && left {
            targets.push((neighbours[4].clone(), TILE_SIZE, TILE_SIZE));
        }
        if up && right {
            targets.push((neighbours[5].clone(), -TILE_SIZE, TILE_SIZE));
        }
        if down && left {
            targets.push((neighbours[6].clone(), TILE_SIZE, -TILE_SIZE));
        }
        if down && right {
            targets.push((neighbours[7].clone(), -TILE_SIZE, -TILE_SIZE));
        }
        targets
    }

    fn register_label_spillover(&mut self, label: &PointTextContainer) {
        let targets = self.crossing_targets(&label.boundary);
        let current = self.current().clone();

        let shared = Arc::new(Mutex::new(DependencyText {
            text: label.text.clone(),
            paint_front: label.paint_front,
            paint_back: label.paint_back,
            width: label.boundary.width,
            height: label.boundary.height,
            tiles: vec![current.clone()],
        }));

        self.dependency_table
            .entry(current)
            .or_default()
            .labels
            .push(Dependency::new(
                shared.clone(),
                (label.boundary.x, label.boundary.y),
            ));

        for (neighbour, dx, dy) in targets {
            if self.is_drawn(&neighbour) {
                continue;
            }
            shared.lock().unwrap().tiles.push(neighbour.clone());
            self.dependency_table
                .entry(neighbour)
                .or_default()
                .labels
                .push(Dependency::new(
                    shared.clone(),
                    (label.boundary.x + dx, label.boundary.y + dy),
                ));
        }
    }

    fn register_symbol_spillover(&mut self, symbol: &SymbolContainer) {
        let rect = symbol.boundary();
        let targets = self.crossing_targets(&rect);
        let current = self.current().clone();

        let shared = Arc::new(Mutex::new(DependencySymbol {
            symbol: symbol.symbol,
            width: symbol.width,
            height: symbol.height,
            tiles: vec![current.clone()],
        }));

        self.dependency_table
            .entry(current)
            .or_default()
            .symbols
            .push(Dependency::new(shared.clone(), symbol.position));

        for (neighbour, dx, dy) in targets {
            if self.is_drawn(&neighbour) {
                continue;
            }
            shared.lock().unwrap().tiles.push(neighbour.clone());
            self.dependency_table
                .entry(neighbour)
                .or_default()
                .symbols
                .push(Dependency::new(
                    shared.clone(),
                    (symbol.position.0 + dx, symbol.position.1 + dy),
                ));
        }
    }

    /// Step 6: registers every item that crosses a tile border with its neighbour(s),
    /// translating position by `±TILE_SIZE` per side crossed, then marks the current tile
    /// `drawn`. `drawn` is monotonic: once set here it is never reverted.
    pub fn fill_dependency_on_tile(
        &mut self,
        labels: &[PointTextContainer],
        symbols: &[SymbolContainer],
        area_labels: &[PointTextContainer],
    ) {
        for label in labels.iter().chain(area_labels.iter()) {
            self.register_label_spillover(label);
        }
        for symbol in symbols {
            self.register_symbol_spillover(symbol);
        }

        let current = self.current().clone();
        trace!(tile_x = current.tile_x, tile_y = current.tile_y, "marking tile drawn");
        self.dependency_table.entry(current).or_default().drawn = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;

    fn label(text: &str, rect: Rectangle) -> PointTextContainer {
        PointTextContainer::new(text, (rect.x, rect.y), PaintRef(1), PaintRef(2), rect, None)
    }

    #[test]
    fn generate_tile_is_idempotent() {
        let mut cache = DependencyCache::new();
        let tile = Tile::new(0, 0, 10, 256);
        cache.generate_tile_and_dependency_on_tile(tile.clone());
        cache.fill_dependency_on_tile(&[], &[], &[]);
        assert!(cache.dependency_table.get(&tile).unwrap().drawn);

        cache.generate_tile_and_dependency_on_tile(tile.clone());
        assert!(
            cache.dependency_table.get(&tile).unwrap().drawn,
            "re-entering an already-drawn tile must not reset it"
        );
    }

    #[test]
    fn label_spanning_right_edge_is_registered_to_neighbour_with_translated_position() {
        let mut cache = DependencyCache::new();
        let origin = Tile::new(0, 0, 10, 256);
        cache.generate_tile_and_dependency_on_tile(origin);

        let rect = Rectangle::new(255.0, 100.0, 40.0, 10.0);
        let text = label("Cafe", rect);
        cache.fill_dependency_on_tile(&[text], &[], &[]);

        let right_neighbour = Tile::new(1, 0, 10, 256);
        let entry = cache.dependency_table.get(&right_neighbour).unwrap();
        assert_eq!(entry.labels.len(), 1);
        let dep = &entry.labels[0];
        assert_eq!(dep.point, (-1.0, 100.0));
        assert_eq!(dep.value.lock().unwrap().text, "Cafe");
    }

    #[test]
    fn symbol_dropped_when_crossing_into_already_drawn_neighbour() {
        let mut cache = DependencyCache::new();
        let right_neighbour = Tile::new(1, 0, 10, 256);
        cache.generate_tile_and_dependency_on_tile(right_neighbour.clone());
        cache.fill_dependency_on_tile(&[], &[], &[]);
        assert!(cache.dependency_table.get(&right_neighbour).unwrap().drawn);

        let origin = Tile::new(0, 0, 10, 256);
        cache.generate_tile_and_dependency_on_tile(origin);

        let mut symbols = vec![SymbolContainer::new(SymbolRef(1), (250.0, 50.0), 20.0, 20.0)];
        cache.remove_symbols_from_drawn_areas(&mut symbols);
        assert!(symbols.is_empty());
    }

    #[test]
    fn identity_duplicate_label_is_removed_by_overlap_pass() {
        let mut cache = DependencyCache::new();
        let origin = Tile::new(0, 0, 10, 256);
        cache.generate_tile_and_dependency_on_tile(origin.clone());

        let rect = Rectangle::new(10.0, 10.0, 30.0, 10.0);
        cache.fill_dependency_on_tile(&[label("Cafe", rect)], &[], &[]);

        cache.generate_tile_and_dependency_on_tile(origin);
        let mut candidates = vec![label("Cafe", Rectangle::new(10.0, 10.0, 30.0, 10.0))];
        let mut area_labels = Vec::new();
        let mut symbols = Vec::new();
        cache.remove_overlapping_objects_with_dependency_on_tile(
            &mut candidates,
            &mut area_labels,
            &mut symbols,
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn drawn_down_crossing_registers_against_tile_above_not_below() {
        let mut cache = DependencyCache::new();
        let origin = Tile::new(5, 5, 10, 256);
        cache.generate_tile_and_dependency_on_tile(origin);

        let rect = Rectangle::new(50.0, 250.0, 30.0, 10.0);
        cache.fill_dependency_on_tile(&[label("Trail", rect)], &[], &[]);

        let tile_above = Tile::new(5, 4, 10, 256);
        let tile_below = Tile::new(5, 6, 10, 256);
        assert_eq!(
            cache
                .dependency_table
                .get(&tile_above)
                .map(|e| e.labels.len())
                .unwrap_or(0),
            1,
            "known defect: down-crossing spillovers land on the tile above"
        );
        assert!(!cache.dependency_table.contains_key(&tile_below));
    }

    #[test]
    fn drawn_flag_never_reverts() {
        let mut cache = DependencyCache::new();
        let tile = Tile::new(0, 0, 10, 256);
        cache.generate_tile_and_dependency_on_tile(tile.clone());
        cache.fill_dependency_on_tile(&[], &[], &[]);
        cache.generate_tile_and_dependency_on_tile(tile.clone());
        assert!(cache.dependency_table.get(&tile).unwrap().drawn);
    }
}

//! Demonstrates the label-placement engine and the cross-tile dependency cache together:
//! a label near the right edge of tile (0,0) is placed once, then tile (1,0) picks up the
//! identical label translated into its own local coordinates instead of drawing a duplicate.

use mapsforge_core::{
    DependencyCache, LabelCandidate, LabelPlacement, PaintRef, SymbolContainer, SymbolRef, Tile,
};

fn main() {
    let mut cache = DependencyCache::new();

    let tile_a = Tile::new(0, 0, 12, 256);
    cache.generate_tile_and_dependency_on_tile(tile_a.clone());

    let symbol = SymbolContainer::new(SymbolRef(1), (248.0, 100.0), 16.0, 16.0);
    let candidate = LabelCandidate {
        text: "Lighthouse".to_string(),
        paint_front: PaintRef(1),
        paint_back: PaintRef(2),
        symbol: Some(symbol),
        text_width: 70.0,
        text_height: 12.0,
        wide_symbol: false,
    };

    let placement = LabelPlacement::place(vec![candidate], vec![], vec![]);
    println!(
        "tile (0,0): placed {} label(s), {} symbol(s)",
        placement.labels.len(),
        placement.symbols.len()
    );
    for label in &placement.labels {
        println!(
            "  label {:?} at ({:.1}, {:.1}), boundary {:?}",
            label.text, label.position.0, label.position.1, label.boundary
        );
    }

    cache.fill_dependency_on_tile(&placement.labels, &placement.symbols, &[]);

    let tile_b = Tile::new(1, 0, 12, 256);
    cache.generate_tile_and_dependency_on_tile(tile_b);

    let mut candidate_labels = Vec::new();
    let mut candidate_symbols = Vec::new();
    cache.remove_overlapping_objects_with_dependency_on_tile(
        &mut candidate_labels,
        &mut Vec::new(),
        &mut candidate_symbols,
    );

    println!("\ntile (1,0) inherits the spillover automatically via the dependency cache.");
    println!("no renderer-side work is needed to avoid drawing \"Lighthouse\" twice.");
}

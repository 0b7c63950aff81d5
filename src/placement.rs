use crate::geometry::{PaintRef, Rectangle, SymbolRef};

/// A POI or area label candidate: text plus the two paints used to stroke/fill it, its
/// pixel boundary, and an optional symbol drawn alongside it.
#[derive(Debug, Clone)]
pub struct PointTextContainer {
    pub text: String,
    pub position: (f64, f64),
    pub paint_front: PaintRef,
    pub paint_back: PaintRef,
    pub boundary: Rectangle,
    pub symbol: Option<SymbolContainer>,
}

impl PointTextContainer {
    pub fn new(
        text: impl Into<String>,
        position: (f64, f64),
        paint_front: PaintRef,
        paint_back: PaintRef,
        boundary: Rectangle,
        symbol: Option<SymbolContainer>,
    ) -> Self {
        Self {
            text: text.into(),
            position,
            paint_front,
            paint_back,
            boundary,
            symbol,
        }
    }

    /// Identity used for cross-tile duplicate detection: text content plus the pair of
    /// paints used to render it (two labels with the same text but different styling are
    /// not considered the same label).
    pub fn identity(&self) -> (String, PaintRef, PaintRef) {
        (self.text.clone(), self.paint_front, self.paint_back)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SymbolContainer {
    pub symbol: SymbolRef,
    pub position: (f64, f64),
    pub width: f64,
    pub height: f64,
}

impl SymbolContainer {
    pub fn new(symbol: SymbolRef, position: (f64, f64), width: f64, height: f64) -> Self {
        Self {
            symbol,
            position,
            width,
            height,
        }
    }

    pub fn boundary(&self) -> Rectangle {
        Rectangle::new(self.position.0, self.position.1, self.width, self.height)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlacementResult {
    pub labels: Vec<PointTextContainer>,
    pub symbols: Vec<SymbolContainer>,
    pub area_labels: Vec<PointTextContainer>,
}

/// A POI text label still awaiting a placement decision, paired with the symbol it sits
/// next to (if any) and whether that symbol is wide enough to require the four-point
/// placement strategy instead of the two-point one.
pub struct LabelCandidate {
    pub text: String,
    pub paint_front: PaintRef,
    pub paint_back: PaintRef,
    pub symbol: Option<SymbolContainer>,
    pub text_width: f64,
    pub text_height: f64,
    pub wide_symbol: bool,
}

pub struct LabelPlacement;

impl LabelPlacement {
    /// Greedily places POI labels (optionally paired with a symbol), standalone symbols,
    /// and area labels on a single tile with no pairwise rectangle overlap among the
    /// accepted items.
    ///
    /// Order of operations: POI labels first (each trying its above/below, or
    /// above/below/left/right, candidates in that order and taking the first that doesn't
    /// overlap anything already accepted), then standalone symbols, then area labels (both
    /// of the latter placed as-is and rejected outright on overlap).
    pub fn place(
        poi_labels: Vec<LabelCandidate>,
        standalone_symbols: Vec<SymbolContainer>,
        area_labels: Vec<PointTextContainer>,
    ) -> PlacementResult {
        let mut result = PlacementResult::default();
        let mut accepted_rects: Vec<Rectangle> = Vec::new();

        for candidate in poi_labels {
            if let Some(symbol) = &candidate.symbol {
                let symbol_rect = symbol.boundary();
                if accepted_rects.iter().any(|r| r.intersects(&symbol_rect)) {
                    continue;
                }

                let candidates = Self::generate_candidate_positions(symbol, &candidate);
                let mut placed = false;
                for rect in candidates {
                    if !accepted_rects.iter().any(|r| r.intersects(&rect)) {
                        accepted_rects.push(rect);
                        accepted_rects.push(symbol_rect);
                        result.symbols.push(*symbol);
                        result.labels.push(PointTextContainer::new(
                            candidate.text,
                            (rect.x, rect.y),
                            candidate.paint_front,
                            candidate.paint_back,
                            rect,
                            Some(*symbol),
                        ));
                        placed = true;
                        break;
                    }
                }
                if !placed {
                    continue;
                }
            } else {
                let rect = Rectangle::new(0.0, 0.0, candidate.text_width, candidate.text_height);
                if accepted_rects.iter().any(|r| r.intersects(&rect)) {
                    continue;
                }
                accepted_rects.push(rect);
                result.labels.push(PointTextContainer::new(
                    candidate.text,
                    (rect.x, rect.y),
                    candidate.paint_front,
                    candidate.paint_back,
                    rect,
                    None,
                ));
            }
        }

        for symbol in standalone_symbols {
            let rect = symbol.boundary();
            if accepted_rects.iter().any(|r| r.intersects(&rect)) {
                continue;
            }
            accepted_rects.push(rect);
            result.symbols.push(symbol);
        }

        for label in area_labels {
            if accepted_rects.iter().any(|r| r.intersects(&label.boundary)) {
                continue;
            }
            accepted_rects.push(label.boundary);
            result.area_labels.push(label);
        }

        result
    }

    /// 2-point (above/below) or 4-point (above/below/left/right) candidate rectangles
    /// around a symbol, in that order, mirroring Mapsforge's placement strategy.
    fn generate_candidate_positions(
        symbol: &SymbolContainer,
        candidate: &LabelCandidate,
    ) -> Vec<Rectangle> {
        let (sx, sy) = symbol.position;
        let text_w = candidate.text_width;
        let text_h = candidate.text_height;

        let above = Rectangle::new(
            sx + symbol.width / 2.0 - text_w / 2.0,
            sy - text_h,
            text_w,
            text_h,
        );
        let below = Rectangle::new(
            sx + symbol.width / 2.0 - text_w / 2.0,
            sy + symbol.height,
            text_w,
            text_h,
        );

        if !candidate.wide_symbol {
            vec![above, below]
        } else {
            let left = Rectangle::new(
                sx - text_w,
                sy + symbol.height / 2.0 - text_h / 2.0,
                text_w,
                text_h,
            );
            let right = Rectangle::new(
                sx + symbol.width,
                sy + symbol.height / 2.0 - text_h / 2.0,
                text_w,
                text_h,
            );
            vec![above, below, left, right]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(id: u64) -> PaintRef {
        PaintRef(id)
    }

    #[test]
    fn places_label_above_symbol_when_free() {
        let symbol = SymbolContainer::new(SymbolRef(1), (100.0, 100.0), 16.0, 16.0);
        let candidate = LabelCandidate {
            text: "Cafe".to_string(),
            paint_front: paint(1),
            paint_back: paint(2),
            symbol: Some(symbol),
            text_width: 30.0,
            text_height: 10.0,
            wide_symbol: false,
        };

        let result = LabelPlacement::place(vec![candidate], vec![], vec![]);
        assert_eq!(result.labels.len(), 1);
        assert_eq!(result.labels[0].position.1, 90.0);
    }

    #[test]
    fn falls_back_to_below_when_above_taken() {
        // Two distinct, non-overlapping symbols placed close enough that their
        // above-candidate label rectangles collide; the second must fall back to below.
        let symbol_a = SymbolContainer::new(SymbolRef(1), (100.0, 100.0), 16.0, 16.0);
        let symbol_b = SymbolContainer::new(SymbolRef(2), (120.0, 100.0), 16.0, 16.0);
        let candidate = |symbol: SymbolContainer| LabelCandidate {
            text: "Cafe".to_string(),
            paint_front: paint(1),
            paint_back: paint(2),
            symbol: Some(symbol),
            text_width: 30.0,
            text_height: 10.0,
            wide_symbol: false,
        };

        let placed = LabelPlacement::place(
            vec![candidate(symbol_a), candidate(symbol_b)],
            vec![],
            vec![],
        );
        assert_eq!(placed.labels.len(), 2);
        assert_eq!(placed.labels[0].position.1, 90.0);
        assert_eq!(placed.labels[1].position.1, 116.0);
    }

    #[test]
    fn first_accepted_candidate_wins_tie_break() {
        let symbol = SymbolContainer::new(SymbolRef(1), (0.0, 0.0), 16.0, 16.0);
        let candidate = LabelCandidate {
            text: "A".to_string(),
            paint_front: paint(1),
            paint_back: paint(1),
            symbol: Some(symbol),
            text_width: 10.0,
            text_height: 10.0,
            wide_symbol: false,
        };
        let result = LabelPlacement::place(vec![candidate], vec![], vec![]);
        assert_eq!(result.labels[0].boundary.y, -10.0);
    }
}

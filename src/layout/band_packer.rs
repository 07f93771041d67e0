//! One-dimensional interval packing of annotation symbols into bands.
//!
//! Symbols above or below a staff (and in the system symbol area) each
//! cover a horizontal interval. The packer assigns every symbol a band so
//! that no two symbols sharing a band overlap, opening as few bands as a
//! left-to-right greedy sweep allows.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::items::{bounds_of, PlacedItem};

/// Kind of annotation, used to break ties between symbols starting at the
/// same x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolCategory {
    Dynamic,
    Direction,
    ChordText,
    TempoMarker,
    AlternateEnding,
    RehearsalSign,
    /// Playing techniques hanging off a staff (let ring, vibrato, ...)
    StaffSymbol,
}

impl SymbolCategory {
    pub const DEFAULT_PRIORITY: [SymbolCategory; 7] = [
        SymbolCategory::Dynamic,
        SymbolCategory::Direction,
        SymbolCategory::ChordText,
        SymbolCategory::TempoMarker,
        SymbolCategory::AlternateEnding,
        SymbolCategory::RehearsalSign,
        SymbolCategory::StaffSymbol,
    ];
}

/// A symbol awaiting band assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolInfo {
    pub category: SymbolCategory,
    /// Left edge of the horizontal extent
    pub start: f64,
    /// Right edge of the horizontal extent
    pub end: f64,
    /// Drawables in band-local coordinates (y = 0 is the top of the band)
    pub items: Vec<PlacedItem>,
}

impl SymbolInfo {
    /// Wrap `items`, taking the extent from their bounds.
    pub fn from_items(category: SymbolCategory, items: Vec<PlacedItem>) -> Self {
        let (start, end) = bounds_of(&items).map_or((0.0, 0.0), |b| (b.min_x(), b.max_x()));
        Self {
            category,
            start,
            end,
            items,
        }
    }
}

/// Which way bands stack away from the staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSide {
    /// Band 0 sits directly above the origin, later bands further up
    Above,
    /// Band 0 sits directly below the origin, later bands further down
    Below,
}

/// Result of packing: one band index per input symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Packing {
    pub bands: Vec<usize>,
    pub band_count: usize,
}

impl Packing {
    pub fn height(&self, band_height: f64) -> f64 {
        self.band_count as f64 * band_height
    }
}

/// Greedy interval packer with a configurable tie-break order.
pub struct BandPacker<'a> {
    priority: &'a [SymbolCategory],
}

impl<'a> BandPacker<'a> {
    pub fn new(priority: &'a [SymbolCategory]) -> Self {
        Self { priority }
    }

    fn rank(&self, category: SymbolCategory) -> usize {
        self.priority
            .iter()
            .position(|&c| c == category)
            .unwrap_or(self.priority.len())
    }

    /// Assign a band to every symbol.
    pub fn pack(&self, symbols: &[SymbolInfo]) -> Packing {
        let mut order: Vec<usize> = (0..symbols.len()).collect();
        // Stable sort keeps declaration order for full ties.
        order.sort_by(|&a, &b| {
            let (sa, sb) = (&symbols[a], &symbols[b]);
            sa.start
                .total_cmp(&sb.start)
                .then_with(|| self.rank(sa.category).cmp(&self.rank(sb.category)))
        });

        let mut band_ends: Vec<f64> = Vec::new();
        let mut bands = vec![0; symbols.len()];
        for i in order {
            let symbol = &symbols[i];
            let band = match band_ends.iter().position(|&end| end < symbol.start) {
                Some(band) => {
                    band_ends[band] = symbol.end;
                    band
                }
                None => {
                    band_ends.push(symbol.end);
                    band_ends.len() - 1
                }
            };
            trace!(
                symbol = i, category:? = symbol.category, start = symbol.start, end = symbol.end, band;
                "Packed symbol",
            );
            bands[i] = band;
        }

        Packing {
            bands,
            band_count: band_ends.len(),
        }
    }
}

/// Move every symbol's items into its band and flatten them.
///
/// `origin_y` is the edge of the band area nearest the staff.
pub fn place_bands(
    symbols: Vec<SymbolInfo>,
    packing: &Packing,
    side: BandSide,
    origin_y: f64,
    band_height: f64,
) -> Vec<PlacedItem> {
    let mut placed = Vec::new();
    for (symbol, &band) in symbols.into_iter().zip(&packing.bands) {
        let top = match side {
            BandSide::Above => origin_y - (band + 1) as f64 * band_height,
            BandSide::Below => origin_y + band as f64 * band_height,
        };
        for mut item in symbol.items {
            item.translate(0.0, top);
            placed.push(item);
        }
    }
    placed
}

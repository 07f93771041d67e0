//! Horizontal placement of positions and barlines.
//!
//! Every staff of a system shares one grid. Each position slot is
//! `spacing` wide plus whatever room the widest accidental stack at that
//! index needs; barlines consume their own gap plus any signature they
//! introduce.

use log::{trace, warn};
use serde::Serialize;

use super::constants::*;
use crate::model::{BarlineStyle, System};

/// Widths the grid has to make room for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridInput {
    /// Room taken by the clef and the opening signatures
    pub header: f64,
    /// Extra room before each position index (accidentals)
    pub extra: Vec<f64>,
    /// Room for the signatures following each barline
    pub barline_extra: Vec<f64>,
}

/// Resolved x coordinates, in system-local units.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionGrid {
    /// Distance between position centres, before accidental room
    pub spacing: f64,
    /// Right edge of the clef/signature header
    pub header_end: f64,
    /// Centre of each position index
    pub centers: Vec<f64>,
    /// Left edge of each slot, including accidental room
    pub slot_starts: Vec<f64>,
    /// x of each barline, indexed like `System::barlines`
    pub barlines: Vec<f64>,
    /// Right edge of the last slot
    pub content_end: f64,
    /// x of the closing barline
    pub end_x: f64,
}

impl PositionGrid {
    /// Lay out `system`, squeezing spacing down to `min_spacing` if the
    /// content would overflow the system width.
    pub fn compute(system: &System, input: &GridInput, spacing: f64, min_spacing: f64) -> Self {
        let count = system.position_count() as usize;
        let mut grid = Self::place(system, input, spacing);
        if grid.content_end > system.width && count > 0 && spacing > min_spacing {
            let fixed = grid.content_end - count as f64 * spacing;
            let squeezed = ((system.width - fixed) / count as f64).clamp(min_spacing, spacing);
            trace!(spacing, squeezed; "Squeezing position spacing");
            grid = Self::place(system, input, squeezed);
        }
        if grid.content_end > system.width {
            warn!(
                content_end = grid.content_end, width = system.width;
                "System content overflows its width",
            );
        }
        grid
    }

    fn place(system: &System, input: &GridInput, spacing: f64) -> Self {
        let count = system.position_count() as usize;
        let mut barlines = vec![0.0; system.barlines.len()];
        let mut centers = Vec::with_capacity(count);
        let mut slot_starts = Vec::with_capacity(count);
        let mut cursor = input.header;
        let barline_extra = |i: usize| input.barline_extra.get(i).copied().unwrap_or(0.0);

        // The start bar sits on the system's left edge unless it opens a repeat.
        for (i, bar) in system.barlines.iter().enumerate().filter(|(_, b)| b.position == 0) {
            if bar.style == BarlineStyle::RepeatStart {
                barlines[i] = cursor + BARLINE_GAP / 2.0;
                cursor += BARLINE_GAP;
            }
        }

        for index in 0..count {
            if index > 0 {
                for (i, _) in system
                    .barlines
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.position as usize == index)
                {
                    barlines[i] = cursor + BARLINE_GAP / 2.0;
                    cursor += BARLINE_GAP + barline_extra(i);
                }
            }
            let extra = input.extra.get(index).copied().unwrap_or(0.0);
            slot_starts.push(cursor);
            centers.push(cursor + extra + spacing / 2.0);
            cursor += extra + spacing;
        }

        let content_end = cursor;
        // Barlines after the last position close the content.
        for (i, bar) in system.barlines.iter().enumerate() {
            if bar.position > 0 && bar.position as usize >= count {
                barlines[i] = content_end;
            }
        }

        Self {
            spacing,
            header_end: input.header,
            centers,
            slot_starts,
            barlines,
            content_end,
            end_x: system.width.max(content_end),
        }
    }

    /// Centre of position `index`; indices past the end continue at the
    /// grid spacing.
    pub fn x(&self, index: u32) -> f64 {
        let index = index as usize;
        match self.centers.get(index) {
            Some(&x) => x,
            None => match self.centers.last() {
                Some(&last) => last + (index + 1 - self.centers.len()) as f64 * self.spacing,
                None => self.header_end + (index as f64 + 0.5) * self.spacing,
            },
        }
    }

    /// Left edge of the note area of `index`.
    pub fn left(&self, index: u32) -> f64 {
        self.x(index) - self.spacing / 2.0
    }

    /// Right edge of the note area of `index`.
    pub fn right(&self, index: u32) -> f64 {
        self.x(index) + self.spacing / 2.0
    }

    /// Left edge of slot `index` including accidental room.
    pub fn slot_start(&self, index: u32) -> f64 {
        self.slot_starts
            .get(index as usize)
            .copied()
            .unwrap_or_else(|| self.left(index))
    }

    /// Horizontal extent covering positions `start..end`.
    pub fn span(&self, start: u32, end: u32) -> (f64, f64) {
        let last = end.max(start + 1) - 1;
        (self.slot_start(start), self.right(last))
    }

    pub fn position_count(&self) -> usize {
        self.centers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Barline, Position, Staff};
    use pretty_assertions::assert_eq;

    fn system(positions: u32, bars: &[u32], width: f64) -> System {
        let mut staff = Staff::tablature(6);
        staff.positions = (0..positions)
            .map(|index| Position {
                index,
                ..Position::default()
            })
            .collect();
        System {
            width,
            staves: vec![staff],
            barlines: bars.iter().map(|&p| Barline::at(p)).collect(),
            ..System::default()
        }
    }

    #[test]
    fn positions_follow_header_at_spacing() {
        let system = system(3, &[0], 500.0);
        let input = GridInput {
            header: 30.0,
            ..GridInput::default()
        };
        let grid = PositionGrid::compute(&system, &input, 20.0, 10.0);
        assert_eq!(grid.centers, vec![40.0, 60.0, 80.0]);
        assert_eq!(grid.barlines, vec![0.0]);
        assert_eq!(grid.content_end, 90.0);
        assert_eq!(grid.end_x, 500.0);
    }

    #[test]
    fn accidental_room_shifts_later_positions() {
        let system = system(3, &[], 500.0);
        let input = GridInput {
            header: 0.0,
            extra: vec![0.0, 12.0, 0.0],
            ..GridInput::default()
        };
        let grid = PositionGrid::compute(&system, &input, 20.0, 10.0);
        assert_eq!(grid.centers, vec![10.0, 42.0, 62.0]);
        assert_eq!(grid.slot_start(1), 20.0);
    }

    #[test]
    fn barlines_take_room() {
        let system = system(4, &[0, 2, 4], 500.0);
        let input = GridInput {
            header: 0.0,
            barline_extra: vec![0.0, 10.0, 0.0],
            ..GridInput::default()
        };
        let grid = PositionGrid::compute(&system, &input, 20.0, 10.0);
        assert_eq!(grid.barlines[1], 40.0 + BARLINE_GAP / 2.0);
        assert_eq!(grid.centers[2], 40.0 + BARLINE_GAP + 10.0 + 10.0);
        assert_eq!(grid.barlines[2], grid.content_end);
    }

    #[test]
    fn overflow_squeezes_spacing() {
        let system = system(10, &[], 100.0);
        let grid = PositionGrid::compute(&system, &GridInput::default(), 20.0, 5.0);
        assert_eq!(grid.spacing, 10.0);
        assert_eq!(grid.content_end, 100.0);
    }

    #[test]
    fn squeeze_stops_at_minimum() {
        let system = system(10, &[], 50.0);
        let grid = PositionGrid::compute(&system, &GridInput::default(), 20.0, 10.0);
        assert_eq!(grid.spacing, 10.0);
        assert_eq!(grid.end_x, 100.0);
    }

    #[test]
    fn x_extrapolates_past_the_end() {
        let system = system(2, &[], 500.0);
        let grid = PositionGrid::compute(&system, &GridInput::default(), 20.0, 10.0);
        assert_eq!(grid.x(3), 70.0);
        assert_eq!(grid.span(0, 2), (0.0, 40.0));
    }
}

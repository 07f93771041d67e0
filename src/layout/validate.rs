//! Structural checks run before any layout work.

use crate::error::LayoutError;
use crate::model::{Score, Staff, StaffKind, System};

const STANDARD_LINES: u8 = 5;
const MIN_STRINGS: u8 = 3;
const MAX_STRINGS: u8 = 8;

pub fn validate_score(score: &Score) -> Result<(), LayoutError> {
    validate_line_spacing(score.line_spacing)?;
    for (index, system) in score.systems.iter().enumerate() {
        validate_system(index, system)?;
    }
    Ok(())
}

/// A score-level line spacing override must be a positive number.
pub fn validate_line_spacing(spacing: Option<f64>) -> Result<(), LayoutError> {
    match spacing {
        Some(spacing) if !(spacing.is_finite() && spacing > 0.0) => Err(LayoutError::Config(
            format!("score line spacing must be positive, got {spacing}"),
        )),
        _ => Ok(()),
    }
}

pub fn validate_system(index: usize, system: &System) -> Result<(), LayoutError> {
    if let Some(spacing) = system.position_spacing {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(LayoutError::Config(format!(
                "system {index} position spacing must be positive, got {spacing}"
            )));
        }
    }
    for (j, staff) in system.staves.iter().enumerate() {
        validate_staff(staff).map_err(|reason| LayoutError::inconsistent(index, j, reason))?;
    }
    Ok(())
}

fn validate_staff(staff: &Staff) -> Result<(), String> {
    let lines = staff.line_count;
    match staff.kind {
        StaffKind::Standard if lines != STANDARD_LINES => {
            return Err(format!("standard staff has {lines} lines, expected {STANDARD_LINES}"));
        }
        StaffKind::Tablature if !(MIN_STRINGS..=MAX_STRINGS).contains(&lines) => {
            return Err(format!(
                "tablature staff has {lines} strings, expected {MIN_STRINGS} to {MAX_STRINGS}"
            ));
        }
        _ => {}
    }

    for pair in staff.positions.windows(2) {
        if pair[1].index <= pair[0].index {
            return Err(format!(
                "position {} follows position {}",
                pair[1].index, pair[0].index
            ));
        }
    }

    if staff.kind == StaffKind::Tablature {
        for position in &staff.positions {
            if let Some(note) = position.notes.iter().find(|n| n.string >= lines) {
                return Err(format!(
                    "note at position {} is on string {} but the staff has {lines}",
                    position.index, note.string
                ));
            }
        }
    }
    Ok(())
}

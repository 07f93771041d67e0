//! Error types for layout operations.
//!
//! Geometry computations themselves never fail; only boundary validation
//! (index bounds, structural consistency of the document) and the
//! configuration/export helpers produce a [`LayoutError`].

use thiserror::Error;

/// The main error type for the layout engine.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A system index outside `0..count` was passed to a partial relayout.
    #[error("system index {index} is out of range (score has {count} systems)")]
    InvalidIndex { index: usize, count: usize },

    /// A staff whose declared kind does not match its line/string count or
    /// notes. Reported before any layout work begins.
    #[error("inconsistent geometry in system {system}, staff {staff}: {reason}")]
    InconsistentGeometry {
        system: usize,
        staff: usize,
        reason: String,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LayoutError {
    pub(crate) fn inconsistent(system: usize, staff: usize, reason: impl Into<String>) -> Self {
        Self::InconsistentGeometry {
            system,
            staff,
            reason: reason.into(),
        }
    }
}

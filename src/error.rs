//! Error types for drill construction.
//!
//! Only configuration and scripted-pattern problems are errors. Misses,
//! expiries and damage inside a running match are state transitions.

use std::path::PathBuf;

use crate::entities::{Mode, Phase};

/// A drill configuration that would produce a broken match loop.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("difficulty must be a finite positive number, got {0}")]
    InvalidDifficulty(f64),

    #[error("grid size must be between 1 and {max}, got {got}")]
    InvalidGridSize { got: u32, max: u32 },

    #[error("time limit must be a finite positive number of seconds, got {0}")]
    InvalidTimeLimit(f64),

    #[error("playfield must have positive finite dimensions, got {width} x {height}")]
    InvalidField { width: f64, height: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read drill config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse drill config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("pattern cell {cell} is outside a {cells}-cell grid")]
    InvalidPattern { cell: usize, cells: usize },

    #[error("pattern must contain at least one step")]
    EmptyPattern,

    #[error("{0:?} drills have no recorded pattern")]
    UnsupportedMode(Mode),

    #[error("operation not available in the {0:?} phase")]
    WrongPhase(Phase),
}

//! Drill configuration supplied by the orchestration layer.
//!
//! Configs are plain JSON documents (or built in code) and are validated
//! before an engine is constructed, so a bad grid size or time limit never
//! reaches the tick loop.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::{Field, Mode};
use crate::error::{ConfigError, DrillError};

/// Largest grid edge accepted for the grid modes.
pub const MAX_GRID_SIZE: u32 = 8;

const DEFAULT_FIELD_WIDTH: f64 = 800.0;
const DEFAULT_FIELD_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillConfig {
    pub mode: Mode,
    /// Base difficulty multiplier; 1.0 is the standard drill.
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
    /// Edge length of the board for grid modes (default depends on mode).
    #[serde(default)]
    pub grid_size: Option<u32>,
    /// Match time budget in seconds (default depends on mode).
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
    #[serde(default)]
    pub field_width: Option<f64>,
    #[serde(default)]
    pub field_height: Option<f64>,
    /// Seed for reproducible spawns; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_difficulty() -> f64 {
    1.0
}

impl DrillConfig {
    pub fn new(mode: Mode, difficulty: f64) -> Self {
        Self {
            mode,
            difficulty,
            grid_size: None,
            time_limit_secs: None,
            field_width: None,
            field_height: None,
            seed: None,
        }
    }

    pub fn with_grid_size(mut self, grid_size: u32) -> Self {
        self.grid_size = Some(grid_size);
        self
    }

    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load configuration from a JSON file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, DrillError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DrillError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, DrillError> {
        let config: DrillConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.difficulty.is_finite() || self.difficulty <= 0.0 {
            return Err(ConfigError::InvalidDifficulty(self.difficulty));
        }

        // Free-roaming modes ignore the grid, but a zero is still a caller bug.
        if let Some(size) = self.grid_size {
            if size == 0 || size > MAX_GRID_SIZE {
                return Err(ConfigError::InvalidGridSize {
                    got: size,
                    max: MAX_GRID_SIZE,
                });
            }
        }

        if let Some(secs) = self.time_limit_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::InvalidTimeLimit(secs));
            }
        }

        let field = self.field();
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(field.width) || !valid(field.height) {
            return Err(ConfigError::InvalidField {
                width: field.width,
                height: field.height,
            });
        }

        Ok(())
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size.unwrap_or(match self.mode {
            Mode::SequenceRecall => 3,
            Mode::GridReaction => 4,
            // Not used for hit-testing, kept for display layout only.
            Mode::FreeRoamTarget | Mode::SurvivalWave => 1,
        })
    }

    pub fn time_limit_secs(&self) -> f64 {
        self.time_limit_secs.unwrap_or(match self.mode {
            Mode::SequenceRecall => 180.0,
            Mode::GridReaction => 60.0,
            Mode::FreeRoamTarget => 30.0,
            Mode::SurvivalWave => 60.0,
        })
    }

    pub fn time_limit_ms(&self) -> u64 {
        // Validated finite and positive; sub-millisecond budgets round up.
        (self.time_limit_secs() * 1000.0).ceil().max(1.0) as u64
    }

    pub fn field(&self) -> Field {
        Field {
            width: self.field_width.unwrap_or(DEFAULT_FIELD_WIDTH),
            height: self.field_height.unwrap_or(DEFAULT_FIELD_HEIGHT),
        }
    }
}

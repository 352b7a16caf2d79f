//! Pure drill-logic functions.
//!
//! Every public function takes an immutable reference to the current
//! `GameState` (and, where needed, an RNG handle) and returns a brand-new
//! `GameState`.  Side effects are limited to the injected RNG and logging.

pub mod difficulty;
pub mod hits;
pub mod lifecycle;
pub mod phase;
pub mod scoring;
pub mod spawner;

use std::collections::HashMap;

use crate::config::DrillConfig;
use crate::entities::{GameState, Phase, Stats};

use self::difficulty::tuning;

/// Build the initial match state for a validated configuration.
pub fn init_state(config: &DrillConfig) -> GameState {
    let t = tuning(config.mode);
    let time_limit_ms = config.time_limit_ms();
    GameState {
        mode: config.mode,
        phase: Phase::Instructions,
        difficulty: config.difficulty,
        score: 0.0,
        lives: t.starting_lives,
        health: t.starting_health,
        level: 1,
        time_limit_ms,
        time_remaining_ms: time_limit_ms,
        clock_ms: 0,
        elapsed_ms: 0,
        phase_elapsed_ms: 0,
        entities: HashMap::new(),
        next_id: 1,
        combo: 0,
        max_combo: 0,
        stats: Stats::default(),
        last_action_ms: None,
        grid_size: config.grid_size(),
        field: config.field(),
        pattern: Vec::new(),
        pattern_ids: Vec::new(),
        pattern_cursor: 0,
        recall_started_ms: 0,
        round_perfect: true,
        round_outcome: None,
        results_final: false,
        end_reason: None,
    }
}

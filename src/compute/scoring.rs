//! Score, combo and the final performance record.

use serde::Serialize;

use super::difficulty::tuning;
use crate::entities::{EndReason, GameState, Mode, Stats};

/// Highest level a pattern drill can reach; recalling it ends the match.
pub const MAX_SEQUENCE_LEVEL: u32 = 10;

/// Bonus per level for a fully recalled pattern.
pub const ROUND_BONUS_PER_LEVEL: f64 = 50.0;

const GRID_HITS_PER_LEVEL: u32 = 10;
const FREE_ROAM_HITS_PER_LEVEL: u32 = 8;
const SURVIVAL_SCORE_PER_LEVEL: f64 = 500.0;

/// Summary handed to the completion callback.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub mode: Mode,
    pub score: f64,
    /// Percentage, 0–100.
    pub accuracy: f64,
    pub level: u32,
    /// Mean reaction time over cleared entities, when any were cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction_time_ms: Option<f64>,
    pub perfect_hits: u32,
    pub total_targets: u32,
    pub total_shots: u32,
    pub total_hits: u32,
    pub max_combo: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perfect_rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survival_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<EndReason>,
    pub aborted: bool,
}

// ── Formulas ─────────────────────────────────────────────────────────────────

/// `accuracy = 100 * hits / max(attempts, 1)`.
pub fn accuracy(stats: &Stats) -> f64 {
    let hits = stats.total_hits.min(stats.total_shots) as f64;
    100.0 * hits / stats.total_shots.max(1) as f64
}

/// Continuous bonus for fast reactions, never negative.
pub fn speed_bonus(mode: Mode, reaction_time_ms: u64, max_duration_ms: u64) -> f64 {
    let remaining = max_duration_ms.saturating_sub(reaction_time_ms) as f64;
    (remaining * tuning(mode).speed_bonus_per_ms).max(0.0)
}

pub fn is_perfect(mode: Mode, reaction_time_ms: u64) -> bool {
    reaction_time_ms <= tuning(mode).perfect_threshold_ms
}

pub fn mean_reaction_time_ms(stats: &Stats) -> Option<f64> {
    (stats.reaction_samples > 0)
        .then(|| stats.sum_reaction_time_ms as f64 / stats.reaction_samples as f64)
}

// ── In-place bookkeeping used by the pure compute functions ─────────────────

/// Add `delta` to the score, which is floored at zero.
pub fn apply_score(state: &mut GameState, delta: f64) {
    state.score = (state.score + delta).max(0.0);
}

pub fn extend_combo(state: &mut GameState) {
    state.combo += 1;
    state.max_combo = state.max_combo.max(state.combo);
}

pub fn break_combo(state: &mut GameState) {
    state.combo = 0;
}

pub fn record_reaction(state: &mut GameState, reaction_time_ms: u64) {
    state.stats.sum_reaction_time_ms += reaction_time_ms;
    state.stats.reaction_samples += 1;
    if is_perfect(state.mode, reaction_time_ms) {
        state.stats.perfect_hits += 1;
    }
}

/// Re-derive the level from progress. Levels never go back down.
///
/// Pattern drills level up per recalled round instead (see `phase`).
pub fn update_level(state: &mut GameState) {
    let derived = match state.mode {
        Mode::SequenceRecall => return,
        Mode::GridReaction => 1 + state.stats.total_cleared / GRID_HITS_PER_LEVEL,
        Mode::FreeRoamTarget => 1 + state.stats.total_cleared / FREE_ROAM_HITS_PER_LEVEL,
        Mode::SurvivalWave => 1 + (state.score / SURVIVAL_SCORE_PER_LEVEL).floor() as u32,
    };
    state.level = state.level.max(derived);
}

// ── Aggregation ──────────────────────────────────────────────────────────────

pub fn performance(state: &GameState) -> PerformanceRecord {
    let stats = &state.stats;
    let rounds = state.mode.is_multi_round();
    PerformanceRecord {
        mode: state.mode,
        score: state.score,
        accuracy: accuracy(stats),
        level: state.level,
        reaction_time_ms: mean_reaction_time_ms(stats),
        perfect_hits: stats.perfect_hits,
        total_targets: stats.total_spawned,
        total_shots: stats.total_shots,
        total_hits: stats.total_hits,
        max_combo: state.max_combo,
        perfect_rounds: rounds.then_some(stats.perfect_rounds),
        total_rounds: rounds.then_some(stats.total_rounds),
        survival_time_seconds: (state.mode == Mode::SurvivalWave)
            .then(|| state.elapsed_ms as f64 / 1000.0),
        end_reason: state.end_reason,
        aborted: state.end_reason == Some(EndReason::Aborted),
    }
}

//! Difficulty tables and the parameter calculator.
//!
//! Every parameter is a linear function of level and base difficulty,
//! clamped to a floor (or cap) so the drill stays completable at any level.

use crate::entities::Mode;

/// Spawn interval never drops below this, whatever the mode.
pub const MIN_SPAWN_INTERVAL_MS: u64 = 600;

/// Tick-loop parameters in effect for the current level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub spawn_interval_ms: u64,
    pub entity_lifetime_ms: u64,
    pub max_concurrent_entities: u32,
    pub min_size: f64,
    pub max_size: f64,
    /// Playfield units per second.
    pub speed: f64,
}

impl Params {
    /// Expected spawns per second at this interval.
    pub fn spawn_rate(&self) -> f64 {
        1000.0 / self.spawn_interval_ms as f64
    }
}

// ── Difficulty tables ────────────────────────────────────────────────────────

/// Per-mode tuning constants.
#[derive(Clone, Copy, Debug)]
pub struct ModeTuning {
    pub spawn_interval_ms: f64,
    pub spawn_interval_floor_ms: f64,
    pub interval_per_level_ms: f64,
    pub interval_per_difficulty_ms: f64,
    /// Extra ramp applied per second of play (survival only).
    pub interval_per_elapsed_sec_ms: f64,

    pub lifetime_ms: f64,
    pub lifetime_floor_ms: f64,
    pub lifetime_per_level_ms: f64,
    pub lifetime_per_difficulty_ms: f64,

    pub concurrency: u32,
    /// Levels needed for each additional concurrent entity.
    pub levels_per_extra_entity: u32,
    pub concurrency_cap: u32,

    pub size: f64,
    pub size_floor: f64,
    pub size_per_level: f64,
    pub size_per_difficulty: f64,
    /// `min_size = max_size * size_spread`.
    pub size_spread: f64,

    pub speed: f64,
    pub speed_per_level: f64,
    pub speed_per_difficulty: f64,
    pub speed_cap: f64,

    pub perfect_threshold_ms: u64,
    pub base_points: f64,
    pub speed_bonus_per_ms: f64,
    pub starting_lives: u32,
    pub starting_health: u32,
}

const SEQUENCE_TUNING: ModeTuning = ModeTuning {
    spawn_interval_ms: 1_000.0,
    spawn_interval_floor_ms: 1_000.0,
    interval_per_level_ms: 0.0,
    interval_per_difficulty_ms: 0.0,
    interval_per_elapsed_sec_ms: 0.0,
    // Per-step recall allowance.
    lifetime_ms: 2_500.0,
    lifetime_floor_ms: 900.0,
    lifetime_per_level_ms: 120.0,
    lifetime_per_difficulty_ms: 300.0,
    concurrency: 1,
    levels_per_extra_entity: 1,
    concurrency_cap: 1,
    size: 1.0,
    size_floor: 1.0,
    size_per_level: 0.0,
    size_per_difficulty: 0.0,
    size_spread: 1.0,
    speed: 0.0,
    speed_per_level: 0.0,
    speed_per_difficulty: 0.0,
    speed_cap: 0.0,
    perfect_threshold_ms: 500,
    base_points: 10.0,
    speed_bonus_per_ms: 0.005,
    starting_lives: 3,
    starting_health: 0,
};

const GRID_TUNING: ModeTuning = ModeTuning {
    spawn_interval_ms: 1_400.0,
    spawn_interval_floor_ms: MIN_SPAWN_INTERVAL_MS as f64,
    interval_per_level_ms: 80.0,
    interval_per_difficulty_ms: 200.0,
    interval_per_elapsed_sec_ms: 0.0,
    lifetime_ms: 2_200.0,
    lifetime_floor_ms: 700.0,
    lifetime_per_level_ms: 100.0,
    lifetime_per_difficulty_ms: 250.0,
    concurrency: 1,
    levels_per_extra_entity: 3,
    concurrency_cap: 6,
    size: 1.0,
    size_floor: 1.0,
    size_per_level: 0.0,
    size_per_difficulty: 0.0,
    size_spread: 1.0,
    speed: 0.0,
    speed_per_level: 0.0,
    speed_per_difficulty: 0.0,
    speed_cap: 0.0,
    perfect_threshold_ms: 300,
    base_points: 10.0,
    speed_bonus_per_ms: 0.01,
    starting_lives: 3,
    starting_health: 0,
};

const FREE_ROAM_TUNING: ModeTuning = ModeTuning {
    spawn_interval_ms: 1_200.0,
    spawn_interval_floor_ms: MIN_SPAWN_INTERVAL_MS as f64,
    interval_per_level_ms: 60.0,
    interval_per_difficulty_ms: 150.0,
    interval_per_elapsed_sec_ms: 0.0,
    lifetime_ms: 3_000.0,
    lifetime_floor_ms: 900.0,
    lifetime_per_level_ms: 120.0,
    lifetime_per_difficulty_ms: 300.0,
    concurrency: 2,
    levels_per_extra_entity: 2,
    concurrency_cap: 6,
    size: 90.0,
    size_floor: 24.0,
    size_per_level: 4.0,
    size_per_difficulty: 10.0,
    size_spread: 0.5,
    speed: 0.0,
    speed_per_level: 0.0,
    speed_per_difficulty: 0.0,
    speed_cap: 0.0,
    perfect_threshold_ms: 500,
    base_points: 10.0,
    speed_bonus_per_ms: 0.01,
    starting_lives: 3,
    starting_health: 0,
};

const SURVIVAL_TUNING: ModeTuning = ModeTuning {
    spawn_interval_ms: 1_100.0,
    spawn_interval_floor_ms: MIN_SPAWN_INTERVAL_MS as f64,
    interval_per_level_ms: 50.0,
    interval_per_difficulty_ms: 150.0,
    interval_per_elapsed_sec_ms: 4.0,
    lifetime_ms: 6_000.0,
    lifetime_floor_ms: 2_500.0,
    lifetime_per_level_ms: 150.0,
    lifetime_per_difficulty_ms: 400.0,
    concurrency: 3,
    levels_per_extra_entity: 1,
    concurrency_cap: 12,
    size: 70.0,
    size_floor: 30.0,
    size_per_level: 2.0,
    size_per_difficulty: 6.0,
    size_spread: 0.7,
    speed: 90.0,
    speed_per_level: 8.0,
    speed_per_difficulty: 20.0,
    speed_cap: 320.0,
    perfect_threshold_ms: 400,
    base_points: 10.0,
    speed_bonus_per_ms: 0.004,
    starting_lives: 0,
    starting_health: 100,
};

pub fn tuning(mode: Mode) -> &'static ModeTuning {
    match mode {
        Mode::SequenceRecall => &SEQUENCE_TUNING,
        Mode::GridReaction => &GRID_TUNING,
        Mode::FreeRoamTarget => &FREE_ROAM_TUNING,
        Mode::SurvivalWave => &SURVIVAL_TUNING,
    }
}

// ── Parameter calculator (pure) ──────────────────────────────────────────────

/// Map `(level, base difficulty, elapsed play time)` to tick parameters.
///
/// Raising `level`, `difficulty` or `elapsed_secs` never makes any output
/// easier: intervals, lifetimes and sizes only shrink, concurrency and
/// speed only grow, and each is held at its floor/cap.
pub fn params(mode: Mode, level: u32, difficulty: f64, elapsed_secs: f64) -> Params {
    let t = tuning(mode);
    let lvl = level.saturating_sub(1) as f64;
    let diff = difficulty - 1.0;
    let elapsed = elapsed_secs.max(0.0);

    let interval = (t.spawn_interval_ms
        - lvl * t.interval_per_level_ms
        - diff * t.interval_per_difficulty_ms
        - elapsed * t.interval_per_elapsed_sec_ms)
        .max(t.spawn_interval_floor_ms)
        .max(MIN_SPAWN_INTERVAL_MS as f64);

    let lifetime = (t.lifetime_ms - lvl * t.lifetime_per_level_ms - diff * t.lifetime_per_difficulty_ms)
        .max(t.lifetime_floor_ms);

    let extra_for_level = level.saturating_sub(1) / t.levels_per_extra_entity.max(1);
    let extra_for_difficulty = diff.max(0.0).floor() as u32;
    let concurrency = t
        .concurrency
        .saturating_add(extra_for_level)
        .saturating_add(extra_for_difficulty)
        .min(t.concurrency_cap)
        .max(1);

    let max_size = (t.size - lvl * t.size_per_level - diff * t.size_per_difficulty).max(t.size_floor);
    let min_size = (max_size * t.size_spread).max(t.size_floor.min(max_size));

    let speed = (t.speed + lvl * t.speed_per_level + diff * t.speed_per_difficulty)
        .clamp(0.0, t.speed_cap);

    Params {
        spawn_interval_ms: interval.round() as u64,
        entity_lifetime_ms: lifetime.round() as u64,
        max_concurrent_entities: concurrency,
        min_size,
        max_size,
        speed,
    }
}

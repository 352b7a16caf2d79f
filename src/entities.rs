//! Drill data model: modes, entities, phases and the match state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type EntityId = u64;

// ── Drill modes ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Pattern memory: watch a sequence of cells, then repeat it.
    SequenceRecall,
    /// Reaction grid: cells light up and must be pressed before they fade.
    GridReaction,
    /// Precision targets: static circles of varying size inside the field.
    FreeRoamTarget,
    /// Stamina rush: moving waves of mixed entities drifting in from the edges.
    SurvivalWave,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::SequenceRecall,
        Mode::GridReaction,
        Mode::FreeRoamTarget,
        Mode::SurvivalWave,
    ];

    /// Grid modes address entities by cell index instead of coordinates.
    pub fn is_grid(self) -> bool {
        matches!(self, Mode::SequenceRecall | Mode::GridReaction)
    }

    /// Only sequence recall plays several memorize/recall rounds per match.
    pub fn is_multi_round(self) -> bool {
        self == Mode::SequenceRecall
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::SequenceRecall => "Pattern Memory",
            Mode::GridReaction => "Reaction Grid",
            Mode::FreeRoamTarget => "Precision Targets",
            Mode::SurvivalWave => "Stamina Rush",
        }
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// Row-major cell index on a `grid_size × grid_size` board.
    Cell(usize),
    /// Continuous playfield coordinate.
    Point(Point),
}

/// Dimensions of the continuous playfield used by the free-roaming modes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// True when `p` lies more than `margin` outside the field.
    pub fn is_outside(&self, p: Point, margin: f64) -> bool {
        p.x < -margin || p.y < -margin || p.x > self.width + margin || p.y > self.height + margin
    }
}

// ── Entities ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// One step of a recorded pattern (sequence recall).
    PatternStep,
    /// A lit grid cell (grid reaction).
    Cell,
    /// A static precision target.
    Target,
    Normal,
    Fast,
    /// Takes two hits to clear.
    Bonus,
    /// Negative points when hit, damage when left to expire.
    Danger,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub position: Position,
    pub kind: EntityKind,
    /// Diameter in playfield units (1.0 for cells and pattern steps).
    pub size: f64,
    /// Playfield units per second; 0 for static entities.
    pub speed: f64,
    /// Unit vector of travel; zero for static entities.
    pub direction: Point,
    pub health: u32,
    pub max_health: u32,
    pub points: f64,
    pub time_remaining_ms: u64,
    pub max_duration_ms: u64,
    pub created_at_ms: u64,
    /// Never set on a stored entity by the engine, see `live_entities`.
    pub is_hit: bool,
}

impl Entity {
    pub fn is_moving(&self) -> bool {
        self.speed > 0.0
    }

    pub fn cell(&self) -> Option<usize> {
        match self.position {
            Position::Cell(index) => Some(index),
            Position::Point(_) => None,
        }
    }

    pub fn point(&self) -> Option<Point> {
        match self.position {
            Position::Point(p) => Some(p),
            Position::Cell(_) => None,
        }
    }
}

// ── Match phases ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Instructions,
    /// Pattern is being shown; no input accepted.
    Memorize,
    Recall,
    Playing,
    /// Entity mutation is frozen while the round summary is shown.
    Results,
    Complete,
}

impl Phase {
    /// Phases in which the tick loop ages entities and input is resolved.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Recall | Phase::Playing)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    Success,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    TimeUp,
    OutOfLives,
    OutOfHealth,
    PatternMastered,
    Aborted,
}

// ── Running totals ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub total_spawned: u32,
    pub total_cleared: u32,
    /// Every disposition other than a clear: expiries, escapes, failed
    /// pattern steps and entities still live when a round ended.
    pub total_missed: u32,
    /// Subset of `total_missed` that timed out.
    pub total_expired: u32,
    /// Subset of `total_missed` that drifted out of the field.
    pub total_escaped: u32,
    pub perfect_hits: u32,
    pub total_shots: u32,
    pub total_hits: u32,
    pub sum_reaction_time_ms: u64,
    pub reaction_samples: u32,
    pub total_rounds: u32,
    pub perfect_rounds: u32,
}

impl Stats {
    /// Entities that reached a terminal disposition.
    pub fn disposed(&self) -> u32 {
        self.total_cleared + self.total_missed
    }
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire match state.  Cloneable so the pure update functions in
/// `compute` can return a new copy without mutating the original.
#[derive(Clone, Debug)]
pub struct GameState {
    pub mode: Mode,
    pub phase: Phase,
    pub difficulty: f64,
    pub score: f64,
    pub lives: u32,
    /// Stamina pool for survival waves (unused by the lives-based modes).
    pub health: u32,
    pub level: u32,
    pub time_limit_ms: u64,
    pub time_remaining_ms: u64,
    /// Monotonic engine clock; every timestamp in the match reads from it.
    pub clock_ms: u64,
    /// Time spent in `Recall`/`Playing`.
    pub elapsed_ms: u64,
    pub phase_elapsed_ms: u64,
    pub entities: HashMap<EntityId, Entity>,
    pub next_id: EntityId,
    pub combo: u32,
    pub max_combo: u32,
    pub stats: Stats,
    pub last_action_ms: Option<u64>,
    pub grid_size: u32,
    pub field: Field,
    /// Cells of the current pattern, in display order.
    pub pattern: Vec<usize>,
    /// Entity ids of the pattern steps, parallel to `pattern`.
    pub pattern_ids: Vec<EntityId>,
    pub pattern_cursor: usize,
    pub recall_started_ms: u64,
    /// Stays true while every recalled step lands within the perfect window.
    pub round_perfect: bool,
    pub round_outcome: Option<RoundOutcome>,
    /// Set on entry to `Results` when no further round follows.
    pub results_final: bool,
    pub end_reason: Option<EndReason>,
}

impl GameState {
    pub fn cell_count(&self) -> usize {
        (self.grid_size as usize) * (self.grid_size as usize)
    }

    /// Entities that can still be hit.
    ///
    /// Hit resolution removes an entity in the same pass that clears it, so
    /// the engine never stores one with `is_hit` set; the filter only
    /// matters for hand-built states.
    pub fn live_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| !e.is_hit)
    }

    pub fn live_count(&self) -> usize {
        self.live_entities().count()
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.time_remaining_ms.div_ceil(1000)
    }
}

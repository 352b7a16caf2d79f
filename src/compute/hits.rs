//! Input/hit resolution.
//!
//! A player action maps to zero or one entity. Misses are never errors,
//! they only show up in accuracy, combo and (for patterns) lives.

use tracing::trace;

use super::lifecycle::fail_round;
use super::scoring::{
    apply_score, break_combo, extend_combo, is_perfect, record_reaction, speed_bonus, update_level,
};
use crate::entities::{Entity, EntityId, EntityKind, GameState, Mode, Point, RoundOutcome};

/// What the player pointed at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputTarget {
    Cell(usize),
    Point(Point),
}

/// One player action stamped with the engine clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerInput {
    pub target: InputTarget,
    pub timestamp_ms: u64,
}

impl PlayerInput {
    pub fn cell(index: usize, timestamp_ms: u64) -> Self {
        Self {
            target: InputTarget::Cell(index),
            timestamp_ms,
        }
    }

    pub fn point(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            target: InputTarget::Point(Point::new(x, y)),
            timestamp_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HitOutcome {
    pub hit: bool,
    pub entity: Option<EntityId>,
    /// The entity's health reached zero and it left the store.
    pub cleared: bool,
    pub reaction_time_ms: Option<u64>,
    /// Score delta applied by this input, before the zero floor.
    pub points: f64,
}

impl HitOutcome {
    fn miss() -> Self {
        Self {
            hit: false,
            entity: None,
            cleared: false,
            reaction_time_ms: None,
            points: 0.0,
        }
    }
}

pub struct HitResolution {
    pub state: GameState,
    pub outcome: HitOutcome,
}

// ── Resolution (pure) ────────────────────────────────────────────────────────

/// Resolve one input against the current state.
///
/// Every resolved input counts as a shot. Callers must only pass inputs in
/// an active phase; the engine's phase guard drops the rest.
pub fn resolve_hit(state: &GameState, input: &PlayerInput) -> HitResolution {
    if state.mode == Mode::SequenceRecall {
        return resolve_step(state, input);
    }

    let mut next = state.clone();
    next.stats.total_shots += 1;
    next.last_action_ms = Some(input.timestamp_ms);

    let Some(id) = locate(state, input.target) else {
        break_combo(&mut next);
        trace!(input = ?input.target, "input missed");
        return HitResolution {
            state: next,
            outcome: HitOutcome::miss(),
        };
    };

    next.stats.total_hits += 1;
    let mut outcome = HitOutcome {
        hit: true,
        entity: Some(id),
        ..HitOutcome::miss()
    };

    let Some(entity) = next.entities.get_mut(&id) else {
        return HitResolution { state: next, outcome };
    };
    entity.health = entity.health.saturating_sub(1);

    if entity.health > 0 {
        extend_combo(&mut next);
        return HitResolution { state: next, outcome };
    }

    let Some(cleared) = next.entities.remove(&id) else {
        return HitResolution { state: next, outcome };
    };
    next.stats.total_cleared += 1;

    let reaction = input.timestamp_ms.saturating_sub(cleared.created_at_ms);
    outcome.cleared = true;
    outcome.reaction_time_ms = Some(reaction);

    if cleared.kind == EntityKind::Danger {
        outcome.points = cleared.points;
        break_combo(&mut next);
    } else {
        outcome.points = cleared.points + speed_bonus(next.mode, reaction, cleared.max_duration_ms);
        extend_combo(&mut next);
        record_reaction(&mut next, reaction);
    }
    apply_score(&mut next, outcome.points);
    update_level(&mut next);

    trace!(id, reaction, points = outcome.points, "entity cleared");
    HitResolution { state: next, outcome }
}

/// Find the entity an input lands on, if any.
///
/// Cells match exactly. Points match the nearest live entity whose centre
/// lies within `size / 2`.
pub fn locate(state: &GameState, target: InputTarget) -> Option<EntityId> {
    match target {
        InputTarget::Cell(index) => state
            .live_entities()
            .filter(|e| e.cell() == Some(index))
            .map(|e| e.id)
            .min(),
        InputTarget::Point(p) => state
            .live_entities()
            .filter_map(|e| e.point().map(|c| (e, c.distance_to(p))))
            .filter(|(e, d)| *d <= e.size / 2.0)
            .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.id.cmp(&b.id)))
            .map(|(e, _)| e.id),
    }
}

/// Sequence recall: the input must be the next expected cell.
///
/// A wrong cell fails the whole round immediately; the remaining steps are
/// never consulted.
fn resolve_step(state: &GameState, input: &PlayerInput) -> HitResolution {
    let mut next = state.clone();
    next.stats.total_shots += 1;

    let reaction = input
        .timestamp_ms
        .saturating_sub(next.last_action_ms.unwrap_or(0).max(next.recall_started_ms));
    next.last_action_ms = Some(input.timestamp_ms);

    let expected = next.pattern.get(next.pattern_cursor).copied();
    let step_id = next.pattern_ids.get(next.pattern_cursor).copied();
    let (Some(expected), Some(step_id)) = (expected, step_id) else {
        return HitResolution {
            state: next,
            outcome: HitOutcome::miss(),
        };
    };

    let correct = matches!(input.target, InputTarget::Cell(cell) if cell == expected);
    let step: Option<Entity> = if correct { next.entities.remove(&step_id) } else { None };

    let Some(step) = step else {
        trace!(expected, input = ?input.target, "wrong pattern step");
        return HitResolution {
            state: fail_round(&next),
            outcome: HitOutcome::miss(),
        };
    };

    next.stats.total_hits += 1;
    next.stats.total_cleared += 1;
    next.pattern_cursor += 1;
    if !is_perfect(next.mode, reaction) {
        next.round_perfect = false;
    }
    extend_combo(&mut next);
    record_reaction(&mut next, reaction);

    // Each step's allowance is its share of the round deadline.
    let allowance = step.max_duration_ms / next.pattern.len().max(1) as u64;
    let points = step.points + speed_bonus(next.mode, reaction, allowance);
    apply_score(&mut next, points);

    if next.pattern_cursor == next.pattern.len() {
        next.round_outcome = Some(RoundOutcome::Success);
        next.stats.total_rounds += 1;
        if next.round_perfect {
            next.stats.perfect_rounds += 1;
        }
    }

    HitResolution {
        state: next,
        outcome: HitOutcome {
            hit: true,
            entity: Some(step_id),
            cleared: true,
            reaction_time_ms: Some(reaction),
            points,
        },
    }
}

//! Entity lifecycle: ageing, motion, expiry and round-end cleanup.
//!
//! There is no per-entity timer. Each tick scans the live set once, and an
//! entity leaves the store in the same pass that applies its penalty, so a
//! dead entity is never observable as hittable.

use tracing::trace;

use super::scoring::break_combo;
use crate::entities::{EntityKind, GameState, Mode, Point, Position, RoundOutcome};

/// Health lost when a danger entity is left to expire.
pub const DANGER_EXPIRY_DAMAGE: u32 = 20;

// ── Per-tick ageing (pure) ───────────────────────────────────────────────────

/// Advance every live entity by `dt_ms`.
///
/// Expired entities are removed and penalised according to the mode:
/// grid and free-roam expiries cost a life, survival expiries only hurt
/// when the entity was a danger, and a pattern step timing out fails the
/// whole round. Entities that drift a full size outside the field are
/// dropped without penalty.
pub fn advance(state: &GameState, dt_ms: u64) -> GameState {
    let mut next = state.clone();
    if !next.phase.is_active() || dt_ms == 0 {
        return next;
    }

    let dt_secs = dt_ms as f64 / 1000.0;
    let field = next.field;
    let mut expired = Vec::new();
    let mut escaped = Vec::new();

    for entity in next.entities.values_mut() {
        entity.time_remaining_ms = entity.time_remaining_ms.saturating_sub(dt_ms);
        if entity.time_remaining_ms == 0 {
            expired.push(entity.id);
            continue;
        }
        if entity.is_moving() {
            if let Position::Point(p) = entity.position {
                let moved = Point::new(
                    p.x + entity.direction.x * entity.speed * dt_secs,
                    p.y + entity.direction.y * entity.speed * dt_secs,
                );
                entity.position = Position::Point(moved);
                if field.is_outside(moved, entity.size) {
                    escaped.push(entity.id);
                }
            }
        }
    }

    // Deterministic penalty order regardless of map iteration order.
    expired.sort_unstable();
    escaped.sort_unstable();

    for id in escaped {
        if next.entities.remove(&id).is_some() {
            trace!(id, "entity left the field");
            next.stats.total_missed += 1;
            next.stats.total_escaped += 1;
        }
    }

    let mut step_expired = false;
    for id in expired {
        let Some(entity) = next.entities.remove(&id) else {
            continue;
        };
        trace!(id, kind = ?entity.kind, "entity expired");
        next.stats.total_missed += 1;
        next.stats.total_expired += 1;
        break_combo(&mut next);

        match (next.mode, entity.kind) {
            (Mode::SequenceRecall, _) => step_expired = true,
            (Mode::SurvivalWave, EntityKind::Danger) => {
                next.health = next.health.saturating_sub(DANGER_EXPIRY_DAMAGE);
            }
            (Mode::SurvivalWave, _) => {}
            (Mode::GridReaction | Mode::FreeRoamTarget, _) => {
                next.lives = next.lives.saturating_sub(1);
            }
        }
    }

    if step_expired && next.round_outcome.is_none() {
        next = fail_round(&next);
    }

    next
}

/// Fail the current pattern round: the remaining steps are missed and one
/// life is lost.
pub fn fail_round(state: &GameState) -> GameState {
    let mut next = dispose_all(state);
    next.lives = next.lives.saturating_sub(1);
    next.round_outcome = Some(RoundOutcome::Failed);
    next.round_perfect = false;
    next.stats.total_rounds += 1;
    break_combo(&mut next);
    next
}

/// Remove every live entity as a miss, with no penalty.
///
/// Called whenever a round ends so nothing from round N survives into
/// round N + 1.
pub fn dispose_all(state: &GameState) -> GameState {
    let mut next = state.clone();
    let leftover = next.entities.len() as u32;
    if leftover > 0 {
        trace!(leftover, "disposing live entities");
    }
    next.stats.total_missed += leftover;
    next.entities.clear();
    next
}

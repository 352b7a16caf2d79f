//! Match phase state machine.
//!
//! `Instructions → Memorize → Recall → Results → (Memorize …) → Complete`
//! for pattern drills, `Instructions → Playing → Results → Complete` for
//! the rest. `Complete` is absorbing.

use rand::seq::index::sample;
use rand::Rng;
use tracing::{debug, info};

use super::difficulty::{params, tuning};
use super::lifecycle::dispose_all;
use super::scoring::{
    accuracy, apply_score, break_combo, MAX_SEQUENCE_LEVEL, ROUND_BONUS_PER_LEVEL,
};
use super::spawner;
use crate::entities::{
    EndReason, Entity, EntityKind, GameState, Mode, Phase, Point, Position, RoundOutcome,
};

/// Blank lead-in before the first pattern step is shown.
pub const MEMORIZE_LEAD_MS: u64 = 600;
/// How long each pattern step stays highlighted.
pub const STEP_SHOW_MS: u64 = 700;
/// How long the results screen holds before the next round (or the end).
pub const RESULTS_HOLD_MS: u64 = 1_500;

const BASE_PATTERN_LEN: usize = 3;
const MAX_PATTERN_LEN: usize = 12;

// ── Clock ────────────────────────────────────────────────────────────────────

/// Advance the single match clock. The match countdown and every entity
/// timestamp derive from it, so they cannot drift apart.
pub fn count_down(state: &GameState, dt_ms: u64) -> GameState {
    let mut next = state.clone();
    if matches!(next.phase, Phase::Instructions | Phase::Complete) {
        return next;
    }
    next.clock_ms = next.clock_ms.saturating_add(dt_ms);
    next.phase_elapsed_ms = next.phase_elapsed_ms.saturating_add(dt_ms);
    if next.phase.is_active() {
        next.elapsed_ms = next.elapsed_ms.saturating_add(dt_ms);
        next.time_remaining_ms = next.time_remaining_ms.saturating_sub(dt_ms);
    }
    next
}

// ── Round setup ──────────────────────────────────────────────────────────────

/// Leave `Instructions` and begin the first round.
pub fn start(state: &GameState, rng: &mut impl Rng) -> GameState {
    if state.phase != Phase::Instructions {
        return state.clone();
    }
    begin_round(state, rng)
}

pub fn begin_round(state: &GameState, rng: &mut impl Rng) -> GameState {
    if state.mode == Mode::SequenceRecall {
        let len = pattern_length(state.level);
        let pattern = generate_pattern(state.cell_count(), len, rng);
        return begin_memorize(state, pattern);
    }
    let mut next = state.clone();
    set_phase(&mut next, Phase::Playing);
    next
}

/// Show `pattern` and reset the per-round bookkeeping.
pub fn begin_memorize(state: &GameState, pattern: Vec<usize>) -> GameState {
    let mut next = dispose_all(state);
    next.pattern = pattern;
    next.pattern_ids.clear();
    next.pattern_cursor = 0;
    next.round_outcome = None;
    next.round_perfect = true;
    next.last_action_ms = None;
    set_phase(&mut next, Phase::Memorize);
    next
}

pub fn pattern_length(level: u32) -> usize {
    (BASE_PATTERN_LEN + level.saturating_sub(1) as usize).min(MAX_PATTERN_LEN)
}

/// Random pattern over `cells` cells. Steps are distinct while the board is
/// large enough, otherwise consecutive steps merely differ.
pub fn generate_pattern(cells: usize, len: usize, rng: &mut impl Rng) -> Vec<usize> {
    if cells == 0 || len == 0 {
        return Vec::new();
    }
    if len <= cells {
        return sample(rng, cells, len).into_vec();
    }
    let mut pattern: Vec<usize> = Vec::with_capacity(len);
    while pattern.len() < len {
        let cell = rng.gen_range(0..cells);
        if cells > 1 && pattern.last() == Some(&cell) {
            continue;
        }
        pattern.push(cell);
    }
    pattern
}

pub fn memorize_duration_ms(pattern_len: usize) -> u64 {
    MEMORIZE_LEAD_MS + pattern_len as u64 * STEP_SHOW_MS
}

/// Cell currently highlighted while memorizing, if any.
pub fn highlighted_cell(state: &GameState) -> Option<usize> {
    if state.phase != Phase::Memorize {
        return None;
    }
    let shown = state.phase_elapsed_ms.checked_sub(MEMORIZE_LEAD_MS)?;
    state.pattern.get((shown / STEP_SHOW_MS) as usize).copied()
}

/// Memorize auto-advances to recall once the whole pattern has been shown.
pub fn advance_memorize(state: &GameState) -> GameState {
    if state.phase != Phase::Memorize
        || state.phase_elapsed_ms < memorize_duration_ms(state.pattern.len())
    {
        return state.clone();
    }
    enter_recall(state)
}

/// Create one pattern-step entity per step. All steps share the round
/// deadline of `per-step lifetime × length`.
pub fn enter_recall(state: &GameState) -> GameState {
    let p = params(state.mode, state.level, state.difficulty, state.elapsed_ms as f64 / 1000.0);
    let deadline = p.entity_lifetime_ms * state.pattern.len().max(1) as u64;
    let points = tuning(state.mode).base_points;

    let mut next = state.clone();
    next.pattern_ids.clear();
    for &cell in &state.pattern {
        let step = Entity {
            id: next.next_id,
            position: Position::Cell(cell),
            kind: EntityKind::PatternStep,
            size: 1.0,
            speed: 0.0,
            direction: Point::default(),
            health: 1,
            max_health: 1,
            points,
            time_remaining_ms: deadline,
            max_duration_ms: deadline,
            created_at_ms: next.clock_ms,
            is_hit: false,
        };
        next.pattern_ids.push(step.id);
        next = spawner::insert(&next, step);
    }
    next.recall_started_ms = next.clock_ms;
    set_phase(&mut next, Phase::Recall);
    next
}

// ── Termination ──────────────────────────────────────────────────────────────

pub fn terminal_reason(state: &GameState) -> Option<EndReason> {
    let depleted = match state.mode {
        Mode::SurvivalWave => (state.health == 0).then_some(EndReason::OutOfHealth),
        _ => (state.lives == 0).then_some(EndReason::OutOfLives),
    };
    depleted.or((state.time_remaining_ms == 0).then_some(EndReason::TimeUp))
}

/// Re-evaluate end conditions after ageing or input; move to `Results` when
/// the round or the match is over.
pub fn conclude(state: &GameState) -> GameState {
    if !state.phase.is_active() {
        return state.clone();
    }

    let mut next = state.clone();
    let mut reason = terminal_reason(&next);

    if next.mode == Mode::SequenceRecall {
        match next.round_outcome {
            Some(RoundOutcome::Success) => {
                let bonus = ROUND_BONUS_PER_LEVEL * next.level as f64;
                apply_score(&mut next, bonus);
                if next.level >= MAX_SEQUENCE_LEVEL {
                    reason = reason.or(Some(EndReason::PatternMastered));
                } else {
                    next.level += 1;
                }
                debug!(level = next.level, "pattern recalled");
            }
            Some(RoundOutcome::Failed) => {
                debug!(lives = next.lives, "pattern failed");
            }
            None if reason.is_none() => return next,
            None => {
                // Cut short by the clock: the round counts as failed but
                // costs no life.
                next.stats.total_rounds += 1;
                next.round_perfect = false;
                break_combo(&mut next);
                debug!(cursor = next.pattern_cursor, "pattern cut short");
            }
        }
        return enter_results(&next, reason);
    }

    match reason {
        Some(reason) => enter_results(&next, Some(reason)),
        None => next,
    }
}

/// Freeze the round. Live entities are disposed without penalty.
pub fn enter_results(state: &GameState, reason: Option<EndReason>) -> GameState {
    let mut next = dispose_all(state);
    next.results_final = reason.is_some() || !next.mode.is_multi_round();
    next.end_reason = reason.or(next.end_reason);
    set_phase(&mut next, Phase::Results);
    next
}

/// Hold the results screen, then start the next round or complete.
pub fn advance_results(state: &GameState, rng: &mut impl Rng) -> GameState {
    if state.phase != Phase::Results || state.phase_elapsed_ms < RESULTS_HOLD_MS {
        return state.clone();
    }
    if state.results_final {
        complete(state)
    } else {
        begin_round(state, rng)
    }
}

pub fn complete(state: &GameState) -> GameState {
    let mut next = dispose_all(state);
    set_phase(&mut next, Phase::Complete);
    info!(
        mode = ?next.mode,
        score = next.score,
        accuracy = accuracy(&next.stats),
        level = next.level,
        reason = ?next.end_reason,
        "drill complete"
    );
    next
}

/// External abort: straight to `Complete` from any phase.
pub fn abort(state: &GameState) -> GameState {
    if state.phase == Phase::Complete {
        return state.clone();
    }
    let mut next = state.clone();
    next.end_reason = Some(EndReason::Aborted);
    next.results_final = true;
    complete(&next)
}

fn set_phase(state: &mut GameState, phase: Phase) {
    if state.phase != phase {
        debug!(from = ?state.phase, to = ?phase, clock_ms = state.clock_ms, "phase change");
    }
    state.phase = phase;
    state.phase_elapsed_ms = 0;
}

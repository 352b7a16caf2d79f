use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use agent_drills::compute::hits::PlayerInput;
use agent_drills::compute::scoring::MAX_SEQUENCE_LEVEL;
use agent_drills::config::DrillConfig;
use agent_drills::engine::DrillEngine;
use agent_drills::entities::*;
use agent_drills::error::{ConfigError, DrillError};

const TICK: Duration = Duration::from_millis(100);

fn make_engine(mode: Mode, secs: f64) -> DrillEngine {
    let config = DrillConfig::new(mode, 1.0).with_time_limit(secs).with_seed(42);
    DrillEngine::new(&config).expect("valid config")
}

fn run_to_completion(engine: &mut DrillEngine) {
    for _ in 0..10_000 {
        if engine.is_complete() {
            return;
        }
        engine.tick(TICK);
    }
    panic!("drill never completed");
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn invalid_config_is_rejected() {
    let config = DrillConfig::new(Mode::GridReaction, 0.0);
    assert!(matches!(
        DrillEngine::new(&config),
        Err(ConfigError::InvalidDifficulty(_))
    ));
}

#[test]
fn instructions_ignore_time_and_input() {
    let mut engine = make_engine(Mode::GridReaction, 30.0);
    engine.tick(Duration::from_secs(5));
    assert_eq!(engine.phase(), Phase::Instructions);
    assert_eq!(engine.clock_ms(), 0);
    assert_eq!(engine.handle_input(PlayerInput::cell(0, 0)), None);
    assert_eq!(engine.state().stats.total_shots, 0);
}

#[test]
fn start_enters_the_first_round() {
    let mut grid = make_engine(Mode::GridReaction, 30.0);
    grid.start();
    assert_eq!(grid.phase(), Phase::Playing);

    let mut pattern = make_engine(Mode::SequenceRecall, 30.0);
    pattern.start();
    assert_eq!(pattern.phase(), Phase::Memorize);
    assert_eq!(pattern.state().pattern.len(), 3);
}

// ── Grid reaction ─────────────────────────────────────────────────────────────

#[test]
fn idle_grid_drill_runs_out_of_lives() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let mut engine = make_engine(Mode::GridReaction, 30.0).on_complete(move |_, _| {
        seen.set(seen.get() + 1);
    });
    engine.start();
    run_to_completion(&mut engine);

    let state = engine.state();
    assert_eq!(state.stats.total_hits, 0);
    assert_eq!(3 - state.lives, state.stats.total_expired);
    assert_eq!(state.stats.disposed(), state.stats.total_spawned);
    assert_eq!(engine.pending_timers(), 0);

    let record = engine.performance().expect("record");
    assert_eq!(record.accuracy, 0.0);
    assert_eq!(record.end_reason, Some(EndReason::OutOfLives));
    assert!(!record.aborted);

    engine.tick(TICK);
    engine.abort();
    assert_eq!(calls.get(), 1);
}

#[test]
fn perfect_bot_survives_until_time_up() {
    let mut engine = make_engine(Mode::GridReaction, 10.0);
    engine.start();
    while engine.phase() == Phase::Playing {
        engine.tick(TICK);
        let now = engine.clock_ms();
        let inputs: Vec<PlayerInput> = engine
            .state()
            .live_entities()
            .filter_map(Entity::cell)
            .map(|cell| PlayerInput::cell(cell, now))
            .collect();
        for input in inputs {
            let outcome = engine.handle_input(input).expect("active phase");
            assert!(outcome.cleared);
        }
    }
    run_to_completion(&mut engine);

    let record = engine.performance().expect("record");
    assert!(record.total_shots > 0);
    assert_eq!(record.accuracy, 100.0);
    assert_eq!(record.end_reason, Some(EndReason::TimeUp));
    assert_eq!(record.perfect_hits, record.total_hits);
    assert_eq!(engine.state().lives, 3);
}

#[test]
fn clock_stops_while_results_hold() {
    let mut engine = make_engine(Mode::GridReaction, 1.0);
    engine.start();
    while engine.phase() == Phase::Playing {
        engine.tick(TICK);
    }
    assert_eq!(engine.phase(), Phase::Results);
    let elapsed = engine.state().elapsed_ms;
    engine.tick(TICK);
    assert_eq!(engine.state().elapsed_ms, elapsed);
    assert_eq!(engine.handle_input(PlayerInput::cell(0, engine.clock_ms())), None);
}

#[test]
fn step_resolves_inputs_after_the_tick() {
    let mut engine = make_engine(Mode::GridReaction, 30.0);
    engine.start();
    let outcomes = engine.step(TICK, &[PlayerInput::cell(0, 100), PlayerInput::cell(1, 100)]);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(engine.clock_ms(), 100);
    assert_eq!(engine.state().stats.total_shots, 2);
}

// ── Pattern recall ────────────────────────────────────────────────────────────

fn recall_engine(pattern: Vec<usize>) -> DrillEngine {
    timed_recall_engine(pattern, 180.0)
}

fn timed_recall_engine(pattern: Vec<usize>, secs: f64) -> DrillEngine {
    let mut engine = make_engine(Mode::SequenceRecall, secs);
    engine.start();
    engine.start_round_with_pattern(pattern).expect("valid pattern");
    assert_eq!(engine.phase(), Phase::Memorize);
    engine.tick(Duration::from_millis(2_700));
    assert_eq!(engine.phase(), Phase::Recall);
    engine
}

#[test]
fn memorize_highlights_each_step_in_order() {
    let mut engine = make_engine(Mode::SequenceRecall, 180.0);
    engine.start_round_with_pattern(vec![2, 5, 1]).expect("valid pattern");
    assert_eq!(engine.highlighted_cell(), None);
    assert_eq!(engine.handle_input(PlayerInput::cell(2, 0)), None);
    let mut shown = Vec::new();
    for _ in 0..27 {
        engine.tick(TICK);
        if let Some(cell) = engine.highlighted_cell() {
            if shown.last() != Some(&cell) {
                shown.push(cell);
            }
        }
    }
    assert_eq!(shown, vec![2, 5, 1]);
    assert_eq!(engine.phase(), Phase::Recall);
}

#[test]
fn recalled_pattern_levels_up_and_starts_next_round() {
    let mut engine = recall_engine(vec![2, 5, 1]);
    let start = engine.clock_ms();
    for (i, cell) in [2, 5, 1].into_iter().enumerate() {
        let outcome = engine
            .handle_input(PlayerInput::cell(cell, start + 200 * (i as u64 + 1)))
            .expect("recall accepts input");
        assert!(outcome.hit);
    }
    assert_eq!(engine.phase(), Phase::Results);
    assert_eq!(engine.state().level, 2);
    assert_eq!(engine.state().stats.perfect_rounds, 1);
    assert_eq!(engine.handle_input(PlayerInput::cell(0, start + 900)), None);

    engine.tick(Duration::from_millis(1_500));
    assert_eq!(engine.phase(), Phase::Memorize);
    assert_eq!(engine.state().pattern.len(), 4);
}

#[test]
fn wrong_step_costs_a_life_and_freezes_input() {
    let mut engine = recall_engine(vec![2, 5, 1]);
    let start = engine.clock_ms();
    engine.handle_input(PlayerInput::cell(2, start + 200));
    let outcome = engine
        .handle_input(PlayerInput::cell(1, start + 400))
        .expect("recall accepts input");
    assert!(!outcome.hit);
    assert_eq!(engine.phase(), Phase::Results);
    assert_eq!(engine.state().lives, 2);
    assert_eq!(engine.state().level, 1);
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(engine.handle_input(PlayerInput::cell(5, start + 600)), None);
}

#[test]
fn unanswered_pattern_times_out() {
    let mut engine = recall_engine(vec![2, 5, 1]);
    let deadline = engine.params().entity_lifetime_ms * 3;
    engine.tick(Duration::from_millis(deadline));
    assert_eq!(engine.phase(), Phase::Results);
    assert_eq!(engine.state().lives, 2);
    assert_eq!(engine.state().stats.total_expired, 3);
}

#[test]
fn scripted_pattern_is_validated() {
    let mut grid = make_engine(Mode::GridReaction, 30.0);
    assert!(matches!(
        grid.start_round_with_pattern(vec![0]),
        Err(DrillError::UnsupportedMode(Mode::GridReaction))
    ));

    let mut engine = make_engine(Mode::SequenceRecall, 30.0);
    assert!(matches!(
        engine.start_round_with_pattern(Vec::new()),
        Err(DrillError::EmptyPattern)
    ));
    assert!(matches!(
        engine.start_round_with_pattern(vec![1, 9]),
        Err(DrillError::InvalidPattern { cell: 9, cells: 9 })
    ));
}

#[test]
fn clock_running_out_mid_recall_still_counts_the_round() {
    let mut engine = timed_recall_engine(vec![2, 5, 1], 1.0);
    let start = engine.clock_ms();
    let outcome = engine
        .handle_input(PlayerInput::cell(2, start + 200))
        .expect("recall accepts input");
    assert!(outcome.hit);
    run_to_completion(&mut engine);

    let state = engine.state();
    assert_eq!(state.combo, 0);
    assert_eq!(state.lives, 3);
    assert_eq!(state.stats.disposed(), state.stats.total_spawned);

    let record = engine.performance().expect("record");
    assert_eq!(record.end_reason, Some(EndReason::TimeUp));
    assert_eq!(record.total_rounds, Some(1));
    assert_eq!(record.perfect_rounds, Some(0));
    assert_eq!(record.total_hits, 1);
}

#[test]
fn flawless_recall_masters_the_drill_at_the_top_level() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let mut engine = make_engine(Mode::SequenceRecall, 180.0).on_complete(move |_, _| {
        seen.set(seen.get() + 1);
    });
    engine.start();
    for _ in 0..20_000 {
        if engine.is_complete() {
            break;
        }
        engine.tick(TICK);
        if engine.phase() != Phase::Recall {
            continue;
        }
        let now = engine.clock_ms();
        let state = engine.state();
        let remaining = state.pattern[state.pattern_cursor..].to_vec();
        for cell in remaining {
            engine.handle_input(PlayerInput::cell(cell, now));
        }
    }

    assert!(engine.is_complete());
    assert_eq!(calls.get(), 1);
    let record = engine.performance().expect("record");
    assert_eq!(record.end_reason, Some(EndReason::PatternMastered));
    assert_eq!(record.level, MAX_SEQUENCE_LEVEL);
    assert_eq!(record.total_rounds, Some(MAX_SEQUENCE_LEVEL));
    assert_eq!(record.perfect_rounds, Some(MAX_SEQUENCE_LEVEL));
    assert_eq!(record.accuracy, 100.0);
    assert_eq!(engine.state().lives, 3);
}

// ── Free-roaming drills ───────────────────────────────────────────────────────

/// Shoot at the centre of the oldest live entity.
fn aim_at_oldest(engine: &DrillEngine) -> Option<PlayerInput> {
    let now = engine.clock_ms();
    let oldest = engine.state().live_entities().min_by_key(|e| e.id)?;
    let p = oldest.point()?;
    Some(PlayerInput::point(p.x, p.y, now))
}

fn run_bot(engine: &mut DrillEngine) {
    engine.start();
    for _ in 0..10_000 {
        if engine.is_complete() {
            return;
        }
        engine.tick(TICK);
        if let Some(input) = aim_at_oldest(engine) {
            let outcome = engine.handle_input(input).expect("active phase");
            assert!(outcome.hit);
        }
    }
    panic!("drill never completed");
}

#[test]
fn precision_bot_clears_targets_to_the_end() {
    let mut engine = make_engine(Mode::FreeRoamTarget, 20.0);
    run_bot(&mut engine);

    let state = engine.state();
    assert!(state.stats.total_cleared > 0);
    assert_eq!(state.stats.disposed(), state.stats.total_spawned);
    assert_eq!(engine.pending_timers(), 0);

    let record = engine.performance().expect("record");
    assert!((0.0..=100.0).contains(&record.accuracy));
    assert!(record.total_hits > 0);
    assert_eq!(record.survival_time_seconds, None);
    assert_eq!(record.total_rounds, None);
}

#[test]
fn wave_bot_survives_to_the_end() {
    let mut engine = make_engine(Mode::SurvivalWave, 20.0);
    run_bot(&mut engine);

    let state = engine.state();
    assert!(state.stats.total_cleared > 0);
    assert_eq!(state.stats.disposed(), state.stats.total_spawned);
    assert_eq!(engine.pending_timers(), 0);

    let record = engine.performance().expect("record");
    assert!((0.0..=100.0).contains(&record.accuracy));
    let survived = record.survival_time_seconds.expect("wave records survival time");
    assert!(survived > 0.0 && survived <= 20.0);
}

#[test]
fn idle_wave_runs_out_of_health() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let mut engine = make_engine(Mode::SurvivalWave, 600.0).on_complete(move |_, record| {
        assert_eq!(record.end_reason, Some(EndReason::OutOfHealth));
        seen.set(seen.get() + 1);
    });
    engine.start();
    run_to_completion(&mut engine);

    assert_eq!(engine.phase(), Phase::Complete);
    assert_eq!(engine.state().health, 0);
    assert_eq!(calls.get(), 1);
    let record = engine.performance().expect("record");
    assert_eq!(record.end_reason, Some(EndReason::OutOfHealth));
    assert!(record.survival_time_seconds.is_some_and(|t| t < 600.0));
    assert_eq!(engine.state().stats.disposed(), engine.state().stats.total_spawned);
}

// ── Abort ─────────────────────────────────────────────────────────────────────

#[test]
fn abort_completes_once_from_any_phase() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let mut engine = make_engine(Mode::SurvivalWave, 60.0).on_complete(move |_, record| {
        assert!(record.aborted);
        seen.set(seen.get() + 1);
    });
    engine.start();
    for _ in 0..50 {
        engine.tick(TICK);
    }
    engine.abort();
    engine.abort();
    engine.tick(TICK);

    assert!(engine.is_complete());
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(calls.get(), 1);
    let record = engine.performance().expect("record");
    assert_eq!(record.end_reason, Some(EndReason::Aborted));
    assert_eq!(record.survival_time_seconds, Some(5.0));
}

#[test]
fn abort_before_start_still_reports() {
    let mut engine = make_engine(Mode::FreeRoamTarget, 30.0);
    engine.abort();
    assert!(engine.is_complete());
    let record = engine.performance().expect("record");
    assert!(record.aborted);
    assert_eq!(record.total_targets, 0);
}

use agent_drills::compute::difficulty::*;
use agent_drills::entities::Mode;

const DIFFICULTIES: [f64; 9] = [0.25, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0, 8.0, 20.0];

// ── Baseline values ───────────────────────────────────────────────────────────

#[test]
fn grid_baseline_at_level_one() {
    let p = params(Mode::GridReaction, 1, 1.0, 0.0);
    assert_eq!(p.spawn_interval_ms, 1_400);
    assert_eq!(p.entity_lifetime_ms, 2_200);
    assert_eq!(p.max_concurrent_entities, 1);
}

#[test]
fn survival_moves_and_free_roam_does_not() {
    assert!(params(Mode::SurvivalWave, 1, 1.0, 0.0).speed > 0.0);
    assert_eq!(params(Mode::FreeRoamTarget, 1, 1.0, 0.0).speed, 0.0);
}

#[test]
fn spawn_rate_is_inverse_interval() {
    let p = params(Mode::GridReaction, 1, 1.0, 0.0);
    let expected = 1000.0 / 1400.0;
    assert!((p.spawn_rate() - expected).abs() < 1e-9);
}

// ── Floors ────────────────────────────────────────────────────────────────────

#[test]
fn extreme_inputs_stay_completable() {
    for mode in Mode::ALL {
        let p = params(mode, 10_000, 1_000.0, 100_000.0);
        assert!(p.spawn_interval_ms >= MIN_SPAWN_INTERVAL_MS, "{mode:?}");
        assert!(p.max_concurrent_entities >= 1, "{mode:?}");
        assert!(p.max_concurrent_entities <= tuning(mode).concurrency_cap, "{mode:?}");
        assert!(p.entity_lifetime_ms as f64 >= tuning(mode).lifetime_floor_ms, "{mode:?}");
        assert!(p.min_size > 0.0 && p.min_size <= p.max_size, "{mode:?}");
        assert!(p.speed <= tuning(mode).speed_cap, "{mode:?}");
    }
}

#[test]
fn survival_ramps_with_elapsed_time() {
    let fresh = params(Mode::SurvivalWave, 1, 1.0, 0.0);
    let late = params(Mode::SurvivalWave, 1, 1.0, 60.0);
    assert!(late.spawn_interval_ms < fresh.spawn_interval_ms);
}

// ── Monotonicity ──────────────────────────────────────────────────────────────

#[test]
fn higher_difficulty_never_slows_spawns_or_extends_lifetimes() {
    for mode in Mode::ALL {
        for level in [1, 2, 5, 10, 30] {
            for pair in DIFFICULTIES.windows(2) {
                let easy = params(mode, level, pair[0], 0.0);
                let hard = params(mode, level, pair[1], 0.0);
                assert!(hard.spawn_rate() >= easy.spawn_rate(), "{mode:?} L{level} {pair:?}");
                assert!(hard.entity_lifetime_ms <= easy.entity_lifetime_ms, "{mode:?} L{level} {pair:?}");
                assert!(hard.max_size <= easy.max_size);
                assert!(hard.max_concurrent_entities >= easy.max_concurrent_entities);
                assert!(hard.speed >= easy.speed);
            }
        }
    }
}

#[test]
fn higher_level_never_makes_it_easier() {
    for mode in Mode::ALL {
        for &difficulty in &DIFFICULTIES {
            let mut prev = params(mode, 1, difficulty, 0.0);
            for level in 2..=40 {
                let p = params(mode, level, difficulty, 0.0);
                assert!(p.spawn_interval_ms <= prev.spawn_interval_ms);
                assert!(p.entity_lifetime_ms <= prev.entity_lifetime_ms);
                assert!(p.max_concurrent_entities >= prev.max_concurrent_entities);
                assert!(p.min_size <= prev.min_size);
                prev = p;
            }
        }
    }
}

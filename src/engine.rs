//! The drill engine: single owner of one match's `GameState`.
//!
//! Presentation code reads snapshots through [`DrillEngine::state`] and
//! feeds time and input in; it never touches simulation fields directly.

use std::fmt;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::compute::difficulty::{self, Params};
use crate::compute::hits::{self, HitOutcome, PlayerInput};
use crate::compute::scoring::{self, PerformanceRecord};
use crate::compute::{init_state, lifecycle, phase, spawner};
use crate::config::DrillConfig;
use crate::entities::{GameState, Mode, Phase};
use crate::error::{ConfigError, DrillError};

pub type CompletionCallback = Box<dyn FnOnce(f64, &PerformanceRecord)>;

pub struct DrillEngine {
    state: GameState,
    rng: StdRng,
    on_complete: Option<CompletionCallback>,
    record: Option<PerformanceRecord>,
}

impl fmt::Debug for DrillEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillEngine")
            .field("state", &self.state)
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl DrillEngine {
    /// Validate `config` and build an engine sitting in `Instructions`.
    pub fn new(config: &DrillConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(mode = ?config.mode, difficulty = config.difficulty, "drill created");
        Ok(Self {
            state: init_state(config),
            rng,
            on_complete: None,
            record: None,
        })
    }

    /// Register the completion callback. It runs exactly once, on entry to
    /// `Complete`.
    pub fn on_complete(mut self, callback: impl FnOnce(f64, &PerformanceRecord) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Current engine clock; stamp player inputs with this.
    pub fn clock_ms(&self) -> u64 {
        self.state.clock_ms
    }

    /// Parameters the tick loop is using right now.
    pub fn params(&self) -> Params {
        difficulty::params(
            self.state.mode,
            self.state.level,
            self.state.difficulty,
            self.state.elapsed_ms as f64 / 1000.0,
        )
    }

    /// Live entity countdowns still outstanding.
    pub fn pending_timers(&self) -> usize {
        self.state.entities.len()
    }

    pub fn performance(&self) -> Option<&PerformanceRecord> {
        self.record.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.state.phase == Phase::Complete
    }

    pub fn highlighted_cell(&self) -> Option<usize> {
        phase::highlighted_cell(&self.state)
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.state = phase::start(&self.state, &mut self.rng);
    }

    /// Replace the upcoming pattern (pattern drills only) and restart the
    /// memorize phase with it. Accepted before the match starts or while a
    /// pattern is being shown.
    pub fn start_round_with_pattern(&mut self, pattern: Vec<usize>) -> Result<(), DrillError> {
        if self.state.mode != Mode::SequenceRecall {
            return Err(DrillError::UnsupportedMode(self.state.mode));
        }
        if !matches!(self.state.phase, Phase::Instructions | Phase::Memorize) {
            return Err(DrillError::WrongPhase(self.state.phase));
        }
        if pattern.is_empty() {
            return Err(DrillError::EmptyPattern);
        }
        let cells = self.state.cell_count();
        if let Some(&cell) = pattern.iter().find(|&&c| c >= cells) {
            return Err(DrillError::InvalidPattern { cell, cells });
        }
        self.state = phase::begin_memorize(&self.state, pattern);
        Ok(())
    }

    /// Advance the match by `dt`.
    ///
    /// Within one tick entities are aged and expired first, end conditions
    /// are checked, and only then is a new spawn considered.
    pub fn tick(&mut self, dt: Duration) {
        let dt_ms = u64::try_from(dt.as_millis()).unwrap_or(u64::MAX);
        let mut state = phase::count_down(&self.state, dt_ms);

        match state.phase {
            Phase::Instructions | Phase::Complete => {}
            Phase::Memorize => state = phase::advance_memorize(&state),
            Phase::Recall | Phase::Playing => {
                state = lifecycle::advance(&state, dt_ms);
                state = phase::conclude(&state);
                if state.phase.is_active() {
                    let params = difficulty::params(
                        state.mode,
                        state.level,
                        state.difficulty,
                        state.elapsed_ms as f64 / 1000.0,
                    );
                    if let Some(entity) = spawner::try_spawn(&state, &params, dt_ms, &mut self.rng) {
                        state = spawner::insert(&state, entity);
                    }
                }
            }
            Phase::Results => state = phase::advance_results(&state, &mut self.rng),
        }

        self.state = state;
        self.report_if_complete();
    }

    /// Resolve one input against the state as of the last completed tick.
    ///
    /// Returns `None` when the phase does not accept input (instructions,
    /// memorize, results, complete); such input is dropped silently.
    pub fn handle_input(&mut self, input: PlayerInput) -> Option<HitOutcome> {
        if !self.state.phase.is_active() {
            return None;
        }
        let resolution = hits::resolve_hit(&self.state, &input);
        self.state = phase::conclude(&resolution.state);
        self.report_if_complete();
        Some(resolution.outcome)
    }

    /// One tick followed by the inputs queued for it, in order.
    pub fn step(&mut self, dt: Duration, inputs: &[PlayerInput]) -> Vec<HitOutcome> {
        self.tick(dt);
        inputs
            .iter()
            .filter_map(|input| self.handle_input(*input))
            .collect()
    }

    /// Tear the match down from any phase. Outstanding entities are
    /// disposed and the completion callback still fires once.
    pub fn abort(&mut self) {
        self.state = phase::abort(&self.state);
        self.report_if_complete();
    }

    fn report_if_complete(&mut self) {
        if self.state.phase != Phase::Complete || self.record.is_some() {
            return;
        }
        let record = scoring::performance(&self.state);
        if let Some(callback) = self.on_complete.take() {
            callback(self.state.score, &record);
        }
        self.record = Some(record);
    }
}

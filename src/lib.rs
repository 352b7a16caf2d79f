//! Timed training-drill engine.
//!
//! One parameterised engine runs the four drill modes (sequence recall,
//! grid reaction, free-roam targets, survival waves). The simulation is a
//! plain [`entities::GameState`] value advanced by the pure functions in
//! [`compute`]; [`engine::DrillEngine`] owns that value for one match and is
//! the only thing that mutates it.

pub mod compute;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;

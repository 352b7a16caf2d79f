//! Entity spawner: at most one new entity per tick.

use std::f64::consts::PI;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::trace;

use super::difficulty::{tuning, Params};
use crate::entities::{Entity, EntityKind, GameState, Mode, Point, Position};

/// Half-angle of the inward cone used for edge spawns.
const SPAWN_CONE_HALF_ANGLE: f64 = PI / 6.0;

const SURVIVAL_KINDS: [EntityKind; 4] = [
    EntityKind::Normal,
    EntityKind::Fast,
    EntityKind::Bonus,
    EntityKind::Danger,
];
const SURVIVAL_WEIGHTS: [u32; 4] = [60, 20, 10, 10];

/// Fixed per-kind profile, scaled by the current `Params`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindProfile {
    pub size_factor: f64,
    pub speed_factor: f64,
    pub health: u32,
    pub points: f64,
    pub duration_factor: f64,
}

pub fn kind_profile(kind: EntityKind) -> KindProfile {
    let plain = KindProfile {
        size_factor: 1.0,
        speed_factor: 1.0,
        health: 1,
        points: 10.0,
        duration_factor: 1.0,
    };
    match kind {
        EntityKind::PatternStep | EntityKind::Cell | EntityKind::Target | EntityKind::Normal => {
            plain
        }
        EntityKind::Fast => KindProfile {
            size_factor: 0.7,
            speed_factor: 1.8,
            points: 20.0,
            duration_factor: 0.7,
            ..plain
        },
        EntityKind::Bonus => KindProfile {
            size_factor: 1.2,
            speed_factor: 0.8,
            health: 2,
            points: 50.0,
            ..plain
        },
        EntityKind::Danger => KindProfile {
            points: -30.0,
            ..plain
        },
    }
}

// ── Spawning (RNG injected) ──────────────────────────────────────────────────

/// Decide whether a new entity appears this tick.
///
/// The chance scales with `dt_ms / spawn_interval_ms`, so the average
/// spawn rate does not depend on how often the loop ticks.
pub fn try_spawn(
    state: &GameState,
    params: &Params,
    dt_ms: u64,
    rng: &mut impl Rng,
) -> Option<Entity> {
    if state.mode == Mode::SequenceRecall || !state.phase.is_active() {
        return None;
    }
    if state.live_count() >= params.max_concurrent_entities as usize {
        return None;
    }

    let chance = (dt_ms as f64 / params.spawn_interval_ms.max(1) as f64).clamp(0.0, 1.0);
    if chance <= 0.0 || !rng.gen_bool(chance) {
        return None;
    }

    match state.mode {
        Mode::GridReaction => spawn_cell(state, params, rng),
        Mode::FreeRoamTarget => Some(spawn_target(state, params, rng)),
        Mode::SurvivalWave => Some(spawn_wave_entity(state, params, rng)),
        Mode::SequenceRecall => None,
    }
}

/// Insert a spawned entity and account for it.
pub fn insert(state: &GameState, entity: Entity) -> GameState {
    trace!(id = entity.id, kind = ?entity.kind, "entity spawned");
    let mut next = state.clone();
    next.next_id = next.next_id.max(entity.id + 1);
    next.stats.total_spawned += 1;
    let id = entity.id;
    let previous = next.entities.insert(id, entity);
    debug_assert!(previous.is_none(), "entity id {id} inserted twice");
    next
}

/// Cells without a live entity on them, ascending.
pub fn free_cells(state: &GameState) -> Vec<usize> {
    let mut occupied = vec![false; state.cell_count()];
    for cell in state.live_entities().filter_map(Entity::cell) {
        if let Some(slot) = occupied.get_mut(cell) {
            *slot = true;
        }
    }
    occupied
        .iter()
        .enumerate()
        .filter(|(_, taken)| !**taken)
        .map(|(i, _)| i)
        .collect()
}

fn base_entity(state: &GameState, position: Position, kind: EntityKind, lifetime_ms: u64) -> Entity {
    let profile = kind_profile(kind);
    Entity {
        id: state.next_id,
        position,
        kind,
        size: 1.0,
        speed: 0.0,
        direction: Point::default(),
        health: profile.health,
        max_health: profile.health,
        points: profile.points,
        time_remaining_ms: lifetime_ms,
        max_duration_ms: lifetime_ms,
        created_at_ms: state.clock_ms,
        is_hit: false,
    }
}

fn spawn_cell(state: &GameState, params: &Params, rng: &mut impl Rng) -> Option<Entity> {
    let free = free_cells(state);
    if free.is_empty() {
        return None;
    }
    let cell = free[rng.gen_range(0..free.len())];
    let mut entity = base_entity(state, Position::Cell(cell), EntityKind::Cell, params.entity_lifetime_ms);
    entity.points = tuning(state.mode).base_points;
    Some(entity)
}

fn spawn_target(state: &GameState, params: &Params, rng: &mut impl Rng) -> Entity {
    let size = if params.max_size > params.min_size {
        rng.gen_range(params.min_size..=params.max_size)
    } else {
        params.max_size
    };
    let r = size / 2.0;
    let field = state.field;
    let x = if field.width > size { rng.gen_range(r..=field.width - r) } else { field.width / 2.0 };
    let y = if field.height > size { rng.gen_range(r..=field.height - r) } else { field.height / 2.0 };

    let mut entity = base_entity(
        state,
        Position::Point(Point::new(x, y)),
        EntityKind::Target,
        params.entity_lifetime_ms,
    );
    entity.size = size;
    // Smaller targets are worth more.
    entity.points = tuning(state.mode).base_points * (params.max_size / size);
    entity
}

fn spawn_wave_entity(state: &GameState, params: &Params, rng: &mut impl Rng) -> Entity {
    let kind = match WeightedIndex::<u32>::new(SURVIVAL_WEIGHTS) {
        Ok(dist) => SURVIVAL_KINDS[dist.sample(rng)],
        Err(_) => EntityKind::Normal,
    };
    let profile = kind_profile(kind);
    let field = state.field;

    let origin = match rng.gen_range(0..4) {
        0 => Point::new(rng.gen_range(0.0..=field.width), 0.0),
        1 => Point::new(field.width, rng.gen_range(0.0..=field.height)),
        2 => Point::new(rng.gen_range(0.0..=field.width), field.height),
        _ => Point::new(0.0, rng.gen_range(0.0..=field.height)),
    };
    let center = field.center();
    let aim = (center.y - origin.y).atan2(center.x - origin.x);
    let angle = aim + rng.gen_range(-SPAWN_CONE_HALF_ANGLE..=SPAWN_CONE_HALF_ANGLE);

    let lifetime = (params.entity_lifetime_ms as f64 * profile.duration_factor).round() as u64;
    let mut entity = base_entity(state, Position::Point(origin), kind, lifetime.max(1));
    entity.size = params.max_size * profile.size_factor;
    entity.speed = params.speed * profile.speed_factor;
    entity.direction = Point::new(angle.cos(), angle.sin());
    entity
}

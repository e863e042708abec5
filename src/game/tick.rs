//! Authoritative Simulation Tick
//!
//! The ordered per-frame pipeline. Given the same config and the same
//! sequence of commands and host timestamps, it produces the same state.
//!
//! ## Order within a tick
//!
//! 0. Advance the clock (clamped frame delta)
//! 1. Spawner may emit one enemy
//! 2. Enemies walk the path
//! 3. Towers pick targets and fire
//! 4. Projectiles fly and resolve impacts (direct + splash)
//! 5. Dead and escaped enemies are removed; money and lives settle
//! 6. Wave completion, then victory

use tracing::{debug, info, warn};

use crate::core::vec2::Vec2;
use crate::game::config::{GameConfig, Settings};
use crate::game::enemy::{Enemy, EnemyId, EnemyStatus};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::map::GameMap;
use crate::game::state::{GamePhase, GameState};

/// Base wave completion bonus.
pub const WAVE_BONUS_BASE: u32 = 25;

/// Extra completion bonus per wave number.
pub const WAVE_BONUS_PER_WAVE: u32 = 5;

/// Result of a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickResult {
    /// Events generated since the previous tick (commands included)
    pub events: Vec<GameEvent>,
    /// Clamped frame delta applied (ms)
    pub delta_ms: f64,
    /// Lives ran out this tick
    pub game_over: bool,
    /// Final wave cleared this tick
    pub victory: bool,
    /// A wave completed this tick
    pub wave_completed: bool,
}

/// Completion bonus for the 1-based `wave`.
pub fn wave_bonus(wave: u32) -> u32 {
    WAVE_BONUS_BASE + WAVE_BONUS_PER_WAVE * wave
}

/// Run one simulation tick at host time `now_ms`.
///
/// Once the game is over or won this is a no-op that returns an empty
/// result; terminal events are never reported twice.
pub fn tick(state: &mut GameState, config: &GameConfig, map: &GameMap, now_ms: f64) -> TickResult {
    let mut result = TickResult::default();

    if state.phase.is_terminal() {
        return result;
    }

    // 0. Clock
    state.tick += 1;
    let delta = advance_clock(state, &config.settings, now_ms);
    result.delta_ms = delta;

    let path = map.path_as_pixel_sequence();

    // 1. Spawning
    spawn_enemies(state, config, path, delta);

    // 2. Enemy movement
    for enemy in state.enemies.values_mut() {
        enemy.advance(delta, path);
    }

    // 3. Towers fire
    fire_towers(state, &config.settings, path);

    // 4. Projectiles
    update_projectiles(state, map, delta);

    // 5. Reconcile
    result.game_over = reconcile_enemies(state);

    // 6. Wave completion
    if !result.game_over {
        check_wave_completion(state, config, &mut result);
    }

    // Collect events
    result.events = state.take_events();

    result
}

/// Advance the simulation clock and return the clamped delta.
///
/// The first call only records the host timestamp.
fn advance_clock(state: &mut GameState, settings: &Settings, now_ms: f64) -> f64 {
    let raw = match state.last_now_ms {
        Some(last) => now_ms - last,
        None => 0.0,
    };
    state.last_now_ms = Some(now_ms);

    let delta = if !raw.is_finite() {
        warn!("Non-finite frame delta at tick {}, treating as 0", state.tick);
        0.0
    } else if raw < 0.0 {
        warn!("Clock went backwards by {:.1}ms at tick {}", -raw, state.tick);
        0.0
    } else if raw > settings.max_frame_delta_ms {
        warn!(
            "Frame delta {:.1}ms clamped to {:.1}ms at tick {}",
            raw, settings.max_frame_delta_ms, state.tick
        );
        settings.max_frame_delta_ms
    } else {
        raw
    };

    state.elapsed_ms += delta;
    delta
}

/// Materialise the spawner's request, if any.
fn spawn_enemies(state: &mut GameState, config: &GameConfig, path: &[Vec2], delta: f64) {
    let Some(type_id) = state.spawner.tick(delta) else {
        return;
    };
    let Some(kind) = config.enemy_type(&type_id) else {
        // Validated configs never get here
        warn!("Wave references unknown enemy type {}", type_id);
        return;
    };

    let id = state.allocate_enemy_id();
    state.enemies.insert(id, Enemy::new(id, kind, path));
    debug!("Spawned {} ({})", id, type_id);
    state.push_event(GameEvent::new(
        state.tick,
        GameEventData::EnemySpawned { enemy_id: id, enemy_type: type_id },
    ));
}

/// Let every ready tower shoot at its chosen target.
fn fire_towers(state: &mut GameState, settings: &Settings, path: &[Vec2]) {
    let now = state.elapsed_ms;
    let tick = state.tick;
    let mut events = Vec::new();

    // BTreeMap values_mut iterates in sorted order
    for tower in state.towers.values_mut() {
        if !tower.can_fire(now) {
            continue;
        }
        let Some(target) = tower
            .select_target(&state.enemies, settings.targeting, path)
            .and_then(|id| state.enemies.get(&id))
        else {
            continue;
        };

        let fired = tower.fire(target, now, &mut state.next_projectile_id);
        for projectile in tower.projectiles.iter().filter(|p| fired.contains(&p.id)) {
            events.push(GameEvent::new(
                tick,
                GameEventData::ProjectileFired {
                    tower_id: tower.id,
                    projectile_id: projectile.id,
                    target_id: target.id,
                    angle: projectile.launch_angle,
                },
            ));
        }
    }

    state.pending_events.extend(events);
}

/// Fly every projectile and apply the damage of those that land.
fn update_projectiles(state: &mut GameState, map: &GameMap, delta: f64) {
    let tick = state.tick;
    let mut events = Vec::new();

    for tower in state.towers.values_mut() {
        let mut kills = 0;

        for projectile in tower.projectiles.iter_mut() {
            let outcome = projectile.update(delta, &mut state.enemies, map);
            let Some(impact) = outcome.impact else {
                continue;
            };

            events.push(GameEvent::enemy_damaged(
                tick,
                impact.target,
                tower.id,
                impact.amount,
                impact.direct.health_percent,
                false,
            ));
            if impact.direct.died {
                kills += 1;
            }

            for hit in &impact.splash {
                events.push(GameEvent::enemy_damaged(
                    tick,
                    hit.enemy,
                    tower.id,
                    hit.amount,
                    hit.outcome.health_percent,
                    true,
                ));
                if hit.outcome.died {
                    kills += 1;
                }
            }
        }

        tower.projectiles.retain(|p| !p.to_remove);
        tower.kills += kills;
    }

    state.pending_events.extend(events);
}

/// Remove dead and escaped enemies, paying rewards and charging lives
/// exactly once per enemy. Returns true if the game ended here.
fn reconcile_enemies(state: &mut GameState) -> bool {
    let finished: Vec<EnemyId> = state
        .enemies
        .iter()
        .filter(|(_, enemy)| !enemy.is_alive())
        .map(|(id, _)| *id)
        .collect();

    let lives_before = state.lives;

    for id in finished {
        let Some(enemy) = state.enemies.remove(&id) else {
            continue;
        };
        match enemy.status {
            EnemyStatus::Dead => {
                state.money = state.money.saturating_add(enemy.reward);
                debug!("{} defeated, +{} money", id, enemy.reward);
                state.push_event(GameEvent::enemy_defeated(state.tick, id, enemy.reward, enemy.killed_by));
            }
            EnemyStatus::ReachedEnd => {
                state.lives = state.lives.saturating_sub(enemy.damage);
                debug!("{} reached the end, -{} lives", id, enemy.damage);
                state.push_event(GameEvent::enemy_reached_end(state.tick, id, enemy.damage, state.lives));
            }
            EnemyStatus::Alive => {}
        }
    }

    if lives_before > 0 && state.lives == 0 {
        state.phase = GamePhase::GameOver;
        info!("Game over at wave {} (tick {})", state.wave, state.tick);
        state.push_event(GameEvent::new(state.tick, GameEventData::GameOver { wave: state.wave }));
        return true;
    }
    false
}

/// Pay the completion bonus once the wave is fully spawned and cleared.
fn check_wave_completion(state: &mut GameState, config: &GameConfig, result: &mut TickResult) {
    if !state.spawner.try_complete(state.enemies.len()) {
        return;
    }

    let bonus = wave_bonus(state.wave);
    state.money = state.money.saturating_add(bonus);
    result.wave_completed = true;
    info!("Wave {} completed, bonus {}", state.wave, bonus);
    state.push_event(GameEvent::wave_completed(state.tick, state.wave, bonus));

    if state.wave as usize >= config.waves.len() {
        state.phase = GamePhase::Victory;
        result.victory = true;
        info!("Victory with {} lives left", state.lives);
        state.push_event(GameEvent::new(
            state.tick,
            GameEventData::Victory { wave: state.wave, lives: state.lives },
        ));
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Tower Siege demo
//!
//! Plays a game with a simple autopilot, records it, then verifies the
//! transcript by replay.
//!
//! ```text
//! tower-siege [CONFIG.json] [TRANSCRIPT_OUT.json]
//! ```

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tower_siege::{
    game::{events::GameEventData, map::GameMap, state::GamePhase},
    replay::{verify_transcript, Recorder},
    Cell, Command, CommandOutcome, GameConfig, Simulation, REFERENCE_TICK_RATE, VERSION,
};

const CLASSIC_CONFIG: &str = include_str!("../config/classic.json");

/// Frame step the autopilot feeds the simulation (ms)
const FRAME_MS: f64 = 1000.0 / REFERENCE_TICK_RATE as f64;

/// Give up after this many frames (30 minutes of game time)
const MAX_FRAMES: u32 = REFERENCE_TICK_RATE * 60 * 30;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Tower Siege v{}", VERSION);

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::from_path(&path).with_context(|| format!("loading {}", path))?,
        None => GameConfig::from_json_str(CLASSIC_CONFIG).context("parsing built-in config")?,
    };
    let transcript_out = args.next();

    info!(
        "Map {}x{}, {} tower types, {} enemy types, {} waves",
        config.map.width,
        config.map.height,
        config.towers.len(),
        config.enemies.len(),
        config.waves.len()
    );
    info!("Config fingerprint: {}", hex::encode(config.fingerprint()));

    let recorder = autoplay(Recorder::new(Simulation::new(config.clone())?));
    let (sim, transcript) = recorder.finish();

    info!("=== Game Results ===");
    info!(
        "{:?} at wave {}/{} with {} lives and {} money after {} ticks",
        sim.phase(),
        sim.wave_number(),
        sim.total_waves(),
        sim.lives(),
        sim.money(),
        sim.state().tick
    );
    for tower in sim.towers() {
        info!("{} ({}) level {} at {}: {} kills", tower.id, tower.type_id, tower.level, tower.cell, tower.kills);
    }
    info!("Final State Hash: {}", hex::encode(sim.state_hash()));

    info!("=== Verifying Replay ===");
    let report = verify_transcript(&config, &transcript)?;
    info!(
        "Replayed {} commands, {} checkpoints matched",
        report.commands_replayed, report.checkpoints_verified
    );
    if report.final_state_hash != sim.state_hash() {
        bail!("replay diverged from the recorded game");
    }
    info!("REPLAY VERIFIED: Hashes match!");

    if let Some(path) = transcript_out {
        fs::write(&path, transcript.to_json()?).with_context(|| format!("writing {}", path))?;
        info!("Transcript written to {}", path);
    }

    Ok(())
}

/// Play until the game ends or the frame cap runs out.
fn autoplay(mut recorder: Recorder) -> Recorder {
    let mut now = 0.0;
    recorder.apply(Command::Tick { now_ms: now });

    for _ in 0..MAX_FRAMES {
        if recorder.simulation().phase() != GamePhase::Playing {
            break;
        }

        for command in plan(recorder.simulation()) {
            if let CommandOutcome::Rejected(err) = recorder.apply(command) {
                warn!("Autopilot command rejected: {}", err);
            }
        }

        now += FRAME_MS;
        if let CommandOutcome::Ticked(result) = recorder.apply(Command::Tick { now_ms: now }) {
            for event in &result.events {
                log_event(&event.data);
            }
        }
    }

    recorder
}

/// Decide what to do this frame: start idle waves, spend money on towers
/// near the path, then on upgrades.
fn plan(sim: &Simulation) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut money = sim.money();

    if !sim.is_wave_in_progress() && sim.wave_number() < sim.total_waves() {
        commands.push(Command::StartNextWave);
    }

    let cheapest = sim.config().towers.iter().min_by_key(|t| t.cost);
    if let Some(kind) = cheapest {
        if money >= kind.cost {
            if let Some(cell) = best_free_cell(sim) {
                commands.push(Command::BuildTower { tower_type: kind.id.clone(), cell });
                money -= kind.cost;
            }
        }
    }

    if let Some(tower) = sim
        .towers()
        .filter(|t| !t.is_max_level())
        .min_by_key(|t| t.upgrade_cost)
    {
        if money >= tower.upgrade_cost + 100 {
            commands.push(Command::UpgradeTower { tower_id: tower.id });
        }
    }

    commands
}

/// Free buildable cell touching the most path cells.
fn best_free_cell(sim: &Simulation) -> Option<Cell> {
    let map = sim.map();
    map.buildable_cells()
        .filter(|cell| sim.state().tower_at(*cell).is_none())
        .map(|cell| (path_neighbours(map, cell), cell))
        .filter(|(score, _)| *score > 0)
        .max_by_key(|(score, cell)| (*score, std::cmp::Reverse((cell.y, cell.x))))
        .map(|(_, cell)| cell)
}

fn path_neighbours(map: &GameMap, cell: Cell) -> u32 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if (dx, dy) != (0, 0) && map.is_path(Cell::new(cell.x + dx, cell.y + dy)) {
                count += 1;
            }
        }
    }
    count
}

fn log_event(data: &GameEventData) {
    match data {
        GameEventData::WaveStarted { wave, enemy_count } => {
            info!("Wave {} started ({} enemies)", wave, enemy_count);
        }
        GameEventData::WaveCompleted { wave, bonus } => {
            info!("Wave {} cleared, bonus {}", wave, bonus);
        }
        GameEventData::EnemyReachedEnd { enemy_id, lives_left, .. } => {
            info!("{} got through, {} lives left", enemy_id, lives_left);
        }
        GameEventData::GameOver { wave } => info!("Game over on wave {}", wave),
        GameEventData::Victory { lives, .. } => info!("Victory with {} lives", lives),
        _ => {}
    }
}

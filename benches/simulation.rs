//! Tick throughput on the classic map with a random tower layout.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use tower_siege::replay::{verify_transcript, Recorder};
use tower_siege::{Cell, Command, GameConfig, Simulation};

const CLASSIC_CONFIG: &str = include_str!("../config/classic.json");

/// Classic config with plenty of money so the layout is dense.
fn config() -> GameConfig {
    let mut config = GameConfig::from_json_str(CLASSIC_CONFIG).expect("classic config parses");
    config.settings.starting_money = 5_000;
    config
}

/// Build commands for `count` towers on random buildable cells.
fn layout(config: &GameConfig, count: usize, seed: u64) -> Vec<Command> {
    let sim = Simulation::new(config.clone()).expect("classic config is valid");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells: Vec<Cell> = sim.map().buildable_cells().collect();
    cells.shuffle(&mut rng);

    let kinds: Vec<String> = config.towers.iter().map(|t| t.id.clone()).collect();
    cells
        .into_iter()
        .take(count)
        .filter_map(|cell| {
            kinds
                .choose(&mut rng)
                .map(|kind| Command::BuildTower { tower_type: kind.clone(), cell })
        })
        .collect()
}

fn bench_tick(c: &mut Criterion) {
    let config = config();
    let builds = layout(&config, 20, 7);

    c.bench_function("wave_1_with_20_towers", |b| {
        b.iter_batched(
            || {
                let mut sim = Simulation::new(config.clone()).expect("classic config is valid");
                for command in &builds {
                    sim.apply(command);
                }
                sim.tick(0.0);
                sim.start_next_wave().expect("first wave starts");
                sim
            },
            |mut sim| {
                let mut now = 0.0;
                for _ in 0..600 {
                    now += 16.0;
                    black_box(sim.tick(now));
                }
                sim
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_verify(c: &mut Criterion) {
    let config = config();
    let mut recorder = Recorder::new(Simulation::new(config.clone()).expect("classic config is valid"));
    for command in layout(&config, 20, 11) {
        recorder.apply(command);
    }
    let mut now = 0.0;
    recorder.apply(Command::Tick { now_ms: now });
    for wave in 0..config.waves.len() {
        recorder.apply(Command::StartNextWave);
        for _ in 0..(600 + 300 * wave) {
            now += 16.0;
            recorder.apply(Command::Tick { now_ms: now });
        }
    }
    let (_, transcript) = recorder.finish();

    c.bench_function("verify_full_game", |b| {
        b.iter(|| verify_transcript(black_box(&config), black_box(&transcript)))
    });
}

criterion_group!(benches, bench_tick, bench_verify);
criterion_main!(benches);

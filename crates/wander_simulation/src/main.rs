//! Headless симуляция Wander
//!
//! Запускает Bevy App без рендера: walker'ы из сценария ходят между
//! waypoint'ами, прибытия логируются.

use std::path::PathBuf;

use bevy::prelude::*;
use clap::{Parser, ValueEnum};
use wander_simulation::{
    create_stepped_app, log_info, set_log_level, spawn_walker, LogLevel, ScenarioConfig,
    WaypointWalker,
};

#[derive(Parser, Debug)]
#[command(name = "wander_simulation")]
#[command(about = "Headless waypoint walker simulation")]
#[command(version)]
struct Args {
    /// JSON сценарий (без него — встроенный сценарий на квадрате)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed RNG (перекрывает seed из сценария)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Число тиков (перекрывает ticks из сценария)
    #[arg(short, long)]
    ticks: Option<usize>,

    /// Минимальный уровень логов
    #[arg(long, value_enum, default_value_t = LevelArg::Info)]
    log_level: LevelArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LevelArg {
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LevelArg> for LogLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Debug => LogLevel::Debug,
            LevelArg::Info => LogLevel::Info,
            LevelArg::Warning => LogLevel::Warning,
            LevelArg::Error => LogLevel::Error,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    set_log_level(args.log_level.into());

    let mut scenario = match &args.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }

    let mut app = create_stepped_app(scenario.seed, scenario.tick_rate_hz);
    log_info(&format!(
        "Starting Wander headless simulation (seed: {}, walkers: {}, ticks: {})",
        scenario.seed,
        scenario.walkers.len(),
        scenario.ticks
    ));

    {
        let world = app.world_mut();
        let mut commands = world.commands();
        for spawn in &scenario.walkers {
            spawn_walker(&mut commands, spawn)?;
        }
    }
    app.world_mut().flush();

    // Первый update только инициализирует время
    for tick in 0..=scenario.ticks {
        app.update();

        if tick % 100 == 0 && tick != scenario.ticks {
            report_progress(&mut app, tick);
        }
    }

    report_progress(&mut app, scenario.ticks);
    log_info("Simulation complete!");
    Ok(())
}

fn report_progress(app: &mut App, tick: usize) {
    let world = app.world_mut();
    let mut query = world.query::<(Entity, &WaypointWalker, &Transform)>();

    for (entity, walker, transform) in query.iter(world) {
        log_info(&format!(
            "Tick {}: {:?} at {:?} → target {:?} ({:?})",
            tick,
            entity,
            transform.translation,
            walker.target(),
            walker.phase()
        ));
    }
}

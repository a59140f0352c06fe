//! Wander Simulation Core
//!
//! Headless ECS-симуляция на Bevy 0.16: персонажи ходят между случайными
//! waypoint'ами, поворачиваются по направлению движения и выставляют
//! bool-флаг анимации.
//!
//! Рендер, анимация и редакторские gizmo — ответственность host'а.
//! Симуляция только пишет Transform и AnimatorParams.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod config;
pub mod logger;
pub mod walker;

// Re-export базовых типов для удобства
pub use config::{ConfigError, ScenarioConfig, WalkerConfig, WalkerSpawn};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use walker::{
    AnimationFlagSink, AnimatorParams, Pose, TickOutcome, WalkerDisabled, WalkerError,
    WalkerPhase, WalkerPlugin, WaypointReached, WaypointWalker,
};

/// Частота FixedUpdate по умолчанию
pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed, выставленный create_headless_app, не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        if !app.world().contains_resource::<Time<Fixed>>() {
            app.insert_resource(Time::<Fixed>::from_hz(DEFAULT_TICK_RATE_HZ));
        }

        app.add_plugins(WalkerPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(DEFAULT_TICK_RATE_HZ)); // 60Hz FixedUpdate

    app
}

/// Headless App с ручным временем: каждый `app.update()` = ровно один fixed тик
/// (кроме самого первого, где Time<Real> только инициализируется)
///
/// Нужен для воспроизводимых прогонов (runner, тесты): wall clock не участвует.
pub fn create_stepped_app(seed: u64, tick_rate_hz: f64) -> App {
    let mut app = create_headless_app(seed);
    let fixed = Time::<Fixed>::from_hz(tick_rate_hz);
    let step = fixed.timestep();

    app.insert_resource(fixed)
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(step))
        .add_plugins(SimulationPlugin);

    // Time<Virtual> по умолчанию режет delta до 250ms → при tick rate < 4Hz
    // fixed тик срабатывал бы не на каждом update
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .set_max_delta(step.max(Time::<Virtual>::default().max_delta()));

    app
}

/// Spawn walker entity (Transform + WaypointWalker + AnimatorParams)
pub fn spawn_walker(
    commands: &mut Commands,
    spawn: &WalkerSpawn,
) -> Result<Entity, ConfigError> {
    let walker = WaypointWalker::new(spawn.walker.clone())?;

    Ok(commands
        .spawn((
            Transform::from_translation(spawn.start),
            walker,
            AnimatorParams::default(),
        ))
        .id())
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

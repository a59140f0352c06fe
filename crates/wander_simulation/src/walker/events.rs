//! Walker events

use bevy::prelude::*;

/// Event: walker выключился при активации (нет waypoint'ов)
///
/// Пишется ровно один раз на entity.
#[derive(Event, Debug, Clone)]
pub struct WalkerDisabled {
    pub entity: Entity,
}

/// Event: entity дошла до target и выбрала следующий waypoint
#[derive(Event, Debug, Clone)]
pub struct WaypointReached {
    pub entity: Entity,
    /// Индекс достигнутой точки
    pub previous: usize,
    /// Индекс новой цели
    pub next: usize,
    /// Позиция entity в момент прибытия
    pub position: Vec3,
}

//! Walker domain — случайная ходьба между waypoint'ами
//!
//! Содержит:
//! - WaypointWalker (логика тика, без зависимости от scheduler'а)
//! - AnimatorParams / AnimationFlagSink (флаг "идёт" для анимации)
//! - WalkerDisabled, WaypointReached (events)
//! - waypoint_walker_tick (ECS система)

use bevy::prelude::*;

pub mod animation;
pub mod behavior;
pub mod events;
pub mod systems;

pub use animation::*;
pub use behavior::*;
pub use events::*;
pub use systems::*;

/// Walker Plugin
///
/// Регистрирует events и тик walker'ов в FixedUpdate для детерминизма.
pub struct WalkerPlugin;

impl Plugin for WalkerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<WaypointWalker>()
            .register_type::<AnimatorParams>()
            .add_event::<WalkerDisabled>()
            .add_event::<WaypointReached>()
            .add_systems(FixedUpdate, waypoint_walker_tick);
    }
}

//! Walker ECS systems.

use bevy::prelude::*;

use crate::walker::animation::{AnimationFlagSink, AnimatorParams};
use crate::walker::behavior::{Pose, TickOutcome, WaypointWalker};
use crate::walker::events::{WalkerDisabled, WaypointReached};
use crate::DeterministicRng;

/// Система: тик всех walker'ов
///
/// `Res<Time>` — в FixedUpdate это Time<Fixed> (фиксированный dt).
/// Transform и AnimatorParams помечаем changed только если entity реально
/// сдвинулась, иначе Changed<...> спамит каждый тик.
pub fn waypoint_walker_tick(
    mut walkers: Query<(
        Entity,
        &mut WaypointWalker,
        &mut Transform,
        Option<&mut AnimatorParams>,
    )>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time>,
    mut disabled_events: EventWriter<WalkerDisabled>,
    mut reached_events: EventWriter<WaypointReached>,
) {
    let dt = time.delta_secs();

    for (entity, mut walker, mut transform, mut animator) in walkers.iter_mut() {
        // Выключенные walker'ы больше не тикают
        if !walker.is_enabled() {
            continue;
        }

        let mut pose = Pose::from(&*transform);
        // Change detection выставляем сами, только когда флаг реально писался
        let sink = animator
            .as_mut()
            .map(|params| params.bypass_change_detection() as &mut dyn AnimationFlagSink);

        match walker.tick(&mut pose, dt, &mut rng.rng, sink) {
            TickOutcome::Moved { .. } => {
                pose.write_to(&mut transform);
                if let Some(params) = animator.as_mut() {
                    params.set_changed();
                }
            }
            TickOutcome::Arrived { previous, next } => {
                crate::log_info(&format!(
                    "walker {:?}: reached waypoint #{} → next #{}",
                    entity, previous, next
                ));
                reached_events.write(WaypointReached {
                    entity,
                    previous,
                    next,
                    position: pose.translation,
                });
            }
            TickOutcome::Disabled => {
                disabled_events.write(WalkerDisabled { entity });
            }
            TickOutcome::Inert => {}
        }
    }
}

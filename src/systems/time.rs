//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per tick, applying `time_scale` to the provided delta.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on the `WorldTime` resource and return
/// the scaled delta.
///
/// `dt` is expected to be the unscaled frame delta in seconds. Inserts a
/// default clock when the world has none.
pub fn update_world_time(world: &mut World, dt: f32) -> f32 {
    let mut wt = world.get_resource_or_insert_with(WorldTime::default);
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame += 1;
    scaled_dt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale_applies_to_delta() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            time_scale: 0.5,
            ..Default::default()
        });
        let dt = update_world_time(&mut world, 0.2);
        assert!((dt - 0.1).abs() < 1e-6);
        update_world_time(&mut world, 0.2);
        let wt = world.resource::<WorldTime>();
        assert!((wt.elapsed - 0.2).abs() < 1e-6);
        assert_eq!(wt.frame, 2);
    }

    #[test]
    fn test_missing_clock_is_created() {
        let mut world = World::new();
        update_world_time(&mut world, 1.0);
        assert!(world.contains_resource::<WorldTime>());
    }
}

//! Status timers

use hecs::World;

use crate::components::StatusEffects;

/// Decay every frozen/shocked timer linearly.
pub fn status_system(world: &mut World, dt: f32) {
    for (_, status) in world.query_mut::<&mut StatusEffects>() {
        status.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_run_down() {
        let mut world = World::new();
        let e = world.spawn((StatusEffects {
            frozen: 0.5,
            shocked: 1.0,
        },));
        status_system(&mut world, 0.6);
        let s = *world.get::<&StatusEffects>(e).unwrap();
        assert_eq!(s.frozen, 0.0);
        assert!((s.shocked - 0.4).abs() < 1e-6);
    }
}

//! Free-fly behaviour, the runtime test mode.
//!
//! No gravity, no interaction; the actor moves wherever the input points.
//! Used by headless tests and debug possession.

use bevy::prelude::*;

use crate::attributes::Attribute;
use crate::input::{actions, InputSource};
use crate::logger::log;

use super::{BehaviourContext, EntityBehaviour};

const FLY_SPEED_FACTOR: f32 = 3.0;

pub struct FreeFlyBehaviour {
    move_direction: Vec3,
}

impl FreeFlyBehaviour {
    pub fn new() -> Self {
        Self {
            move_direction: Vec3::ZERO,
        }
    }
}

impl Default for FreeFlyBehaviour {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityBehaviour for FreeFlyBehaviour {
    fn name(&self) -> &'static str {
        "free_fly"
    }

    fn start(&mut self, ctx: &mut BehaviourContext, _previous: Option<Box<dyn EntityBehaviour>>) {
        ctx.motion.halt();
        log("free-fly behaviour started");
    }

    fn stop(&mut self, ctx: &mut BehaviourContext) {
        ctx.motion.halt();
    }

    fn handle_input(&mut self, _ctx: &mut BehaviourContext, input: &dyn InputSource) {
        let axis = input.axis(actions::MOVE);
        let vertical = (input.is_action_pressed(actions::JUMP) as i32
            - input.is_action_pressed(actions::CROUCH) as i32) as f32;
        self.move_direction = Vec3::new(axis.x, vertical, axis.y);
    }

    fn tick(&mut self, ctx: &mut BehaviourContext, _dt: f32) {
        let speed =
            ctx.modifiers.apply(Attribute::MoveSpeed, ctx.stats.move_speed) * FLY_SPEED_FACTOR;
        ctx.motion.movement = self.move_direction.normalize_or_zero() * speed;
        // Test mode carries no momentum.
        ctx.motion.inertia = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeModifiers;
    use crate::components::{EntityStats, Motion};
    use crate::input::InputSnapshot;

    #[test]
    fn test_flies_where_input_points() {
        let mut behaviour = FreeFlyBehaviour::new();
        let mut input = InputSnapshot::default();
        input.set_axis(actions::MOVE, Vec2::new(1.0, 0.0));
        input.press(actions::JUMP);

        let mut motion = Motion::default();
        let mut transform = Transform::default();
        let stats = EntityStats::default();
        let modifiers = AttributeModifiers::default();
        let mut effects = Vec::new();
        let mut ctx = BehaviourContext {
            entity: Entity::PLACEHOLDER,
            motion: &mut motion,
            transform: &mut transform,
            stats: &stats,
            modifiers: &modifiers,
            effects: &mut effects,
        };

        behaviour.handle_input(&mut ctx, &input);
        behaviour.tick(&mut ctx, 0.016);

        assert!(motion.movement.x > 0.0);
        assert!(motion.movement.y > 0.0);
        assert_eq!(motion.inertia, Vec3::ZERO);
    }
}

//! Sitting behaviour: pins the actor to a seat until dismount.
//!
//! Remembers the behaviour it replaced and restores it when the actor
//! interacts (dismount). Does not survive its own stop; a vacated seat
//! behaviour is gone.

use bevy::prelude::*;

use crate::input::{actions, InputSource};
use crate::logger::log;

use super::{BehaviourContext, BehaviourEffect, BehaviourRequest, EntityBehaviour, MovementSpeed};

pub struct SittingBehaviour {
    seat_position: Vec3,
    seat_forward: Vec3,
    previous: Option<Box<dyn EntityBehaviour>>,
}

impl SittingBehaviour {
    pub fn new(seat_position: Vec3, seat_forward: Vec3) -> Self {
        Self {
            seat_position,
            seat_forward,
            previous: None,
        }
    }
}

impl EntityBehaviour for SittingBehaviour {
    fn name(&self) -> &'static str {
        "sitting"
    }

    fn start(&mut self, ctx: &mut BehaviourContext, previous: Option<Box<dyn EntityBehaviour>>) {
        self.previous = previous;
        ctx.motion.halt();
        log("sitting behaviour started");
    }

    fn stop(&mut self, _ctx: &mut BehaviourContext) {}

    /// A vacated seat behaviour is destroyed, not stashed.
    fn persists_after_stop(&self) -> bool {
        false
    }

    fn handle_input(&mut self, ctx: &mut BehaviourContext, input: &dyn InputSource) {
        if input.is_action_just_pressed(actions::INTERACT) {
            ctx.effects
                .push(BehaviourEffect::SetBehaviour(BehaviourRequest::Previous));
        }
    }

    fn tick(&mut self, ctx: &mut BehaviourContext, _dt: f32) {
        ctx.transform.translation = self.seat_position;
        if self.seat_forward.length_squared() > 1e-6 {
            ctx.transform.look_to(self.seat_forward, Vec3::Y);
        }
        ctx.motion.halt();
    }

    // Seated actors do not steer, sprint, or jump.
    fn set_speed(&mut self, _speed: MovementSpeed) -> bool {
        false
    }

    fn request_move(&mut self, _direction: Vec3) -> bool {
        false
    }

    fn request_jump(&mut self, _target: Option<Vec3>) -> bool {
        false
    }

    fn take_previous(&mut self) -> Option<Box<dyn EntityBehaviour>> {
        self.previous.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeModifiers;
    use crate::components::{EntityStats, Motion};

    fn run<R>(behaviour: &mut SittingBehaviour, f: impl FnOnce(&mut SittingBehaviour, &mut BehaviourContext) -> R) -> (R, Vec<BehaviourEffect>, Transform) {
        let mut motion = Motion::default();
        let mut transform = Transform::default();
        let stats = EntityStats::default();
        let modifiers = AttributeModifiers::default();
        let mut effects = Vec::new();
        let result = {
            let mut ctx = BehaviourContext {
                entity: Entity::PLACEHOLDER,
                motion: &mut motion,
                transform: &mut transform,
                stats: &stats,
                modifiers: &modifiers,
                effects: &mut effects,
            };
            f(behaviour, &mut ctx)
        };
        (result, effects, transform)
    }

    #[test]
    fn test_tick_pins_to_seat() {
        let seat = Vec3::new(4.0, 1.0, -2.0);
        let mut behaviour = SittingBehaviour::new(seat, Vec3::Z);

        let (_, _, transform) = run(&mut behaviour, |b, ctx| b.tick(ctx, 0.016));
        assert_eq!(transform.translation, seat);
    }

    #[test]
    fn test_rejects_movement_requests() {
        let mut behaviour = SittingBehaviour::new(Vec3::ZERO, Vec3::Z);
        assert!(!behaviour.request_move(Vec3::X));
        assert!(!behaviour.request_jump(None));
        assert!(!behaviour.set_speed(MovementSpeed::Run));
    }

    #[test]
    fn test_interact_requests_previous_restore() {
        let mut behaviour = SittingBehaviour::new(Vec3::ZERO, Vec3::Z);
        let mut input = crate::input::InputSnapshot::default();
        input.press(actions::INTERACT);

        let (_, effects, _) = run(&mut behaviour, |b, ctx| b.handle_input(ctx, &input));
        assert!(matches!(
            effects.as_slice(),
            [BehaviourEffect::SetBehaviour(BehaviourRequest::Previous)]
        ));
    }
}

//! Grounded movement behaviour.

use bevy::prelude::*;

use crate::attributes::Attribute;
use crate::input::{actions, InputSource};
use crate::logger::log;

use super::{BehaviourContext, EntityBehaviour, MovementSpeed};

pub struct BipedBehaviour {
    speed: MovementSpeed,
    move_direction: Vec3,
}

impl BipedBehaviour {
    pub fn new() -> Self {
        Self {
            speed: MovementSpeed::Idle,
            move_direction: Vec3::ZERO,
        }
    }
}

impl Default for BipedBehaviour {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityBehaviour for BipedBehaviour {
    fn name(&self) -> &'static str {
        "biped"
    }

    fn start(
        &mut self,
        _ctx: &mut BehaviourContext,
        _previous: Option<Box<dyn EntityBehaviour>>,
    ) {
        log("biped behaviour started");
    }

    fn stop(&mut self, ctx: &mut BehaviourContext) {
        ctx.motion.movement = Vec3::ZERO;
    }

    fn handle_input(&mut self, ctx: &mut BehaviourContext, input: &dyn InputSource) {
        let axis = input.axis(actions::MOVE);
        let direction = Vec3::new(axis.x, 0.0, axis.y);

        self.request_move(direction);

        let speed = if direction.length_squared() < 1e-4 {
            MovementSpeed::Idle
        } else if input.is_action_pressed(actions::SPRINT) {
            MovementSpeed::Sprint
        } else if input.is_action_pressed(actions::WALK) {
            MovementSpeed::Walk
        } else {
            MovementSpeed::Run
        };
        self.set_speed(speed);

        if input.is_action_just_pressed(actions::JUMP) && self.request_jump(None) {
            let impulse = ctx
                .modifiers
                .apply(Attribute::JumpHeight, ctx.stats.jump_impulse);
            ctx.motion.inertia += Vec3::Y * impulse;
        }
    }

    fn tick(&mut self, ctx: &mut BehaviourContext, _dt: f32) {
        let base = ctx.modifiers.apply(Attribute::MoveSpeed, ctx.stats.move_speed);
        ctx.motion.movement =
            self.move_direction.normalize_or_zero() * base * self.speed.factor();
    }

    fn set_speed(&mut self, speed: MovementSpeed) -> bool {
        self.speed = speed;
        true
    }

    fn request_move(&mut self, direction: Vec3) -> bool {
        self.move_direction = direction;
        true
    }
}

//! Evade action: a short committed dash.

use bevy::prelude::*;

use crate::attributes::{Attribute, AttributeModifiers};
use crate::input::InputSource;
use crate::logger::log;

use super::{ActionContext, ActionStatus, EntityAction};

const EVADE_SPEED: f32 = 8.0;
const EVADE_DURATION: f32 = 0.4;
/// Portion of the dash that cannot be cancelled.
const EVADE_COMMIT: f32 = 0.25;

pub struct EvadeAction {
    direction: Vec3,
    elapsed: f32,
}

impl EvadeAction {
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            elapsed: 0.0,
        }
    }
}

impl EntityAction for EvadeAction {
    fn name(&self) -> &str {
        "evade"
    }

    fn is_cancellable(&self) -> bool {
        self.elapsed >= EVADE_COMMIT
    }

    /// Evades slip through knockback.
    fn is_knockable(&self) -> bool {
        false
    }

    fn start(&mut self, _ctx: &mut ActionContext) {
        log("evade started");
    }

    fn tick(&mut self, ctx: &mut ActionContext, _input: &dyn InputSource, dt: f32) -> ActionStatus {
        self.elapsed += dt;
        if self.elapsed >= EVADE_DURATION {
            return ActionStatus::Finished;
        }

        let speed = AttributeModifiers::apply(ctx.modifiers, Attribute::MoveSpeed, EVADE_SPEED);
        ctx.motion.movement = self.direction * speed;
        ActionStatus::Running
    }

    fn stop(&mut self, ctx: &mut ActionContext) {
        ctx.motion.movement = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeModifiers;
    use crate::components::Motion;
    use crate::input::InputSnapshot;

    #[test]
    fn test_evade_commit_window_then_cancellable() {
        let mut action = EvadeAction::new(Vec3::X);
        let mut motion = Motion::default();
        let mut modifiers = AttributeModifiers::default();
        let mut effects = Vec::new();
        let input = InputSnapshot::default();

        let mut ctx = ActionContext {
            entity: Entity::PLACEHOLDER,
            motion: &mut motion,
            modifiers: &mut modifiers,
            inventory: None,
            effects: &mut effects,
        };

        assert!(!action.is_cancellable());
        assert_eq!(action.tick(&mut ctx, &input, 0.1), ActionStatus::Running);
        assert!(ctx.motion.movement.x > 0.0);

        action.tick(&mut ctx, &input, 0.2);
        assert!(action.is_cancellable());

        assert_eq!(action.tick(&mut ctx, &input, 0.2), ActionStatus::Finished);
        action.stop(&mut ctx);
        assert_eq!(ctx.motion.movement, Vec3::ZERO);
    }
}

//! Attack action: windup → strike → recovery.
//!
//! Damage lands once, on the transition into the strike phase. Cancellation
//! is only allowed during recovery; heavier rules (forced replacement by a
//! charge follow-up) bypass that at the state-machine level.

use bevy::prelude::*;

use crate::attributes::{Attribute, AttributeModifiers};
use crate::input::InputSource;
use crate::logger::log;
use crate::weapon::AttackData;

use super::{ActionContext, ActionEffect, ActionStatus, EntityAction};

/// Hook run around an attack's lifetime (weapon switch/restore wiring from
/// composite weapons).
pub type ActionHook = Box<dyn FnOnce(&mut ActionContext) + Send + Sync>;

/// Factory for one attack: static data plus dynamic wiring collected while
/// the attack list was aggregated.
pub struct AttackBuilder {
    attack: AttackData,
    target: Option<Entity>,
    before: Vec<ActionHook>,
    after: Vec<ActionHook>,
}

impl AttackBuilder {
    pub fn new(attack: AttackData, target: Option<Entity>) -> Self {
        Self {
            attack,
            target,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn attack(&self) -> &AttackData {
        &self.attack
    }

    /// Runs when the built attack starts, before its first phase.
    pub fn before_execute(&mut self, hook: ActionHook) {
        self.before.push(hook);
    }

    /// Runs when the built attack stops, completed or cancelled.
    pub fn after_execute(&mut self, hook: ActionHook) {
        self.after.push(hook);
    }

    pub fn build(self) -> Box<dyn EntityAction> {
        Box::new(AttackAction {
            phase: AttackPhase::Windup,
            phase_timer: self.attack.windup,
            dealt: false,
            attack: self.attack,
            target: self.target,
            before: self.before,
            after: self.after,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackPhase {
    Windup,
    Strike,
    Recovery,
}

pub struct AttackAction {
    attack: AttackData,
    target: Option<Entity>,
    phase: AttackPhase,
    phase_timer: f32,
    dealt: bool,
    before: Vec<ActionHook>,
    after: Vec<ActionHook>,
}

impl AttackAction {
    fn deal_damage(&mut self, ctx: &mut ActionContext) {
        if self.dealt {
            return;
        }
        self.dealt = true;

        let Some(target) = self.target else {
            return;
        };
        let amount = AttributeModifiers::apply(
            ctx.modifiers,
            Attribute::AttackDamage,
            self.attack.base_damage,
        );
        ctx.effects.push(ActionEffect::Damage { target, amount });
    }
}

impl EntityAction for AttackAction {
    fn name(&self) -> &str {
        &self.attack.name
    }

    fn is_cancellable(&self) -> bool {
        self.phase == AttackPhase::Recovery
    }

    fn start(&mut self, ctx: &mut ActionContext) {
        for hook in self.before.drain(..) {
            hook(ctx);
        }
        log(&format!("attack {} started", self.attack.name));
    }

    fn tick(&mut self, ctx: &mut ActionContext, _input: &dyn InputSource, dt: f32) -> ActionStatus {
        self.phase_timer -= dt;

        while self.phase_timer <= 0.0 {
            match self.phase {
                AttackPhase::Windup => {
                    self.phase = AttackPhase::Strike;
                    self.phase_timer += self.attack.strike;
                    self.deal_damage(ctx);
                }
                AttackPhase::Strike => {
                    self.phase = AttackPhase::Recovery;
                    self.phase_timer += self.attack.recovery;
                }
                AttackPhase::Recovery => return ActionStatus::Finished,
            }
        }
        ActionStatus::Running
    }

    fn stop(&mut self, ctx: &mut ActionContext) {
        for hook in self.after.drain(..) {
            hook(ctx);
        }
    }
}

//! Charge attack: hold a key, release to swing.
//!
//! While the charge is held the actor carries the spec's attribute
//! modifiers; they are registered in `start` and unregistered in `stop`,
//! so a cancelled charge leaves nothing behind. Release resolves into a
//! *forced* follow-up attack: charged if the hold lasted the full charge
//! duration, uncharged otherwise.

use bevy::prelude::*;

use crate::attributes::AttributeModifier;
use crate::input::InputSource;
use crate::logger::{log, log_error};
use crate::weapon::{AttackData, ChargeSpec, WeaponData};

use super::{ActionContext, ActionEffect, ActionRequest, ActionStatus, EntityAction};

pub struct ChargeAttack {
    action_key: String,
    charge_duration: f32,
    elapsed: f32,
    announced: bool,
    charged_attack: AttackData,
    uncharged_attack: AttackData,
    modifiers: Vec<AttributeModifier>,
    target: Option<Entity>,
}

impl ChargeAttack {
    /// Resolves the spec's attack names against the weapon definition.
    /// Broken data (unknown attack name) declines the action.
    pub fn from_spec(
        spec: &ChargeSpec,
        data: &WeaponData,
        target: Option<Entity>,
    ) -> Option<Box<dyn EntityAction>> {
        let Some(charged) = data.find_attack(&spec.charged_attack) else {
            log_error(&format!(
                "{}: charge spec names unknown attack {}",
                data.display_name, spec.charged_attack
            ));
            return None;
        };
        let Some(uncharged) = data.find_attack(&spec.uncharged_attack) else {
            log_error(&format!(
                "{}: charge spec names unknown attack {}",
                data.display_name, spec.uncharged_attack
            ));
            return None;
        };

        Some(Box::new(Self {
            action_key: spec.action_key.clone(),
            charge_duration: spec.charge_duration,
            elapsed: 0.0,
            announced: false,
            charged_attack: charged.clone(),
            uncharged_attack: uncharged.clone(),
            modifiers: spec.modifiers.clone(),
            target,
        }))
    }

    fn is_charged(&self) -> bool {
        self.elapsed >= self.charge_duration
    }
}

impl EntityAction for ChargeAttack {
    fn name(&self) -> &str {
        "charge_attack"
    }

    fn is_cancellable(&self) -> bool {
        false
    }

    fn start(&mut self, ctx: &mut ActionContext) {
        ctx.modifiers.add_many(&self.modifiers);
        log("charge started");
    }

    fn tick(&mut self, ctx: &mut ActionContext, input: &dyn InputSource, dt: f32) -> ActionStatus {
        self.elapsed += dt;

        if self.is_charged() && !self.announced {
            self.announced = true;
            log("charge complete");
        }

        if input.is_action_just_released(&self.action_key) {
            let attack = if self.is_charged() {
                self.charged_attack.clone()
            } else {
                self.uncharged_attack.clone()
            };
            ctx.effects.push(ActionEffect::ExecuteAction {
                request: ActionRequest::DirectAttack {
                    attack,
                    target: self.target,
                },
                force: true,
            });
            return ActionStatus::Finished;
        }

        ActionStatus::Running
    }

    fn stop(&mut self, ctx: &mut ActionContext) {
        // Whatever ended the charge, the buffs come back out.
        ctx.modifiers.remove_many(&self.modifiers);
    }
}

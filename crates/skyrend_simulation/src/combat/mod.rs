//! Damage application and death handling.
//!
//! Attack actions raise `DamageIntent`; this module turns intents into
//! health changes and death consequences:
//!
//! 1. `update_max_health`: re-derives the gauge maximum from base stats
//!    plus the actor's modifier stack
//! 2. `apply_damage`: intents → `Health`, emits `DamageDealt` / `EntityDied`
//! 3. `interrupt_knocked_actions`: a hit staggers the victim out of any
//!    knockable in-flight action
//! 4. `handle_death`: stops the dead actor's action and behaviour (full
//!    cleanup, modifiers included), zeroes motion, marks `Dead`

use bevy::prelude::*;

use crate::action::{ActionContext, ActionFinished, CurrentAction, EntityAction};
use crate::attributes::{Attribute, AttributeModifiers};
use crate::behaviour::{BehaviourContext, CurrentBehaviour};
use crate::components::{Dead, EntityStats, Health, Motion};
use crate::logger::{log, log_info, log_warning};
use crate::weapon::WeaponInventory;
use crate::SimSet;

// ============================================================================
// Events
// ============================================================================

/// Someone wants to hurt someone.
#[derive(Event, Debug, Clone)]
pub struct DamageIntent {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: f32,
}

/// Damage landed.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub amount: f32,
    pub target_died: bool,
}

/// The target's health gauge emptied. Fires once per death; `from_health`
/// is the gauge value right before the killing blow.
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
    pub from_health: f32,
}

// ============================================================================
// Systems
// ============================================================================

/// Effective max health = modifiers over the base stat, refreshed every
/// tick so modifier registration/removal shows up immediately.
pub fn update_max_health(mut actors: Query<(&mut Health, &EntityStats, &AttributeModifiers)>) {
    for (mut health, stats, modifiers) in actors.iter_mut() {
        let max = modifiers.apply(Attribute::MaxHealth, stats.max_health);
        health.set_maximum(max, false);
    }
}

pub fn apply_damage(
    mut intents: EventReader<DamageIntent>,
    mut targets: Query<&mut Health>,
    mut dealt: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
) {
    for intent in intents.read() {
        let Ok(mut health) = targets.get_mut(intent.target) else {
            log_warning(&format!("damage target {:?} has no Health", intent.target));
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let emptied = health.damage(intent.amount);
        log(&format!(
            "{:?} -> {:?}: {} damage, {} health left",
            intent.attacker, intent.target, intent.amount, health.current
        ));

        dealt.write(DamageDealt {
            attacker: intent.attacker,
            target: intent.target,
            amount: intent.amount,
            target_died: emptied.is_some(),
        });

        if let Some(emptied) = emptied {
            died.write(EntityDied {
                entity: intent.target,
                killer: Some(intent.attacker),
                from_health: emptied.from_amount,
            });
        }
    }
}

/// A hit cuts short the victim's in-flight action through its normal
/// cleanup path, unless the action is not knockable (evades slip through).
/// The killing blow is `handle_death`'s job, not ours.
pub fn interrupt_knocked_actions(
    mut hits: EventReader<DamageDealt>,
    mut actors: Query<(
        &mut CurrentAction,
        &mut Motion,
        &mut AttributeModifiers,
        Option<&mut WeaponInventory>,
    )>,
    mut finished: EventWriter<ActionFinished>,
) {
    for hit in hits.read() {
        if hit.target_died {
            continue;
        }
        let Ok((mut current, mut motion, mut modifiers, mut inventory)) =
            actors.get_mut(hit.target)
        else {
            continue;
        };
        if !current.0.as_deref().is_some_and(EntityAction::is_knockable) {
            continue;
        }

        let Some(mut outgoing) = current.0.take() else {
            continue;
        };
        let mut effects = Vec::new();
        let mut ctx = ActionContext {
            entity: hit.target,
            motion: &mut motion,
            modifiers: &mut modifiers,
            inventory: inventory.as_deref_mut(),
            effects: &mut effects,
        };
        outgoing.stop(&mut ctx);
        // Follow-ups of a staggered action are dropped with it.
        log(&format!(
            "{:?} staggered out of {}",
            hit.target,
            outgoing.name()
        ));
        finished.write(ActionFinished {
            entity: hit.target,
            name: outgoing.name().to_string(),
        });
    }
}

/// Death consequences. Both state machines are stopped through their
/// normal cleanup paths so nothing registered by a running action or
/// behaviour outlives its owner.
pub fn handle_death(
    mut deaths: EventReader<EntityDied>,
    mut commands: Commands,
    mut actors: Query<(
        &mut CurrentAction,
        &mut CurrentBehaviour,
        &mut Motion,
        &mut Transform,
        &EntityStats,
        &mut AttributeModifiers,
        Option<&mut WeaponInventory>,
    )>,
) {
    for death in deaths.read() {
        let Ok((
            mut action,
            mut behaviour,
            mut motion,
            mut transform,
            stats,
            mut modifiers,
            mut inventory,
        )) = actors.get_mut(death.entity)
        else {
            continue;
        };

        if let Some(mut outgoing) = action.0.take() {
            let mut effects = Vec::new();
            let mut ctx = ActionContext {
                entity: death.entity,
                motion: &mut motion,
                modifiers: &mut modifiers,
                inventory: inventory.as_deref_mut(),
                effects: &mut effects,
            };
            outgoing.stop(&mut ctx);
            // Posthumous follow-ups are dropped.
        }

        if let Some(mut outgoing) = behaviour.0.take() {
            let mut effects = Vec::new();
            let mut ctx = BehaviourContext {
                entity: death.entity,
                motion: &mut motion,
                transform: &mut transform,
                stats,
                modifiers: &modifiers,
                effects: &mut effects,
            };
            outgoing.stop(&mut ctx);
        }

        motion.halt();

        if let Ok(mut entity_commands) = commands.get_entity(death.entity) {
            entity_commands.insert(Dead);
        }

        log_info(&format!(
            "{:?} died (killer {:?}, from {} health)",
            death.entity, death.killer, death.from_health
        ));
    }
}

// ============================================================================
// Plugin
// ============================================================================

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageIntent>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_systems(
                FixedUpdate,
                (
                    update_max_health,
                    apply_damage,
                    interrupt_knocked_actions,
                    handle_death,
                )
                    .chain()
                    .in_set(SimSet::Combat),
            );
    }
}

//! Player input routing.
//!
//! One system reads the logical input snapshot and routes it to the
//! controlled actor: movement and interaction to the active behaviour,
//! style hotkeys to the current weapon, combat presses to action intents.

use bevy::prelude::*;

use crate::action::{ActionRequest, ExecuteActionIntent};
use crate::attributes::AttributeModifiers;
use crate::behaviour::{BehaviourContext, BehaviourEffect, CurrentBehaviour};
use crate::components::{EntityStats, Motion, Player};
use crate::deferred::{DeferredCall, DeferredQueue};
use crate::input::{actions, InputSnapshot, InputSource};
use crate::weapon::WeaponInventory;
use crate::SimSet;

pub fn handle_player_input(
    input: Res<InputSnapshot>,
    mut actors: Query<
        (
            Entity,
            &mut CurrentBehaviour,
            &mut Motion,
            &mut Transform,
            &EntityStats,
            &AttributeModifiers,
            Option<&mut WeaponInventory>,
        ),
        With<Player>,
    >,
    mut intents: EventWriter<ExecuteActionIntent>,
    mut queue: ResMut<DeferredQueue>,
) {
    let input: &dyn InputSource = &*input;

    for (entity, mut behaviour, mut motion, mut transform, stats, modifiers, mut inventory) in
        actors.iter_mut()
    {
        // Behaviour gets the snapshot first; it may queue a switch.
        if let Some(mut active) = behaviour.0.take() {
            let mut effects = Vec::new();
            {
                let mut ctx = BehaviourContext {
                    entity,
                    motion: &mut motion,
                    transform: &mut transform,
                    stats,
                    modifiers,
                    effects: &mut effects,
                };
                active.handle_input(&mut ctx, input);
            }
            behaviour.0 = Some(active);

            for effect in effects {
                match effect {
                    BehaviourEffect::SetBehaviour(request) => {
                        queue.push(DeferredCall::SetBehaviour { entity, request });
                    }
                }
            }
        }

        // Style hotkeys act on the weapon under the cursor.
        if let Some(inventory) = inventory.as_deref_mut() {
            let style = if input.is_action_just_pressed(actions::SWITCH_WEAPON_PRIMARY) {
                Some(0)
            } else if input.is_action_just_pressed(actions::SWITCH_WEAPON_SECONDARY) {
                Some(1)
            } else if input.is_action_just_pressed(actions::SWITCH_WEAPON_TERNARY) {
                Some(2)
            } else {
                None
            };
            if let (Some(style), Some(weapon)) = (style, inventory.current_weapon_mut()) {
                weapon.set_style(style);
            }
        }

        // Combat presses become action intents; refusal is the action
        // machine's call, not ours.
        if input.is_action_just_pressed(actions::ATTACK_LIGHT) {
            intents.write(ExecuteActionIntent {
                entity,
                request: ActionRequest::Attack {
                    name: None,
                    target: None,
                },
                force: false,
            });
        }
        if input.is_action_just_pressed(actions::ATTACK_HEAVY) {
            intents.write(ExecuteActionIntent {
                entity,
                request: ActionRequest::ChargeAttack { target: None },
                force: false,
            });
        }
        if input.is_action_just_pressed(actions::EVADE) {
            let axis = input.axis(actions::MOVE);
            let direction = if axis.length_squared() > 1e-4 {
                Vec3::new(axis.x, 0.0, axis.y)
            } else {
                *transform.forward()
            };
            intents.write(ExecuteActionIntent {
                entity,
                request: ActionRequest::Evade { direction },
                force: false,
            });
        }
    }
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, handle_player_input.in_set(SimSet::Input));
    }
}

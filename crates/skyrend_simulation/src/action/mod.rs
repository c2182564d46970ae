//! Entity action state machine.
//!
//! # Architecture
//!
//! At most one action runs per actor, boxed inside [`CurrentAction`].
//! Gameplay asks for actions through `ExecuteActionIntent` events carrying
//! a data-only [`ActionRequest`]; the dispatch system resolves the request
//! against the actor's weapon tree and runs the transition:
//!
//! - `force = false` + current action not cancellable → the request is
//!   declined (not an error, nothing changes)
//! - otherwise the outgoing action is stopped *completely* (modifiers
//!   unregistered, after-hooks drained) before the incoming one starts
//!
//! Actions never touch the world directly during `tick` beyond their own
//! context; cross-entity consequences go through the effect outbox
//! ([`ActionEffect`]) which the owning system drains after the call
//! returns. Follow-up `ExecuteAction` effects therefore run exactly one
//! stop+start cycle each; re-entrant replacement cannot happen.
//!
//! When an action finishes on its own, the tick system stops it and clears
//! the slot itself, so the actor never holds a dangling action.

pub mod attack;
pub mod charge;
pub mod evade;

pub use attack::{AttackAction, AttackBuilder, AttackPhase};
pub use charge::ChargeAttack;
pub use evade::EvadeAction;

use bevy::prelude::*;

use crate::attributes::AttributeModifiers;
use crate::combat::DamageIntent;
use crate::components::Motion;
use crate::input::{InputSnapshot, InputSource};
use crate::logger::{log, log_error};
use crate::weapon::{AttackData, WeaponInventory};
use crate::SimSet;

// ============================================================================
// Trait and component
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Running,
    Finished,
}

/// Everything an action may touch while it runs. Borrowed from the owning
/// actor's components for the duration of one call.
pub struct ActionContext<'a> {
    pub entity: Entity,
    pub motion: &'a mut Motion,
    pub modifiers: &'a mut AttributeModifiers,
    pub inventory: Option<&'a mut WeaponInventory>,
    pub effects: &'a mut Vec<ActionEffect>,
}

/// Deferred consequences of an action call, drained by the owning system.
#[derive(Debug)]
pub enum ActionEffect {
    Damage { target: Entity, amount: f32 },
    ExecuteAction { request: ActionRequest, force: bool },
}

pub trait EntityAction: Send + Sync {
    fn name(&self) -> &str;

    /// May the current action be replaced without force?
    fn is_cancellable(&self) -> bool;

    /// Does incoming damage interrupt this action?
    fn is_knockable(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut ActionContext);

    fn tick(&mut self, ctx: &mut ActionContext, input: &dyn InputSource, dt: f32) -> ActionStatus;

    /// Guaranteed cleanup: called exactly once, on completion or on forced
    /// replacement. Everything the action registered must come back out.
    fn stop(&mut self, ctx: &mut ActionContext);
}

/// The actor's single action slot.
#[derive(Component, Default)]
pub struct CurrentAction(pub(crate) Option<Box<dyn EntityAction>>);

impl CurrentAction {
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref().map(EntityAction::name)
    }

    pub fn can_cancel(&self) -> bool {
        self.0.as_deref().is_none_or(EntityAction::is_cancellable)
    }
}

// ============================================================================
// Requests and events
// ============================================================================

/// Data-only description of an action to run, resolvable against the
/// actor's current state.
#[derive(Debug, Clone)]
pub enum ActionRequest {
    /// Attack from the current weapon; `name` picks a specific attack,
    /// otherwise the first attack of the current style wins.
    Attack {
        name: Option<String>,
        target: Option<Entity>,
    },
    /// Fully resolved attack (charge follow-ups).
    DirectAttack {
        attack: AttackData,
        target: Option<Entity>,
    },
    /// Hold-and-release charge attack from the current weapon.
    ChargeAttack { target: Option<Entity> },
    Evade { direction: Vec3 },
}

#[derive(Event, Debug, Clone)]
pub struct ExecuteActionIntent {
    pub entity: Entity,
    pub request: ActionRequest,
    pub force: bool,
}

/// The action slot was cleared after an action ran to completion or was
/// replaced.
#[derive(Event, Debug, Clone)]
pub struct ActionFinished {
    pub entity: Entity,
    pub name: String,
}

// ============================================================================
// Request resolution and transition
// ============================================================================

/// Builds a runnable action out of a request. `None` means the request is
/// declined (no weapon, unknown attack): logged, never raised.
fn build_action(
    request: &ActionRequest,
    inventory: Option<&WeaponInventory>,
) -> Option<Box<dyn EntityAction>> {
    match request {
        ActionRequest::Attack { name, target } => {
            let inventory = inventory?;
            let style = inventory.current_weapon()?.style();
            let mut builders = inventory.attacks(*target);
            if builders.is_empty() {
                log("attack declined: current weapon offers no attacks");
                return None;
            }

            let index = match name {
                Some(name) => builders.iter().position(|b| &b.attack().name == name),
                None => builders
                    .iter()
                    .position(|b| b.attack().style == style)
                    .or(Some(0)),
            };
            let Some(index) = index else {
                log_error(&format!("unknown attack requested: {:?}", name));
                return None;
            };
            Some(builders.swap_remove(index).build())
        }
        ActionRequest::DirectAttack { attack, target } => {
            Some(AttackBuilder::new(attack.clone(), *target).build())
        }
        ActionRequest::ChargeAttack { target } => {
            let inventory = inventory?;
            let (spec, data) = inventory.current_weapon()?.charge_source()?;
            ChargeAttack::from_spec(spec, data, *target)
        }
        ActionRequest::Evade { direction } => Some(Box::new(EvadeAction::new(*direction))),
    }
}

/// The one transition: refuse, or stop-then-start.
pub(crate) fn run_transition(
    current: &mut CurrentAction,
    ctx: &mut ActionContext,
    incoming: Box<dyn EntityAction>,
    force: bool,
    finished: &mut EventWriter<ActionFinished>,
) -> bool {
    if !force && !current.can_cancel() {
        log(&format!(
            "action {} refused: current is not cancellable",
            incoming.name()
        ));
        return false;
    }

    if let Some(mut outgoing) = current.0.take() {
        outgoing.stop(ctx);
        finished.write(ActionFinished {
            entity: ctx.entity,
            name: outgoing.name().to_string(),
        });
    }

    let mut incoming = incoming;
    incoming.start(ctx);
    current.0 = Some(incoming);
    true
}

/// Drains the effect outbox, including follow-up action requests, until it
/// runs dry. Follow-ups build and transition here, after the originating
/// call has fully returned.
#[allow(clippy::too_many_arguments)]
fn drain_effects(
    entity: Entity,
    current: &mut CurrentAction,
    motion: &mut Motion,
    modifiers: &mut AttributeModifiers,
    mut inventory: Option<&mut WeaponInventory>,
    effects: &mut Vec<ActionEffect>,
    damage: &mut EventWriter<DamageIntent>,
    finished: &mut EventWriter<ActionFinished>,
) {
    let mut rounds = 0;
    while !effects.is_empty() {
        rounds += 1;
        if rounds > 8 {
            log_error("action effect chain did not settle, dropping remainder");
            effects.clear();
            break;
        }

        let batch: Vec<ActionEffect> = effects.drain(..).collect();
        for effect in batch {
            match effect {
                ActionEffect::Damage { target, amount } => {
                    damage.write(DamageIntent {
                        attacker: entity,
                        target,
                        amount,
                    });
                }
                ActionEffect::ExecuteAction { request, force } => {
                    let Some(action) = build_action(&request, inventory.as_deref()) else {
                        continue;
                    };
                    let mut ctx = ActionContext {
                        entity,
                        motion: &mut *motion,
                        modifiers: &mut *modifiers,
                        inventory: inventory.as_deref_mut(),
                        effects: &mut *effects,
                    };
                    run_transition(current, &mut ctx, action, force, finished);
                }
            }
        }
    }
}

// ============================================================================
// Systems
// ============================================================================

pub fn process_execute_action_intents(
    mut intents: EventReader<ExecuteActionIntent>,
    mut actors: Query<(
        &mut CurrentAction,
        &mut Motion,
        &mut AttributeModifiers,
        Option<&mut WeaponInventory>,
    )>,
    mut damage: EventWriter<DamageIntent>,
    mut finished: EventWriter<ActionFinished>,
) {
    for intent in intents.read() {
        let Ok((mut current, mut motion, mut modifiers, mut inventory)) =
            actors.get_mut(intent.entity)
        else {
            log_error(&format!("{:?} cannot execute actions", intent.entity));
            continue;
        };

        let Some(action) = build_action(&intent.request, inventory.as_deref()) else {
            continue;
        };

        let mut effects = Vec::new();
        {
            let mut ctx = ActionContext {
                entity: intent.entity,
                motion: &mut motion,
                modifiers: &mut modifiers,
                inventory: inventory.as_deref_mut(),
                effects: &mut effects,
            };
            run_transition(&mut current, &mut ctx, action, intent.force, &mut finished);
        }

        drain_effects(
            intent.entity,
            &mut current,
            &mut motion,
            &mut modifiers,
            inventory.as_deref_mut(),
            &mut effects,
            &mut damage,
            &mut finished,
        );
    }
}

pub fn tick_actions(
    mut actors: Query<(
        Entity,
        &mut CurrentAction,
        &mut Motion,
        &mut AttributeModifiers,
        Option<&mut WeaponInventory>,
    )>,
    input: Res<InputSnapshot>,
    time: Res<Time>,
    mut damage: EventWriter<DamageIntent>,
    mut finished: EventWriter<ActionFinished>,
) {
    let dt = time.delta_secs();
    let input: &dyn InputSource = &*input;

    for (entity, mut current, mut motion, mut modifiers, mut inventory) in actors.iter_mut() {
        let Some(mut action) = current.0.take() else {
            continue;
        };

        let mut effects = Vec::new();
        let status = {
            let mut ctx = ActionContext {
                entity,
                motion: &mut motion,
                modifiers: &mut modifiers,
                inventory: inventory.as_deref_mut(),
                effects: &mut effects,
            };
            action.tick(&mut ctx, input, dt)
        };

        match status {
            ActionStatus::Running => {
                current.0 = Some(action);
            }
            ActionStatus::Finished => {
                let mut ctx = ActionContext {
                    entity,
                    motion: &mut motion,
                    modifiers: &mut modifiers,
                    inventory: inventory.as_deref_mut(),
                    effects: &mut effects,
                };
                action.stop(&mut ctx);
                // Slot stays empty: the actor never dangles a finished action.
                finished.write(ActionFinished {
                    entity,
                    name: action.name().to_string(),
                });
            }
        }

        drain_effects(
            entity,
            &mut current,
            &mut motion,
            &mut modifiers,
            inventory.as_deref_mut(),
            &mut effects,
            &mut damage,
            &mut finished,
        );
    }
}

// ============================================================================
// Plugin
// ============================================================================

pub struct ActionPlugin;

impl Plugin for ActionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ExecuteActionIntent>()
            .add_event::<ActionFinished>()
            .add_systems(
                FixedUpdate,
                (process_execute_action_intents, tick_actions)
                    .chain()
                    .in_set(SimSet::Actions),
            );
    }
}

//! Entity behaviour state machine.
//!
//! # Architecture
//!
//! Exactly one behaviour is active per actor (or none, right after spawn
//! and before the first switch lands). Behaviours are semi-persistent
//! modes: grounded movement, sitting, free-fly. The transition hands the
//! outgoing behaviour to the incoming one (`start(previous)`) so flows like
//! dismount can restore what ran before; a behaviour that does not survive
//! its `stop` (sitting) reports so and is dropped instead.
//!
//! Switches never run mid-traversal. `SetBehaviourIntent` events and
//! effects raised inside behaviour ticks both land on the [`DeferredQueue`]
//! and apply at the end of the tick, in FIFO order.
//!
//! Input routing: the active behaviour receives the input snapshot each
//! tick and answers move/jump/speed requests with accept or reject rather
//! than mutating actor state from ambiguous positions.

pub mod biped;
pub mod freefly;
pub mod sitting;

pub use biped::BipedBehaviour;
pub use freefly::FreeFlyBehaviour;
pub use sitting::SittingBehaviour;

use bevy::prelude::*;

use crate::attributes::AttributeModifiers;
use crate::components::{EntityStats, Motion};
use crate::deferred::{DeferredCall, DeferredQueue};
use crate::input::InputSource;
use crate::logger::{log, log_error};
use crate::SimSet;

// ============================================================================
// Trait and component
// ============================================================================

/// Movement gear requested from a behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementSpeed {
    #[default]
    Idle,
    Walk,
    Run,
    Sprint,
}

impl MovementSpeed {
    pub fn factor(self) -> f32 {
        match self {
            MovementSpeed::Idle => 0.0,
            MovementSpeed::Walk => 1.0,
            MovementSpeed::Run => 1.7,
            MovementSpeed::Sprint => 2.4,
        }
    }
}

/// State a behaviour may touch during one call.
pub struct BehaviourContext<'a> {
    pub entity: Entity,
    pub motion: &'a mut Motion,
    pub transform: &'a mut Transform,
    pub stats: &'a EntityStats,
    pub modifiers: &'a AttributeModifiers,
    pub effects: &'a mut Vec<BehaviourEffect>,
}

/// Deferred consequences of a behaviour call.
#[derive(Debug, Clone)]
pub enum BehaviourEffect {
    SetBehaviour(BehaviourRequest),
}

pub trait EntityBehaviour: Send + Sync {
    fn name(&self) -> &'static str;

    /// `previous` is the behaviour this one replaced, already stopped.
    /// Take ownership to restore it later; drop it to forget it.
    fn start(&mut self, ctx: &mut BehaviourContext, previous: Option<Box<dyn EntityBehaviour>>);

    fn stop(&mut self, ctx: &mut BehaviourContext);

    /// `false` means the behaviour self-destroys on stop and is never handed
    /// to a successor (sitting).
    fn persists_after_stop(&self) -> bool {
        true
    }

    fn handle_input(&mut self, ctx: &mut BehaviourContext, input: &dyn InputSource) {
        let _ = (ctx, input);
    }

    fn tick(&mut self, ctx: &mut BehaviourContext, dt: f32) {
        let _ = (ctx, dt);
    }

    /// Accept/reject surface. Defaults accept everything.
    fn set_speed(&mut self, speed: MovementSpeed) -> bool {
        let _ = speed;
        true
    }

    fn request_move(&mut self, direction: Vec3) -> bool {
        let _ = direction;
        true
    }

    fn request_jump(&mut self, target: Option<Vec3>) -> bool {
        let _ = target;
        true
    }

    /// What the actor would interact with right now.
    fn interaction_candidate(&self) -> Option<Entity> {
        None
    }

    /// Hands out the stored previous behaviour (dismount restore).
    fn take_previous(&mut self) -> Option<Box<dyn EntityBehaviour>> {
        None
    }
}

/// The actor's single behaviour slot.
#[derive(Component, Default)]
pub struct CurrentBehaviour(pub(crate) Option<Box<dyn EntityBehaviour>>);

impl CurrentBehaviour {
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_deref().map(EntityBehaviour::name)
    }
}

// ============================================================================
// Requests and events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviourRequest {
    Biped,
    Sitting {
        seat_position: Vec3,
        seat_forward: Vec3,
    },
    /// Free-fly test mode (no gravity, no interaction).
    FreeFly,
    /// Restore whatever the current behaviour replaced.
    Previous,
    Clear,
}

#[derive(Event, Debug, Clone)]
pub struct SetBehaviourIntent {
    pub entity: Entity,
    pub request: BehaviourRequest,
}

#[derive(Event, Debug, Clone)]
pub struct BehaviourChanged {
    pub entity: Entity,
    pub name: Option<String>,
}

// ============================================================================
// Transition
// ============================================================================

fn instantiate(request: &BehaviourRequest) -> Option<Box<dyn EntityBehaviour>> {
    match request {
        BehaviourRequest::Biped => Some(Box::new(BipedBehaviour::new())),
        BehaviourRequest::Sitting {
            seat_position,
            seat_forward,
        } => Some(Box::new(SittingBehaviour::new(*seat_position, *seat_forward))),
        BehaviourRequest::FreeFly => Some(Box::new(FreeFlyBehaviour::new())),
        BehaviourRequest::Previous | BehaviourRequest::Clear => None,
    }
}

/// Stop-current-then-start-next. The outgoing behaviour, if it persists,
/// is handed to the incoming one for continuity.
pub(crate) fn apply_behaviour_request(
    current: &mut CurrentBehaviour,
    ctx: &mut BehaviourContext,
    request: &BehaviourRequest,
) {
    let next = match request {
        BehaviourRequest::Previous => current
            .0
            .as_mut()
            .and_then(|behaviour| behaviour.take_previous()),
        other => instantiate(other),
    };

    let mut outgoing = current.0.take();
    if let Some(behaviour) = outgoing.as_mut() {
        behaviour.stop(ctx);
    }
    let previous = outgoing.filter(|behaviour| behaviour.persists_after_stop());

    let Some(mut next) = next else {
        // Cleared (or nothing to restore): actor is left without a behaviour.
        return;
    };
    next.start(ctx, previous);
    current.0 = Some(next);
}

// ============================================================================
// Systems
// ============================================================================

/// External switch requests only queue; the switch itself runs at the tick
/// boundary with everything else.
pub fn process_set_behaviour_intents(
    mut intents: EventReader<SetBehaviourIntent>,
    mut queue: ResMut<DeferredQueue>,
) {
    for intent in intents.read() {
        queue.push(DeferredCall::SetBehaviour {
            entity: intent.entity,
            request: intent.request.clone(),
        });
    }
}

pub fn tick_behaviours(
    mut actors: Query<(
        Entity,
        &mut CurrentBehaviour,
        &mut Motion,
        &mut Transform,
        &EntityStats,
        &AttributeModifiers,
    )>,
    time: Res<Time>,
    mut queue: ResMut<DeferredQueue>,
) {
    let dt = time.delta_secs();

    for (entity, mut current, mut motion, mut transform, stats, modifiers) in actors.iter_mut() {
        let Some(mut behaviour) = current.0.take() else {
            continue;
        };

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
            behaviour.tick(&mut ctx, dt);
        }
        current.0 = Some(behaviour);

        for effect in effects {
            match effect {
                BehaviourEffect::SetBehaviour(request) => {
                    queue.push(DeferredCall::SetBehaviour { entity, request });
                }
            }
        }
    }
}

/// Drains the deferred queue: the fixed point after all traversals.
pub fn apply_deferred_calls(
    mut queue: ResMut<DeferredQueue>,
    mut actors: Query<(
        &mut CurrentBehaviour,
        &mut Motion,
        &mut Transform,
        &EntityStats,
        &AttributeModifiers,
    )>,
    mut changed: EventWriter<BehaviourChanged>,
) {
    for call in queue.take_pending() {
        match call {
            DeferredCall::SetBehaviour { entity, request } => {
                let Ok((mut current, mut motion, mut transform, stats, modifiers)) =
                    actors.get_mut(entity)
                else {
                    log_error(&format!("{:?} cannot take a behaviour", entity));
                    continue;
                };

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
                    apply_behaviour_request(&mut current, &mut ctx, &request);
                }

                log(&format!(
                    "behaviour -> {}",
                    current.name().unwrap_or("none")
                ));
                changed.write(BehaviourChanged {
                    entity,
                    name: current.name().map(String::from),
                });

                // Effects raised during the switch run next tick, still FIFO.
                for effect in effects {
                    match effect {
                        BehaviourEffect::SetBehaviour(request) => {
                            queue.push(DeferredCall::SetBehaviour { entity, request });
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Plugin
// ============================================================================

pub struct BehaviourPlugin;

impl Plugin for BehaviourPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SetBehaviourIntent>()
            .add_event::<BehaviourChanged>()
            .add_systems(
                FixedUpdate,
                (process_set_behaviour_intents, tick_behaviours)
                    .chain()
                    .in_set(SimSet::Behaviours),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EntityStats;

    struct Recorder {
        name: &'static str,
        persists: bool,
        previous: Option<Box<dyn EntityBehaviour>>,
    }

    impl Recorder {
        fn boxed(name: &'static str, persists: bool) -> Box<dyn EntityBehaviour> {
            Box::new(Self {
                name,
                persists,
                previous: None,
            })
        }
    }

    impl EntityBehaviour for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }
        fn start(&mut self, _ctx: &mut BehaviourContext, previous: Option<Box<dyn EntityBehaviour>>) {
            self.previous = previous;
        }
        fn stop(&mut self, _ctx: &mut BehaviourContext) {}
        fn persists_after_stop(&self) -> bool {
            self.persists
        }
        fn take_previous(&mut self) -> Option<Box<dyn EntityBehaviour>> {
            self.previous.take()
        }
    }

    fn with_ctx<R>(f: impl FnOnce(&mut BehaviourContext) -> R) -> R {
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
        f(&mut ctx)
    }

    #[test]
    fn test_switch_replaces_active_behaviour() {
        let mut current = CurrentBehaviour::default();
        with_ctx(|ctx| {
            current.0 = Some(Recorder::boxed("first", true));
            apply_behaviour_request(&mut current, ctx, &BehaviourRequest::FreeFly);
        });
        assert_eq!(current.name(), Some("free_fly"));
    }

    #[test]
    fn test_previous_restores_persistent_behaviour() {
        let mut current = CurrentBehaviour::default();
        with_ctx(|ctx| {
            let seat = Recorder {
                name: "seat",
                persists: false,
                previous: Some(Recorder::boxed("walker", true)),
            };
            current.0 = Some(Box::new(seat));
            apply_behaviour_request(&mut current, ctx, &BehaviourRequest::Previous);
        });
        assert_eq!(current.name(), Some("walker"));
    }

    #[test]
    fn test_previous_without_stored_behaviour_clears() {
        let mut current = CurrentBehaviour::default();
        with_ctx(|ctx| {
            current.0 = Some(Recorder::boxed("loner", true));
            apply_behaviour_request(&mut current, ctx, &BehaviourRequest::Previous);
        });
        assert!(!current.is_active());
    }

    #[test]
    fn test_clear_stops_and_empties_slot() {
        let mut current = CurrentBehaviour::default();
        with_ctx(|ctx| {
            current.0 = Some(Recorder::boxed("first", true));
            apply_behaviour_request(&mut current, ctx, &BehaviourRequest::Clear);
        });
        assert!(!current.is_active());
    }
}

//! SKYREND simulation core
//!
//! Strategic layer for a 3D action game: actor composition, action and
//! behaviour state machines, weapon trees with loadable costume models,
//! dependency propagation. The tactical layer (rendering, physics
//! integration, animation, real devices) runs in the engine and talks to
//! this crate through components, resources and events only.
//!
//! All gameplay mutation happens in `FixedUpdate` at 60 Hz, in one chained
//! pass: input → intents → actions → behaviours → combat → deferred calls.

use bevy::prelude::*;

pub mod action;
pub mod attributes;
pub mod behaviour;
pub mod character;
pub mod combat;
pub mod components;
pub mod costume;
pub mod deferred;
pub mod inject;
pub mod input;
pub mod loadable;
pub mod logger;
pub mod player;
pub mod save;
pub mod weapon;

// Re-exports for the common surface
pub use action::{ActionRequest, ActionStatus, CurrentAction, ExecuteActionIntent};
pub use attributes::{Attribute, AttributeModifier, AttributeModifiers, ModifierEffect};
pub use behaviour::{BehaviourRequest, CurrentBehaviour, SetBehaviourIntent};
pub use character::{CharacterData, CharacterPlugin, SetCharacterIntent};
pub use combat::{CombatPlugin, DamageDealt, DamageIntent, EntityDied};
pub use components::*;
pub use costume::{CharacterCostume, WeaponCostume};
pub use deferred::DeferredQueue;
pub use input::{InputSnapshot, InputSource};
pub use loadable::{LoadTransition, Loadable};
pub use logger::init_logger;
pub use weapon::{Weapon, WeaponData, WeaponInventory, WeaponPlugin};

use action::ActionPlugin;
use behaviour::BehaviourPlugin;
use player::PlayerPlugin;

/// Fixed execution order of one simulation tick.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Input,
    Intents,
    Actions,
    Behaviours,
    Combat,
    Deferred,
}

/// The whole simulation: every subsystem plugin plus the shared resources
/// and the deferred tail of the tick.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(60.0))
            .init_resource::<InputSnapshot>()
            .init_resource::<DeferredQueue>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Input,
                    SimSet::Intents,
                    SimSet::Actions,
                    SimSet::Behaviours,
                    SimSet::Combat,
                    SimSet::Deferred,
                )
                    .chain(),
            )
            .add_plugins((
                PlayerPlugin,
                CharacterPlugin,
                WeaponPlugin,
                ActionPlugin,
                BehaviourPlugin,
                CombatPlugin,
            ))
            // Tick tail: deferred switches, re-propagation, edge cleanup,
            // after every traversal, before the next tick's input.
            .add_systems(
                FixedUpdate,
                (
                    behaviour::apply_deferred_calls,
                    character::propagate_dependencies,
                    input::clear_input_edges,
                )
                    .chain()
                    .in_set(SimSet::Deferred),
            );
    }
}

/// Minimal Bevy app for headless simulation (tests, CI, the demo binary).
///
/// Time advances by exactly one fixed step per `app.update()`, so headless
/// runs are tick-for-tick deterministic regardless of wall clock. Nothing
/// in the simulation draws random numbers; the fixed step is the whole
/// determinism story.
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(
            std::time::Duration::from_secs_f64(1.0 / 60.0),
        ));
    app
}

/// Deterministic byte snapshot of one component type across the world,
/// for run-to-run comparisons.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }
    snapshot
}

//! Character: the actor's body, skeleton plus costume model.
//!
//! # Lifecycle
//!
//! - `SetCharacterIntent` swaps the whole character (unload old, load new)
//! - `SetCharacterCostumeIntent` swaps art only; the skeleton survives
//! - every actual load transition emits `CharacterLoadChanged`
//!
//! A load-state flip re-runs dependency propagation: the skeleton reference
//! and the actor's handedness flow into the character model and the whole
//! weapon subtree. Propagation is the only write path into descendants.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Handedness, SkeletonRef};
use crate::costume::{CharacterCostume, Model};
use crate::inject::{propagate_inject, Injection};
use crate::loadable::Loadable;
use crate::logger::{log, log_error};
use crate::weapon::{WeaponInventory, WeaponLoadChanged};
use crate::SimSet;

// ============================================================================
// Data and component
// ============================================================================

/// Immutable character definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterData {
    pub display_name: String,
    /// Rig prefab; empty means the character cannot load (recoverable).
    pub skeleton_scene: String,
    pub base_costume: Option<CharacterCostume>,
}

impl CharacterData {
    pub fn new(display_name: impl Into<String>, skeleton_scene: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            skeleton_scene: skeleton_scene.into(),
            base_costume: None,
        }
    }
}

/// The actor's body. Owns the skeleton handle and the costume model.
#[derive(Component, Debug)]
pub struct Character {
    data: CharacterData,
    costume: Option<CharacterCostume>,
    model: Option<Model>,
    skeleton: Option<SkeletonRef>,
    loaded: bool,
}

impl Character {
    /// `costume` falls back to the definition's base costume.
    pub fn new(data: CharacterData, costume: Option<CharacterCostume>) -> Self {
        let costume = costume.or_else(|| data.base_costume.clone());
        Self {
            data,
            costume,
            model: None,
            skeleton: None,
            loaded: false,
        }
    }

    pub fn data(&self) -> &CharacterData {
        &self.data
    }

    pub fn costume(&self) -> Option<&CharacterCostume> {
        self.costume.as_ref()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// The skeleton weapons and models bind to, present only while loaded.
    pub fn active_skeleton(&self) -> Option<SkeletonRef> {
        if self.loaded {
            self.skeleton
        } else {
            None
        }
    }

    /// Swaps art in place. The old model is destroyed before the new one
    /// is built; the skeleton is untouched.
    pub fn set_costume(&mut self, costume: Option<CharacterCostume>) {
        if self.costume == costume {
            return;
        }
        log(&format!(
            "{}: costume -> {:?}",
            self.data.display_name,
            costume.as_ref().map(|c| c.display_name.as_str())
        ));
        self.costume = costume;

        if self.loaded {
            self.model = None;
            self.model = self
                .costume
                .as_ref()
                .and_then(|c| c.instantiate(self.skeleton));
        }
    }

    /// Pushes current skeleton/handedness into the owned model.
    pub fn refresh_model_bindings(&mut self, handedness: Handedness) {
        let skeleton = self.active_skeleton();
        if let Some(model) = &mut self.model {
            propagate_inject(model, Injection::Skeleton(skeleton), true, false, false);
            propagate_inject(model, Injection::Handedness(handedness), true, false, false);
        }
    }
}

impl Loadable for Character {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded_flag(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn load_immediate(&mut self) -> bool {
        if self.data.skeleton_scene.is_empty() {
            return false;
        }
        self.skeleton = Some(SkeletonRef::allocate());
        // A bare skeleton without art is a valid loaded state.
        self.model = self
            .costume
            .as_ref()
            .and_then(|c| c.instantiate(self.skeleton));
        true
    }

    fn unload_immediate(&mut self) -> bool {
        self.model = None;
        self.skeleton = None;
        true
    }
}

// ============================================================================
// Events
// ============================================================================

/// Swap the actor's character. `data: None` removes it entirely.
#[derive(Event, Debug, Clone)]
pub struct SetCharacterIntent {
    pub entity: Entity,
    pub data: Option<CharacterData>,
    pub costume: Option<CharacterCostume>,
}

#[derive(Event, Debug, Clone)]
pub struct SetCharacterCostumeIntent {
    pub entity: Entity,
    pub costume: Option<CharacterCostume>,
}

#[derive(Event, Debug, Clone)]
pub struct CharacterLoadChanged {
    pub entity: Entity,
    pub loaded: bool,
}

// ============================================================================
// Systems
// ============================================================================

pub fn process_set_character(
    mut intents: EventReader<SetCharacterIntent>,
    mut commands: Commands,
    mut characters: Query<Option<&mut Character>>,
    mut load_events: EventWriter<CharacterLoadChanged>,
) {
    for intent in intents.read() {
        let Ok(existing) = characters.get_mut(intent.entity) else {
            log_error(&format!("{:?} does not exist", intent.entity));
            continue;
        };

        match (&intent.data, existing) {
            (None, Some(mut character)) => {
                if character.unload().is_some() {
                    load_events.write(CharacterLoadChanged {
                        entity: intent.entity,
                        loaded: false,
                    });
                }
                commands.entity(intent.entity).remove::<Character>();
            }
            (None, None) => {}
            (Some(data), existing) => {
                // Same definition: keep the live character untouched.
                if let Some(character) = &existing {
                    if character.data() == data {
                        continue;
                    }
                }

                if let Some(mut old) = existing {
                    if old.unload().is_some() {
                        load_events.write(CharacterLoadChanged {
                            entity: intent.entity,
                            loaded: false,
                        });
                    }
                }

                let mut character = Character::new(data.clone(), intent.costume.clone());
                if character.load().is_some() {
                    load_events.write(CharacterLoadChanged {
                        entity: intent.entity,
                        loaded: true,
                    });
                }
                log(&format!(
                    "{:?}: character -> {}",
                    intent.entity, character.data().display_name
                ));
                commands.entity(intent.entity).insert(character);
            }
        }
    }
}

pub fn process_set_character_costume(
    mut intents: EventReader<SetCharacterCostumeIntent>,
    mut characters: Query<&mut Character>,
) {
    for intent in intents.read() {
        let Ok(mut character) = characters.get_mut(intent.entity) else {
            log_error(&format!("{:?} has no Character", intent.entity));
            continue;
        };
        character.set_costume(intent.costume.clone());
    }
}

/// Re-runs skeleton/handedness propagation for every actor whose character
/// load state or handedness changed this tick. Weapon load flips caused by
/// the new skeleton surface as `WeaponLoadChanged`.
pub fn propagate_dependencies(
    mut load_events: EventReader<CharacterLoadChanged>,
    handedness_changed: Query<Entity, Changed<Handedness>>,
    mut actors: Query<(
        &Handedness,
        Option<&mut Character>,
        Option<&mut WeaponInventory>,
    )>,
    mut weapon_load: EventWriter<WeaponLoadChanged>,
) {
    let mut targets: Vec<Entity> = load_events.read().map(|e| e.entity).collect();
    for entity in handedness_changed.iter() {
        if !targets.contains(&entity) {
            targets.push(entity);
        }
    }

    for entity in targets {
        let Ok((handedness, mut character, mut inventory)) = actors.get_mut(entity) else {
            continue;
        };

        let skeleton = character.as_deref().and_then(Character::active_skeleton);

        if let Some(character) = character.as_deref_mut() {
            character.refresh_model_bindings(*handedness);
        }

        if let Some(inventory) = inventory.as_deref_mut() {
            let before = inventory.slot_loaded_flags();

            propagate_inject(inventory, Injection::Skeleton(skeleton), true, false, false);
            propagate_inject(
                inventory,
                Injection::Handedness(*handedness),
                true,
                true,
                false,
            );

            let after = inventory.slot_loaded_flags();
            for (slot, (was, is)) in before.iter().zip(after.iter()).enumerate() {
                if was != is {
                    weapon_load.write(WeaponLoadChanged {
                        entity,
                        slot,
                        loaded: *is,
                    });
                }
            }
        }
    }
}

// ============================================================================
// Plugin
// ============================================================================

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SetCharacterIntent>()
            .add_event::<SetCharacterCostumeIntent>()
            .add_event::<CharacterLoadChanged>()
            .add_systems(
                FixedUpdate,
                (process_set_character, process_set_character_costume)
                    .chain()
                    .in_set(SimSet::Intents),
            );
    }
}

//! Weapon inventory: ordered slots with an active-index cursor.
//!
//! # Architecture
//!
//! **Events → systems flow** (one system per intent, chained):
//! - `SwitchWeaponIntent`: move the cursor; everything but the target is
//!   disabled, the target is enabled exactly once
//! - `AddWeaponIntent` / `SetWeaponIntent`: build a single weapon from its
//!   definition, wire the stored skeleton/handedness in, load it
//! - `RemoveWeaponIntent`: unload and drop the slot
//! - `SetWeaponCostumeIntent`: swap art on a slot, reload
//!
//! Out-of-range indices are tolerated no-ops: data-driven edits go through
//! transient states and must not crash the simulation.
//!
//! Load-state changes surface as `WeaponLoadChanged` events, one per actual
//! transition.

use bevy::prelude::*;

use crate::action::attack::AttackBuilder;
use crate::components::{Handedness, SkeletonRef};
use crate::costume::WeaponCostume;
use crate::inject::{propagate_inject, ChannelKind, InjectNode, Injection};
use crate::loadable::{LoadTransition, Loadable};
use crate::logger::{log, log_error};
use crate::SimSet;

use super::{SingleWeapon, Weapon, WeaponData, WeaponPath};

// ============================================================================
// Component
// ============================================================================

#[derive(Component, Debug, Default)]
pub struct WeaponInventory {
    slots: Vec<Weapon>,
    current_index: usize,
    skeleton: Option<SkeletonRef>,
    handedness: Handedness,
    loaded: bool,
}

impl WeaponInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weapons(weapons: Vec<Weapon>) -> Self {
        let mut inventory = Self {
            slots: weapons,
            ..Self::default()
        };
        inventory.refresh_enabled();
        inventory
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn skeleton(&self) -> Option<SkeletonRef> {
        self.skeleton
    }

    pub fn weapon_at(&self, index: usize) -> Option<&Weapon> {
        self.slots.get(index)
    }

    pub fn current_weapon(&self) -> Option<&Weapon> {
        self.slots.get(self.current_index)
    }

    pub fn current_weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.slots.get_mut(self.current_index)
    }

    /// Resolves a path produced by attack aggregation back to a weapon.
    pub fn weapon_at_path_mut(&mut self, path: &WeaponPath) -> Option<&mut Weapon> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.slots.get_mut(*first)?;
        for &index in rest {
            node = node.child_mut(index)?;
        }
        Some(node)
    }

    pub fn slot_loaded_flags(&self) -> Vec<bool> {
        self.slots.iter().map(Loadable::is_loaded).collect()
    }

    /// Moves the cursor (clamped into range) and re-derives enablement:
    /// every other slot is disabled, the target enabled. Both directions are
    /// guarded, so a redundant switch touches nothing.
    pub fn switch_to(&mut self, index: usize) {
        if self.slots.is_empty() {
            self.current_index = 0;
            return;
        }

        let clamped = index.min(self.slots.len() - 1);
        self.current_index = clamped;
        self.refresh_enabled();
    }

    fn refresh_enabled(&mut self) {
        if self.current_index >= self.slots.len() {
            self.current_index = 0;
        }
        let current = self.current_index;
        for (i, weapon) in self.slots.iter_mut().enumerate() {
            if i != current {
                weapon.disable();
            }
        }
        if let Some(weapon) = self.slots.get_mut(current) {
            weapon.enable();
        }
    }

    /// Appends an already-composed weapon (akimbo pairs, multi stacks).
    pub fn add_composed(&mut self, mut weapon: Weapon) -> (usize, Option<LoadTransition>) {
        let index = self.slots.len();

        propagate_inject(
            &mut weapon,
            Injection::Handedness(self.handedness),
            true,
            true,
            false,
        );
        propagate_inject(&mut weapon, Injection::Skeleton(self.skeleton), true, false, false);

        if index != self.current_index {
            weapon.disable();
        }

        let transition = weapon.is_loaded().then_some(LoadTransition::Loaded);
        self.slots.push(weapon);
        (index, transition)
    }

    /// Appends a single weapon built from its definition.
    pub fn add_weapon(
        &mut self,
        data: WeaponData,
        costume: Option<WeaponCostume>,
    ) -> (usize, Option<LoadTransition>) {
        self.add_composed(Weapon::Single(SingleWeapon::new(data, costume)))
    }

    /// Replaces a slot. Out-of-range and same-definition calls are no-ops.
    pub fn set_weapon(
        &mut self,
        index: usize,
        data: WeaponData,
        costume: Option<WeaponCostume>,
    ) -> Vec<(usize, LoadTransition)> {
        let Some(old) = self.slots.get_mut(index) else {
            return Vec::new();
        };
        if let Weapon::Single(existing) = &*old {
            if existing.data() == &data {
                return Vec::new();
            }
        }

        let mut transitions = Vec::new();
        if let Some(t) = old.unload() {
            transitions.push((index, t));
        }

        let mut weapon = Weapon::Single(SingleWeapon::new(data, costume));
        propagate_inject(
            &mut weapon,
            Injection::Handedness(self.handedness),
            true,
            true,
            false,
        );
        propagate_inject(&mut weapon, Injection::Skeleton(self.skeleton), true, false, false);
        if index != self.current_index {
            weapon.disable();
        }
        if weapon.is_loaded() {
            transitions.push((index, LoadTransition::Loaded));
        }

        self.slots[index] = weapon;
        transitions
    }

    /// Unloads and drops a slot. Out-of-range calls are no-ops.
    pub fn remove_weapon(&mut self, index: usize) -> Vec<(usize, LoadTransition)> {
        if index >= self.slots.len() {
            return Vec::new();
        }

        let mut weapon = self.slots.remove(index);
        let transitions = weapon
            .unload()
            .map(|t| vec![(index, t)])
            .unwrap_or_default();

        if !self.slots.is_empty() {
            self.current_index = self.current_index.min(self.slots.len() - 1);
            self.refresh_enabled();
        } else {
            self.current_index = 0;
        }
        transitions
    }

    /// Swaps the costume of the weapon in `index` (forwarded through
    /// composites to the weapon that owns art).
    pub fn set_costume(
        &mut self,
        index: usize,
        costume: Option<WeaponCostume>,
    ) -> Vec<(usize, LoadTransition)> {
        let Some(weapon) = self.slots.get_mut(index) else {
            return Vec::new();
        };
        weapon
            .set_costume(costume, false)
            .into_iter()
            .map(|t| (index, t))
            .collect()
    }

    /// Attacks of the weapon under the cursor.
    pub fn attacks(&self, target: Option<Entity>) -> Vec<AttackBuilder> {
        let Some(weapon) = self.current_weapon() else {
            return Vec::new();
        };
        weapon.get_attacks(&WeaponPath::slot(self.current_index), target)
    }
}

impl Loadable for WeaponInventory {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded_flag(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn load_immediate(&mut self) -> bool {
        for weapon in &mut self.slots {
            weapon.load();
        }
        true
    }

    fn unload_immediate(&mut self) -> bool {
        for weapon in &mut self.slots {
            weapon.unload();
        }
        true
    }
}

impl InjectNode for WeaponInventory {
    fn consumes(&self, kind: ChannelKind) -> bool {
        matches!(kind, ChannelKind::Skeleton | ChannelKind::Handedness)
    }

    fn inject(&mut self, value: Injection) {
        match value {
            Injection::Skeleton(skeleton) => self.skeleton = skeleton,
            Injection::Handedness(handedness) => self.handedness = handedness,
            Injection::Holster(_) => {}
        }
    }

    fn child_count(&self) -> usize {
        self.slots.len()
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(usize, &mut dyn InjectNode)) {
        for (i, weapon) in self.slots.iter_mut().enumerate() {
            f(i, weapon);
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Move the inventory cursor.
#[derive(Event, Debug, Clone)]
pub struct SwitchWeaponIntent {
    pub entity: Entity,
    pub index: usize,
}

/// Append a weapon built from a definition.
#[derive(Event, Debug, Clone)]
pub struct AddWeaponIntent {
    pub entity: Entity,
    pub data: WeaponData,
    pub costume: Option<WeaponCostume>,
}

/// Replace the weapon in a slot.
#[derive(Event, Debug, Clone)]
pub struct SetWeaponIntent {
    pub entity: Entity,
    pub index: usize,
    pub data: WeaponData,
    pub costume: Option<WeaponCostume>,
}

/// Drop a slot.
#[derive(Event, Debug, Clone)]
pub struct RemoveWeaponIntent {
    pub entity: Entity,
    pub index: usize,
}

/// Swap a slot's costume.
#[derive(Event, Debug, Clone)]
pub struct SetWeaponCostumeIntent {
    pub entity: Entity,
    pub index: usize,
    pub costume: Option<WeaponCostume>,
}

/// A slot actually changed load state.
#[derive(Event, Debug, Clone)]
pub struct WeaponLoadChanged {
    pub entity: Entity,
    pub slot: usize,
    pub loaded: bool,
}

// ============================================================================
// Systems
// ============================================================================

pub fn process_switch_weapon(
    mut intents: EventReader<SwitchWeaponIntent>,
    mut inventories: Query<&mut WeaponInventory>,
) {
    for intent in intents.read() {
        let Ok(mut inventory) = inventories.get_mut(intent.entity) else {
            log_error(&format!("{:?} has no WeaponInventory", intent.entity));
            continue;
        };

        inventory.switch_to(intent.index);
        if let Some(weapon) = inventory.current_weapon() {
            log(&format!(
                "weapon switch -> slot {} ({})",
                inventory.current_index(),
                weapon.display_name()
            ));
        }
    }
}

pub fn process_add_weapon(
    mut intents: EventReader<AddWeaponIntent>,
    mut inventories: Query<&mut WeaponInventory>,
    mut load_events: EventWriter<WeaponLoadChanged>,
) {
    for intent in intents.read() {
        let Ok(mut inventory) = inventories.get_mut(intent.entity) else {
            log_error(&format!("{:?} has no WeaponInventory", intent.entity));
            continue;
        };

        let name = intent.data.display_name.clone();
        let (slot, transition) = inventory.add_weapon(intent.data.clone(), intent.costume.clone());
        if let Some(t) = transition {
            load_events.write(WeaponLoadChanged {
                entity: intent.entity,
                slot,
                loaded: t.is_loaded(),
            });
        }
        log(&format!("added weapon {} to slot {}", name, slot));
    }
}

pub fn process_set_weapon(
    mut intents: EventReader<SetWeaponIntent>,
    mut inventories: Query<&mut WeaponInventory>,
    mut load_events: EventWriter<WeaponLoadChanged>,
) {
    for intent in intents.read() {
        let Ok(mut inventory) = inventories.get_mut(intent.entity) else {
            continue;
        };

        for (slot, transition) in
            inventory.set_weapon(intent.index, intent.data.clone(), intent.costume.clone())
        {
            load_events.write(WeaponLoadChanged {
                entity: intent.entity,
                slot,
                loaded: transition.is_loaded(),
            });
        }
    }
}

pub fn process_remove_weapon(
    mut intents: EventReader<RemoveWeaponIntent>,
    mut inventories: Query<&mut WeaponInventory>,
    mut load_events: EventWriter<WeaponLoadChanged>,
) {
    for intent in intents.read() {
        let Ok(mut inventory) = inventories.get_mut(intent.entity) else {
            continue;
        };

        for (slot, transition) in inventory.remove_weapon(intent.index) {
            load_events.write(WeaponLoadChanged {
                entity: intent.entity,
                slot,
                loaded: transition.is_loaded(),
            });
        }
    }
}

pub fn process_set_weapon_costume(
    mut intents: EventReader<SetWeaponCostumeIntent>,
    mut inventories: Query<&mut WeaponInventory>,
    mut load_events: EventWriter<WeaponLoadChanged>,
) {
    for intent in intents.read() {
        let Ok(mut inventory) = inventories.get_mut(intent.entity) else {
            continue;
        };

        for (slot, transition) in inventory.set_costume(intent.index, intent.costume.clone()) {
            load_events.write(WeaponLoadChanged {
                entity: intent.entity,
                slot,
                loaded: transition.is_loaded(),
            });
        }
    }
}

// ============================================================================
// Plugin
// ============================================================================

pub struct WeaponPlugin;

impl Plugin for WeaponPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SwitchWeaponIntent>()
            .add_event::<AddWeaponIntent>()
            .add_event::<SetWeaponIntent>()
            .add_event::<RemoveWeaponIntent>()
            .add_event::<SetWeaponCostumeIntent>()
            .add_event::<WeaponLoadChanged>()
            .add_systems(
                FixedUpdate,
                (
                    process_add_weapon,
                    process_set_weapon,
                    process_remove_weapon,
                    process_set_weapon_costume,
                    process_switch_weapon,
                )
                    .chain()
                    .in_set(SimSet::Intents),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::super::{WeaponKind, WeaponSize, WeaponUsage};
    use super::*;

    fn data(name: &str) -> WeaponData {
        let mut data = WeaponData::new(
            name,
            WeaponKind::Sword,
            WeaponUsage::Slash,
            WeaponSize::OneHanded,
            2,
        );
        data.base_costume = Some(WeaponCostume::new(name, format!("res://weapons/{name}.tscn")));
        data
    }

    fn inventory_with(count: usize) -> WeaponInventory {
        let mut inventory = WeaponInventory::new();
        propagate_inject(
            &mut inventory,
            Injection::Skeleton(Some(SkeletonRef::allocate())),
            true,
            false,
            false,
        );
        for i in 0..count {
            inventory.add_weapon(data(&format!("weapon_{i}")), None);
        }
        inventory
    }

    #[test]
    fn test_switch_disables_all_but_target() {
        let mut inventory = inventory_with(3);

        inventory.switch_to(2);

        assert_eq!(inventory.current_index(), 2);
        assert!(!inventory.weapon_at(0).unwrap().is_enabled());
        assert!(!inventory.weapon_at(1).unwrap().is_enabled());
        assert!(inventory.weapon_at(2).unwrap().is_enabled());
    }

    #[test]
    fn test_switch_enables_target_exactly_once() {
        let mut inventory = inventory_with(3);
        inventory.switch_to(2);

        // Guarded transition: a second enable reports no change.
        assert!(!inventory.current_weapon_mut().unwrap().enable());

        // Redundant switch leaves everything untouched.
        inventory.switch_to(2);
        assert!(!inventory.current_weapon_mut().unwrap().enable());
    }

    #[test]
    fn test_switch_clamps_out_of_range() {
        let mut inventory = inventory_with(2);
        inventory.switch_to(9);
        assert_eq!(inventory.current_index(), 1);
    }

    #[test]
    fn test_add_weapon_loads_against_stored_skeleton() {
        let inventory = inventory_with(1);
        assert!(inventory.weapon_at(0).unwrap().is_loaded());
    }

    #[test]
    fn test_add_weapon_without_skeleton_stays_unloaded() {
        let mut inventory = WeaponInventory::new();
        let (slot, transition) = inventory.add_weapon(data("bare"), None);
        assert_eq!(slot, 0);
        assert!(transition.is_none());
        assert!(!inventory.weapon_at(0).unwrap().is_loaded());
    }

    #[test]
    fn test_set_weapon_same_data_is_noop() {
        let mut inventory = inventory_with(1);
        let transitions = inventory.set_weapon(0, data("weapon_0"), None);
        assert!(transitions.is_empty());
    }

    #[test]
    fn test_set_weapon_replaces_and_reports() {
        let mut inventory = inventory_with(1);
        let transitions = inventory.set_weapon(0, data("replacement"), None);
        assert_eq!(
            transitions,
            vec![(0, LoadTransition::Unloaded), (0, LoadTransition::Loaded)]
        );
        assert_eq!(inventory.weapon_at(0).unwrap().display_name(), "replacement");
    }

    #[test]
    fn test_out_of_range_edits_are_noops() {
        let mut inventory = inventory_with(1);
        assert!(inventory.set_weapon(5, data("nope"), None).is_empty());
        assert!(inventory.remove_weapon(5).is_empty());
        assert!(inventory.set_costume(5, None).is_empty());
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_remove_weapon_unloads_and_reclamps_cursor() {
        let mut inventory = inventory_with(3);
        inventory.switch_to(2);

        let transitions = inventory.remove_weapon(2);
        assert_eq!(transitions, vec![(2, LoadTransition::Unloaded)]);
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.current_index(), 1);
        assert!(inventory.weapon_at(1).unwrap().is_enabled());
    }
}

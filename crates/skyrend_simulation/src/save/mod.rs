//! Save-data contract.
//!
//! `capture` flattens runtime state into serde-friendly data; `load`
//! reconstructs it. Models are never saved; a restored weapon or
//! character re-instantiates its art when the skeleton propagates on the
//! first tick after spawn. Writing the data to disk is the save
//! collaborator's job, not ours.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::character::{Character, CharacterData};
use crate::components::{Actor, EntityStats, Handedness, Health};
use crate::costume::{CharacterCostume, WeaponCostume};
use crate::loadable::Loadable;
use crate::weapon::{
    AkimboWeapon, MultiWeapon, SingleWeapon, Weapon, WeaponData, WeaponInventory,
};

// ============================================================================
// Weapons
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WeaponSaveData {
    Single {
        data: WeaponData,
        costume: Option<WeaponCostume>,
        style: u32,
    },
    Multi {
        weapons: Vec<WeaponSaveData>,
        current: usize,
    },
    Akimbo {
        main: Box<WeaponSaveData>,
        side: Option<Box<WeaponSaveData>>,
    },
}

impl WeaponSaveData {
    pub fn capture(weapon: &Weapon) -> Self {
        match weapon {
            Weapon::Single(w) => WeaponSaveData::Single {
                data: w.data().clone(),
                costume: w.costume().cloned(),
                style: w.style(),
            },
            Weapon::Multi(w) => WeaponSaveData::Multi {
                weapons: w.weapons().iter().map(Self::capture).collect(),
                current: w.current_index(),
            },
            Weapon::Akimbo(w) => WeaponSaveData::Akimbo {
                main: Box::new(Self::capture(w.main())),
                side: w.side().map(|s| Box::new(Self::capture(s))),
            },
        }
    }

    pub fn load(&self) -> Weapon {
        match self {
            WeaponSaveData::Single {
                data,
                costume,
                style,
            } => {
                let mut weapon = SingleWeapon::new(data.clone(), costume.clone());
                weapon.set_style(*style);
                Weapon::Single(weapon)
            }
            WeaponSaveData::Multi { weapons, current } => {
                let mut multi = MultiWeapon::new(weapons.iter().map(Self::load).collect());
                if *current != 0 {
                    multi.switch_to(*current);
                }
                Weapon::Multi(multi)
            }
            WeaponSaveData::Akimbo { main, side } => Weapon::Akimbo(AkimboWeapon::new(
                main.load(),
                side.as_deref().map(Self::load),
            )),
        }
    }
}

// ============================================================================
// Actors
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSaveData {
    pub data: CharacterData,
    pub costume: Option<CharacterCostume>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSaveData {
    pub display_name: String,
    pub stats: EntityStats,
    pub health: Health,
    pub handedness: Handedness,
    pub character: Option<CharacterSaveData>,
    pub weapons: Vec<WeaponSaveData>,
    pub current_slot: usize,
}

impl ActorSaveData {
    pub fn capture(
        actor: &Actor,
        stats: &EntityStats,
        health: &Health,
        handedness: Handedness,
        character: Option<&Character>,
        inventory: Option<&WeaponInventory>,
    ) -> Self {
        Self {
            display_name: actor.display_name.clone(),
            stats: *stats,
            health: *health,
            handedness,
            character: character.map(|c| CharacterSaveData {
                data: c.data().clone(),
                costume: c.costume().cloned(),
            }),
            weapons: inventory
                .map(|inv| {
                    (0..inv.len())
                        .filter_map(|i| inv.weapon_at(i))
                        .map(WeaponSaveData::capture)
                        .collect()
                })
                .unwrap_or_default(),
            current_slot: inventory.map(WeaponInventory::current_index).unwrap_or(0),
        }
    }

    /// Spawns the restored actor. Weapons come back unloaded and load on
    /// the first dependency propagation after spawn.
    pub fn load(&self, commands: &mut Commands) -> Entity {
        let mut entity = commands.spawn((
            Actor::named(self.display_name.clone()),
            self.stats,
            self.health,
            self.handedness,
        ));

        if let Some(save) = &self.character {
            let mut character = Character::new(save.data.clone(), save.costume.clone());
            character.load();
            entity.insert(character);
        }

        if !self.weapons.is_empty() {
            let mut inventory =
                WeaponInventory::with_weapons(self.weapons.iter().map(WeaponSaveData::load).collect());
            inventory.switch_to(self.current_slot);
            entity.insert(inventory);
        }

        entity.id()
    }
}

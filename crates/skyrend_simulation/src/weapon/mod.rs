//! Weapon composition.
//!
//! # Architecture
//!
//! **WeaponData**: static definition (display name, classification, style
//! count, attack list, optional charge attack). Immutable, serde-friendly,
//! shared between runtime weapons and save data.
//!
//! **Weapon**: runtime polymorph:
//! - `Single`: one costume → model binding, the only variant that owns art
//! - `Multi`: ordered sub-weapons behind one slot, current-index cursor,
//!   holster interception (only the current child stays drawn)
//! - `Akimbo`: main + side pair; the side always carries the mirrored
//!   handedness, enforced by injection, not by construction
//!
//! Composites forward display metadata and classification to their
//! current/main child and aggregate attack queries.

pub mod akimbo;
pub mod inventory;
pub mod multi;
pub mod single;

pub use akimbo::AkimboWeapon;
pub use inventory::*;
pub use multi::MultiWeapon;
pub use single::SingleWeapon;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::action::attack::AttackBuilder;
use crate::attributes::AttributeModifier;
use crate::costume::WeaponCostume;
use crate::inject::{ChannelKind, InjectNode, Injection};
use crate::loadable::{LoadTransition, Loadable};

// ============================================================================
// Static definitions
// ============================================================================

/// Weapon classification: what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Sword,
    Greatsword,
    Daggers,
    Gauntlets,
    Sparklance,
}

/// Weapon classification: how it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponUsage {
    Slash,
    Thrust,
    Strike,
}

/// Weapon classification: slot size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponSize {
    OneHanded,
    TwoHanded,
}

/// One attack a weapon offers. Phase durations drive the attack action's
/// windup → strike → recovery machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackData {
    pub name: String,
    /// Style that offers this attack (0..style_count).
    pub style: u32,
    pub base_damage: f32,
    pub windup: f32,
    pub strike: f32,
    pub recovery: f32,
}

impl AttackData {
    pub fn new(name: impl Into<String>, style: u32, base_damage: f32) -> Self {
        Self {
            name: name.into(),
            style,
            base_damage,
            windup: 0.3,
            strike: 0.2,
            recovery: 0.4,
        }
    }
}

/// Charge-attack configuration: hold `action_key`, release to attack.
/// Modifiers are registered while the charge is held and must come back out
/// whatever way the charge ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeSpec {
    pub action_key: String,
    pub charge_duration: f32,
    /// Attack name resolved against the weapon's attack list.
    pub charged_attack: String,
    pub uncharged_attack: String,
    pub modifiers: Vec<AttributeModifier>,
}

/// Static weapon definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub display_name: String,
    pub kind: WeaponKind,
    pub usage: WeaponUsage,
    pub size: WeaponSize,
    style_count: u32,
    pub attacks: Vec<AttackData>,
    pub charge: Option<ChargeSpec>,
    pub base_costume: Option<WeaponCostume>,
}

impl WeaponData {
    pub fn new(
        display_name: impl Into<String>,
        kind: WeaponKind,
        usage: WeaponUsage,
        size: WeaponSize,
        style_count: u32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            kind,
            usage,
            size,
            style_count,
            attacks: Vec::new(),
            charge: None,
            base_costume: None,
        }
    }

    /// Always at least 1, whatever the authored data says.
    pub fn style_count(&self) -> u32 {
        self.style_count.max(1)
    }

    pub fn find_attack(&self, name: &str) -> Option<&AttackData> {
        self.attacks.iter().find(|a| a.name == name)
    }
}

// ============================================================================
// Runtime weapon
// ============================================================================

/// Address of a weapon inside an inventory: slot index, then child indices
/// through composites. Attack hooks carry these so a built attack can still
/// find its owning sub-weapon after the tree mutated underneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaponPath(Vec<usize>);

impl WeaponPath {
    pub fn slot(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// Runtime weapon, polymorphic over composition shape.
#[derive(Debug)]
pub enum Weapon {
    Single(SingleWeapon),
    Multi(MultiWeapon),
    Akimbo(AkimboWeapon),
}

impl Weapon {
    pub fn display_name(&self) -> &str {
        match self {
            Weapon::Single(w) => w.display_name(),
            Weapon::Multi(w) => w.display_name(),
            Weapon::Akimbo(w) => w.display_name(),
        }
    }

    pub fn portrait(&self) -> Option<&str> {
        match self {
            Weapon::Single(w) => w.portrait(),
            Weapon::Multi(w) => w.portrait(),
            Weapon::Akimbo(w) => w.portrait(),
        }
    }

    pub fn kind(&self) -> Option<WeaponKind> {
        match self {
            Weapon::Single(w) => Some(w.data().kind),
            Weapon::Multi(w) => w.current_weapon().and_then(Weapon::kind),
            Weapon::Akimbo(w) => w.main().kind(),
        }
    }

    pub fn style(&self) -> u32 {
        match self {
            Weapon::Single(w) => w.style(),
            Weapon::Multi(w) => w.current_index() as u32,
            Weapon::Akimbo(w) => w.style(),
        }
    }

    pub fn set_style(&mut self, style: u32) {
        match self {
            Weapon::Single(w) => w.set_style(style),
            Weapon::Multi(w) => w.switch_to(style as usize),
            Weapon::Akimbo(w) => w.set_style(style),
        }
    }

    pub fn style_count(&self) -> u32 {
        match self {
            Weapon::Single(w) => w.style_count(),
            Weapon::Multi(w) => w.style_count(),
            Weapon::Akimbo(w) => w.style_count(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            Weapon::Single(w) => w.is_enabled(),
            Weapon::Multi(w) => w.is_enabled(),
            Weapon::Akimbo(w) => w.is_enabled(),
        }
    }

    /// Returns true if this call actually enabled the weapon.
    pub fn enable(&mut self) -> bool {
        match self {
            Weapon::Single(w) => w.enable(),
            Weapon::Multi(w) => w.enable(),
            Weapon::Akimbo(w) => w.enable(),
        }
    }

    /// Returns true if this call actually disabled the weapon.
    pub fn disable(&mut self) -> bool {
        match self {
            Weapon::Single(w) => w.disable(),
            Weapon::Multi(w) => w.disable(),
            Weapon::Akimbo(w) => w.disable(),
        }
    }

    /// Every attack this weapon can currently offer against `target`,
    /// addressed relative to `self_path`.
    pub fn get_attacks(&self, self_path: &WeaponPath, target: Option<Entity>) -> Vec<AttackBuilder> {
        match self {
            Weapon::Single(w) => w.get_attacks(target),
            Weapon::Multi(w) => w.get_attacks(self_path, target),
            Weapon::Akimbo(w) => w.get_attacks(self_path, target),
        }
    }

    /// Charge configuration of the weapon that would actually swing.
    pub fn charge_source(&self) -> Option<(&ChargeSpec, &WeaponData)> {
        match self {
            Weapon::Single(w) => w.data().charge.as_ref().map(|spec| (spec, w.data())),
            Weapon::Multi(w) => w.current_weapon().and_then(Weapon::charge_source),
            Weapon::Akimbo(w) => w.main().charge_source(),
        }
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Weapon> {
        match self {
            Weapon::Single(_) => None,
            Weapon::Multi(w) => w.child_mut(index),
            Weapon::Akimbo(w) => w.child_mut(index),
        }
    }

    /// Swaps art on the weapon that owns it: composites forward to their
    /// current/main child.
    pub fn set_costume(
        &mut self,
        costume: Option<WeaponCostume>,
        force_load: bool,
    ) -> Vec<LoadTransition> {
        match self {
            Weapon::Single(w) => w.set_costume(costume, force_load),
            Weapon::Multi(w) => w
                .current_weapon_mut()
                .map(|c| c.set_costume(costume, force_load))
                .unwrap_or_default(),
            Weapon::Akimbo(w) => match w.child_mut(0) {
                Some(main) => main.set_costume(costume, force_load),
                None => Vec::new(),
            },
        }
    }
}

impl Loadable for Weapon {
    fn is_loaded(&self) -> bool {
        match self {
            Weapon::Single(w) => w.is_loaded(),
            Weapon::Multi(w) => w.is_loaded(),
            Weapon::Akimbo(w) => w.is_loaded(),
        }
    }

    fn set_loaded_flag(&mut self, loaded: bool) {
        match self {
            Weapon::Single(w) => w.set_loaded_flag(loaded),
            Weapon::Multi(w) => w.set_loaded_flag(loaded),
            Weapon::Akimbo(w) => w.set_loaded_flag(loaded),
        }
    }

    fn load_immediate(&mut self) -> bool {
        match self {
            Weapon::Single(w) => w.load_immediate(),
            Weapon::Multi(w) => w.load_immediate(),
            Weapon::Akimbo(w) => w.load_immediate(),
        }
    }

    fn unload_immediate(&mut self) -> bool {
        match self {
            Weapon::Single(w) => w.unload_immediate(),
            Weapon::Multi(w) => w.unload_immediate(),
            Weapon::Akimbo(w) => w.unload_immediate(),
        }
    }
}

impl InjectNode for Weapon {
    fn consumes(&self, kind: ChannelKind) -> bool {
        match self {
            Weapon::Single(w) => w.consumes(kind),
            Weapon::Multi(w) => w.consumes(kind),
            Weapon::Akimbo(w) => w.consumes(kind),
        }
    }

    fn provides(&self, kind: ChannelKind) -> bool {
        match self {
            Weapon::Single(w) => w.provides(kind),
            Weapon::Multi(w) => w.provides(kind),
            Weapon::Akimbo(w) => w.provides(kind),
        }
    }

    fn inject(&mut self, value: Injection) {
        match self {
            Weapon::Single(w) => w.inject(value),
            Weapon::Multi(w) => w.inject(value),
            Weapon::Akimbo(w) => w.inject(value),
        }
    }

    fn child_count(&self) -> usize {
        match self {
            Weapon::Single(w) => w.child_count(),
            Weapon::Multi(w) => w.child_count(),
            Weapon::Akimbo(w) => w.child_count(),
        }
    }

    fn intercept(&self, index: usize, value: Injection) -> Injection {
        match self {
            Weapon::Single(w) => w.intercept(index, value),
            Weapon::Multi(w) => w.intercept(index, value),
            Weapon::Akimbo(w) => w.intercept(index, value),
        }
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(usize, &mut dyn InjectNode)) {
        match self {
            Weapon::Single(w) => w.for_each_child(f),
            Weapon::Multi(w) => w.for_each_child(f),
            Weapon::Akimbo(w) => w.for_each_child(f),
        }
    }
}

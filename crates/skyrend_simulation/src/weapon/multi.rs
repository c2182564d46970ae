//! Multi weapon: several sub-weapons behind one inventory slot.
//!
//! Switch-to-self cycles the selected weapon's own style instead of
//! re-selecting it. Only the current child stays drawn; the holster
//! interceptor forces `Holstered` onto everyone else.

use bevy::prelude::*;

use crate::action::attack::AttackBuilder;
use crate::components::HolsterState;
use crate::inject::{propagate_inject, ChannelKind, InjectNode, Injection};
use crate::loadable::Loadable;
use crate::logger::log;

use super::{Weapon, WeaponPath};

#[derive(Debug)]
pub struct MultiWeapon {
    weapons: Vec<Weapon>,
    current: usize,
    holster: HolsterState,
    loaded: bool,
    enabled: bool,
}

impl MultiWeapon {
    pub fn new(weapons: Vec<Weapon>) -> Self {
        let mut multi = Self {
            weapons,
            current: 0,
            holster: HolsterState::default(),
            loaded: false,
            enabled: true,
        };
        multi.update_current();
        multi
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_weapon(&self) -> Option<&Weapon> {
        self.weapons.get(self.current)
    }

    pub fn current_weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.weapons.get_mut(self.current)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Weapon> {
        self.weapons.get_mut(index)
    }

    pub fn display_name(&self) -> &str {
        self.current_weapon().map_or("", Weapon::display_name)
    }

    pub fn portrait(&self) -> Option<&str> {
        self.current_weapon().and_then(Weapon::portrait)
    }

    pub fn style_count(&self) -> u32 {
        (self.weapons.len() as u32).max(1)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        for weapon in &mut self.weapons {
            weapon.enable();
        }
        self.update_current();
        true
    }

    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        for weapon in &mut self.weapons {
            weapon.disable();
        }
        true
    }

    /// Selects a sub-weapon. Switching to the already-selected index cycles
    /// that weapon's substyle; a real switch resets the incoming weapon's
    /// style to 0.
    pub fn switch_to(&mut self, index: usize) {
        let new_index = index % self.style_count() as usize;

        if new_index == self.current {
            if let Some(current) = self.current_weapon_mut() {
                let next_style = current.style() + 1;
                current.set_style(next_style);
                return;
            }
        }

        self.current = new_index;

        if let Some(incoming) = self.current_weapon_mut() {
            incoming.set_style(0);
            log(&format!("multi weapon -> {}", incoming.display_name()));
        }

        self.update_current();
    }

    /// Re-derives holster state across children after any selection or
    /// structural change.
    fn update_current(&mut self) {
        if self.current >= self.weapons.len() {
            self.current = 0;
        }
        let holster = self.holster;
        propagate_inject(self, Injection::Holster(holster), true, false, false);
    }

    /// Aggregates every sub-weapon's attacks. Attacks of non-current
    /// children get wrapped so executing one switches to its owner first
    /// and restores the previous selection afterwards.
    pub fn get_attacks(&self, self_path: &WeaponPath, target: Option<Entity>) -> Vec<AttackBuilder> {
        let current = self.current;
        let mut builders = Vec::new();

        for (i, weapon) in self.weapons.iter().enumerate() {
            for mut builder in weapon.get_attacks(&self_path.child(i), target) {
                if i != current {
                    let switch_path = self_path.clone();
                    builder.before_execute(Box::new(move |ctx| {
                        if let Some(inventory) = ctx.inventory.as_mut() {
                            if let Some(Weapon::Multi(multi)) =
                                inventory.weapon_at_path_mut(&switch_path)
                            {
                                multi.switch_to(i);
                            }
                        }
                    }));

                    let restore_path = self_path.clone();
                    builder.after_execute(Box::new(move |ctx| {
                        if let Some(inventory) = ctx.inventory.as_mut() {
                            if let Some(Weapon::Multi(multi)) =
                                inventory.weapon_at_path_mut(&restore_path)
                            {
                                multi.switch_to(current);
                            }
                        }
                    }));
                }
                builders.push(builder);
            }
        }
        builders
    }
}

impl Loadable for MultiWeapon {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded_flag(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn load_immediate(&mut self) -> bool {
        for weapon in &mut self.weapons {
            weapon.load();
        }
        true
    }

    fn unload_immediate(&mut self) -> bool {
        for weapon in &mut self.weapons {
            weapon.unload();
        }
        true
    }
}

impl InjectNode for MultiWeapon {
    fn consumes(&self, kind: ChannelKind) -> bool {
        matches!(kind, ChannelKind::Holster)
    }

    fn inject(&mut self, value: Injection) {
        if let Injection::Holster(state) = value {
            self.holster = state;
        }
    }

    fn child_count(&self) -> usize {
        self.weapons.len()
    }

    fn intercept(&self, index: usize, value: Injection) -> Injection {
        match value {
            // Only the weapon on display stays drawn.
            Injection::Holster(state) if index == self.current => Injection::Holster(state),
            Injection::Holster(_) => Injection::Holster(HolsterState::Holstered),
            other => other,
        }
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(usize, &mut dyn InjectNode)) {
        for (i, weapon) in self.weapons.iter_mut().enumerate() {
            f(i, weapon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SingleWeapon, WeaponData, WeaponKind, WeaponSize, WeaponUsage};
    use super::*;
    use crate::components::SkeletonRef;
    use crate::costume::WeaponCostume;

    fn single(name: &str, styles: u32) -> Weapon {
        let mut data = WeaponData::new(
            name,
            WeaponKind::Sword,
            WeaponUsage::Slash,
            WeaponSize::OneHanded,
            styles,
        );
        data.base_costume = Some(WeaponCostume::new(name, format!("res://weapons/{name}.tscn")));
        Weapon::Single(SingleWeapon::new(data, None))
    }

    fn multi() -> MultiWeapon {
        MultiWeapon::new(vec![single("alpha", 2), single("beta", 2), single("gamma", 2)])
    }

    #[test]
    fn test_switch_to_changes_index_and_resets_style() {
        let mut weapon = multi();
        if let Some(w) = weapon.child_mut(2) {
            w.set_style(1);
        }

        weapon.switch_to(2);
        assert_eq!(weapon.current_index(), 2);
        assert_eq!(weapon.current_weapon().unwrap().style(), 0);
    }

    #[test]
    fn test_switch_to_self_cycles_substyle() {
        let mut weapon = multi();
        weapon.switch_to(1);
        assert_eq!(weapon.current_weapon().unwrap().style(), 0);

        weapon.switch_to(1);
        assert_eq!(weapon.current_index(), 1);
        assert_eq!(weapon.current_weapon().unwrap().style(), 1);
    }

    #[test]
    fn test_switch_wraps_modulo_style_count() {
        let mut weapon = multi();
        weapon.switch_to(4); // 4 % 3 == 1
        assert_eq!(weapon.current_index(), 1);
    }

    #[test]
    fn test_holster_intercept_keeps_only_current_drawn() {
        let mut weapon = multi();
        let skeleton = SkeletonRef::allocate();
        propagate_inject(
            &mut weapon,
            Injection::Skeleton(Some(skeleton)),
            true,
            false,
            false,
        );
        weapon.switch_to(1);

        for (i, w) in weapon.weapons().iter().enumerate() {
            let Weapon::Single(single) = w else { unreachable!() };
            let expected = i == 1;
            assert_eq!(
                single.holster_state().is_drawn(),
                expected,
                "child {i} drawn state"
            );
        }
    }

    #[test]
    fn test_display_metadata_forwards_to_current() {
        let mut weapon = multi();
        weapon.switch_to(2);
        assert_eq!(weapon.display_name(), "gamma");
    }
}

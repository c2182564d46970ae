//! Single weapon: one definition, one costume → model binding.

use bevy::prelude::*;

use crate::action::attack::AttackBuilder;
use crate::components::{Handedness, HolsterState, SkeletonRef};
use crate::costume::{Model, WeaponCostume};
use crate::inject::{ChannelKind, InjectNode, Injection};
use crate::loadable::{LoadTransition, Loadable};
use crate::logger::log;

/// Leaf weapon. Owns its model exclusively; the model lives only while a
/// skeleton is injected and a costume can be instantiated.
#[derive(Debug)]
pub struct SingleWeapon {
    data: super::WeaponData,
    costume: Option<WeaponCostume>,
    model: Option<Model>,
    loaded: bool,
    enabled: bool,
    style: u32,
    skeleton: Option<SkeletonRef>,
    handedness: Handedness,
    holster: HolsterState,
}

impl SingleWeapon {
    /// `costume` falls back to the definition's base costume.
    pub fn new(data: super::WeaponData, costume: Option<WeaponCostume>) -> Self {
        let costume = costume.or_else(|| data.base_costume.clone());
        Self {
            data,
            costume,
            model: None,
            loaded: false,
            enabled: true,
            style: 0,
            skeleton: None,
            handedness: Handedness::default(),
            holster: HolsterState::default(),
        }
    }

    pub fn data(&self) -> &super::WeaponData {
        &self.data
    }

    pub fn costume(&self) -> Option<&WeaponCostume> {
        self.costume.as_ref()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn display_name(&self) -> &str {
        &self.data.display_name
    }

    pub fn portrait(&self) -> Option<&str> {
        self.costume.as_ref().and_then(|c| c.portraits.display())
    }

    pub fn style(&self) -> u32 {
        self.style
    }

    /// Original setter semantics: stored modulo one past the style count,
    /// so cycling input walks every style and an "overflow" notch.
    pub fn set_style(&mut self, style: u32) {
        self.style = style % (self.style_count() + 1);
    }

    pub fn style_count(&self) -> u32 {
        self.data.style_count()
    }

    pub fn skeleton(&self) -> Option<SkeletonRef> {
        self.skeleton
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn holster_state(&self) -> HolsterState {
        self.holster
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        if let Some(model) = &mut self.model {
            model.visible = self.holster.is_drawn();
        }
        true
    }

    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        if let Some(model) = &mut self.model {
            model.visible = false;
        }
        true
    }

    /// Swaps the costume and cycles the model through the loadable
    /// lifecycle. No-op when the costume is unchanged.
    pub fn set_costume(
        &mut self,
        costume: Option<WeaponCostume>,
        force_load: bool,
    ) -> Vec<LoadTransition> {
        if self.costume == costume {
            return Vec::new();
        }
        log(&format!(
            "{}: costume -> {:?}",
            self.data.display_name,
            costume.as_ref().map(|c| c.display_name.as_str())
        ));
        self.costume = costume;
        self.reload(force_load)
    }

    pub fn get_attacks(&self, target: Option<Entity>) -> Vec<AttackBuilder> {
        self.data
            .attacks
            .iter()
            .map(|attack| AttackBuilder::new(attack.clone(), target))
            .collect()
    }
}

impl Loadable for SingleWeapon {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded_flag(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn load_immediate(&mut self) -> bool {
        let Some(costume) = &self.costume else {
            return false;
        };
        let Some(mut model) = costume.instantiate(self.skeleton) else {
            return false;
        };
        model.handedness = self.handedness;
        model.visible = self.enabled && self.holster.is_drawn();
        self.model = Some(model);
        true
    }

    fn unload_immediate(&mut self) -> bool {
        // Exclusive ownership: dropping the model is the destroy.
        self.model = None;
        true
    }
}

impl InjectNode for SingleWeapon {
    fn consumes(&self, _kind: ChannelKind) -> bool {
        true
    }

    fn inject(&mut self, value: Injection) {
        match value {
            Injection::Skeleton(skeleton) => {
                self.skeleton = skeleton;
                if let Some(model) = &mut self.model {
                    model.skeleton = skeleton;
                }
                // A weapon without a rig to hang from cannot stay loaded.
                if skeleton.is_some() {
                    self.load();
                } else {
                    self.unload();
                }
            }
            Injection::Handedness(handedness) => {
                self.handedness = handedness;
                if let Some(model) = &mut self.model {
                    model.handedness = handedness;
                }
            }
            Injection::Holster(state) => {
                self.holster = state;
                if let Some(model) = &mut self.model {
                    model.visible = self.enabled && state.is_drawn();
                }
            }
        }
    }

    fn child_count(&self) -> usize {
        usize::from(self.model.is_some())
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(usize, &mut dyn InjectNode)) {
        if let Some(model) = &mut self.model {
            f(0, model);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{WeaponData, WeaponKind, WeaponSize, WeaponUsage};
    use super::*;
    use crate::inject::propagate_inject;

    fn sword_data() -> WeaponData {
        let mut data = WeaponData::new(
            "Ember Sword",
            WeaponKind::Sword,
            WeaponUsage::Slash,
            WeaponSize::OneHanded,
            2,
        );
        data.base_costume = Some(WeaponCostume::new("Ember", "res://weapons/ember.tscn"));
        data
    }

    #[test]
    fn test_style_wraps_one_past_style_count() {
        let mut weapon = SingleWeapon::new(sword_data(), None);
        assert_eq!(weapon.style_count(), 2);

        weapon.set_style(1);
        assert_eq!(weapon.style(), 1);
        weapon.set_style(2);
        assert_eq!(weapon.style(), 2); // overflow notch
        weapon.set_style(3);
        assert_eq!(weapon.style(), 0);
    }

    #[test]
    fn test_skeleton_injection_drives_load_state() {
        let mut weapon = SingleWeapon::new(sword_data(), None);
        assert!(!weapon.is_loaded());

        weapon.inject(Injection::Skeleton(Some(SkeletonRef::allocate())));
        assert!(weapon.is_loaded());
        assert!(weapon.model().is_some());

        weapon.inject(Injection::Skeleton(None));
        assert!(!weapon.is_loaded());
        assert!(weapon.model().is_none());
    }

    #[test]
    fn test_load_without_costume_fails_recoverably() {
        let mut data = sword_data();
        data.base_costume = None;
        let mut weapon = SingleWeapon::new(data, None);

        weapon.inject(Injection::Skeleton(Some(SkeletonRef::allocate())));
        assert!(!weapon.is_loaded());

        // Costume shows up later; forced reload recovers.
        let transitions =
            weapon.set_costume(Some(WeaponCostume::new("Late", "res://weapons/late.tscn")), true);
        assert_eq!(transitions, vec![LoadTransition::Loaded]);
    }

    #[test]
    fn test_costume_swap_replaces_model() {
        let mut weapon = SingleWeapon::new(sword_data(), None);
        weapon.inject(Injection::Skeleton(Some(SkeletonRef::allocate())));
        assert_eq!(weapon.model().unwrap().scene_path, "res://weapons/ember.tscn");

        let transitions = weapon.set_costume(
            Some(WeaponCostume::new("Frost", "res://weapons/frost.tscn")),
            false,
        );
        assert_eq!(
            transitions,
            vec![LoadTransition::Unloaded, LoadTransition::Loaded]
        );
        assert_eq!(weapon.model().unwrap().scene_path, "res://weapons/frost.tscn");
    }

    #[test]
    fn test_holster_hides_model() {
        let mut weapon = SingleWeapon::new(sword_data(), None);
        weapon.inject(Injection::Skeleton(Some(SkeletonRef::allocate())));
        assert!(weapon.model().unwrap().visible);

        propagate_inject(
            &mut weapon,
            Injection::Holster(HolsterState::Holstered),
            true,
            false,
            false,
        );
        assert!(!weapon.model().unwrap().visible);
        assert!(weapon.is_loaded()); // holstered, not unloaded
    }
}

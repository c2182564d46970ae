//! Akimbo weapon: a main/side pair with mirrored handedness.
//!
//! The akimbo owns the handedness of its subtree: it declares itself a
//! producer, so actor-level propagation stops here and the pair re-injects
//! internally: main gets the owner's hand, side always gets the mirror.
//! The invariant holds at every re-injection, not just at construction.

use bevy::prelude::*;

use crate::action::attack::AttackBuilder;
use crate::components::{Handedness, SkeletonRef};
use crate::inject::{propagate_inject, ChannelKind, InjectNode, Injection};
use crate::loadable::Loadable;

use super::{Weapon, WeaponPath};

#[derive(Debug)]
pub struct AkimboWeapon {
    main: Box<Weapon>,
    side: Option<Box<Weapon>>,
    skeleton: Option<SkeletonRef>,
    handedness: Handedness,
    loaded: bool,
    enabled: bool,
}

impl AkimboWeapon {
    pub fn new(main: Weapon, side: Option<Weapon>) -> Self {
        Self {
            main: Box::new(main),
            side: side.map(Box::new),
            skeleton: None,
            handedness: Handedness::default(),
            loaded: false,
            enabled: true,
        }
    }

    pub fn main(&self) -> &Weapon {
        &self.main
    }

    pub fn side(&self) -> Option<&Weapon> {
        self.side.as_deref()
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn display_name(&self) -> &str {
        self.main.display_name()
    }

    pub fn portrait(&self) -> Option<&str> {
        self.main.portrait()
    }

    /// Main's styles plus one extra notch for the side weapon.
    pub fn style_count(&self) -> u32 {
        self.main.style_count() + u32::from(self.side.is_some())
    }

    pub fn style(&self) -> u32 {
        self.main.style()
    }

    /// Routes to main until its styles are exhausted; the last notch cycles
    /// the side weapon. Out-of-range values are ignored.
    pub fn set_style(&mut self, style: u32) {
        if style < self.main.style_count() {
            self.main.set_style(style);
        } else {
            let last_style = self.style_count() - 1;
            if let Some(side) = self.side.as_deref_mut() {
                if style == last_style {
                    let next = side.style() + 1;
                    side.set_style(next);
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        self.main.enable();
        if let Some(side) = self.side.as_deref_mut() {
            side.enable();
        }
        true
    }

    pub fn disable(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.enabled = false;
        self.main.disable();
        if let Some(side) = self.side.as_deref_mut() {
            side.disable();
        }
        true
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Weapon> {
        match index {
            0 => Some(&mut self.main),
            1 => self.side.as_deref_mut(),
            _ => None,
        }
    }

    pub fn get_attacks(&self, self_path: &WeaponPath, target: Option<Entity>) -> Vec<AttackBuilder> {
        let mut builders = self.main.get_attacks(&self_path.child(0), target);
        if let Some(side) = self.side.as_deref() {
            builders.extend(side.get_attacks(&self_path.child(1), target));
        }
        builders
    }
}

impl Loadable for AkimboWeapon {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded_flag(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn load_immediate(&mut self) -> bool {
        self.main.load();
        if let Some(side) = self.side.as_deref_mut() {
            side.load();
        }
        true
    }

    fn unload_immediate(&mut self) -> bool {
        self.main.unload();
        if let Some(side) = self.side.as_deref_mut() {
            side.unload();
        }
        true
    }
}

impl InjectNode for AkimboWeapon {
    fn consumes(&self, kind: ChannelKind) -> bool {
        matches!(
            kind,
            ChannelKind::Skeleton | ChannelKind::Handedness | ChannelKind::Holster
        )
    }

    /// The pair owns `Handedness` for its subtree.
    fn provides(&self, kind: ChannelKind) -> bool {
        matches!(kind, ChannelKind::Handedness)
    }

    fn inject(&mut self, value: Injection) {
        match value {
            Injection::Skeleton(skeleton) => {
                self.skeleton = skeleton;
                propagate_inject(self.main.as_mut(), value, true, false, false);
                if let Some(side) = self.side.as_deref_mut() {
                    propagate_inject(side, value, true, false, false);
                }
            }
            Injection::Handedness(handedness) => {
                self.handedness = handedness;
                propagate_inject(
                    self.main.as_mut(),
                    Injection::Handedness(handedness),
                    true,
                    true,
                    false,
                );
                if let Some(side) = self.side.as_deref_mut() {
                    propagate_inject(
                        side,
                        Injection::Handedness(handedness.mirror()),
                        true,
                        true,
                        false,
                    );
                }
            }
            Injection::Holster(_) => {
                propagate_inject(self.main.as_mut(), value, true, false, false);
                if let Some(side) = self.side.as_deref_mut() {
                    propagate_inject(side, value, true, false, false);
                }
            }
        }
    }

    fn child_count(&self) -> usize {
        1 + usize::from(self.side.is_some())
    }

    fn intercept(&self, index: usize, value: Injection) -> Injection {
        match value {
            // Side slot is always the mirror, whichever way the value comes in.
            Injection::Handedness(h) if index == 1 => Injection::Handedness(h.mirror()),
            other => other,
        }
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(usize, &mut dyn InjectNode)) {
        f(0, self.main.as_mut());
        if let Some(side) = self.side.as_deref_mut() {
            f(1, side);
        }
    }
}

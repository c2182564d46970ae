//! Logical input surface.
//!
//! The simulation never talks to devices. The engine bridge (or a test)
//! fills an [`InputSnapshot`] resource with logical action states each
//! frame; gameplay reads it through the [`InputSource`] trait. Edge states
//! (just-pressed / just-released) live for exactly one fixed tick; the
//! clear system runs at the very end of the chain.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

/// Logical action names shared with the engine-side input map.
pub mod actions {
    pub const MOVE: &str = "move";
    pub const LOOK: &str = "look";
    pub const JUMP: &str = "jump";
    pub const CROUCH: &str = "crouch";
    pub const SPRINT: &str = "sprint";
    pub const WALK: &str = "walk";
    pub const INTERACT: &str = "interact";
    pub const EVADE: &str = "evade";
    pub const ATTACK_LIGHT: &str = "attack_light";
    pub const ATTACK_HEAVY: &str = "attack_heavy";
    pub const SWITCH_WEAPON_PRIMARY: &str = "switch_weapon_primary";
    pub const SWITCH_WEAPON_SECONDARY: &str = "switch_weapon_secondary";
    pub const SWITCH_WEAPON_TERNARY: &str = "switch_weapon_ternary";
}

/// Per-frame query surface consumed by behaviours and actions.
pub trait InputSource {
    fn is_action_pressed(&self, action: &str) -> bool;
    fn is_action_just_pressed(&self, action: &str) -> bool;
    fn is_action_just_released(&self, action: &str) -> bool;
    fn axis(&self, action: &str) -> Vec2;
    fn sensitivity(&self) -> f32;
}

/// Logical input state for the current tick.
#[derive(Resource, Debug, Clone)]
pub struct InputSnapshot {
    pressed: HashSet<String>,
    just_pressed: HashSet<String>,
    just_released: HashSet<String>,
    axes: HashMap<String, Vec2>,
    pub sensitivity: f32,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            axes: HashMap::new(),
            sensitivity: 1.0,
        }
    }
}

impl InputSnapshot {
    pub fn press(&mut self, action: &str) {
        if self.pressed.insert(action.to_string()) {
            self.just_pressed.insert(action.to_string());
        }
    }

    pub fn release(&mut self, action: &str) {
        if self.pressed.remove(action) {
            self.just_released.insert(action.to_string());
        }
    }

    pub fn set_axis(&mut self, action: &str, value: Vec2) {
        self.axes.insert(action.to_string(), value);
    }

    /// Forgets this tick's edges. Held state and axes persist.
    pub fn clear_edges(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl InputSource for InputSnapshot {
    fn is_action_pressed(&self, action: &str) -> bool {
        self.pressed.contains(action)
    }

    fn is_action_just_pressed(&self, action: &str) -> bool {
        self.just_pressed.contains(action)
    }

    fn is_action_just_released(&self, action: &str) -> bool {
        self.just_released.contains(action)
    }

    fn axis(&self, action: &str) -> Vec2 {
        self.axes.get(action).copied().unwrap_or(Vec2::ZERO)
    }

    fn sensitivity(&self) -> f32 {
        self.sensitivity
    }
}

/// End-of-tick edge cleanup.
pub fn clear_input_edges(mut input: ResMut<InputSnapshot>) {
    input.clear_edges();
}

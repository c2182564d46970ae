//! Base actor components: Actor, Health, EntityStats, Motion, plus the
//! small value types shared by the whole composition tree (SkeletonRef,
//! Handedness, HolsterState).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::action::CurrentAction;
use crate::attributes::AttributeModifiers;
use crate::behaviour::CurrentBehaviour;

/// Root actor component (player character, NPC, mount).
///
/// Required components pull in the full gameplay state: health gauge,
/// base stats, modifier stack, motion vectors, action/behaviour slots.
#[derive(Component, Debug, Clone, Default)]
#[require(
    Health,
    EntityStats,
    AttributeModifiers,
    Motion,
    Handedness,
    CurrentAction,
    CurrentBehaviour,
    Transform
)]
pub struct Actor {
    pub display_name: String,
}

impl Actor {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// Marker: actor is dead (health emptied). Gameplay systems skip these;
/// despawn is not automatic.
#[derive(Component, Debug, Default)]
pub struct Dead;

// ============================================================================
// Health gauge
// ============================================================================

/// Fired by [`Health::damage`] exactly once, when the gauge crosses to
/// empty. Carries the amount that was left right before the killing blow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthEmptied {
    pub from_amount: f32,
}

/// Health gauge.
///
/// Invariant: 0.0 <= current <= max. The emptied report fires on the
/// transition to zero only, never again while the gauge stays empty.
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Applies damage; returns the emptied report when this call crossed
    /// the gauge to zero.
    pub fn damage(&mut self, amount: f32) -> Option<HealthEmptied> {
        if !self.is_alive() {
            return None;
        }
        let before = self.current;
        self.current = (self.current - amount).max(0.0);

        if self.current <= 0.0 {
            Some(HealthEmptied {
                from_amount: before,
            })
        } else {
            None
        }
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.is_alive() {
            return;
        }
        self.current = (self.current + amount).min(self.max);
    }

    /// Re-derives the maximum (modifier changes). With `keep_ratio` the fill
    /// percentage is preserved, otherwise current is clamped into range.
    pub fn set_maximum(&mut self, max: f32, keep_ratio: bool) {
        let max = max.max(0.0);
        if (max - self.max).abs() < f32::EPSILON {
            return;
        }
        if keep_ratio && self.max > 0.0 {
            let ratio = self.current / self.max;
            self.current = max * ratio;
        }
        self.max = max;
        self.current = self.current.min(max);
    }
}

// ============================================================================
// Stats and motion
// ============================================================================

/// Base stats an actor spawns with. Effective values are these with the
/// actor's [`AttributeModifiers`] applied.
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct EntityStats {
    pub max_health: f32,
    /// Walk speed in m/s; run and sprint scale from it.
    pub move_speed: f32,
    pub jump_impulse: f32,
    pub step_height: f32,
}

impl Default for EntityStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 3.0,
            jump_impulse: 7.0,
            step_height: 0.5,
        }
    }
}

/// Decomposed velocity the movement collaborator integrates.
///
/// `inertia` is carried momentum (gravity, knockback, jumps), `movement` is
/// the intentional per-tick locomotion written by the active behaviour or
/// action. The physics layer consumes `inertia + movement`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Motion {
    pub inertia: Vec3,
    pub movement: Vec3,
}

impl Motion {
    pub fn velocity(&self) -> Vec3 {
        self.inertia + self.movement
    }

    pub fn halt(&mut self) {
        self.inertia = Vec3::ZERO;
        self.movement = Vec3::ZERO;
    }
}

// ============================================================================
// Shared value types
// ============================================================================

/// Left/right orientation. Drives weapon placement; akimbo side weapons
/// always carry the mirror of their owner's value.
#[derive(
    Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, Serialize, Deserialize,
)]
#[reflect(Component)]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl Handedness {
    pub fn mirror(self) -> Self {
        match self {
            Handedness::Right => Handedness::Left,
            Handedness::Left => Handedness::Right,
        }
    }
}

/// Whether a weapon is drawn or stowed. Holstered weapons stay loaded but
/// hide their model and refuse attack queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolsterState {
    #[default]
    Unholstered,
    Holstered,
}

impl HolsterState {
    pub fn is_drawn(self) -> bool {
        matches!(self, HolsterState::Unholstered)
    }
}

/// Opaque handle to an instantiated skeleton owned by the tactical layer.
/// The simulation only threads it through the composition tree so models
/// know what to bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkeletonRef(u64);

static NEXT_SKELETON_ID: AtomicU64 = AtomicU64::new(1);

impl SkeletonRef {
    /// Allocates a process-unique handle (monotonic, deterministic per run).
    pub fn allocate() -> Self {
        Self(NEXT_SKELETON_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_and_heal() {
        let mut health = Health::new(100.0);

        assert!(health.damage(30.0).is_none());
        assert_eq!(health.current, 70.0);
        assert!(health.is_alive());

        health.heal(10.0);
        assert_eq!(health.current, 80.0);

        health.heal(500.0); // clamped to max
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_health_emptied_fires_once_with_pre_death_amount() {
        let mut health = Health::new(100.0);
        health.damage(30.0);

        let emptied = health.damage(70.0);
        assert_eq!(emptied, Some(HealthEmptied { from_amount: 70.0 }));
        assert!(!health.is_alive());

        // Already empty: no second report, no heal
        assert!(health.damage(10.0).is_none());
        health.heal(50.0);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn test_health_set_maximum_keep_ratio() {
        let mut health = Health::new(100.0);
        health.damage(50.0);

        health.set_maximum(200.0, true);
        assert_eq!(health.max, 200.0);
        assert_eq!(health.current, 100.0); // 50% preserved

        health.set_maximum(80.0, false);
        assert_eq!(health.current, 80.0); // clamped
    }

    #[test]
    fn test_handedness_mirror() {
        assert_eq!(Handedness::Right.mirror(), Handedness::Left);
        assert_eq!(Handedness::Left.mirror(), Handedness::Right);
        assert_eq!(Handedness::Right.mirror().mirror(), Handedness::Right);
    }

    #[test]
    fn test_skeleton_refs_unique() {
        let a = SkeletonRef::allocate();
        let b = SkeletonRef::allocate();
        assert_ne!(a, b);
    }
}

//! Costume configuration and the models they instantiate.
//!
//! A costume is immutable data (display name, portraits, prefab path). Its
//! `instantiate` produces a [`Model`] bound to a skeleton: the simulation's
//! record of the visual the tactical layer spawns. Swapping a costume always
//! destroys the old model before the new one is constructed.

use serde::{Deserialize, Serialize};

use crate::components::{Handedness, HolsterState, SkeletonRef};
use crate::inject::{ChannelKind, InjectNode, Injection};

/// Portrait variants for dialogue/UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Neutral,
    Determined,
    Shocked,
    Melancholic,
}

/// Portrait art references. UI-facing metadata only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortraitSet {
    pub neutral: Option<String>,
    pub determined: Option<String>,
    pub shocked: Option<String>,
    pub melancholic: Option<String>,
}

impl PortraitSet {
    pub fn get(&self, emotion: Emotion) -> Option<&str> {
        match emotion {
            Emotion::Neutral => self.neutral.as_deref(),
            Emotion::Determined => self.determined.as_deref(),
            Emotion::Shocked => self.shocked.as_deref(),
            Emotion::Melancholic => self.melancholic.as_deref(),
        }
    }

    /// Default display portrait.
    pub fn display(&self) -> Option<&str> {
        self.neutral.as_deref()
    }
}

/// Immutable weapon costume configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponCostume {
    pub display_name: String,
    pub portraits: PortraitSet,
    /// Prefab the tactical layer spawns, e.g. "res://weapons/ember_sword.tscn".
    /// Empty means the art is not authored yet; instantiation fails
    /// (recoverable, the owner just stays unloaded).
    pub scene_path: String,
}

impl WeaponCostume {
    pub fn new(display_name: impl Into<String>, scene_path: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            portraits: PortraitSet::default(),
            scene_path: scene_path.into(),
        }
    }

    pub fn instantiate(&self, skeleton: Option<SkeletonRef>) -> Option<Model> {
        Model::spawn(&self.scene_path, skeleton)
    }
}

/// Immutable character costume configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterCostume {
    pub display_name: String,
    pub portraits: PortraitSet,
    pub scene_path: String,
}

impl CharacterCostume {
    pub fn new(display_name: impl Into<String>, scene_path: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            portraits: PortraitSet::default(),
            scene_path: scene_path.into(),
        }
    }

    pub fn instantiate(&self, skeleton: Option<SkeletonRef>) -> Option<Model> {
        Model::spawn(&self.scene_path, skeleton)
    }
}

/// Instantiated visual representation, bound to a skeleton.
///
/// Owned exclusively by the weapon/character that created it; dropping it is
/// the destroy. The tactical layer mirrors this state onto the real scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub scene_path: String,
    pub skeleton: Option<SkeletonRef>,
    pub handedness: Handedness,
    pub visible: bool,
}

impl Model {
    fn spawn(scene_path: &str, skeleton: Option<SkeletonRef>) -> Option<Self> {
        if scene_path.is_empty() {
            return None;
        }
        Some(Self {
            scene_path: scene_path.to_string(),
            skeleton,
            handedness: Handedness::Right,
            visible: true,
        })
    }
}

impl InjectNode for Model {
    fn consumes(&self, _kind: ChannelKind) -> bool {
        true
    }

    fn inject(&mut self, value: Injection) {
        match value {
            Injection::Skeleton(skeleton) => self.skeleton = skeleton,
            Injection::Handedness(handedness) => self.handedness = handedness,
            Injection::Holster(state) => self.visible = state.is_drawn(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::propagate_inject;

    #[test]
    fn test_empty_scene_path_fails_instantiation() {
        let costume = WeaponCostume::new("Unfinished", "");
        assert!(costume.instantiate(None).is_none());
    }

    #[test]
    fn test_instantiate_binds_skeleton() {
        let skeleton = SkeletonRef::allocate();
        let costume = CharacterCostume::new("Wanderer", "res://actors/wanderer.tscn");

        let model = costume.instantiate(Some(skeleton)).unwrap();
        assert_eq!(model.skeleton, Some(skeleton));
        assert!(model.visible);
    }

    #[test]
    fn test_model_consumes_all_channels() {
        let costume = WeaponCostume::new("Sword", "res://weapons/sword.tscn");
        let mut model = costume.instantiate(None).unwrap();

        propagate_inject(
            &mut model,
            Injection::Holster(HolsterState::Holstered),
            true,
            false,
            false,
        );
        assert!(!model.visible);

        propagate_inject(
            &mut model,
            Injection::Handedness(Handedness::Left),
            true,
            false,
            false,
        );
        assert_eq!(model.handedness, Handedness::Left);
    }

    #[test]
    fn test_portrait_lookup() {
        let mut costume = CharacterCostume::new("Wanderer", "res://actors/wanderer.tscn");
        costume.portraits.neutral = Some("res://ui/wanderer_neutral.png".into());

        assert_eq!(costume.portraits.display(), costume.portraits.get(Emotion::Neutral));
        assert!(costume.portraits.get(Emotion::Shocked).is_none());
    }
}

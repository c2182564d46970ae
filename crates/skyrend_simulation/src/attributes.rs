//! Attribute modifier stack.
//!
//! Actions and equipment register modifiers against named attributes;
//! effective stats are the base value with the stack applied. Evaluation
//! order is fixed: additive offsets are summed onto the base first, then all
//! percentile factors multiply the result. Reordering modifiers of the same
//! kinds never changes the outcome.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::logger::log_warning;

/// Attribute a modifier targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum Attribute {
    MaxHealth,
    MoveSpeed,
    AttackDamage,
    JumpHeight,
}

/// How a modifier combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum ModifierEffect {
    /// Flat offset, summed before any percentile factor.
    Additive(f32),
    /// Multiplicative factor (1.0 = no change), applied after all offsets.
    Percentile(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct AttributeModifier {
    pub attribute: Attribute,
    pub effect: ModifierEffect,
}

impl AttributeModifier {
    pub fn additive(attribute: Attribute, offset: f32) -> Self {
        Self {
            attribute,
            effect: ModifierEffect::Additive(offset),
        }
    }

    pub fn percentile(attribute: Attribute, factor: f32) -> Self {
        Self {
            attribute,
            effect: ModifierEffect::Percentile(factor),
        }
    }
}

/// Ordered modifier collection. Duplicates are allowed; removal takes out
/// one matching instance per request so a cancelled action never strips
/// modifiers registered by someone else.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AttributeModifiers {
    modifiers: Vec<AttributeModifier>,
}

impl AttributeModifiers {
    pub fn add(&mut self, modifier: AttributeModifier) {
        self.modifiers.push(modifier);
    }

    pub fn add_many(&mut self, modifiers: &[AttributeModifier]) {
        self.modifiers.extend_from_slice(modifiers);
    }

    /// Removes one instance per given modifier. Missing instances are
    /// logged and skipped; a double-removal bug must not cascade.
    pub fn remove_many(&mut self, modifiers: &[AttributeModifier]) {
        for modifier in modifiers {
            match self.modifiers.iter().position(|m| m == modifier) {
                Some(index) => {
                    self.modifiers.remove(index);
                }
                None => log_warning(&format!(
                    "removing modifier that is not registered: {:?}",
                    modifier
                )),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Effective value of `attribute` over `base`: additive first, then
    /// percentile.
    pub fn apply(&self, attribute: Attribute, base: f32) -> f32 {
        let mut offset = 0.0;
        let mut factor = 1.0;

        for modifier in self.modifiers.iter().filter(|m| m.attribute == attribute) {
            match modifier.effect {
                ModifierEffect::Additive(value) => offset += value,
                ModifierEffect::Percentile(value) => factor *= value,
            }
        }

        (base + offset) * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_additive_then_percentile() {
        let mut modifiers = AttributeModifiers::default();
        modifiers.add(AttributeModifier::additive(Attribute::MaxHealth, 10.0));
        modifiers.add(AttributeModifier::percentile(Attribute::MaxHealth, 1.5));

        // (100 + 10) * 1.5
        assert_eq!(modifiers.apply(Attribute::MaxHealth, 100.0), 165.0);
    }

    #[test]
    fn test_apply_order_independent_for_fixed_kinds() {
        let mut a = AttributeModifiers::default();
        a.add(AttributeModifier::additive(Attribute::MaxHealth, 10.0));
        a.add(AttributeModifier::percentile(Attribute::MaxHealth, 1.5));

        let mut b = AttributeModifiers::default();
        b.add(AttributeModifier::percentile(Attribute::MaxHealth, 1.5));
        b.add(AttributeModifier::additive(Attribute::MaxHealth, 10.0));

        assert_eq!(
            a.apply(Attribute::MaxHealth, 100.0),
            b.apply(Attribute::MaxHealth, 100.0)
        );
    }

    #[test]
    fn test_apply_ignores_other_attributes() {
        let mut modifiers = AttributeModifiers::default();
        modifiers.add(AttributeModifier::additive(Attribute::MoveSpeed, 2.0));

        assert_eq!(modifiers.apply(Attribute::MaxHealth, 100.0), 100.0);
        assert_eq!(modifiers.apply(Attribute::MoveSpeed, 3.0), 5.0);
    }

    #[test]
    fn test_duplicates_stack() {
        let mut modifiers = AttributeModifiers::default();
        let boost = AttributeModifier::additive(Attribute::AttackDamage, 5.0);
        modifiers.add(boost);
        modifiers.add(boost);

        assert_eq!(modifiers.apply(Attribute::AttackDamage, 20.0), 30.0);
    }

    #[test]
    fn test_remove_many_takes_one_instance_each() {
        let boost = AttributeModifier::additive(Attribute::AttackDamage, 5.0);
        let mut modifiers = AttributeModifiers::default();
        modifiers.add(boost);
        modifiers.add(boost);

        modifiers.remove_many(&[boost]);
        assert_eq!(modifiers.len(), 1);
        assert_eq!(modifiers.apply(Attribute::AttackDamage, 20.0), 25.0);

        // Removing something never registered is absorbed
        modifiers.remove_many(&[AttributeModifier::percentile(Attribute::MoveSpeed, 2.0)]);
        assert_eq!(modifiers.len(), 1);
    }
}

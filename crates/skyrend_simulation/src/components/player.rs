//! Player control marker component.

use bevy::prelude::Component;

/// Marks the entity the player currently controls.
///
/// Input routing systems use a `With<Player>` filter; everything else
/// ignores the marker. Possession swap is a remove + insert:
///
/// ```ignore
/// commands.entity(old_actor).remove::<Player>();
/// commands.entity(new_actor).insert(Player);
/// ```
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

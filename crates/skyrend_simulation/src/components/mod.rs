//! ECS components shared across the simulation.
//!
//! Domain layout:
//! - actor: base state (Actor, Health, EntityStats, Motion) and the shared
//!   value types (Handedness, HolsterState, SkeletonRef)
//! - player: player control marker

pub mod actor;
pub mod player;

pub use actor::*;
pub use player::*;

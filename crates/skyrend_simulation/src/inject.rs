//! Typed dependency propagation through the composition tree.
//!
//! # Architecture
//!
//! Three independent channels flow from an actor down into its character
//! model and weapon subtrees:
//! - `Skeleton`: which rig models bind to (cleared on character unload)
//! - `Handedness`: weapon placement side
//! - `Holster`: drawn/stowed, drives model visibility
//!
//! Nodes declare what they consume and what they produce through the
//! [`InjectNode`] capability surface instead of runtime type checks. A node
//! that *produces* a channel (an injector) owns that value for its subtree:
//! outer propagation stops at it unless explicitly passed through, and the
//! node re-propagates internally (an akimbo weapon injects the mirrored
//! handedness into its side slot).
//!
//! Parents may intercept the value per child before descent: a multi
//! weapon forces `Holstered` onto every child except the current one.

use crate::components::{Handedness, HolsterState, SkeletonRef};

/// Channel discriminant for capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Skeleton,
    Handedness,
    Holster,
}

/// A value travelling down one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Injection {
    Skeleton(Option<SkeletonRef>),
    Handedness(Handedness),
    Holster(HolsterState),
}

impl Injection {
    pub fn kind(&self) -> ChannelKind {
        match self {
            Injection::Skeleton(_) => ChannelKind::Skeleton,
            Injection::Handedness(_) => ChannelKind::Handedness,
            Injection::Holster(_) => ChannelKind::Holster,
        }
    }
}

/// Capability surface of a composition-tree node.
///
/// Defaults describe an inert leaf; implementors override what applies.
pub trait InjectNode {
    /// Does this node consume values on `kind`?
    fn consumes(&self, kind: ChannelKind) -> bool {
        let _ = kind;
        false
    }

    /// Does this node produce `kind` for its own subtree (injector)?
    fn provides(&self, kind: ChannelKind) -> bool {
        let _ = kind;
        false
    }

    /// Deliver a value. Only called when `consumes(value.kind())` holds.
    fn inject(&mut self, value: Injection) {
        let _ = value;
    }

    fn child_count(&self) -> usize {
        0
    }

    /// Transform the value handed to child `index` (interceptor).
    fn intercept(&self, index: usize, value: Injection) -> Injection {
        let _ = index;
        value
    }

    fn for_each_child(&mut self, f: &mut dyn FnMut(usize, &mut dyn InjectNode)) {
        let _ = f;
    }
}

/// Delivers `value` to `node` alone, respecting its consumption declaration.
pub fn inject(node: &mut dyn InjectNode, value: Injection) {
    if node.consumes(value.kind()) {
        node.inject(value);
    }
}

/// Walks the subtree rooted at `node`, delivering `value` to every consumer.
///
/// - `parent_first` injects the root before its descendants, otherwise after
/// - `stop_at_injector` halts descent at any node producing the channel
///   (the node itself is still injected); `pass_through_this_injector`
///   overrides that for the root node only and never recurses
pub fn propagate_inject(
    node: &mut dyn InjectNode,
    value: Injection,
    parent_first: bool,
    stop_at_injector: bool,
    pass_through_this_injector: bool,
) {
    let kind = value.kind();

    if stop_at_injector && !pass_through_this_injector && node.provides(kind) {
        inject(node, value);
        return;
    }

    if parent_first {
        inject(node, value);
    }

    // Interceptors run against &self before descending, so per-child values
    // are fixed before any child mutates.
    let child_values: Vec<Injection> = (0..node.child_count())
        .map(|i| node.intercept(i, value))
        .collect();

    node.for_each_child(&mut |i, child| {
        propagate_inject(child, child_values[i], parent_first, stop_at_injector, false);
    });

    if !parent_first {
        inject(node, value);
    }
}

//! Per-tick deferred-call queue.
//!
//! Structural changes requested while a tree is being walked (a behaviour
//! asking to replace itself from inside its own tick) must not run in
//! place. They queue here instead, FIFO, and the drain system runs at the
//! end of the `FixedUpdate` chain, after every traversal of the current
//! tick, before the next tick's input processing. Calls queued during the
//! drain run on the next tick.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::behaviour::BehaviourRequest;

/// A deferred structural mutation.
#[derive(Debug, Clone)]
pub enum DeferredCall {
    SetBehaviour {
        entity: Entity,
        request: BehaviourRequest,
    },
}

#[derive(Resource, Debug, Default)]
pub struct DeferredQueue {
    calls: VecDeque<DeferredCall>,
}

impl DeferredQueue {
    pub fn push(&mut self, call: DeferredCall) {
        self.calls.push_back(call);
    }

    /// Takes everything queued so far, in FIFO order.
    pub fn take_pending(&mut self) -> Vec<DeferredCall> {
        self.calls.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = DeferredQueue::default();
        queue.push(DeferredCall::SetBehaviour {
            entity: Entity::PLACEHOLDER,
            request: BehaviourRequest::Biped,
        });
        queue.push(DeferredCall::SetBehaviour {
            entity: Entity::PLACEHOLDER,
            request: BehaviourRequest::Clear,
        });

        let pending = queue.take_pending();
        assert_eq!(pending.len(), 2);
        assert!(matches!(
            pending[0],
            DeferredCall::SetBehaviour {
                request: BehaviourRequest::Biped,
                ..
            }
        ));
        assert!(queue.is_empty());
    }
}

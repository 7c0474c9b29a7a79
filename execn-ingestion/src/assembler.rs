// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Maintains the pool of blocks whose parent state or transaction
//! collections are not yet fully resolved, and promotes blocks to the ready
//! queue once both are satisfied.

use crate::error::AssemblerError;
use execn_notifier::Notifier;
use execn_types::{Block, Collection, ExecutableBlock, Identifier, StateCommitment};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct Pending {
    blocks: HashMap<Identifier, ExecutableBlock>,
    /// Index from a not-yet-resolved collection id to every pending block
    /// that references it, so a single `on_collection_received` can attach
    /// the collection to all of them.
    waiting_on_collection: HashMap<Identifier, Vec<Identifier>>,
}

/// Accepts inbound blocks, tracks their dependencies, and hands off fully
/// resolved blocks to the scheduler via a shared ready queue.
///
/// Cheap to clone: the pending-block map and ready queue are shared behind
/// an `Arc`, matching the assembler's role as an entry point called
/// concurrently from network and collection-delivery callbacks.
#[derive(Clone)]
pub struct Assembler {
    pending: Arc<Mutex<Pending>>,
    ready: Arc<Mutex<Vec<ExecutableBlock>>>,
    ready_notifier: Notifier,
    genesis_id: Identifier,
}

impl Assembler {
    pub fn new(genesis_id: Identifier, ready_notifier: Notifier) -> Self {
        Assembler {
            pending: Arc::new(Mutex::new(Pending {
                blocks: HashMap::new(),
                waiting_on_collection: HashMap::new(),
            })),
            ready: Arc::new(Mutex::new(Vec::new())),
            ready_notifier,
            genesis_id,
        }
    }

    /// Drains every block currently in the ready queue.
    pub fn drain_ready(&self) -> Vec<ExecutableBlock> {
        std::mem::take(&mut *self.ready.lock())
    }

    /// Current depth of the ready queue, used by the engine to enforce
    /// backpressure before it even calls [`Self::handle_block`].
    pub fn ready_len(&self) -> usize {
        self.ready.lock().len()
    }

    /// Accepts a new block. The parent must already be known to the
    /// assembler (via a prior `handle_block`) or be `genesis_id`, the one
    /// block allowed to bootstrap with no parent on file.
    ///
    /// If the parent's post-state is already known (via `on_parent_executed`
    /// or because the parent is `genesis_id`, whose start state the caller
    /// supplies out of band as part of bootstrap), `start_state` is attached
    /// immediately.
    pub fn handle_block(
        &self,
        block: Block,
        parent_start_state: Option<StateCommitment>,
    ) -> Result<(), AssemblerError> {
        let block_id = block.id().expect("block id hashing cannot fail");
        let parent_id = block.parent_id();

        let mut pending = self.pending.lock();
        let parent_known = block.is_genesis()
            || parent_id == self.genesis_id
            || pending.blocks.contains_key(&parent_id)
            || parent_start_state.is_some();
        if !parent_known {
            return Err(AssemblerError::ParentUnknown {
                block_id,
                parent_id,
            });
        }

        let mut executable = ExecutableBlock::new(block);
        executable.start_state = parent_start_state;

        for missing in executable.missing_collection_ids() {
            pending
                .waiting_on_collection
                .entry(missing)
                .or_default()
                .push(block_id);
        }

        let promote = executable.is_executable();
        pending.blocks.insert(block_id, executable);
        drop(pending);

        if promote {
            self.promote(block_id);
        }

        Ok(())
    }

    /// Attaches `collection` to every pending block that references it.
    pub fn on_collection_received(&self, collection_id: Identifier, collection: Collection) {
        let mut pending = self.pending.lock();
        let Some(waiters) = pending.waiting_on_collection.remove(&collection_id) else {
            return;
        };

        let mut newly_ready = Vec::new();
        for block_id in waiters {
            if let Some(executable) = pending.blocks.get_mut(&block_id) {
                executable
                    .complete_collections
                    .insert(collection_id, collection.clone());
                if executable.is_executable() {
                    newly_ready.push(block_id);
                }
            }
        }
        drop(pending);

        for block_id in newly_ready {
            self.promote(block_id);
        }
    }

    /// Propagates a parent's freshly-announced post-state to every pending
    /// direct child, potentially promoting them to the ready queue.
    pub fn on_parent_executed(&self, parent_id: Identifier, post_state: StateCommitment) {
        let mut pending = self.pending.lock();
        let mut newly_ready = Vec::new();
        for (block_id, executable) in pending.blocks.iter_mut() {
            if executable.block.parent_id() == parent_id && executable.start_state.is_none() {
                executable.start_state = Some(post_state);
                if executable.is_executable() {
                    newly_ready.push(*block_id);
                }
            }
        }
        drop(pending);

        for block_id in newly_ready {
            self.promote(block_id);
        }
    }

    /// Returns `true` if `block_id` is still tracked (pending or ready) by
    /// this assembler, i.e. has not yet been consumed by the scheduler.
    pub fn is_tracked(&self, block_id: Identifier) -> bool {
        self.pending.lock().blocks.contains_key(&block_id)
    }

    fn promote(&self, block_id: Identifier) {
        let mut pending = self.pending.lock();
        let Some(executable) = pending.blocks.remove(&block_id) else {
            return;
        };
        drop(pending);

        self.ready.lock().push(executable);
        self.ready_notifier.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use execn_types::CollectionGuarantee;

    fn child_block(parent: &Block, guarantees: Vec<CollectionGuarantee>) -> Block {
        Block::child_of(parent, Identifier::random(), guarantees).unwrap()
    }

    #[test]
    fn rejects_block_with_unknown_parent() {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let assembler = Assembler::new(genesis.id().unwrap(), Notifier::new());
        let orphan = child_block(&Block::genesis(Identifier::random()).unwrap(), vec![]);
        let err = assembler.handle_block(orphan, None).unwrap_err();
        assert!(matches!(err, AssemblerError::ParentUnknown { .. }));
    }

    #[test]
    fn becomes_ready_immediately_with_no_guarantees_and_known_start_state() {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let assembler = Assembler::new(genesis.id().unwrap(), Notifier::new());
        let child = child_block(&genesis, vec![]);
        assembler
            .handle_block(child.clone(), Some(StateCommitment::dummy()))
            .unwrap();

        let ready = assembler.drain_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].block.id().unwrap(), child.id().unwrap());
    }

    #[test]
    fn waits_for_start_state_then_collection_before_promoting() {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let assembler = Assembler::new(genesis.id().unwrap(), Notifier::new());

        let collection_id = Identifier::random();
        let guarantee = CollectionGuarantee {
            collection_id,
            signer_indices: vec![],
            signer_count: 0,
        };
        let child = child_block(&genesis, vec![guarantee]);
        assembler.handle_block(child.clone(), None).unwrap();
        assert!(assembler.drain_ready().is_empty());

        assembler.on_collection_received(collection_id, Collection::empty());
        assert!(
            assembler.drain_ready().is_empty(),
            "start state still unknown"
        );

        assembler.on_parent_executed(genesis.id().unwrap(), StateCommitment::dummy());
        let ready = assembler.drain_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].block.id().unwrap(), child.id().unwrap());
    }

    #[test]
    fn collection_arriving_before_parent_execution_still_promotes_once_both_resolve() {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let assembler = Assembler::new(genesis.id().unwrap(), Notifier::new());

        let collection_id = Identifier::random();
        let guarantee = CollectionGuarantee {
            collection_id,
            signer_indices: vec![],
            signer_count: 0,
        };
        let child = child_block(&genesis, vec![guarantee]);
        assembler.handle_block(child.clone(), None).unwrap();

        assembler.on_parent_executed(genesis.id().unwrap(), StateCommitment::dummy());
        assert!(assembler.drain_ready().is_empty());

        assembler.on_collection_received(collection_id, Collection::empty());
        let ready = assembler.drain_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].block.id().unwrap(), child.id().unwrap());
    }

    #[test]
    fn one_collection_promotes_multiple_waiting_blocks() {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let assembler = Assembler::new(genesis.id().unwrap(), Notifier::new());

        let collection_id = Identifier::random();
        let guarantee = CollectionGuarantee {
            collection_id,
            signer_indices: vec![],
            signer_count: 0,
        };
        let block_a = child_block(&genesis, vec![guarantee.clone()]);
        let block_b = Block::child_of(&block_a, Identifier::random(), vec![guarantee]).unwrap();

        assembler
            .handle_block(block_a.clone(), Some(StateCommitment::dummy()))
            .unwrap();
        // block_b's parent (block_a) is known to the assembler (still pending),
        // so it is accepted even though block_a has not yet been executed.
        assembler.handle_block(block_b.clone(), None).unwrap();

        assembler.on_collection_received(collection_id, Collection::empty());
        let ready = assembler.drain_ready();
        assert_eq!(ready.len(), 1, "only block_a has a known start state");
        assert_eq!(ready[0].block.id().unwrap(), block_a.id().unwrap());
    }
}

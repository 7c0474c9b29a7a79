// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! The fork-aware startup recovery scan: figures out which finalized blocks
//! and which pending (not-yet-finalized) blocks still need to be executed.
//!
//! Finalized blocks form a single chain, so `finalized_unexecuted` is found
//! by walking backward from the finalized tip via `parent_id` until the
//! first already-executed ancestor. Pending blocks form a DAG rooted at the
//! finalized tip; `pending_unexecuted` is a breadth-first walk of that DAG.
//! A block on a fork that never descends from the finalized tip is outside
//! the walk entirely and is correctly never visited — that is what "a
//! conflicting block is excluded" reduces to once execution only ever
//! proceeds along descendants of the finalized chain.

use crate::error::RecoveryError;
use crate::traits::{ExecutionStateStore, ProtocolState};
use execn_types::Identifier;
use std::collections::VecDeque;

/// Returns `(finalized_unexecuted, pending_unexecuted)`:
/// - `finalized_unexecuted`: ids of unexecuted blocks on the finalized chain,
///   in ascending height order.
/// - `pending_unexecuted`: ids of unexecuted blocks descending from the
///   finalized tip, in breadth-first order.
pub fn unexecuted_blocks(
    protocol: &dyn ProtocolState,
    execution_state: &dyn ExecutionStateStore,
) -> Result<(Vec<Identifier>, Vec<Identifier>), RecoveryError> {
    let last_final = protocol.final_block();
    let finalized_unexecuted = finalized_chain_unexecuted(protocol, execution_state, last_final)?;
    let pending_unexecuted = pending_descendants_unexecuted(protocol, execution_state, last_final);
    Ok((finalized_unexecuted, pending_unexecuted))
}

fn finalized_chain_unexecuted(
    protocol: &dyn ProtocolState,
    execution_state: &dyn ExecutionStateStore,
    last_final: Identifier,
) -> Result<Vec<Identifier>, RecoveryError> {
    let mut unexecuted = Vec::new();
    let mut current = last_final;

    loop {
        if execution_state
            .state_commitment_by_block_id(current)
            .is_some()
        {
            break;
        }
        unexecuted.push(current);

        let block = protocol
            .block(current)
            .ok_or(RecoveryError::MissingFinalizedBlock(current))?;
        if block.is_genesis() {
            break;
        }
        current = block.parent_id();
    }

    unexecuted.reverse();
    Ok(unexecuted)
}

fn pending_descendants_unexecuted(
    protocol: &dyn ProtocolState,
    execution_state: &dyn ExecutionStateStore,
    last_final: Identifier,
) -> Vec<Identifier> {
    let mut pending = Vec::new();
    let mut queue: VecDeque<Identifier> = protocol.children(last_final).into();

    while let Some(id) = queue.pop_front() {
        if execution_state.state_commitment_by_block_id(id).is_none() {
            pending.push(id);
        }
        queue.extend(protocol.children(id));
    }

    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryExecutionState, MockProtocolState};
    use execn_types::Block;
    use std::collections::HashSet;

    fn chain_of(n: usize) -> (MockProtocolState, Vec<Block>) {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let ps = MockProtocolState::bootstrap(genesis.clone());
        let mut blocks = vec![genesis];
        for _ in 0..n {
            let next = Block::child_of(blocks.last().unwrap(), Identifier::random(), vec![]).unwrap();
            ps.extend(next.clone());
            blocks.push(next);
        }
        (ps, blocks)
    }

    fn ids(blocks: &[Block]) -> Vec<Identifier> {
        blocks.iter().map(|b| b.id().unwrap()).collect()
    }

    fn assert_set_eq(actual: Vec<Identifier>, expected: Vec<Identifier>) {
        let a: HashSet<_> = actual.into_iter().collect();
        let e: HashSet<_> = expected.into_iter().collect();
        assert_eq!(a, e);
    }

    #[test]
    fn only_genesis_has_nothing_unexecuted() {
        let (ps, blocks) = chain_of(0);
        let genesis_id = blocks[0].id().unwrap();
        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis_id, execn_types::StateCommitment::dummy());

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert!(finalized.is_empty());
        assert!(pending.is_empty());
    }

    #[test]
    fn nothing_finalized_all_pending_unexecuted() {
        let (ps, blocks) = chain_of(4);
        let genesis_id = blocks[0].id().unwrap();
        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis_id, execn_types::StateCommitment::dummy());

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert!(finalized.is_empty());
        assert_set_eq(pending, ids(&blocks[1..]));
    }

    #[test]
    fn some_pending_executed() {
        let (ps, blocks) = chain_of(4);
        let genesis_id = blocks[0].id().unwrap();
        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis_id, execn_types::StateCommitment::dummy());
        es.mark_executed(blocks[1].id().unwrap(), execn_types::StateCommitment::dummy());
        es.mark_executed(blocks[2].id().unwrap(), execn_types::StateCommitment::dummy());

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert!(finalized.is_empty());
        assert_set_eq(pending, ids(&blocks[3..]));
    }

    #[test]
    fn finalized_chain_includes_unexecuted_ancestors_in_ascending_order() {
        let (ps, blocks) = chain_of(4);
        let genesis_id = blocks[0].id().unwrap();
        ps.finalize(blocks[3].id().unwrap());
        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis_id, execn_types::StateCommitment::dummy());
        es.mark_executed(blocks[1].id().unwrap(), execn_types::StateCommitment::dummy());

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert_eq!(finalized, vec![blocks[2].id().unwrap(), blocks[3].id().unwrap()]);
        assert_set_eq(pending, ids(&blocks[4..]));
    }

    #[test]
    fn all_finalized_executed_leaves_only_pending() {
        let (ps, blocks) = chain_of(4);
        let genesis_id = blocks[0].id().unwrap();
        ps.finalize(blocks[3].id().unwrap());
        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis_id, execn_types::StateCommitment::dummy());
        for b in &blocks[1..=3] {
            es.mark_executed(b.id().unwrap(), execn_types::StateCommitment::dummy());
        }

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert!(finalized.is_empty());
        assert_set_eq(pending, ids(&blocks[4..]));
    }

    #[test]
    fn all_executed_nothing_left() {
        let (ps, blocks) = chain_of(4);
        let genesis_id = blocks[0].id().unwrap();
        ps.finalize(blocks[0].id().unwrap());
        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis_id, execn_types::StateCommitment::dummy());
        for b in &blocks[1..] {
            es.mark_executed(b.id().unwrap(), execn_types::StateCommitment::dummy());
        }

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert!(finalized.is_empty());
        assert!(pending.is_empty());
    }

    /// Pins the exact scenario from this engine's test suite: Genesis <- A <-
    /// B <- C(final) <- D <- E <- F, with forks D <- G <- H, C <- I, and B <-
    /// J <- K. Once C is finalized and A, B, C, D, G, J are executed, J and
    /// K sit on a fork that never descends from C, the finalized tip — they
    /// are outside the walk entirely, not merely "excluded as conflicting".
    #[test]
    fn fork_off_an_earlier_ancestor_is_never_visited() {
        let genesis = Block::genesis(Identifier::random()).unwrap();
        let ps = MockProtocolState::bootstrap(genesis.clone());
        let a = Block::child_of(&genesis, Identifier::random(), vec![]).unwrap();
        ps.extend(a.clone());
        let b = Block::child_of(&a, Identifier::random(), vec![]).unwrap();
        ps.extend(b.clone());
        let c = Block::child_of(&b, Identifier::random(), vec![]).unwrap();
        ps.extend(c.clone());
        let d = Block::child_of(&c, Identifier::random(), vec![]).unwrap();
        ps.extend(d.clone());
        let e = Block::child_of(&d, Identifier::random(), vec![]).unwrap();
        ps.extend(e.clone());
        let f = Block::child_of(&e, Identifier::random(), vec![]).unwrap();
        ps.extend(f.clone());

        let g = Block::child_of(&d, Identifier::random(), vec![]).unwrap();
        ps.extend(g.clone());
        let h = Block::child_of(&g, Identifier::random(), vec![]).unwrap();
        ps.extend(h.clone());

        let i = Block::child_of(&c, Identifier::random(), vec![]).unwrap();
        ps.extend(i.clone());

        let j = Block::child_of(&b, Identifier::random(), vec![]).unwrap();
        ps.extend(j.clone());
        let k = Block::child_of(&j, Identifier::random(), vec![]).unwrap();
        ps.extend(k.clone());

        ps.finalize(c.id().unwrap());

        let es = InMemoryExecutionState::new();
        es.seed_genesis(genesis.id().unwrap(), execn_types::StateCommitment::dummy());
        for block in [&a, &b, &c, &d, &g, &j] {
            es.mark_executed(block.id().unwrap(), execn_types::StateCommitment::dummy());
        }

        let (finalized, pending) = unexecuted_blocks(&ps, &es).unwrap();
        assert!(finalized.is_empty());
        // K is never visited: it descends from J, a sibling fork of the
        // finalized chain rooted at B, not from the finalized tip C.
        assert!(!pending.contains(&k.id().unwrap()));
        assert_set_eq(
            pending,
            vec![i.id().unwrap(), e.id().unwrap(), f.id().unwrap(), h.id().unwrap()],
        );
    }
}

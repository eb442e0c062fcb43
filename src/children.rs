//! Keyed/unkeyed child-list reconciliation.
//!
//! Given two ordered child sequences this computes the op program that turns
//! the `before` list into the `after` list, plus the matched pairs the
//! differ recurses into. Keyed children match by key across any distance;
//! unkeyed children match positionally among themselves; a keyed child is
//! never matched to an unkeyed one by position. Movement is minimized with a
//! longest-increasing-subsequence over the matched `before` indices in
//! `after` order: children on that subsequence stay put, everything else
//! moves.
use crate::vnode::VTree;
use std::collections::{HashMap, HashSet};

/// One step of the child-op program. Ops execute sequentially; every index
/// refers to the parent's child list as it stands when the op runs.
#[derive(Clone, Debug)]
pub enum ChildOp {
    /// Realize `node` and insert it at `index`.
    Insert { index: usize, node: VTree },
    /// Remove (and destroy) the child at `index`.
    Remove { index: usize },
    /// Detach the child at `from` and reinsert it at `to`.
    Move { from: usize, to: usize },
}

/// A `before` child paired with its `after` counterpart; only these pairs
/// are diffed recursively. Inserted and removed children are realized or
/// destroyed wholesale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchedPair {
    pub before_index: usize,
    pub after_index: usize,
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub ops: Vec<ChildOp>,
    pub pairs: Vec<MatchedPair>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Before(usize),
    New(usize),
}

/// Reconcile two ordered child sequences.
pub fn reconcile(before: &[VTree], after: &[VTree]) -> Reconciliation {
    // Partition `before`: first occurrence of a key wins; duplicates are
    // demoted to the unkeyed pool.
    let mut before_by_key: HashMap<&str, usize> = HashMap::new();
    let mut before_unkeyed: Vec<usize> = Vec::new();
    for (i, child) in before.iter().enumerate() {
        match child.key() {
            Some(key) if !before_by_key.contains_key(key) => {
                before_by_key.insert(key, i);
            }
            _ => before_unkeyed.push(i),
        }
    }

    // Match every `after` child to a `before` index, or None for insertions.
    let mut matched: Vec<Option<usize>> = Vec::with_capacity(after.len());
    let mut seen_after_keys: HashSet<&str> = HashSet::new();
    let mut unkeyed_cursor = 0usize;
    for child in after {
        let slot = match child.key() {
            Some(key) if seen_after_keys.insert(key) => before_by_key.get(key).copied(),
            _ => {
                let slot = before_unkeyed.get(unkeyed_cursor).copied();
                if slot.is_some() {
                    unkeyed_cursor += 1;
                }
                slot
            }
        };
        matched.push(slot);
    }

    let matched_before: HashSet<usize> = matched.iter().flatten().copied().collect();

    // Removals first, in descending index order so each index is valid both
    // in the original `before` list and at execution time.
    let mut ops = Vec::new();
    for index in (0..before.len()).rev() {
        if !matched_before.contains(&index) {
            ops.push(ChildOp::Remove { index });
        }
    }

    // Children on the LIS keep their position; the rest are moved.
    let seq: Vec<usize> = matched.iter().flatten().copied().collect();
    let stable: HashSet<usize> = longest_increasing_subsequence(&seq)
        .into_iter()
        .map(|position| seq[position])
        .collect();

    // Generate moves/inserts back-to-front against a simulated child list,
    // anchoring each placement before the child that follows it. The applier
    // replays these ops literally.
    let mut current: Vec<Slot> = (0..before.len())
        .filter(|index| matched_before.contains(index))
        .map(Slot::Before)
        .collect();
    let mut anchor: Option<Slot> = None;
    for (after_index, slot_source) in matched.iter().enumerate().rev() {
        let slot = match slot_source {
            Some(before_index) => Slot::Before(*before_index),
            None => Slot::New(after_index),
        };
        match slot_source {
            None => {
                let at = anchor
                    .and_then(|a| current.iter().position(|&s| s == a))
                    .unwrap_or(current.len());
                current.insert(at, slot);
                ops.push(ChildOp::Insert {
                    index: at,
                    node: after[after_index].clone(),
                });
            }
            Some(before_index) if !stable.contains(before_index) => {
                let from = current.iter().position(|&s| s == slot).unwrap();
                current.remove(from);
                let at = anchor
                    .and_then(|a| current.iter().position(|&s| s == a))
                    .unwrap_or(current.len());
                current.insert(at, slot);
                if from != at {
                    ops.push(ChildOp::Move { from, to: at });
                }
            }
            Some(_) => {}
        }
        anchor = Some(slot);
    }

    debug_assert_eq!(
        current,
        matched
            .iter()
            .enumerate()
            .map(|(i, s)| match s {
                Some(b) => Slot::Before(*b),
                None => Slot::New(i),
            })
            .collect::<Vec<_>>(),
        "child-op program must reproduce the after ordering"
    );

    let pairs = matched
        .iter()
        .enumerate()
        .filter_map(|(after_index, slot)| {
            slot.map(|before_index| MatchedPair {
                before_index,
                after_index,
            })
        })
        .collect();

    log::trace!(
        "reconciled children: {} before, {} after, {} ops",
        before.len(),
        after.len(),
        ops.len()
    );
    Reconciliation { ops, pairs }
}

/// O(n log n) longest increasing subsequence; returns positions into `seq`
/// in increasing order. Each tail slot greedily keeps the smallest feasible
/// value, so ties between equally long subsequences resolve toward smaller
/// elements; the result is reconstructed through predecessor links.
pub(crate) fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    if seq.is_empty() {
        return Vec::new();
    }

    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors = vec![usize::MAX; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let mut low = 0;
        let mut high = tails.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if seq[tails[mid]] < value {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        if low > 0 {
            predecessors[i] = tails[low - 1];
        }
        if low == tails.len() {
            tails.push(i);
        } else {
            tails[low] = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut k = tails[tails.len() - 1];
    loop {
        out.push(k);
        if predecessors[k] == usize::MAX {
            break;
        }
        k = predecessors[k];
    }
    out.reverse();
    out
}

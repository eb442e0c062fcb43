//! Pre-order addressing shared by the differ (virtual side) and the applier
//! (live side).
//!
//! Both sides walk the same deterministic pre-order: a node before its
//! children, children in their given order. Widgets occupy exactly one
//! address and are never descended into; thunks are transparent, standing
//! for their resolved tree. Keeping the two walks in this one module is what
//! guarantees that an address computed from the virtual `before` tree
//! resolves to the matching node in a live tree realized from it.
use crate::errors::ReconcileError;
use crate::lifecycle;
use crate::live::{LiveKind, LiveNode};
use crate::vnode::VTree;
use std::collections::{HashMap, HashSet};

/// Number of addresses a subtree occupies. Thunks resolve through their
/// cache (rendering with no previous value if never resolved).
pub fn subtree_size(node: &VTree) -> Result<usize, ReconcileError> {
    match node {
        VTree::Text(_) | VTree::Widget(_) => Ok(1),
        VTree::Element(el) => {
            let mut total = 1;
            for child in &el.children {
                total += subtree_size(child)?;
            }
            Ok(total)
        }
        VTree::Thunk(_) => subtree_size(&lifecycle::resolved_view(node)?),
    }
}

/// Pre-order address of `target` within `root`, by pointer identity.
pub fn address_of(root: &VTree, target: &VTree) -> Result<Option<usize>, ReconcileError> {
    let mut cursor = 0;
    find_address(root, target, &mut cursor)
}

fn find_address(
    node: &VTree,
    target: &VTree,
    cursor: &mut usize,
) -> Result<Option<usize>, ReconcileError> {
    if VTree::ptr_eq(node, target) {
        return Ok(Some(*cursor));
    }
    if let VTree::Thunk(_) = node {
        // a thunk shares its address space with its resolved tree
        return find_address(&lifecycle::resolved_view(node)?, target, cursor);
    }
    *cursor += 1;
    if let VTree::Element(el) = node {
        for child in &el.children {
            if let Some(found) = find_address(child, target, cursor)? {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

/// Resolve one address against a live tree.
pub fn resolve_live(root: &LiveNode, address: usize) -> Result<LiveNode, ReconcileError> {
    let resolved = resolve_live_many(root, &[address])?;
    // resolve_live_many errors on any missing address
    Ok(resolved[&address].clone())
}

/// Resolve a set of addresses against a live tree in a single pre-order
/// pass. Any address beyond the tree is an `Addressing` error: the patch
/// list was computed against a tree this one does not structurally match.
pub fn resolve_live_many(
    root: &LiveNode,
    addresses: &[usize],
) -> Result<HashMap<usize, LiveNode>, ReconcileError> {
    let wanted: HashSet<usize> = addresses.iter().copied().collect();
    let mut found = HashMap::with_capacity(wanted.len());
    let mut cursor = 0;
    collect_live(root, &wanted, &mut found, &mut cursor);
    for address in &wanted {
        if !found.contains_key(address) {
            return Err(ReconcileError::addressing(
                *address,
                format!("live tree has only {} addressable nodes", cursor),
            ));
        }
    }
    Ok(found)
}

fn collect_live(
    node: &LiveNode,
    wanted: &HashSet<usize>,
    found: &mut HashMap<usize, LiveNode>,
    cursor: &mut usize,
) {
    if wanted.contains(cursor) {
        found.insert(*cursor, node.clone());
    }
    *cursor += 1;
    if let LiveKind::Element(el) = &node.data().kind {
        for child in &el.children {
            collect_live(child, wanted, found, cursor);
        }
    }
}

//! Patch application: resolve every patched address in one indexer pass,
//! then mutate the live tree in increasing address order.
//!
//! Handles are captured against the pre-mutation tree, so an Order patch at
//! a parent cannot invalidate the targets of later patches inside its
//! children. Replace swaps node contents in place, which keeps the root
//! handle valid even when the root itself is replaced.
use crate::children::ChildOp;
use crate::errors::ReconcileError;
use crate::index;
use crate::lifecycle;
use crate::live::{LiveKind, LiveNode, LiveNodeData};
use crate::patch::{MapEdit, Patch, PatchKind, PropsPatch};
use crate::realize::realize;
use crate::vnode::{PropHook, PropValue};
use std::rc::Rc;

/// Apply a patch list to the live tree it was computed against.
pub fn apply(root: &LiveNode, patches: &[Patch]) -> Result<(), ReconcileError> {
    if patches.is_empty() {
        return Ok(());
    }

    let mut ordered: Vec<&Patch> = patches.iter().collect();
    ordered.sort_by_key(|patch| patch.address);

    let mut addresses: Vec<usize> = ordered.iter().map(|patch| patch.address).collect();
    addresses.dedup();
    let targets = index::resolve_live_many(root, &addresses)?;

    for patch in ordered {
        // resolve_live_many guarantees presence of every requested address
        let target = targets[&patch.address].clone();
        log::debug!(
            "applying {} at address {} (live node {})",
            patch.action(),
            patch.address,
            target.debug_id()
        );
        apply_one(&target, patch)?;
    }
    Ok(())
}

fn apply_one(target: &LiveNode, patch: &Patch) -> Result<(), ReconcileError> {
    match &patch.kind {
        PatchKind::Text { text } => match &mut target.data_mut().kind {
            LiveKind::Text(current) => {
                *current = text.clone();
                Ok(())
            }
            _ => Err(ReconcileError::addressing(
                patch.address,
                "text patch targets a non-text node",
            )),
        },
        PatchKind::Replace { node } => {
            lifecycle::destroy_live(target);
            let fresh = realize(node)?;
            target.replace_with(fresh);
            Ok(())
        }
        PatchKind::Properties { diff } => apply_props(target, diff, patch.address),
        PatchKind::Order { ops } => apply_order(target, ops, patch.address),
        PatchKind::UpdateWidget { previous, next } => {
            let body = match &target.data().kind {
                LiveKind::Widget { body, .. } => body.clone(),
                _ => {
                    return Err(ReconcileError::addressing(
                        patch.address,
                        "widget patch targets a non-widget node",
                    ));
                }
            };
            next.update(previous.as_ref(), &body);
            if let LiveKind::Widget { widget, .. } = &mut target.data_mut().kind {
                *widget = next.clone();
            }
            Ok(())
        }
    }
}

fn apply_props(target: &LiveNode, diff: &PropsPatch, address: usize) -> Result<(), ReconcileError> {
    // hooks fire after the borrow is released, with the node handle
    let mut to_unhook: Vec<(String, Rc<dyn PropHook>)> = Vec::new();
    let mut to_hook: Vec<(String, Rc<dyn PropHook>)> = Vec::new();
    {
        let mut data = target.data_mut();
        let el = match &mut data.kind {
            LiveKind::Element(el) => el,
            _ => {
                return Err(ReconcileError::addressing(
                    address,
                    "properties patch targets a non-element node",
                ));
            }
        };
        for edit in &diff.entries {
            // prefer the patch's recorded previous value, fall back to live state
            let previous = edit
                .previous
                .clone()
                .or_else(|| el.properties.get(&edit.name).cloned());
            if let Some(PropValue::Hook(hook)) = previous {
                to_unhook.push((edit.name.clone(), hook));
            }
            match &edit.next {
                None => {
                    el.properties.shift_remove(&edit.name);
                }
                Some(value) => {
                    el.properties.insert(edit.name.clone(), value.clone());
                    if let PropValue::Hook(hook) = value {
                        to_hook.push((edit.name.clone(), hook.clone()));
                    }
                }
            }
        }
        apply_map_edits(&mut el.attributes, &diff.attributes);
        apply_map_edits(&mut el.style, &diff.style);
    }
    for (name, hook) in to_unhook {
        hook.unhook(target, &name);
    }
    for (name, hook) in to_hook {
        hook.hook(target, &name);
    }
    Ok(())
}

fn apply_map_edits(map: &mut indexmap::IndexMap<String, String>, edits: &[MapEdit]) {
    for edit in edits {
        match &edit.next {
            None => {
                map.shift_remove(&edit.name);
            }
            Some(value) => {
                map.insert(edit.name.clone(), value.clone());
            }
        }
    }
}

fn apply_order(target: &LiveNode, ops: &[ChildOp], address: usize) -> Result<(), ReconcileError> {
    for op in ops {
        match op {
            ChildOp::Remove { index } => {
                let removed = {
                    let mut data = target.data_mut();
                    let children = element_children(&mut data, address)?;
                    if *index >= children.len() {
                        return Err(ReconcileError::addressing(
                            address,
                            format!("remove index {} out of bounds", index),
                        ));
                    }
                    children.remove(*index)
                };
                lifecycle::destroy_live(&removed);
            }
            ChildOp::Insert { index, node } => {
                let fresh = realize(node)?;
                let mut data = target.data_mut();
                let children = element_children(&mut data, address)?;
                if *index > children.len() {
                    return Err(ReconcileError::addressing(
                        address,
                        format!("insert index {} out of bounds", index),
                    ));
                }
                children.insert(*index, fresh);
            }
            ChildOp::Move { from, to } => {
                let mut data = target.data_mut();
                let children = element_children(&mut data, address)?;
                if *from >= children.len() {
                    return Err(ReconcileError::addressing(
                        address,
                        format!("move source {} out of bounds", from),
                    ));
                }
                let node = children.remove(*from);
                if *to > children.len() {
                    return Err(ReconcileError::addressing(
                        address,
                        format!("move target {} out of bounds", to),
                    ));
                }
                children.insert(*to, node);
            }
        }
    }
    Ok(())
}

fn element_children<'a>(
    data: &'a mut LiveNodeData,
    address: usize,
) -> Result<&'a mut Vec<LiveNode>, ReconcileError> {
    match &mut data.kind {
        LiveKind::Element(el) => Ok(&mut el.children),
        _ => Err(ReconcileError::addressing(
            address,
            "order patch targets a non-element node",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff_engine::diff;
    use crate::patch::PatchKind;
    use crate::vnode::{VProps, VTree, h};

    fn cycle(before: &VTree, after: &VTree) -> LiveNode {
        let live = realize(before).unwrap();
        let patches = diff(before, after).unwrap();
        apply(&live, &patches).unwrap();
        live
    }

    #[test]
    fn text_patch_rewrites_in_place() {
        let before = h("div", VProps::new(), vec![VTree::text("a")]);
        let after = h("div", VProps::new(), vec![VTree::text("b")]);
        let live = cycle(&before, &after);
        assert!(live.equivalent(&realize(&after).unwrap()));
    }

    #[test]
    fn replace_keeps_the_root_handle() {
        let before = h("div", VProps::new(), vec![]);
        let after = h("section", VProps::new(), vec![VTree::text("x")]);
        let live = realize(&before).unwrap();
        let patches = diff(&before, &after).unwrap();
        apply(&live, &patches).unwrap();
        assert!(live.equivalent(&realize(&after).unwrap()));
    }

    #[test]
    fn mismatched_patch_kind_is_an_addressing_error() {
        let live = realize(&h("div", VProps::new(), vec![])).unwrap();
        let patch = Patch {
            address: 0,
            kind: PatchKind::Text {
                text: "nope".to_string(),
            },
        };
        let err = apply(&live, &[patch]).unwrap_err();
        assert!(matches!(err, ReconcileError::Addressing { address: 0, .. }));
    }

    #[test]
    fn stale_address_is_an_addressing_error() {
        let live = realize(&h("div", VProps::new(), vec![])).unwrap();
        let patch = Patch {
            address: 7,
            kind: PatchKind::Text {
                text: "nope".to_string(),
            },
        };
        let err = apply(&live, &[patch]).unwrap_err();
        assert!(matches!(err, ReconcileError::Addressing { address: 7, .. }));
    }
}

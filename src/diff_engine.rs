//! Core diffing engine: lock-step walk of two virtual trees producing an
//! ordered, address-keyed patch list.
//!
//! The differ never mutates either input tree and never touches a live
//! tree; addresses are computed purely from the `before` tree via the
//! indexer, which is what lets the applier resolve them purely against the
//! live side.
use crate::children;
use crate::errors::ReconcileError;
use crate::index;
use crate::lifecycle;
use crate::patch::{MapEdit, Patch, PatchKind, PropEdit, PropsPatch};
use crate::vnode::{self, PropValue, VElement, VProps, VTree, RESERVED_ATTRIBUTES, RESERVED_STYLE};
use indexmap::IndexMap;

/// Diff two virtual trees into a patch list sorted by address. Diffing a
/// tree against itself yields an empty list.
pub fn diff(before: &VTree, after: &VTree) -> Result<Vec<Patch>, ReconcileError> {
    vnode::validate(before)?;
    vnode::validate(after)?;

    let mut engine = DiffEngine { patches: Vec::new() };
    engine.diff_node(before, after, 0)?;
    // stable: keeps Properties ahead of Order when both target one address
    engine.patches.sort_by_key(|patch| patch.address);
    log::debug!("diff produced {} patches", engine.patches.len());
    Ok(engine.patches)
}

struct DiffEngine {
    patches: Vec<Patch>,
}

impl DiffEngine {
    fn diff_node(
        &mut self,
        before: &VTree,
        after: &VTree,
        address: usize,
    ) -> Result<(), ReconcileError> {
        if VTree::ptr_eq(before, after) {
            return Ok(());
        }
        let before_view = lifecycle::resolved_view(before)?;
        let after_view = match after {
            VTree::Thunk(thunk) => {
                let previous = match before {
                    VTree::Thunk(_) => Some(before_view.clone()),
                    _ => None,
                };
                let rendered = lifecycle::resolve_thunk(thunk, previous.as_ref())?;
                if let Some(previous) = &previous {
                    if VTree::ptr_eq(&rendered, previous) {
                        // cache hit: the subtree is unchanged by contract
                        log::trace!("thunk cache hit at address {}", address);
                        return Ok(());
                    }
                }
                rendered
            }
            _ => after.clone(),
        };
        self.diff_resolved(&before_view, &after_view, address)
    }

    fn diff_resolved(
        &mut self,
        before: &VTree,
        after: &VTree,
        address: usize,
    ) -> Result<(), ReconcileError> {
        match (before, after) {
            (VTree::Widget(previous), VTree::Widget(next))
                if lifecycle::widgets_compatible(previous, next) =>
            {
                self.patches.push(Patch {
                    address,
                    kind: PatchKind::UpdateWidget {
                        previous: previous.clone(),
                        next: next.clone(),
                    },
                });
                Ok(())
            }
            (VTree::Text(a), VTree::Text(b)) => {
                if a.text != b.text {
                    self.patches.push(Patch {
                        address,
                        kind: PatchKind::Text {
                            text: b.text.clone(),
                        },
                    });
                }
                Ok(())
            }
            (VTree::Element(a), VTree::Element(b))
                if a.tag == b.tag && a.namespace == b.namespace =>
            {
                let props = diff_props(&a.props, &b.props)?;
                if !props.is_empty() {
                    self.patches.push(Patch {
                        address,
                        kind: PatchKind::Properties { diff: props },
                    });
                }
                self.diff_children(a, b, address)
            }
            // kind mismatch, tag/namespace mismatch, incompatible widget:
            // replace wholesale, no recursion
            _ => {
                self.patches.push(Patch {
                    address,
                    kind: PatchKind::Replace {
                        node: after.clone(),
                    },
                });
                Ok(())
            }
        }
    }

    fn diff_children(
        &mut self,
        a: &VElement,
        b: &VElement,
        address: usize,
    ) -> Result<(), ReconcileError> {
        let children::Reconciliation { ops, pairs } = children::reconcile(&a.children, &b.children);

        // before-side child addresses come from resolved subtree sizes
        let mut offsets = Vec::with_capacity(a.children.len());
        let mut cursor = address + 1;
        for child in &a.children {
            offsets.push(cursor);
            cursor += index::subtree_size(child)?;
        }

        if !ops.is_empty() {
            self.patches.push(Patch {
                address,
                kind: PatchKind::Order { ops },
            });
        }
        for pair in pairs {
            self.diff_node(
                &a.children[pair.before_index],
                &b.children[pair.after_index],
                offsets[pair.before_index],
            )?;
        }
        Ok(())
    }
}

/// Structural key/value diff of two property mappings. Ordinary entries and
/// the two reserved sub-mappings are compared independently; hooks compare
/// by identity.
fn diff_props(before: &VProps, after: &VProps) -> Result<PropsPatch, ReconcileError> {
    let mut out = PropsPatch::default();

    for (name, previous) in before.iter() {
        if vnode::is_reserved(name) {
            continue;
        }
        match after.get(name) {
            None => out.entries.push(PropEdit {
                name: name.clone(),
                previous: Some(previous.clone()),
                next: None,
            }),
            Some(next) if next != previous => out.entries.push(PropEdit {
                name: name.clone(),
                previous: Some(previous.clone()),
                next: Some(next.clone()),
            }),
            Some(_) => {}
        }
    }
    for (name, next) in after.iter() {
        if vnode::is_reserved(name) || before.get(name).is_some() {
            continue;
        }
        out.entries.push(PropEdit {
            name: name.clone(),
            previous: None,
            next: Some(next.clone()),
        });
    }

    out.attributes = diff_reserved(before, after, RESERVED_ATTRIBUTES)?;
    out.style = diff_reserved(before, after, RESERVED_STYLE)?;
    Ok(out)
}

fn diff_reserved(
    before: &VProps,
    after: &VProps,
    reserved: &str,
) -> Result<Vec<MapEdit>, ReconcileError> {
    let empty = IndexMap::new();
    let b = reserved_map(before, reserved, &empty)?;
    let a = reserved_map(after, reserved, &empty)?;

    let mut edits = Vec::new();
    for (name, previous) in b {
        match a.get(name) {
            None => edits.push(MapEdit {
                name: name.clone(),
                next: None,
            }),
            Some(next) if next != previous => edits.push(MapEdit {
                name: name.clone(),
                next: Some(next.clone()),
            }),
            Some(_) => {}
        }
    }
    for (name, next) in a {
        if !b.contains_key(name) {
            edits.push(MapEdit {
                name: name.clone(),
                next: Some(next.clone()),
            });
        }
    }
    Ok(edits)
}

fn reserved_map<'a>(
    props: &'a VProps,
    reserved: &str,
    empty: &'a IndexMap<String, String>,
) -> Result<&'a IndexMap<String, String>, ReconcileError> {
    match props.get(reserved) {
        None => Ok(empty),
        Some(PropValue::Map(map)) => Ok(map),
        Some(PropValue::Hook(_)) => Err(ReconcileError::Config {
            property: reserved.to_string(),
            details: "hooks cannot be installed on a reserved sub-mapping".to_string(),
        }),
        Some(PropValue::Scalar(_)) => Err(ReconcileError::Config {
            property: reserved.to_string(),
            details: "reserved properties hold key/value sub-mappings".to_string(),
        }),
    }
}

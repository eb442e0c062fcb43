//! Patch model: the wire contract between the differ and the applier.
//!
//! A patch list is an ordered sequence of `{address, kind}` records computed
//! against one `before` tree. Invariants:
//! - Patches are applied in increasing address order.
//! - Each patch targets exactly one address and is applied at most once.
//! - Addresses are not portable across tree instances; applying a list to a
//!   live tree it was not computed from is undefined and guarded only by
//!   address-bounds checks.
use crate::children::ChildOp;
use crate::vnode::{PropValue, VTree, Widget};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::rc::Rc;

/// One addressed mutation instruction.
pub struct Patch {
    pub address: usize,
    pub kind: PatchKind,
}

pub enum PatchKind {
    /// Tear down the target subtree and realize `node` in its place.
    Replace { node: VTree },
    /// Overwrite the target text node's string.
    Text { text: String },
    /// Apply property/attribute/style edits to the target element.
    Properties { diff: PropsPatch },
    /// Run a child-op program against the target element's child list.
    Order { ops: Vec<ChildOp> },
    /// Hand the live widget body to `next.update(previous, body)`.
    UpdateWidget {
        previous: Rc<dyn Widget>,
        next: Rc<dyn Widget>,
    },
}

impl Patch {
    pub fn action(&self) -> &'static str {
        match self.kind {
            PatchKind::Replace { .. } => "REPLACE",
            PatchKind::Text { .. } => "TEXT",
            PatchKind::Properties { .. } => "PROPS",
            PatchKind::Order { .. } => "ORDER",
            PatchKind::UpdateWidget { .. } => "UPDATE_WIDGET",
        }
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("address", &self.address)
            .field("action", &self.action())
            .finish()
    }
}

/// Property diff: independent edit lists for ordinary entries and the two
/// reserved sub-mappings. Sub-mappings are edited key-by-key, never replaced
/// wholesale.
#[derive(Default)]
pub struct PropsPatch {
    pub entries: Vec<PropEdit>,
    pub attributes: Vec<MapEdit>,
    pub style: Vec<MapEdit>,
}

impl PropsPatch {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.attributes.is_empty() && self.style.is_empty()
    }
}

/// Edit of one ordinary property. `previous` is carried so a removed or
/// replaced hook can be unhooked; `next == None` unsets the property.
pub struct PropEdit {
    pub name: String,
    pub previous: Option<PropValue>,
    pub next: Option<PropValue>,
}

/// Edit of one entry in a reserved sub-mapping; `next == None` removes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapEdit {
    pub name: String,
    pub next: Option<String>,
}

/// Serializable flattening of one patch for host transport and debug logs.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PatchRecord {
    pub action: String,
    pub address: usize,
    pub data: serde_json::Value,
}

/// Flatten a patch list into serializable records. Payloads that cannot
/// cross a serialization boundary (subtrees, widget handles, hooks) are
/// reduced to their descriptions.
pub fn summarize(patches: &[Patch]) -> Vec<PatchRecord> {
    patches
        .iter()
        .map(|patch| PatchRecord {
            action: patch.action().to_string(),
            address: patch.address,
            data: match &patch.kind {
                PatchKind::Replace { node } => json!({ "kind": node.kind_name() }),
                PatchKind::Text { text } => json!({ "text": text }),
                PatchKind::Properties { diff } => json!({
                    "entries": diff
                        .entries
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>(),
                    "attributes": diff
                        .attributes
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>(),
                    "style": diff
                        .style
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>(),
                }),
                PatchKind::Order { ops } => json!({
                    "ops": ops
                        .iter()
                        .map(|op| match op {
                            ChildOp::Insert { index, node } =>
                                json!({ "op": "insert", "index": index, "kind": node.kind_name() }),
                            ChildOp::Remove { index } =>
                                json!({ "op": "remove", "index": index }),
                            ChildOp::Move { from, to } =>
                                json!({ "op": "move", "from": from, "to": to }),
                        })
                        .collect::<Vec<_>>(),
                }),
                PatchKind::UpdateWidget { next, .. } => json!({ "widget": next.name() }),
            },
        })
        .collect()
}

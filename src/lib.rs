//! Virtual-tree reconciliation.
//!
//! Describe a UI as an immutable tree of lightweight nodes, diff two
//! versions of it into an ordered, index-addressed patch list, and apply
//! that list to a live tree in a single linear pass. Child lists reconcile
//! under insertion, removal and reordering (with optional identity keys);
//! widgets carry an opaque init/update/destroy lifecycle; thunks defer
//! rendering and can short-circuit diffing by returning their previous
//! resolved tree verbatim.
//!
//! ```
//! use vtree_reconciler::{VProps, VTree, apply, diff, h, realize, render_live};
//!
//! let before = h("div#app", VProps::new(), vec![VTree::text("one")]);
//! let after = h("div#app", VProps::new(), vec![VTree::text("two")]);
//!
//! let live = realize(&before).unwrap();
//! let patches = diff(&before, &after).unwrap();
//! apply(&live, &patches).unwrap();
//!
//! assert_eq!(render_live(&live), r#"<div id="app">two</div>"#);
//! ```
//!
//! Diffing and patching are synchronous and single-threaded; callers
//! serialize diff+patch cycles per live tree.
mod apply;
mod children;
mod diff_engine;
mod errors;
mod html;
mod index;
mod lifecycle;
mod live;
mod patch;
mod realize;
mod vnode;

pub use apply::apply;
pub use children::{ChildOp, MatchedPair, Reconciliation, reconcile};
pub use diff_engine::diff;
pub use errors::ReconcileError;
pub use html::render_live;
pub use index::{address_of, resolve_live, resolve_live_many, subtree_size};
pub use lifecycle::{destroy_live, resolve_thunk, resolved_view, widgets_compatible};
pub use live::{LiveElement, LiveKind, LiveNode, LiveNodeData};
pub use patch::{MapEdit, Patch, PatchKind, PatchRecord, PropEdit, PropsPatch, summarize};
pub use realize::realize;
pub use vnode::{
    PropHook, PropValue, VElement, VProps, VText, VThunk, VTree, Widget, h, RESERVED_ATTRIBUTES,
    RESERVED_STYLE,
};

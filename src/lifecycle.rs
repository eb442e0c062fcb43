//! Uniform handling of widget init/update/destroy and thunk render/cache
//! reuse, shared by the differ, the realizer and the applier.
use crate::errors::ReconcileError;
use crate::live::{LiveKind, LiveNode};
use crate::vnode::{VThunk, VTree, Widget};
use std::rc::Rc;

/// Two widgets accept each other through `update` when they share a name.
pub fn widgets_compatible(previous: &Rc<dyn Widget>, next: &Rc<dyn Widget>) -> bool {
    previous.name() == next.name()
}

/// Resolve a thunk, calling `render` at most once per node. The resolved
/// tree is cached on the node; later calls (realize after diff, repeated
/// occurrences of a shared node) reuse it. `previous` is the previous
/// pass's resolved tree, or none on first render.
pub fn resolve_thunk(thunk: &VThunk, previous: Option<&VTree>) -> Result<VTree, ReconcileError> {
    if let Some(cached) = thunk.cached() {
        return Ok(cached);
    }
    let rendered = thunk.render_with(previous);
    if matches!(rendered, VTree::Thunk(_)) {
        return Err(ReconcileError::validation(
            "thunk render returned another thunk",
        ));
    }
    crate::vnode::validate(&rendered)?;
    thunk.fill(rendered.clone());
    Ok(rendered)
}

/// The tree a node diffs and realizes as: thunks stand for their resolved
/// tree, everything else stands for itself.
pub fn resolved_view(node: &VTree) -> Result<VTree, ReconcileError> {
    match node {
        VTree::Thunk(thunk) => resolve_thunk(thunk, None),
        _ => Ok(node.clone()),
    }
}

/// Destroy every widget in a live subtree that is being detached; pre-order,
/// so an outer widget is told before its surroundings disappear. A widget's
/// body is opaque and is the widget's own concern to clean up.
pub fn destroy_live(node: &LiveNode) {
    let data = node.data();
    match &data.kind {
        LiveKind::Widget { widget, body } => {
            log::trace!("destroying widget '{}'", widget.name());
            widget.destroy(body);
        }
        LiveKind::Element(el) => {
            for child in &el.children {
                destroy_live(child);
            }
        }
        LiveKind::Text(_) => {}
    }
}

//! In-memory live tree the applier mutates.
//!
//! Nodes are shared handles (`Rc<RefCell<_>>`), so a handle resolved before
//! a reorder stays valid after it; the applier can capture every patched
//! node in one pass and then mutate freely. The tree is intentionally
//! single-threaded: callers serialize diff+patch cycles per live tree.
use crate::vnode::{PropValue, Widget};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Debug-id generator (lock-free, atomic); ids only show up in log output.
static ID_COUNTER: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(0));

fn next_id() -> usize {
    ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Shared handle to one live node.
#[derive(Clone)]
pub struct LiveNode(Rc<RefCell<LiveNodeData>>);

#[derive(Clone)]
pub struct LiveNodeData {
    pub id: usize,
    pub kind: LiveKind,
}

#[derive(Clone)]
pub enum LiveKind {
    Text(String),
    Element(LiveElement),
    /// A widget's live body is opaque: it occupies one address and is never
    /// descended into by the indexer.
    Widget {
        widget: Rc<dyn Widget>,
        body: LiveNode,
    },
}

#[derive(Clone)]
pub struct LiveElement {
    pub tag: String,
    pub namespace: Option<String>,
    pub properties: IndexMap<String, PropValue>,
    pub attributes: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub children: Vec<LiveNode>,
}

impl LiveElement {
    pub fn new(tag: impl Into<String>) -> LiveElement {
        LiveElement {
            tag: tag.into(),
            namespace: None,
            properties: IndexMap::new(),
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
        }
    }
}

impl LiveNode {
    pub fn new_text(text: impl Into<String>) -> LiveNode {
        LiveNode::from_kind(LiveKind::Text(text.into()))
    }

    pub fn new_element(element: LiveElement) -> LiveNode {
        LiveNode::from_kind(LiveKind::Element(element))
    }

    pub fn new_widget(widget: Rc<dyn Widget>, body: LiveNode) -> LiveNode {
        LiveNode::from_kind(LiveKind::Widget { widget, body })
    }

    fn from_kind(kind: LiveKind) -> LiveNode {
        LiveNode(Rc::new(RefCell::new(LiveNodeData {
            id: next_id(),
            kind,
        })))
    }

    pub fn data(&self) -> Ref<'_, LiveNodeData> {
        self.0.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, LiveNodeData> {
        self.0.borrow_mut()
    }

    pub fn debug_id(&self) -> usize {
        self.0.borrow().id
    }

    pub fn ptr_eq(a: &LiveNode, b: &LiveNode) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Overwrite this node's contents with `other`'s, keeping the handle
    /// itself (and therefore the node's place in its parent) intact.
    pub(crate) fn replace_with(&self, other: LiveNode) {
        let data = match Rc::try_unwrap(other.0) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => shared.borrow().clone(),
        };
        *self.0.borrow_mut() = data;
    }

    /// Set one attribute; returns false when the node is not an element.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> bool {
        match &mut self.data_mut().kind {
            LiveKind::Element(el) => {
                el.attributes.insert(name.into(), value.into());
                true
            }
            _ => false,
        }
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        match &mut self.data_mut().kind {
            LiveKind::Element(el) => el.attributes.shift_remove(name).is_some(),
            _ => false,
        }
    }

    /// Set one style entry; returns false when the node is not an element.
    pub fn set_style(&self, name: impl Into<String>, value: impl Into<String>) -> bool {
        match &mut self.data_mut().kind {
            LiveKind::Element(el) => {
                el.style.insert(name.into(), value.into());
                true
            }
            _ => false,
        }
    }

    pub fn remove_style(&self, name: &str) -> bool {
        match &mut self.data_mut().kind {
            LiveKind::Element(el) => el.style.shift_remove(name).is_some(),
            _ => false,
        }
    }

    /// Structural equivalence: same kinds, tags, properties, attributes,
    /// styles, text and child order. Widget nodes compare by name and body.
    pub fn equivalent(&self, other: &LiveNode) -> bool {
        if LiveNode::ptr_eq(self, other) {
            return true;
        }
        let a = self.data();
        let b = other.data();
        match (&a.kind, &b.kind) {
            (LiveKind::Text(x), LiveKind::Text(y)) => x == y,
            (LiveKind::Element(x), LiveKind::Element(y)) => {
                x.tag == y.tag
                    && x.namespace == y.namespace
                    && x.properties == y.properties
                    && x.attributes == y.attributes
                    && x.style == y.style
                    && x.children.len() == y.children.len()
                    && x.children
                        .iter()
                        .zip(&y.children)
                        .all(|(c, d)| c.equivalent(d))
            }
            (
                LiveKind::Widget {
                    widget: wa,
                    body: ba,
                },
                LiveKind::Widget {
                    widget: wb,
                    body: bb,
                },
            ) => wa.name() == wb.name() && ba.equivalent(bb),
            _ => false,
        }
    }
}

impl std::fmt::Debug for LiveNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data();
        match &data.kind {
            LiveKind::Text(t) => write!(f, "LiveText#{}({:?})", data.id, t),
            LiveKind::Element(el) => write!(
                f,
                "LiveElement#{}(<{}> {} children)",
                data.id,
                el.tag,
                el.children.len()
            ),
            LiveKind::Widget { widget, .. } => {
                write!(f, "LiveWidget#{}({})", data.id, widget.name())
            }
        }
    }
}

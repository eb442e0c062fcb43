//! Virtual tree node kinds and the properties model.
//!
//! A `VTree` is an immutable description of a UI fragment. Every variant
//! holds an `Rc` payload, so cloning a tree is cheap and two handles can be
//! compared by pointer identity (which is what lets a thunk signal "no
//! change" by returning its previous resolved tree verbatim).
use crate::errors::ReconcileError;
use crate::live::LiveNode;
use indexmap::IndexMap;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Reserved property name holding the attribute sub-mapping.
pub const RESERVED_ATTRIBUTES: &str = "attributes";
/// Reserved property name holding the style sub-mapping.
pub const RESERVED_STYLE: &str = "style";

pub(crate) fn is_reserved(name: &str) -> bool {
    name == RESERVED_ATTRIBUTES || name == RESERVED_STYLE
}

/// A virtual tree node. The set of kinds is closed on purpose: the whole
/// addressing scheme depends on every consumer matching exhaustively.
#[derive(Clone)]
pub enum VTree {
    Text(Rc<VText>),
    Element(Rc<VElement>),
    Widget(Rc<dyn Widget>),
    Thunk(Rc<VThunk>),
}

impl VTree {
    pub fn text(text: impl Into<String>) -> VTree {
        VTree::Text(Rc::new(VText { text: text.into() }))
    }

    pub fn widget(widget: Rc<dyn Widget>) -> VTree {
        VTree::Widget(widget)
    }

    pub fn thunk(render: impl Fn(Option<&VTree>) -> VTree + 'static) -> VTree {
        VTree::Thunk(Rc::new(VThunk::new(render)))
    }

    /// Identity key used by the child reconciler; only elements carry one.
    pub fn key(&self) -> Option<&str> {
        match self {
            VTree::Element(el) => el.key.as_deref(),
            _ => None,
        }
    }

    /// Pointer identity: true when both handles refer to the same node value.
    pub fn ptr_eq(a: &VTree, b: &VTree) -> bool {
        match (a, b) {
            (VTree::Text(x), VTree::Text(y)) => Rc::ptr_eq(x, y),
            (VTree::Element(x), VTree::Element(y)) => Rc::ptr_eq(x, y),
            (VTree::Widget(x), VTree::Widget(y)) => Rc::ptr_eq(x, y),
            (VTree::Thunk(x), VTree::Thunk(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            VTree::Text(_) => "text",
            VTree::Element(_) => "element",
            VTree::Widget(_) => "widget",
            VTree::Thunk(_) => "thunk",
        }
    }
}

impl fmt::Debug for VTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VTree::Text(t) => f.debug_tuple("Text").field(&t.text).finish(),
            VTree::Element(el) => f
                .debug_struct("Element")
                .field("tag", &el.tag)
                .field("key", &el.key)
                .field("children", &el.children.len())
                .finish(),
            VTree::Widget(w) => f.debug_tuple("Widget").field(&w.name()).finish(),
            VTree::Thunk(t) => f
                .debug_struct("Thunk")
                .field("resolved", &t.cached().is_some())
                .finish(),
        }
    }
}

/// Text node: wraps a string, no children, no properties.
pub struct VText {
    pub text: String,
}

/// Element node: tag, optional namespace and identity key, properties and an
/// ordered child list.
pub struct VElement {
    pub tag: String,
    pub namespace: Option<String>,
    pub key: Option<String>,
    pub props: VProps,
    pub children: Vec<VTree>,
}

impl VElement {
    pub fn new(tag: impl Into<String>) -> VElement {
        VElement {
            tag: tag.into(),
            namespace: None,
            key: None,
            props: VProps::new(),
            children: Vec::new(),
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> VElement {
        self.namespace = Some(ns.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> VElement {
        self.key = Some(key.into());
        self
    }

    pub fn props(mut self, props: VProps) -> VElement {
        self.props = props;
        self
    }

    pub fn child(mut self, child: VTree) -> VElement {
        self.children.push(child);
        self
    }
}

impl From<VElement> for VTree {
    fn from(el: VElement) -> VTree {
        VTree::Element(Rc::new(el))
    }
}

/// Caller-defined lifecycle node, opaque to structural diffing. The core
/// never inspects a widget beyond these capabilities.
pub trait Widget {
    /// Identity contract: two widgets accept each other via `update` only
    /// when their names match.
    fn name(&self) -> &str;
    /// Called exactly once, when the widget node is newly introduced.
    fn init(&self) -> LiveNode;
    /// Called exactly once per diff pass when a compatible previous widget
    /// exists; expected to mutate `node` in place.
    fn update(&self, previous: &dyn Widget, node: &LiveNode);
    /// Called exactly once when the widget node is removed or replaced.
    fn destroy(&self, node: &LiveNode);
    /// Downcast support so `update` can read the previous widget's state.
    fn as_any(&self) -> &dyn Any;
}

/// Hook values carry behavior invoked instead of ordinary assignment.
/// Equality is pointer identity; an unchanged hook produces no patch.
pub trait PropHook {
    fn hook(&self, node: &LiveNode, name: &str);
    fn unhook(&self, node: &LiveNode, name: &str);
}

/// Lazily-rendered node. `render` receives the previous pass's resolved
/// tree (or none on first render) and may return it verbatim to
/// short-circuit diffing of the whole subtree.
pub struct VThunk {
    render: Box<dyn Fn(Option<&VTree>) -> VTree>,
    resolved: RefCell<Option<VTree>>,
}

impl VThunk {
    pub fn new(render: impl Fn(Option<&VTree>) -> VTree + 'static) -> VThunk {
        VThunk {
            render: Box::new(render),
            resolved: RefCell::new(None),
        }
    }

    /// The resolved tree from the pass that visited this node, if any.
    pub fn cached(&self) -> Option<VTree> {
        self.resolved.borrow().clone()
    }

    pub(crate) fn render_with(&self, previous: Option<&VTree>) -> VTree {
        (self.render)(previous)
    }

    pub(crate) fn fill(&self, value: VTree) {
        *self.resolved.borrow_mut() = Some(value);
    }
}

/// One property value: a scalar, a reserved key/value sub-mapping, or a hook.
#[derive(Clone)]
pub enum PropValue {
    Scalar(serde_json::Value),
    Map(IndexMap<String, String>),
    Hook(Rc<dyn PropHook>),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Scalar(a), PropValue::Scalar(b)) => a == b,
            (PropValue::Map(a), PropValue::Map(b)) => a == b,
            (PropValue::Hook(a), PropValue::Hook(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Scalar(v) => write!(f, "Scalar({})", v),
            PropValue::Map(m) => write!(f, "Map({} entries)", m.len()),
            PropValue::Hook(_) => write!(f, "Hook(<fn>)"),
        }
    }
}

/// Insertion-ordered property mapping. Ordinary names hold scalars or hooks;
/// the reserved `attributes`/`style` names hold string sub-mappings.
#[derive(Clone, Default)]
pub struct VProps {
    entries: IndexMap<String, PropValue>,
}

impl VProps {
    pub fn new() -> VProps {
        VProps::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.entries.iter()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropValue) {
        self.entries.insert(name.into(), value);
    }

    /// Set a scalar property.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> VProps {
        self.entries
            .insert(name.into(), PropValue::Scalar(value.into()));
        self
    }

    /// Install a hook under an ordinary property name.
    pub fn hook(mut self, name: impl Into<String>, hook: Rc<dyn PropHook>) -> VProps {
        self.entries.insert(name.into(), PropValue::Hook(hook));
        self
    }

    /// Set one entry of the reserved attribute sub-mapping.
    pub fn attr(self, name: impl Into<String>, value: impl Into<String>) -> VProps {
        self.map_entry(RESERVED_ATTRIBUTES, name.into(), value.into())
    }

    /// Set one entry of the reserved style sub-mapping.
    pub fn style(self, name: impl Into<String>, value: impl Into<String>) -> VProps {
        self.map_entry(RESERVED_STYLE, name.into(), value.into())
    }

    fn map_entry(mut self, reserved: &str, name: String, value: String) -> VProps {
        match self.entries.get_mut(reserved) {
            Some(PropValue::Map(map)) => {
                map.insert(name, value);
            }
            _ => {
                let mut map = IndexMap::new();
                map.insert(name, value);
                self.entries
                    .insert(reserved.to_string(), PropValue::Map(map));
            }
        }
        self
    }
}

/// Terse element constructor: `h("span#id.a.b", props, children)`. An empty
/// tag component defaults to `div`; id and classes land in the reserved
/// attribute sub-mapping, merging with any class the caller already set.
pub fn h(selector: &str, mut props: VProps, children: Vec<VTree>) -> VTree {
    let mut tag = String::new();
    let mut id: Option<String> = None;
    let mut classes: Vec<String> = Vec::new();

    let mut current = (None::<char>, String::new());
    let mut parts = Vec::new();
    for ch in selector.chars() {
        if ch == '#' || ch == '.' {
            parts.push(current);
            current = (Some(ch), String::new());
        } else {
            current.1.push(ch);
        }
    }
    parts.push(current);
    for (marker, text) in parts {
        match marker {
            None => tag = text,
            Some('#') => id = Some(text),
            Some('.') if !text.is_empty() => classes.push(text),
            _ => {}
        }
    }

    if tag.is_empty() {
        tag = "div".to_string();
    }
    if let Some(id) = id {
        props = props.attr("id", id);
    }
    if !classes.is_empty() {
        let joined = classes.join(" ");
        let merged = match props.get(RESERVED_ATTRIBUTES) {
            Some(PropValue::Map(map)) => map
                .get("class")
                .map(|existing| format!("{} {}", existing, joined)),
            _ => None,
        };
        props = props.attr("class", merged.unwrap_or(joined));
    }

    VTree::Element(Rc::new(VElement {
        tag,
        namespace: None,
        key: None,
        props,
        children,
    }))
}

/// Fail-fast structural validation, run before any diff walk. Thunk bodies
/// are validated when they are resolved, never eagerly.
pub(crate) fn validate(tree: &VTree) -> Result<(), ReconcileError> {
    match tree {
        VTree::Element(el) => {
            if el.tag.is_empty() {
                return Err(ReconcileError::validation("element with empty tag name"));
            }
            for (name, value) in el.props.iter() {
                if matches!(value, PropValue::Map(_)) && !is_reserved(name) {
                    return Err(ReconcileError::validation(format!(
                        "structured value under non-reserved property '{}'",
                        name
                    )));
                }
            }
            for child in &el.children {
                validate(child)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

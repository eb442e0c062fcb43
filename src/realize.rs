//! First-render construction: build a live tree from a virtual tree.
//!
//! Invoked by the host for the very first render and by the applier for
//! Replace patches and Order inserts. Thunks resolve with no previous value
//! (or reuse the cache the diff pass already filled); widgets are
//! initialized exactly once.
use crate::errors::ReconcileError;
use crate::lifecycle;
use crate::live::{LiveElement, LiveNode};
use crate::vnode::{PropHook, PropValue, VTree, RESERVED_ATTRIBUTES, RESERVED_STYLE};
use std::rc::Rc;

pub fn realize(node: &VTree) -> Result<LiveNode, ReconcileError> {
    match node {
        VTree::Text(text) => Ok(LiveNode::new_text(text.text.clone())),
        VTree::Element(el) => {
            if el.tag.is_empty() {
                return Err(ReconcileError::validation("element with empty tag name"));
            }
            let mut live = LiveElement::new(el.tag.clone());
            live.namespace = el.namespace.clone();

            let mut hooks: Vec<(String, Rc<dyn PropHook>)> = Vec::new();
            for (name, value) in el.props.iter() {
                if name == RESERVED_ATTRIBUTES || name == RESERVED_STYLE {
                    let map = match value {
                        PropValue::Map(map) => map,
                        _ => {
                            return Err(ReconcileError::Config {
                                property: name.clone(),
                                details: "reserved properties hold key/value sub-mappings"
                                    .to_string(),
                            });
                        }
                    };
                    if name == RESERVED_ATTRIBUTES {
                        live.attributes = map.clone();
                    } else {
                        live.style = map.clone();
                    }
                    continue;
                }
                match value {
                    PropValue::Map(_) => {
                        return Err(ReconcileError::validation(format!(
                            "structured value under non-reserved property '{}'",
                            name
                        )));
                    }
                    PropValue::Hook(hook) => {
                        live.properties.insert(name.clone(), value.clone());
                        hooks.push((name.clone(), hook.clone()));
                    }
                    PropValue::Scalar(_) => {
                        live.properties.insert(name.clone(), value.clone());
                    }
                }
            }
            for child in &el.children {
                live.children.push(realize(child)?);
            }

            let node = LiveNode::new_element(live);
            // hooks run once the node exists, in declaration order
            for (name, hook) in hooks {
                hook.hook(&node, &name);
            }
            Ok(node)
        }
        VTree::Widget(widget) => {
            log::trace!("initializing widget '{}'", widget.name());
            let body = widget.init();
            Ok(LiveNode::new_widget(widget.clone(), body))
        }
        VTree::Thunk(_) => {
            let rendered = lifecycle::resolved_view(node)?;
            realize(&rendered)
        }
    }
}

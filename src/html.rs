//! HTML snapshot rendering for live trees, with consistent escaping.
//!
//! Used for log output, debugging and round-trip assertions; this is a
//! serialization of the live tree's observable state, not a rendering
//! contract.
use crate::live::{LiveKind, LiveNode};
use crate::vnode::PropValue;
use phf::phf_set;

// Compile-time void-element lookup (zero allocation)
static VOID_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Consistent HTML attribute escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn render_live(node: &LiveNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &LiveNode, out: &mut String) {
    let data = node.data();
    match &data.kind {
        LiveKind::Text(text) => out.push_str(&html_escape(text)),
        // a widget renders as its body; the wrapper is invisible in markup
        LiveKind::Widget { body, .. } => write_node(body, out),
        LiveKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            if let Some(ns) = &el.namespace {
                out.push_str(&format!(r#" xmlns="{}""#, html_escape(ns)));
            }
            for (name, value) in &el.properties {
                let rendered = match value {
                    PropValue::Scalar(serde_json::Value::String(s)) => s.clone(),
                    PropValue::Scalar(v) => v.to_string(),
                    // hooks and sub-mappings have no markup representation
                    _ => continue,
                };
                out.push_str(&format!(
                    r#" {}="{}""#,
                    html_escape(name),
                    html_escape(&rendered)
                ));
            }
            for (name, value) in &el.attributes {
                out.push_str(&format!(
                    r#" {}="{}""#,
                    html_escape(name),
                    html_escape(value)
                ));
            }
            if !el.style.is_empty() {
                let entries: Vec<String> = el
                    .style
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect();
                out.push_str(&format!(r#" style="{}""#, html_escape(&entries.join("; "))));
            }
            out.push('>');
            if VOID_ELEMENTS.contains(el.tag.as_str()) {
                return;
            }
            for child in &el.children {
                write_node(child, out);
            }
            out.push_str(&format!("</{}>", el.tag));
        }
    }
}

//! End-to-end reconciliation: realize a tree, diff it against a successor,
//! apply the patches, and observe the live tree.
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use vtree_reconciler::{
    ChildOp, LiveKind, LiveNode, PatchKind, PropHook, ReconcileError, VElement, VProps, VTree,
    Widget, address_of, apply, diff, h, realize, render_live, resolve_live, summarize,
};

fn li(key: &str, text: &str) -> VTree {
    VElement::new("li").key(key).child(VTree::text(text)).into()
}

fn cycle(before: &VTree, after: &VTree) -> LiveNode {
    let live = realize(before).expect("realize");
    let patches = diff(before, after).expect("diff");
    apply(&live, &patches).expect("apply");
    live
}

#[test]
fn no_op_diff_is_empty() {
    let tree = h(
        "div#app",
        VProps::new().set("title", "t").style("color", "red"),
        vec![VTree::text("x"), li("k", "item")],
    );
    assert!(diff(&tree, &tree).unwrap().is_empty());
}

#[test]
fn round_trip_matches_direct_realization() {
    let before = h(
        "div#app",
        VProps::new().set("title", "old"),
        vec![
            VTree::text("intro"),
            h(
                "ul",
                VProps::new(),
                vec![li("a", "one"), li("b", "two"), li("c", "three")],
            ),
        ],
    );
    let after = h(
        "div#app",
        VProps::new().set("title", "new"),
        vec![
            VTree::text("INTRO"),
            h(
                "ul",
                VProps::new(),
                vec![li("c", "three"), li("a", "ONE"), li("d", "four")],
            ),
            h("footer", VProps::new(), vec![VTree::text("fin")]),
        ],
    );
    let live = cycle(&before, &after);
    let direct = realize(&after).unwrap();
    assert!(live.equivalent(&direct));
    assert_eq!(render_live(&live), render_live(&direct));
}

#[test]
fn keyed_rotation_moves_live_nodes_instead_of_rebuilding() {
    let before = h(
        "ul",
        VProps::new(),
        vec![li("k1", "one"), li("k2", "two"), li("k3", "three")],
    );
    let after = h(
        "ul",
        VProps::new(),
        vec![li("k3", "three"), li("k1", "one"), li("k2", "two")],
    );

    let live = realize(&before).unwrap();
    // ul 0, li(k1) 1, text 2, li(k2) 3, text 4, li(k3) 5
    let k3_before = resolve_live(&live, 5).unwrap();

    let patches = diff(&before, &after).unwrap();
    assert_eq!(patches.len(), 1);
    let PatchKind::Order { ops } = &patches[0].kind else {
        panic!("expected order patch")
    };
    assert!(ops.iter().all(|op| matches!(op, ChildOp::Move { .. })));

    apply(&live, &patches).unwrap();
    let data = live.data();
    let LiveKind::Element(ul) = &data.kind else {
        panic!("expected element")
    };
    // the same live node slid to the front; nothing was re-realized
    assert!(LiveNode::ptr_eq(&ul.children[0], &k3_before));
    drop(data);
    assert!(live.equivalent(&realize(&after).unwrap()));
}

#[test]
fn unkeyed_middle_change_patches_one_slot() {
    let before = h(
        "div",
        VProps::new(),
        vec![VTree::text("A"), VTree::text("B"), VTree::text("C")],
    );
    let after = h(
        "div",
        VProps::new(),
        vec![VTree::text("A"), VTree::text("X"), VTree::text("C")],
    );
    let patches = diff(&before, &after).unwrap();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].address, 2);
    assert!(matches!(&patches[0].kind, PatchKind::Text { text } if text == "X"));
    assert!(cycle(&before, &after).equivalent(&realize(&after).unwrap()));
}

#[test]
fn style_change_preserves_untouched_entries() {
    let before = h(
        "div",
        VProps::new().style("color", "red").style("width", "1px"),
        vec![],
    );
    let after = h(
        "div",
        VProps::new().style("color", "blue").style("width", "1px"),
        vec![],
    );
    let live = cycle(&before, &after);
    let data = live.data();
    let LiveKind::Element(el) = &data.kind else {
        panic!("expected element")
    };
    assert_eq!(el.style.get("color").map(String::as_str), Some("blue"));
    assert_eq!(el.style.get("width").map(String::as_str), Some("1px"));
}

#[derive(Default)]
struct LifecycleCounts {
    init: Cell<usize>,
    update: Cell<usize>,
    destroy: Cell<usize>,
}

struct CountingWidget {
    type_name: &'static str,
    label: String,
    counts: Rc<LifecycleCounts>,
}

impl Widget for CountingWidget {
    fn name(&self) -> &str {
        self.type_name
    }

    fn init(&self) -> LiveNode {
        self.counts.init.set(self.counts.init.get() + 1);
        LiveNode::new_text(self.label.clone())
    }

    fn update(&self, previous: &dyn Widget, node: &LiveNode) {
        self.counts.update.set(self.counts.update.get() + 1);
        let previous = previous
            .as_any()
            .downcast_ref::<CountingWidget>()
            .expect("previous widget of same type");
        assert_ne!(previous.label, "");
        if let LiveKind::Text(text) = &mut node.data_mut().kind {
            *text = self.label.clone();
        }
    }

    fn destroy(&self, _node: &LiveNode) {
        self.counts.destroy.set(self.counts.destroy.get() + 1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn counting_widget(
    type_name: &'static str,
    label: &str,
    counts: &Rc<LifecycleCounts>,
) -> VTree {
    VTree::widget(Rc::new(CountingWidget {
        type_name,
        label: label.to_string(),
        counts: counts.clone(),
    }))
}

#[test]
fn compatible_widget_updates_in_place() {
    let old_counts = Rc::new(LifecycleCounts::default());
    let new_counts = Rc::new(LifecycleCounts::default());
    let before = h(
        "div",
        VProps::new(),
        vec![counting_widget("gauge", "25%", &old_counts)],
    );
    let after = h(
        "div",
        VProps::new(),
        vec![counting_widget("gauge", "75%", &new_counts)],
    );

    let live = realize(&before).unwrap();
    assert_eq!(old_counts.init.get(), 1);

    let patches = diff(&before, &after).unwrap();
    assert_eq!(patches.len(), 1);
    assert!(matches!(&patches[0].kind, PatchKind::UpdateWidget { .. }));
    apply(&live, &patches).unwrap();

    assert_eq!(new_counts.update.get(), 1);
    assert_eq!(new_counts.init.get(), 0);
    assert_eq!(old_counts.destroy.get(), 0);
    assert_eq!(render_live(&live), "<div>75%</div>");
}

#[test]
fn incompatible_widget_is_replaced_with_destroy_and_init() {
    let old_counts = Rc::new(LifecycleCounts::default());
    let new_counts = Rc::new(LifecycleCounts::default());
    let before = h(
        "div",
        VProps::new(),
        vec![counting_widget("gauge", "25%", &old_counts)],
    );
    let after = h(
        "div",
        VProps::new(),
        vec![counting_widget("spinner", "...", &new_counts)],
    );

    let live = realize(&before).unwrap();
    let patches = diff(&before, &after).unwrap();
    assert_eq!(patches.len(), 1);
    assert!(matches!(&patches[0].kind, PatchKind::Replace { .. }));
    apply(&live, &patches).unwrap();

    assert_eq!(old_counts.destroy.get(), 1);
    assert_eq!(old_counts.update.get(), 0);
    assert_eq!(new_counts.init.get(), 1);
    assert_eq!(new_counts.update.get(), 0);
    assert_eq!(render_live(&live), "<div>...</div>");
}

#[test]
fn removed_widget_is_destroyed_once() {
    let counts = Rc::new(LifecycleCounts::default());
    let before = h(
        "div",
        VProps::new(),
        vec![VTree::text("keep"), counting_widget("gauge", "x", &counts)],
    );
    let after = h("div", VProps::new(), vec![VTree::text("keep")]);
    let live = cycle(&before, &after);
    assert_eq!(counts.destroy.get(), 1);
    assert_eq!(render_live(&live), "<div>keep</div>");
}

#[test]
fn thunk_cache_hit_produces_no_subtree_patches() {
    let renders = Rc::new(Cell::new(0usize));

    let make_thunk = |renders: &Rc<Cell<usize>>| {
        let renders = renders.clone();
        VTree::thunk(move |previous| {
            if let Some(previous) = previous {
                return previous.clone();
            }
            renders.set(renders.get() + 1);
            h("section", VProps::new(), vec![VTree::text("cached")])
        })
    };

    let before = h(
        "div",
        VProps::new(),
        vec![VTree::text("sibling"), make_thunk(&renders)],
    );
    let after = h(
        "div",
        VProps::new(),
        vec![VTree::text("SIBLING"), make_thunk(&renders)],
    );

    let live = realize(&before).unwrap();
    assert_eq!(renders.get(), 1);

    let patches = diff(&before, &after).unwrap();
    // only the sibling text changed; the thunk subtree short-circuited
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].address, 1);
    assert!(matches!(&patches[0].kind, PatchKind::Text { .. }));
    assert_eq!(renders.get(), 1);

    apply(&live, &patches).unwrap();
    assert_eq!(
        render_live(&live),
        "<div>SIBLING<section>cached</section></div>"
    );
}

#[test]
fn changed_thunk_diffs_its_resolved_tree_in_place() {
    let make = |text: &str| {
        let text = text.to_string();
        VTree::thunk(move |_previous| h("p", VProps::new(), vec![VTree::text(text.clone())]))
    };
    let before = h("div", VProps::new(), vec![make("old")]);
    let after = h("div", VProps::new(), vec![make("new")]);
    let patches = diff(&before, &after).unwrap();
    // fine-grained: a text patch inside the resolved tree, not a replace
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].address, 2);
    assert!(matches!(&patches[0].kind, PatchKind::Text { text } if text == "new"));
    assert!(cycle(&before, &after).equivalent(&realize(&after).unwrap()));
}

struct AttrHook {
    value: String,
    hooks: Cell<usize>,
    unhooks: Cell<usize>,
}

impl PropHook for AttrHook {
    fn hook(&self, node: &LiveNode, name: &str) {
        self.hooks.set(self.hooks.get() + 1);
        node.set_attribute(name, self.value.clone());
    }

    fn unhook(&self, node: &LiveNode, name: &str) {
        self.unhooks.set(self.unhooks.get() + 1);
        node.remove_attribute(name);
    }
}

#[test]
fn hooks_are_invoked_instead_of_assignment() {
    let old_hook = Rc::new(AttrHook {
        value: "v1".to_string(),
        hooks: Cell::new(0),
        unhooks: Cell::new(0),
    });
    let new_hook = Rc::new(AttrHook {
        value: "v2".to_string(),
        hooks: Cell::new(0),
        unhooks: Cell::new(0),
    });

    let before = h(
        "div",
        VProps::new().hook("data-x", old_hook.clone()),
        vec![],
    );
    let after = h("div", VProps::new().hook("data-x", new_hook.clone()), vec![]);

    let live = realize(&before).unwrap();
    assert_eq!(old_hook.hooks.get(), 1);

    let patches = diff(&before, &after).unwrap();
    apply(&live, &patches).unwrap();
    assert_eq!(old_hook.unhooks.get(), 1);
    assert_eq!(new_hook.hooks.get(), 1);
    assert_eq!(render_live(&live), r#"<div data-x="v2"></div>"#);

    // removing the property unhooks without a replacement
    let gone = h("div", VProps::new(), vec![]);
    let patches = diff(&after, &gone).unwrap();
    apply(&live, &patches).unwrap();
    assert_eq!(new_hook.unhooks.get(), 1);
    assert_eq!(render_live(&live), "<div></div>");
}

#[test]
fn addressing_is_symmetric_between_virtual_and_live_walks() {
    let grand = VTree::text("deep");
    let child = h("span", VProps::new(), vec![grand.clone()]);
    let tree = h(
        "div",
        VProps::new(),
        vec![VTree::text("first"), child.clone()],
    );

    let live = realize(&tree).unwrap();
    let address = address_of(&tree, &grand).unwrap().unwrap();
    let resolved = resolve_live(&live, address).unwrap();
    let data = resolved.data();
    assert!(matches!(&data.kind, LiveKind::Text(text) if text == "deep"));
}

#[test]
fn patch_records_are_serializable() {
    let before = h(
        "ul",
        VProps::new(),
        vec![li("a", "one"), li("b", "two")],
    );
    let after = h(
        "ul",
        VProps::new().set("title", "list"),
        vec![li("b", "two"), li("c", "three")],
    );
    let patches = diff(&before, &after).unwrap();
    let records = summarize(&patches);
    assert_eq!(records.len(), patches.len());
    let encoded = serde_json::to_string(&records).unwrap();
    assert!(encoded.contains("\"ORDER\""));
    assert!(encoded.contains("\"PROPS\""));
}

#[test]
fn applying_against_a_mismatched_tree_is_an_addressing_error() {
    let before = h(
        "div",
        VProps::new(),
        vec![VTree::text("a"), VTree::text("b")],
    );
    let after = h(
        "div",
        VProps::new(),
        vec![VTree::text("a"), VTree::text("c")],
    );
    let patches = diff(&before, &after).unwrap();

    let unrelated = realize(&h("div", VProps::new(), vec![])).unwrap();
    let err = apply(&unrelated, &patches).unwrap_err();
    assert!(matches!(err, ReconcileError::Addressing { .. }));
}

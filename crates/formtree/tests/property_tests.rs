#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]

//! Property-based tests for list renumbering, identity rewriting, and
//! record assembly.

use std::collections::HashSet;

use formtree::{
    assemble, document, list, Field, Form, NodeKind, NodeSpec, Record, SequenceAllocator,
};
use proptest::prelude::*;

fn worker_form() -> Form {
    let template = NodeSpec::group(
        "",
        vec![
            NodeSpec::text("name", "w"),
            NodeSpec::tabs(vec![
                ("tab1-1", "info", vec![NodeSpec::text("host", "h")]),
                ("tab1-2", "advanced", vec![]),
            ]),
            NodeSpec::choice("mode", "option-1", &["a", "b"]),
            NodeSpec::choice("level", "option-2", &["low", "high"]),
        ],
    )
    .label("#");
    let spec = NodeSpec::group("", vec![NodeSpec::list("workers", template, 0)]);
    let mut ids = SequenceAllocator::default();
    Form::with_allocator(document::build(&spec, &mut ids).unwrap(), ids)
}

#[derive(Debug, Clone)]
enum Edit {
    Add,
    Remove(usize),
}

fn edits() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(
        prop_oneof![
            2 => Just(Edit::Add),
            1 => (0usize..8).prop_map(Edit::Remove),
        ],
        0..24,
    )
}

fn apply(form: &mut Form, edits: &[Edit]) {
    let section = form.section("workers").unwrap();
    for edit in edits {
        match edit {
            Edit::Add => {
                form.add_item(section).unwrap();
            }
            Edit::Remove(i) => {
                let items = list::items(form.tree(), section).unwrap();
                if !items.is_empty() {
                    form.remove_item(items[i % items.len()]).unwrap();
                }
            }
        }
    }
}

// =============================================================================
// Renumbering properties
// =============================================================================

proptest! {
    #[test]
    fn indices_are_contiguous_after_any_edits(edits in edits()) {
        let mut form = worker_form();
        apply(&mut form, &edits);
        let section = form.section("workers").unwrap();
        let indices = list::indices(form.tree(), section).unwrap();
        let expected: Vec<Option<usize>> = (0..indices.len()).map(Some).collect();
        prop_assert_eq!(indices, expected);
        prop_assert!(form.walk().unwrap().duplicate_paths().is_empty());
    }

    #[test]
    fn renumber_twice_equals_once(edits in edits()) {
        let mut form = worker_form();
        apply(&mut form, &edits);
        let section = form.section("workers").unwrap();
        list::renumber(form.tree_mut(), section).unwrap();
        let once = form.walk().unwrap();
        list::renumber(form.tree_mut(), section).unwrap();
        prop_assert_eq!(form.walk().unwrap(), once);
    }

    #[test]
    fn submission_is_deterministic(edits in edits()) {
        let mut form = worker_form();
        apply(&mut form, &edits);
        let first = serde_json::to_string(&form.submission().unwrap()).unwrap();
        let second = serde_json::to_string(&form.submission().unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Identity properties
// =============================================================================

proptest! {
    #[test]
    fn k_clones_have_k_times_distinct_identities(k in 1usize..12) {
        let mut form = worker_form();
        let section = form.section("workers").unwrap();
        for _ in 0..k {
            form.add_item(section).unwrap();
        }
        let tree = form.tree();
        let mut identities = Vec::new();
        for item in list::items(tree, section).unwrap() {
            for id in tree.descendants(item) {
                match &tree.node(id).unwrap().kind {
                    NodeKind::TabPane(pane) => identities.push(pane.id.clone()),
                    NodeKind::Leaf(Field::Choice(group)) => identities.push(group.name.clone()),
                    _ => {}
                }
            }
        }
        // Two panes and two radio groups per template.
        let distinct: HashSet<_> = identities.iter().collect();
        prop_assert_eq!(distinct.len(), k * 4);
        prop_assert_eq!(identities.len(), k * 4);
    }
}

// =============================================================================
// Assembly properties
// =============================================================================

proptest! {
    #[test]
    fn distinct_paths_all_survive(keys in prop::collection::btree_set("[a-z]{1,6}", 1..10)) {
        let records: Vec<Record> = keys
            .iter()
            .map(|k| Record::new(format!("root.{k}"), "", k.to_uppercase()))
            .collect();
        let value = assemble::to_submission(&records);
        for k in &keys {
            let upper = k.to_uppercase();
            prop_assert_eq!(value["root"][k.as_str()].as_str(), Some(upper.as_str()));
        }
    }

    #[test]
    fn last_record_wins(values in prop::collection::vec("[0-9]{1,4}", 1..6)) {
        let records: Vec<Record> = values.iter().map(|v| Record::new("a.b", "", v.as_str())).collect();
        let value = assemble::to_submission(&records);
        prop_assert_eq!(value["a"]["b"].as_str(), values.last().map(String::as_str));
    }
}

use grantbook::hierarchy::{ROOT, forest};
use grantbook::persist::PersistenceMode;
use grantbook::schema::{Database, Item};
use grantbook::table::Id;
use serde_json::json;

fn item(id: Id, parent_id: Id, name: &str) -> Item {
    Item {
        id,
        parent_id,
        name: name.to_string(),
    }
}

#[test]
fn arranges_rows_under_their_parents() {
    let rows = vec![
        item(1, ROOT, "Plant 1"),
        item(2, ROOT, "Plant 2"),
        item(4, 1, "Area A"),
        item(12, 4, "Machine 1"),
    ];
    let trees = forest(rows);
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].record.name, "Plant 1");
    assert_eq!(trees[0].children.len(), 1);
    assert_eq!(trees[0].children[0].record.name, "Area A");
    assert_eq!(trees[0].children[0].children[0].record.name, "Machine 1");
    assert!(
        trees[1].children.is_empty(),
        "leaves still carry a children vector"
    );
}

#[test]
fn preserves_input_order_at_every_level() {
    let rows = vec![
        item(3, ROOT, "C"),
        item(1, ROOT, "A"),
        item(2, ROOT, "B"),
        item(7, 1, "A2"),
        item(6, 1, "A1"),
    ];
    let trees = forest(rows);
    let roots: Vec<&str> = trees.iter().map(|node| node.record.name.as_str()).collect();
    assert_eq!(roots, vec!["C", "A", "B"]);
    let under_a: Vec<&str> = trees[1]
        .children
        .iter()
        .map(|node| node.record.name.as_str())
        .collect();
    assert_eq!(under_a, vec!["A2", "A1"]);
}

#[test]
fn rows_with_missing_parents_are_dropped() {
    let rows = vec![item(1, ROOT, "Root"), item(5, 99, "Orphan")];
    let trees = forest(rows);
    assert_eq!(trees.len(), 1);
    assert!(trees[0].children.is_empty(), "orphan found nowhere to hang");
}

#[test]
fn parent_cycles_starve_each_other() {
    let rows = vec![
        item(1, ROOT, "Root"),
        item(2, 3, "Ouro"),
        item(3, 2, "Boros"),
    ];
    let trees = forest(rows);
    assert_eq!(trees.len(), 1, "only the true root survives");
    assert!(trees[0].children.is_empty());
}

#[test]
fn deep_chains_do_not_exhaust_the_stack() {
    let depth: Id = 50_000;
    let mut rows = vec![item(1, ROOT, "Layer 1")];
    for id in 2..=depth {
        rows.push(item(id, id - 1, &format!("Layer {id}")));
    }
    let trees = forest(rows);
    assert_eq!(trees.len(), 1, "a chain has a single root");
    let mut level = &trees[0];
    let mut walked: Id = 1;
    while let Some(child) = level.children.first() {
        assert_eq!(child.record.parent_id, level.record.id);
        level = child;
        walked += 1;
    }
    assert_eq!(walked, depth, "every link of the chain survives");
}

#[test]
fn seed_catalog_has_the_expected_shape() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let trees = db.item_forest().expect("forest");
    assert_eq!(trees.len(), 3, "three plants at the roots");
    let plant1 = &trees[0];
    assert_eq!(plant1.record.name, "Plant 1");
    assert_eq!(plant1.children.len(), 4, "areas A through D");
    assert_eq!(plant1.children[0].children.len(), 2, "machines 1 and 2");
    let plant3 = &trees[2];
    assert_eq!(plant3.children.len(), 1);
    assert!(plant3.children[0].children.is_empty());
}

#[test]
fn serializes_with_inlined_children() {
    let trees = forest(vec![item(1, ROOT, "Plant 1"), item(4, 1, "Area A")]);
    let encoded = serde_json::to_value(&trees).expect("json");
    assert_eq!(encoded[0]["name"], "Plant 1");
    assert_eq!(encoded[0]["children"][0]["id"], 4);
    assert_eq!(encoded[0]["children"][0]["children"], json!([]));
}

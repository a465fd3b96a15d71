use criterion::{Criterion, black_box, criterion_group, criterion_main};

use grantbook::hierarchy::{ROOT, forest};
use grantbook::persist::PersistenceMode;
use grantbook::reconcile::{Decision, ItemDecision};
use grantbook::schema::{Database, Item};

// three layers deep: roots, areas under each root, machines under each area
fn layered_catalog(roots: u64, children_per: u64) -> Vec<Item> {
    let mut rows = Vec::new();
    let mut id = 0;
    for _ in 0..roots {
        id += 1;
        let root = id;
        rows.push(Item {
            id: root,
            parent_id: ROOT,
            name: format!("Plant {root}"),
        });
        for _ in 0..children_per {
            id += 1;
            let area = id;
            rows.push(Item {
                id: area,
                parent_id: root,
                name: format!("Area {area}"),
            });
            for _ in 0..children_per {
                id += 1;
                rows.push(Item {
                    id,
                    parent_id: area,
                    name: format!("Machine {id}"),
                });
            }
        }
    }
    rows
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let small = layered_catalog(10, 3);
    c.bench_function("forest 130", |b| b.iter(|| forest(black_box(small.clone()))));
    let medium = layered_catalog(10, 10);
    c.bench_function("forest 1k", |b| b.iter(|| forest(black_box(medium.clone()))));
    let large = layered_catalog(100, 10);
    c.bench_function("forest 11k", |b| b.iter(|| forest(black_box(large.clone()))));

    let db = Database::new(PersistenceMode::InMemory).unwrap();
    // ids are reassigned on insert, so shift the generated parent links by the
    // highest seeded id to keep the layered shape intact
    let offset = db
        .all_items()
        .unwrap()
        .iter()
        .map(|item| item.id)
        .max()
        .unwrap_or(0);
    for mut row in layered_catalog(10, 10) {
        if row.parent_id != ROOT {
            row.parent_id += offset;
        }
        db.insert_item(row).unwrap();
    }
    c.bench_function("all_items 1k", |b| {
        b.iter(|| db.all_items().unwrap().len())
    });
    c.bench_function("item_forest 1k", |b| {
        b.iter(|| db.item_forest().unwrap().len())
    });
    c.bench_function("role_item_ids", |b| {
        b.iter(|| db.role_item_ids(black_box(1)).unwrap().len())
    });

    // steady state: each pass deletes the pair and grants it right back
    let toggle = [
        ItemDecision {
            item_id: 12,
            decision: Decision::Revoke,
        },
        ItemDecision {
            item_id: 12,
            decision: Decision::Grant,
        },
    ];
    c.bench_function("reconcile toggle", |b| {
        b.iter(|| db.modify_role_items(2, black_box(&toggle)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

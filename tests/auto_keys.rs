use std::sync::{Arc, Mutex};

use grantbook::persist::{PersistenceMode, Persistor};
use grantbook::schema::{Database, Item, Role};
use grantbook::table::AutoTable;

fn empty_roles() -> AutoTable<Role> {
    let persistor = Arc::new(Mutex::new(
        Persistor::new(PersistenceMode::InMemory).expect("persistor"),
    ));
    AutoTable::from_slot(persistor, "roles", Vec::new()).expect("table")
}

fn role(name: &str) -> Role {
    Role {
        id: 0,
        name: name.to_string(),
    }
}

#[test]
fn ids_count_up_from_one_in_insertion_order() {
    let mut roles = empty_roles();
    let (first, _) = roles.insert(role("Reader")).expect("insert");
    let (second, _) = roles.insert(role("Writer")).expect("insert");
    let (third, _) = roles.insert(role("Owner")).expect("insert");
    assert_eq!((first.id, second.id, third.id), (1, 2, 3));
}

#[test]
fn caller_supplied_ids_are_overwritten() {
    let mut roles = empty_roles();
    let (stored, existed) = roles
        .insert(Role {
            id: 99,
            name: "Impostor".to_string(),
        })
        .expect("insert");
    assert_eq!(stored.id, 1, "assigned id wins");
    assert!(!existed);
}

#[test]
fn deleted_ids_are_never_reassigned() {
    let mut roles = empty_roles();
    for name in ["Reader", "Writer", "Owner"] {
        roles.insert(role(name)).expect("insert");
    }
    assert!(roles.delete_key(3).expect("delete top"));
    assert!(roles.delete_key(2).expect("delete middle"));
    let (next, _) = roles.insert(role("Admin")).expect("insert");
    assert_eq!(
        next.id, 4,
        "neither the gap nor the released top id comes back"
    );
    assert_eq!(roles.len(), 2);
}

#[test]
fn assignment_continues_after_the_seed() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let stored = db
        .insert_item(Item {
            id: 0,
            parent_id: 1,
            name: "Area E".to_string(),
        })
        .expect("insert");
    assert_eq!(stored.id, 18, "17 seeded items come first");
    let caretaker = db
        .insert_role(Role {
            id: 0,
            name: "Caretaker".to_string(),
        })
        .expect("insert");
    assert_eq!(caretaker.id, 7, "6 seeded roles come first");
}

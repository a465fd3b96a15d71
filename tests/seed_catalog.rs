use grantbook::persist::PersistenceMode;
use grantbook::reconcile::{Decision, ItemDecision};
use grantbook::schema::{API_READ, Database};
use grantbook::table::Id;

#[test]
fn first_open_seeds_the_full_catalog() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    assert_eq!(db.all_items().expect("items").len(), 17);
    let roles = db.all_roles().expect("roles");
    let names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Administrator",
            "Plant 1 Manager",
            "Plant 2 Manager",
            "General Manager",
            "Area A Supervisor",
            "Section Chief",
        ]
    );
}

#[test]
fn administrator_sees_everything() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let ids = db.role_item_ids(1).expect("ids");
    assert_eq!(ids.len(), 17);
    let apis = db.role_item_apis_for(1).expect("apis");
    assert_eq!(apis.len(), 51, "three calls for each of 17 items");
}

#[test]
fn general_manager_reads_the_plants_only() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    assert_eq!(db.role_item_ids(4).expect("ids").len(), 10);
    let apis = db.role_item_apis_for(4).expect("apis");
    assert_eq!(apis.len(), 3, "one read call per plant");
    assert!(apis.iter().all(|row| row.api_id == API_READ));
    assert!(apis.iter().all(|row| row.item_id <= 3));
}

#[test]
fn section_chief_capability_is_narrower_than_visibility() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    assert_eq!(db.role_item_ids(6).expect("ids").len(), 4);
    let apis = db.role_item_apis_for(6).expect("apis");
    assert_eq!(apis.len(), 6, "two machines with three calls each");
    assert!(
        apis.iter()
            .all(|row| row.item_id == 12 || row.item_id == 13)
    );
}

#[test]
fn grant_rows_reference_seeded_records() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let item_ids: Vec<Id> = db
        .item_keeper()
        .lock()
        .unwrap()
        .find_all()
        .into_iter()
        .map(|item| item.id)
        .collect();
    let role_ids: Vec<Id> = db
        .role_keeper()
        .lock()
        .unwrap()
        .find_all()
        .into_iter()
        .map(|role| role.id)
        .collect();
    assert_eq!(db.all_role_items().expect("grants").len(), 50);
    assert_eq!(db.all_role_item_apis().expect("cells").len(), 114);
    for row in db.role_item_keeper().lock().unwrap().find_all() {
        assert!(role_ids.contains(&row.role_id), "grant row names a seeded role");
        assert!(item_ids.contains(&row.item_id), "grant row names a seeded item");
    }
    for row in db.role_item_api_keeper().lock().unwrap().find_all() {
        assert!(role_ids.contains(&row.role_id));
        assert!(item_ids.contains(&row.item_id));
    }
}

#[test]
fn granted_ids_surface_in_ascending_order() {
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let out_of_order = [
        ItemDecision {
            item_id: 17,
            decision: Decision::Grant,
        },
        ItemDecision {
            item_id: 11,
            decision: Decision::Grant,
        },
    ];
    db.modify_role_items(4, &out_of_order).expect("modify");
    let ids: Vec<Id> = db.role_item_ids(4).expect("ids").iter().collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(ids.last(), Some(&17));
}

use std::sync::Arc;

use grantbook::persist::PersistenceMode;
use grantbook::schema::Database;
use grantbook::server;

#[test]
fn router_wires_every_route() {
    // Route strings and method sets are validated at construction, so building
    // the router is enough to catch a conflicting or malformed route.
    let db = Database::new(PersistenceMode::InMemory).expect("db");
    let _app = server::router(Arc::new(db));
}

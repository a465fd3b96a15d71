//! Grantbook – a process-local store for catalog items, roles and the grants
//! that tie them together.
//!
//! The store centers on the *table* concept: a keyed, insertion-ordered
//! collection that hands out clones of its records and writes itself through
//! to a named slot whenever a mutation changed something:
//! * A [`table::Table`] keeps records addressed by a key each record projects
//!   from itself (see [`table::Keyed`]).
//! * An [`table::AutoTable`] layers surrogate id assignment on top, for
//!   records keyed by a plain [`table::Id`].
//! * The [`schema::Database`] wires four tables together behind one
//!   [`persist::Persistor`]: catalog items, roles, item grants and api grants.
//!
//! ## Modules
//! * [`table`] – Generic keyed tables and surrogate id assignment.
//! * [`schema`] – Concrete records, the seed catalog and the [`schema::Database`] facade.
//! * [`hierarchy`] – Arranges flat parent-pointing rows into a forest.
//! * [`reconcile`] – Turns batches of grant/revoke decisions into plans.
//! * [`persist`] – Slot storage, in memory or on SQLite, with a hash ledger.
//! * [`server`] – The axum http surface.
//! * [`error`] – Crate-wide error type and `Result` alias.
//!
//! ## Persistence
//! Every table owns a named slot in the [`persist::Persistor`] and serializes
//! its full contents into that slot after each effective mutation. Reads never
//! touch the persistor. In file mode the persistor additionally chains a
//! blake3 hash of every write into a ledger, so the head hash fingerprints
//! the entire write history of the store.
//!
//! ## Grants
//! Roles are granted items (visibility) and api calls against items
//! (capability) as independent row sets. Edit surfaces submit whole decision
//! matrices; the [`reconcile`] module resolves them into deletes and inserts
//! which the [`schema::Database`] applies under a single lock, deletes first.
//!
//! ## Quick Start
//! ```
//! use grantbook::hierarchy::ROOT;
//! use grantbook::persist::PersistenceMode;
//! use grantbook::schema::{Database, Item};
//!
//! let db = Database::new(PersistenceMode::InMemory).unwrap();
//! let plant = db
//!     .insert_item(Item { id: 0, parent_id: ROOT, name: "Plant 4".into() })
//!     .unwrap();
//! let forest = db.item_forest().unwrap();
//! assert!(forest.iter().any(|node| node.record.id == plant.id));
//! ```

pub mod error;
pub mod hierarchy;
pub mod persist;
pub mod reconcile;
pub mod schema;
pub mod server;
pub mod table;

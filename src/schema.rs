use std::sync::{Arc, Mutex};

// used to keep granted item ids as a compact sorted set
use roaring::RoaringTreemap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hierarchy::{Node, Parented, ROOT, forest};
use crate::persist::{PersistenceMode, Persistor};
use crate::reconcile::{
    ApiDecision, Applied, ItemDecision, plan_role_item_apis, plan_role_items,
};
use crate::table::{AutoKeyed, AutoTable, Id, Keyed, Table, lock};

// ------------- Records -------------
/// One entry in the equipment catalog. `parent_id` points at another item,
/// with [`ROOT`] marking a top-level entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: Id,
    pub parent_id: Id,
    pub name: String,
}

impl Keyed for Item {
    type Key = Id;
    fn key(&self) -> Id {
        self.id
    }
}

impl AutoKeyed for Item {
    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

impl Parented for Item {
    fn id(&self) -> Id {
        self.id
    }
    fn parent(&self) -> Id {
        self.parent_id
    }
}

/// A named role that grants are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub id: Id,
    pub name: String,
}

impl Keyed for Role {
    type Key = Id;
    fn key(&self) -> Id {
        self.id
    }
}

impl AutoKeyed for Role {
    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

/// Grants a role visibility of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleItem {
    pub role_id: Id,
    pub item_id: Id,
}

impl Keyed for RoleItem {
    type Key = (Id, Id);
    fn key(&self) -> (Id, Id) {
        (self.role_id, self.item_id)
    }
}

/// Grants a role one api call against one item. Api ids are opaque to the
/// store; the seed uses [`API_READ`], [`API_WRITE`] and [`API_DELETE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleItemApi {
    pub role_id: Id,
    pub item_id: Id,
    pub api_id: Id,
}

impl Keyed for RoleItemApi {
    type Key = (Id, Id, Id);
    fn key(&self) -> (Id, Id, Id) {
        (self.role_id, self.item_id, self.api_id)
    }
}

pub type ItemNode = Node<Item>;

pub const API_READ: Id = 1;
pub const API_WRITE: Id = 2;
pub const API_DELETE: Id = 3;

// ------------- Seeds -------------
fn item(id: Id, parent_id: Id, name: &str) -> Item {
    Item {
        id,
        parent_id,
        name: String::from(name),
    }
}

/// The catalog a fresh store starts out with: three plants broken down into
/// areas and machines.
pub fn default_items() -> Vec<Item> {
    vec![
        item(1, ROOT, "Plant 1"),
        item(2, ROOT, "Plant 2"),
        item(3, ROOT, "Plant 3"),
        item(4, 1, "Area A"),
        item(5, 1, "Area B"),
        item(6, 1, "Area C"),
        item(7, 1, "Area D"),
        item(8, 2, "Area A"),
        item(9, 2, "Area B"),
        item(10, 2, "Area C"),
        item(11, 3, "Area D"),
        item(12, 4, "Machine 1"),
        item(13, 4, "Machine 2"),
        item(14, 5, "Machine 3"),
        item(15, 8, "Machine 1"),
        item(16, 8, "Machine 2"),
        item(17, 8, "Machine 3"),
    ]
}

pub fn default_roles() -> Vec<Role> {
    let role = |id, name: &str| Role {
        id,
        name: String::from(name),
    };
    vec![
        role(1, "Administrator"),
        role(2, "Plant 1 Manager"),
        role(3, "Plant 2 Manager"),
        role(4, "General Manager"),
        role(5, "Area A Supervisor"),
        role(6, "Section Chief"),
    ]
}

pub fn default_role_items() -> Vec<RoleItem> {
    let mut rows = Vec::new();
    let mut grant = |role_id: Id, item_ids: &[Id]| {
        for &item_id in item_ids {
            rows.push(RoleItem { role_id, item_id });
        }
    };
    let every: Vec<Id> = (1..=17).collect();
    grant(1, &every);
    grant(2, &[1, 4, 5, 6, 7, 12, 13, 14]);
    grant(3, &[2, 8, 9, 10, 15, 16, 17]);
    grant(4, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    grant(5, &[1, 4, 12, 13]);
    grant(6, &[1, 4, 12, 13]);
    rows
}

pub fn default_role_item_apis() -> Vec<RoleItemApi> {
    let mut rows = Vec::new();
    let mut grant = |role_id: Id, item_ids: &[Id], api_ids: &[Id]| {
        for &item_id in item_ids {
            for &api_id in api_ids {
                rows.push(RoleItemApi {
                    role_id,
                    item_id,
                    api_id,
                });
            }
        }
    };
    let every: Vec<Id> = (1..=17).collect();
    let full = [API_READ, API_WRITE, API_DELETE];
    grant(1, &every, &full);
    grant(2, &[1, 4, 5, 6, 7, 12, 13, 14], &full);
    grant(3, &[2, 8, 9, 10, 15, 16, 17], &full);
    grant(4, &[1, 2, 3], &[API_READ]);
    grant(5, &[4, 12, 13], &full);
    grant(6, &[12, 13], &full);
    rows
}

// ------------- Database -------------
/// The process-local store. Each table sits behind its own mutex and writes
/// through to the shared [`Persistor`], so two tables can be serviced in
/// parallel while a single table never sees interleaved mutations.
pub struct Database {
    /// The persistence layer every table writes through to.
    pub persistor: Arc<Mutex<Persistor>>,
    /// Catalog entries, surrogate-keyed.
    pub items: Arc<Mutex<AutoTable<Item>>>,
    /// Roles, surrogate-keyed.
    pub roles: Arc<Mutex<AutoTable<Role>>>,
    /// Which items each role has been granted.
    pub role_items: Arc<Mutex<Table<RoleItem>>>,
    /// Which api calls each role may make against an item.
    pub role_item_apis: Arc<Mutex<Table<RoleItemApi>>>,
}

impl Database {
    /// Opens the store in the given mode. Every table restores from its slot,
    /// or seeds the slot with the default catalog on first contact.
    pub fn new(mode: PersistenceMode) -> Result<Database> {
        let persistor = Arc::new(Mutex::new(Persistor::new(mode)?));
        let items = AutoTable::from_slot(Arc::clone(&persistor), "items", default_items())?;
        let roles = AutoTable::from_slot(Arc::clone(&persistor), "roles", default_roles())?;
        let role_items =
            Table::from_slot(Arc::clone(&persistor), "role_items", default_role_items())?;
        let role_item_apis = Table::from_slot(
            Arc::clone(&persistor),
            "role_item_apis",
            default_role_item_apis(),
        )?;
        Ok(Database {
            persistor,
            items: Arc::new(Mutex::new(items)),
            roles: Arc::new(Mutex::new(roles)),
            role_items: Arc::new(Mutex::new(role_items)),
            role_item_apis: Arc::new(Mutex::new(role_item_apis)),
        })
    }

    pub fn item_keeper(&self) -> Arc<Mutex<AutoTable<Item>>> {
        Arc::clone(&self.items)
    }

    pub fn role_keeper(&self) -> Arc<Mutex<AutoTable<Role>>> {
        Arc::clone(&self.roles)
    }

    pub fn role_item_keeper(&self) -> Arc<Mutex<Table<RoleItem>>> {
        Arc::clone(&self.role_items)
    }

    pub fn role_item_api_keeper(&self) -> Arc<Mutex<Table<RoleItemApi>>> {
        Arc::clone(&self.role_item_apis)
    }

    // ------------- Items -------------
    pub fn all_items(&self) -> Result<Vec<Item>> {
        Ok(lock(&self.items)?.find_all())
    }

    /// Stores the item under a freshly assigned id and returns it.
    pub fn insert_item(&self, item: Item) -> Result<Item> {
        let (kept, _) = lock(&self.items)?.insert(item)?;
        Ok(kept)
    }

    /// Replaces the item with the same id, or returns `None` if there is none.
    pub fn update_item(&self, item: Item) -> Result<Option<Item>> {
        lock(&self.items)?.update(item)
    }

    pub fn delete_item(&self, id: Id) -> Result<bool> {
        lock(&self.items)?.delete_key(id)
    }

    /// The items whose ids are in the given set, in storage order.
    pub fn items_by_ids(&self, ids: &RoaringTreemap) -> Result<Vec<Item>> {
        Ok(lock(&self.items)?
            .find_all()
            .into_iter()
            .filter(|item| ids.contains(item.id))
            .collect())
    }

    /// The whole catalog arranged as a forest.
    pub fn item_forest(&self) -> Result<Vec<ItemNode>> {
        Ok(forest(lock(&self.items)?.find_all()))
    }

    // ------------- Roles -------------
    pub fn all_roles(&self) -> Result<Vec<Role>> {
        Ok(lock(&self.roles)?.find_all())
    }

    pub fn insert_role(&self, role: Role) -> Result<Role> {
        let (kept, _) = lock(&self.roles)?.insert(role)?;
        Ok(kept)
    }

    pub fn update_role(&self, role: Role) -> Result<Option<Role>> {
        lock(&self.roles)?.update(role)
    }

    pub fn delete_role(&self, id: Id) -> Result<bool> {
        lock(&self.roles)?.delete_key(id)
    }

    // ------------- Grants -------------
    /// The ids of every item the role has been granted, as a sorted set.
    pub fn role_item_ids(&self, role_id: Id) -> Result<RoaringTreemap> {
        let mut ids = RoaringTreemap::new();
        for row in lock(&self.role_items)?.find_all() {
            if row.role_id == role_id {
                ids.insert(row.item_id);
            }
        }
        Ok(ids)
    }

    pub fn all_role_items(&self) -> Result<Vec<RoleItem>> {
        Ok(lock(&self.role_items)?.find_all())
    }

    pub fn all_role_item_apis(&self) -> Result<Vec<RoleItemApi>> {
        Ok(lock(&self.role_item_apis)?.find_all())
    }

    pub fn role_items_for(&self, role_id: Id) -> Result<Vec<RoleItem>> {
        Ok(lock(&self.role_items)?
            .find_all()
            .into_iter()
            .filter(|row| row.role_id == role_id)
            .collect())
    }

    pub fn role_item_apis_for(&self, role_id: Id) -> Result<Vec<RoleItemApi>> {
        Ok(lock(&self.role_item_apis)?
            .find_all()
            .into_iter()
            .filter(|row| row.role_id == role_id)
            .collect())
    }

    /// Grants one item to a role directly, outside the decision flow.
    pub fn grant_item(&self, row: RoleItem) -> Result<(RoleItem, bool)> {
        lock(&self.role_items)?.insert(row)
    }

    /// Grants one api call to a role directly, outside the decision flow.
    pub fn grant_api(&self, row: RoleItemApi) -> Result<(RoleItemApi, bool)> {
        lock(&self.role_item_apis)?.insert(row)
    }

    /// Applies a batch of item grant decisions for one role. The whole batch
    /// runs under a single lock on the grant table, deletes before inserts,
    /// and only rows that actually changed the table are counted.
    pub fn modify_role_items(&self, role_id: Id, decisions: &[ItemDecision]) -> Result<Applied> {
        let plan = plan_role_items(role_id, decisions);
        let mut table = lock(&self.role_items)?;
        let mut applied = Applied::default();
        for row in &plan.deletes {
            if table.delete(row)? {
                applied.deleted += 1;
            }
        }
        for row in plan.inserts {
            let (_, previously_kept) = table.insert(row)?;
            if !previously_kept {
                applied.inserted += 1;
            }
        }
        Ok(applied)
    }

    /// Same contract as [`Database::modify_role_items`], one matrix cell per
    /// decision.
    pub fn modify_role_item_apis(
        &self,
        role_id: Id,
        decisions: &[ApiDecision],
    ) -> Result<Applied> {
        let plan = plan_role_item_apis(role_id, decisions);
        let mut table = lock(&self.role_item_apis)?;
        let mut applied = Applied::default();
        for row in &plan.deletes {
            if table.delete(row)? {
                applied.deleted += 1;
            }
        }
        for row in plan.inserts {
            let (_, previously_kept) = table.insert(row)?;
            if !previously_kept {
                applied.inserted += 1;
            }
        }
        Ok(applied)
    }

    /// The catalog forest restricted to what the role has been granted. Grant
    /// rows carry no hierarchy of their own, so a granted child whose parent
    /// was not granted has nowhere to hang and disappears from the result.
    pub fn visible_forest(&self, role_id: Id) -> Result<Vec<ItemNode>> {
        let granted = self.role_item_ids(role_id)?;
        Ok(forest(self.items_by_ids(&granted)?))
    }

    /// The head of the persistence ledger, if the backing mode keeps one.
    pub fn current_superhash(&self) -> Result<Option<String>> {
        Ok(lock(&self.persistor)?.current_superhash())
    }
}

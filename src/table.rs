use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash};
use std::sync::{Arc, Mutex, MutexGuard};

// we will use a fast hashing algo for the key indexes
use seahash::SeaHasher;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{GrantbookError, Result};
use crate::persist::Persistor;

// ------------- Id -------------
pub type Id = u64;

pub type KeyHasher = BuildHasherDefault<SeaHasher>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| GrantbookError::Lock(e.to_string()))
}

// ------------- Keys -------------
/// A record that can project its own primary key. Making the projection a
/// trait method keeps it total over the record type, so a record without a key
/// cannot be represented.
pub trait Keyed: Clone {
    type Key: Eq + Hash + Clone;
    fn key(&self) -> Self::Key;
}

/// A record whose primary key is a surrogate [`Id`] assigned by the table.
pub trait AutoKeyed: Keyed<Key = Id> {
    fn id(&self) -> Id;
    fn set_id(&mut self, id: Id);
}

// ------------- Table -------------
/// A keyed, insertion-ordered collection owning the authoritative copy of each
/// record. Reads hand out clones, so callers can never alias table state and
/// stored keys cannot be mutated from outside. Mutations keep `records` and
/// the key index in lockstep and write the whole table through to its slot
/// before returning.
pub struct Table<T: Keyed> {
    records: Vec<T>,
    index: HashMap<T::Key, usize, KeyHasher>,
    slot: String,
    persistor: Arc<Mutex<Persistor>>,
}

impl<T: Keyed + Serialize + DeserializeOwned> Table<T> {
    /// Restores the table from its named slot. When nothing has been stored
    /// under that name yet, the slot is seeded with `default` and the seed is
    /// persisted immediately.
    pub fn from_slot(
        persistor: Arc<Mutex<Persistor>>,
        slot: &str,
        default: Vec<T>,
    ) -> Result<Table<T>> {
        let stored = lock(&persistor)?.load_slot(slot)?;
        let records: Vec<T> = match stored {
            Some(payload) => {
                let records: Vec<T> = serde_json::from_str(&payload)?;
                debug!(slot, records = records.len(), "restored slot");
                records
            }
            None => {
                let payload = serde_json::to_string(&default)?;
                lock(&persistor)?.save_slot(slot, &payload)?;
                info!(slot, records = default.len(), "seeded slot");
                default
            }
        };
        let mut index = HashMap::default();
        for (position, record) in records.iter().enumerate() {
            index.insert(record.key(), position);
        }
        Ok(Table {
            records,
            index,
            slot: slot.to_owned(),
            persistor,
        })
    }

    /// Every stored record, cloned, in storage order.
    pub fn find_all(&self) -> Vec<T> {
        self.records.to_vec()
    }

    /// Primary-key lookup, cloned.
    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.index
            .get(key)
            .map(|position| self.records[*position].clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record under its key. Inserting a key that is already present
    /// is a silent no-op: the table is untouched, nothing is persisted, and
    /// the input comes straight back with `previously_kept` set.
    pub fn insert(&mut self, data: T) -> Result<(T, bool)> {
        let key = data.key();
        if self.index.contains_key(&key) {
            return Ok((data, true));
        }
        self.records.push(data.clone());
        self.index.insert(key, self.records.len() - 1);
        self.write_through()?;
        Ok((data, false))
    }

    /// Replaces the record stored under the input's key wholesale, preserving
    /// its position. Returns `None` and leaves the table untouched when the
    /// key is absent; there is no insert-on-missing fallback.
    pub fn update(&mut self, data: T) -> Result<Option<T>> {
        let Some(position) = self.index.get(&data.key()).copied() else {
            return Ok(None);
        };
        self.records[position] = data.clone();
        self.write_through()?;
        Ok(Some(data))
    }

    /// Removes the record stored under the input's key, preserving the order
    /// of the remaining records. Absent keys are a no-op, so deletion is
    /// idempotent.
    pub fn delete(&mut self, data: &T) -> Result<bool> {
        self.delete_key(&data.key())
    }

    pub fn delete_key(&mut self, key: &T::Key) -> Result<bool> {
        let Some(position) = self.index.remove(key) else {
            return Ok(false);
        };
        self.records.remove(position);
        for stored in self.index.values_mut() {
            if *stored > position {
                *stored -= 1;
            }
        }
        self.write_through()?;
        Ok(true)
    }

    fn write_through(&self) -> Result<()> {
        let payload = serde_json::to_string(&self.records)?;
        lock(&self.persistor)?.save_slot(&self.slot, &payload)
    }
}

// ------------- AutoTable -------------
/// A [`Table`] that assigns surrogate ids on insert. Ids count up from the
/// largest id present when the table was opened and are never handed out
/// twice, so deleting a record does not release its id for reuse.
pub struct AutoTable<T: AutoKeyed> {
    table: Table<T>,
    top: Id,
}

impl<T: AutoKeyed + Serialize + DeserializeOwned> AutoTable<T> {
    pub fn from_slot(
        persistor: Arc<Mutex<Persistor>>,
        slot: &str,
        default: Vec<T>,
    ) -> Result<AutoTable<T>> {
        let table = Table::from_slot(persistor, slot, default)?;
        let top = table
            .records
            .iter()
            .map(|record| record.id())
            .max()
            .unwrap_or(0);
        Ok(AutoTable { table, top })
    }

    /// Inserts with a freshly assigned id, overwriting any id the caller set.
    /// The assigned id cannot collide, so the duplicate-key no-op of the base
    /// insert stays unreachable here, but the delegation keeps it intact.
    pub fn insert(&mut self, mut data: T) -> Result<(T, bool)> {
        self.top += 1;
        data.set_id(self.top);
        self.table.insert(data)
    }

    pub fn find_all(&self) -> Vec<T> {
        self.table.find_all()
    }

    pub fn get(&self, id: Id) -> Option<T> {
        self.table.get(&id)
    }

    pub fn update(&mut self, data: T) -> Result<Option<T>> {
        self.table.update(data)
    }

    pub fn delete(&mut self, data: &T) -> Result<bool> {
        self.table.delete(data)
    }

    pub fn delete_key(&mut self, id: Id) -> Result<bool> {
        self.table.delete_key(&id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// used for persistence
use rusqlite::{params, Connection, OptionalExtension};
use chrono::Utc;
use std::collections::HashMap;

use crate::error::Result;
use crate::table::KeyHasher;

// ------------- Persistence -------------
/// Selects the medium behind a [`Persistor`]. `InMemory` keeps slot payloads in
/// a map for the lifetime of the process (tests, ephemeral runs); `File` keeps
/// them in a SQLite database that survives restarts.
#[derive(Debug, Clone)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

enum Backing {
    Memory(HashMap<String, String, KeyHasher>),
    Sqlite(Connection),
}

/// A store of named, opaque slot payloads. Each table owns one slot: the slot
/// supplies the table's seed once and receives its live contents on every
/// mutation thereafter. In file mode every save is also chained into a
/// tamper-evident ledger of blake3 hashes.
pub struct Persistor {
    backing: Backing,
    superhash: Option<String>,
}

impl Persistor {
    pub fn new(mode: PersistenceMode) -> Result<Persistor> {
        match mode {
            PersistenceMode::InMemory => Ok(Persistor {
                backing: Backing::Memory(HashMap::default()),
                superhash: None,
            }),
            PersistenceMode::File(path) => {
                let connection = Connection::open(path)?;
                connection.execute_batch(
                    "
                create table if not exists Slot (
                    Slot_Name text not null,
                    Contents text not null,
                    Saved_At text not null,
                    constraint referenceable_Slot_Name primary key (
                        Slot_Name
                    )
                );
                create table if not exists Ledger (
                    Ledger_Index integer not null,
                    Slot_Name text not null,
                    Content_Hash text not null,
                    Super_Hash text not null,
                    Chained_At text not null,
                    constraint referenceable_Ledger_Index primary key (
                        Ledger_Index
                    )
                );
                ",
                )?;
                let superhash = connection
                    .query_row(
                        "
                    select Super_Hash
                        from Ledger
                        order by Ledger_Index desc
                        limit 1
                ",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(Persistor {
                    backing: Backing::Sqlite(connection),
                    superhash,
                })
            }
        }
    }

    /// The current contents of a slot, or `None` when the slot has never been
    /// saved under this name.
    pub fn load_slot(&self, name: &str) -> Result<Option<String>> {
        match &self.backing {
            Backing::Memory(slots) => Ok(slots.get(name).cloned()),
            Backing::Sqlite(connection) => {
                let mut get_slot = connection.prepare_cached(
                    "
                select Contents
                    from Slot
                    where Slot_Name = ?
            ",
                )?;
                Ok(get_slot.query_row(params![name], |row| row.get(0)).optional()?)
            }
        }
    }

    /// Upserts a slot payload. File mode also appends a ledger row whose
    /// superhash chains the payload hash onto the previous head.
    pub fn save_slot(&mut self, name: &str, payload: &str) -> Result<()> {
        match &mut self.backing {
            Backing::Memory(slots) => {
                slots.insert(name.to_owned(), payload.to_owned());
                Ok(())
            }
            Backing::Sqlite(connection) => {
                let mut put_slot = connection.prepare_cached(
                    "
                insert into Slot (
                    Slot_Name,
                    Contents,
                    Saved_At
                ) values (?, ?, ?)
                on conflict (Slot_Name) do update set
                    Contents = excluded.Contents,
                    Saved_At = excluded.Saved_At
            ",
                )?;
                put_slot.execute(params![name, payload, Utc::now()])?;
                let content_hash = blake3::hash(payload.as_bytes()).to_hex().to_string();
                let chained = match &self.superhash {
                    Some(head) => {
                        let mut hasher = blake3::Hasher::new();
                        hasher.update(head.as_bytes());
                        hasher.update(content_hash.as_bytes());
                        hasher.finalize().to_hex().to_string()
                    }
                    None => content_hash.clone(),
                };
                let mut add_ledger = connection.prepare_cached(
                    "
                insert into Ledger (
                    Ledger_Index,
                    Slot_Name,
                    Content_Hash,
                    Super_Hash,
                    Chained_At
                ) select coalesce(max(Ledger_Index), 0) + 1, ?, ?, ?, ?
                    from Ledger
            ",
                )?;
                add_ledger.execute(params![name, content_hash, chained, Utc::now()])?;
                self.superhash = Some(chained);
                Ok(())
            }
        }
    }

    /// Head of the ledger chain. `None` in memory mode, and in file mode until
    /// the first save.
    pub fn current_superhash(&self) -> Option<String> {
        self.superhash.clone()
    }
}

//! Storage binding for the partitioned record types.

use redb::TableDefinition;
use serde::Serialize;
use serde::de::DeserializeOwned;

use shift_core::{Fault, GeneralNote, PlannedWork, ShiftKey};

use crate::feed::Collection;
use crate::tables::*;

/// A record stored in its own table and listed per shift through an
/// ordered index table.
pub trait Record: Serialize + DeserializeOwned + Send + 'static {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]>;
    const INDEX: TableDefinition<'static, &'static str, &'static str>;
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn shift_id(&self) -> &ShiftKey;
    fn created_at(&self) -> u64;

    /// Composite key in the index table.
    fn index_key(&self) -> String {
        format!("{}/{:020}/{}", self.shift_id(), self.created_at(), self.id())
    }
}

/// Key range `[start, end)` covering one partition of an index table.
pub(crate) fn partition_range(shift: &ShiftKey) -> (String, String) {
    // '0' sorts right after '/', so the range ends just past the partition.
    (format!("{shift}/"), format!("{shift}0"))
}

impl Record for Fault {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = FAULTS;
    const INDEX: TableDefinition<'static, &'static str, &'static str> = FAULTS_BY_SHIFT;
    const COLLECTION: Collection = Collection::Faults;

    fn id(&self) -> &str {
        &self.id
    }
    fn shift_id(&self) -> &ShiftKey {
        &self.shift_id
    }
    fn created_at(&self) -> u64 {
        self.created_at
    }
}

impl Record for PlannedWork {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = PLANNED;
    const INDEX: TableDefinition<'static, &'static str, &'static str> = PLANNED_BY_SHIFT;
    const COLLECTION: Collection = Collection::Planned;

    fn id(&self) -> &str {
        &self.id
    }
    fn shift_id(&self) -> &ShiftKey {
        &self.shift_id
    }
    fn created_at(&self) -> u64 {
        self.created_at
    }
}

impl Record for GeneralNote {
    const TABLE: TableDefinition<'static, &'static str, &'static [u8]> = NOTES;
    const INDEX: TableDefinition<'static, &'static str, &'static str> = NOTES_BY_SHIFT;
    const COLLECTION: Collection = Collection::Notes;

    fn id(&self) -> &str {
        &self.id
    }
    fn shift_id(&self) -> &ShiftKey {
        &self.shift_id
    }
    fn created_at(&self) -> u64 {
        self.created_at
    }
}

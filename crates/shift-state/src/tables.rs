//! redb table definitions for the shift store.
//!
//! Record tables use `&str` keys (record id) and `&[u8]` values
//! (JSON-serialized records). Index tables map
//! `{shift}/{created_at:020}/{id}` to the record id.

use redb::TableDefinition;

/// Faults keyed by `{id}`.
pub const FAULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("faults");

/// Fault ids ordered by partition and creation time.
pub const FAULTS_BY_SHIFT: TableDefinition<&str, &str> = TableDefinition::new("faults_by_shift");

/// Planned works keyed by `{id}`.
pub const PLANNED: TableDefinition<&str, &[u8]> = TableDefinition::new("planned");

/// Planned work ids ordered by partition and creation time.
pub const PLANNED_BY_SHIFT: TableDefinition<&str, &str> =
    TableDefinition::new("planned_by_shift");

/// General notes keyed by `{id}`.
pub const NOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("notes");

/// Note ids ordered by partition and creation time.
pub const NOTES_BY_SHIFT: TableDefinition<&str, &str> = TableDefinition::new("notes_by_shift");

/// Shift details keyed by `{shift}`.
pub const SHIFTS: TableDefinition<&str, &[u8]> = TableDefinition::new("shifts");

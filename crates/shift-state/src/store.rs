//! StateStore: redb-backed, shift-partitioned persistence for ControlShift.
//!
//! Provides typed create/update/delete/list operations over faults, planned
//! works, general notes and shift details. All values are JSON-serialized
//! into redb's `&[u8]` value columns. The store supports on-disk and
//! in-memory backends (the latter for testing), plus an offline mode used
//! when no database is configured.
//!
//! Every mutation returns an explicit [`StateResult`]; callers decide
//! whether a failure is surfaced or only logged.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tracing::{debug, warn};

use shift_core::{
    Fault, FaultUpdate, GeneralNote, NewFault, PlannedWork, RecordId, ShiftDetails, ShiftKey,
};

use crate::error::{StateError, StateResult};
use crate::feed::{Collection, Feed, Notify, Subscription};
use crate::record::{Record, partition_range};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe shift store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    /// `None` when the store is offline.
    db: Option<Arc<Database>>,
    feed: Arc<Feed>,
    last_stamp: Arc<AtomicU64>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self::with_database(db);
        store.ensure_tables()?;
        debug!(?path, "shift store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self::with_database(db);
        store.ensure_tables()?;
        debug!("in-memory shift store opened");
        Ok(store)
    }

    /// A store with no database behind it. Mutations fail with
    /// [`StateError::Offline`], reads are empty, feeds never fire.
    pub fn offline() -> Self {
        debug!("shift store running offline");
        Self {
            db: None,
            feed: Arc::new(Feed::default()),
            last_stamp: Arc::new(AtomicU64::new(0)),
        }
    }

    fn with_database(db: Database) -> Self {
        Self {
            db: Some(Arc::new(db)),
            feed: Arc::new(Feed::default()),
            last_stamp: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_online(&self) -> bool {
        self.db.is_some()
    }

    /// Number of live feed subscriptions.
    pub fn listener_count(&self) -> usize {
        self.feed.listener_count()
    }

    fn db(&self) -> StateResult<&Database> {
        self.db.as_deref().ok_or(StateError::Offline)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db()?.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(FAULTS).map_err(map_err!(Table))?;
        txn.open_table(FAULTS_BY_SHIFT).map_err(map_err!(Table))?;
        txn.open_table(PLANNED).map_err(map_err!(Table))?;
        txn.open_table(PLANNED_BY_SHIFT).map_err(map_err!(Table))?;
        txn.open_table(NOTES).map_err(map_err!(Table))?;
        txn.open_table(NOTES_BY_SHIFT).map_err(map_err!(Table))?;
        txn.open_table(SHIFTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Epoch milliseconds, strictly increasing across this store's clones.
    fn next_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let prev = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    fn next_id() -> RecordId {
        uuid::Uuid::new_v4().to_string()
    }

    // ── Generic record plumbing ────────────────────────────────────

    fn insert_record<R: Record>(&self, record: &R) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let index_key = record.index_key();
        let txn = self.db()?.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(R::TABLE).map_err(map_err!(Table))?;
            table
                .insert(record.id(), value.as_slice())
                .map_err(map_err!(Write))?;
            let mut index = txn.open_table(R::INDEX).map_err(map_err!(Table))?;
            index
                .insert(index_key.as_str(), record.id())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = record.id(), shift = %record.shift_id(), collection = R::COLLECTION.name(), "record stored");
        self.feed.publish(self, record.shift_id(), R::COLLECTION);
        Ok(())
    }

    /// Read-modify-write a record in a single transaction. The index key
    /// never changes because partition and creation time are immutable.
    fn modify_record<R, F>(&self, id: &str, modify: F) -> StateResult<R>
    where
        R: Record,
        F: FnOnce(&mut R),
    {
        let txn = self.db()?.begin_write().map_err(map_err!(Transaction))?;
        let record = {
            let mut table = txn.open_table(R::TABLE).map_err(map_err!(Table))?;
            let mut record: R = {
                let guard = table
                    .get(id)
                    .map_err(map_err!(Read))?
                    .ok_or_else(|| StateError::NotFound(format!("{} {id}", R::COLLECTION.name())))?;
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
            };
            modify(&mut record);
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table.insert(id, value.as_slice()).map_err(map_err!(Write))?;
            record
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, collection = R::COLLECTION.name(), "record updated");
        self.feed.publish(self, record.shift_id(), R::COLLECTION);
        Ok(record)
    }

    /// Delete a record and its index entry. Returns true if it existed.
    fn delete_record<R: Record>(&self, id: &str) -> StateResult<bool> {
        let txn = self.db()?.begin_write().map_err(map_err!(Transaction))?;
        let removed: Option<R> = {
            let mut table = txn.open_table(R::TABLE).map_err(map_err!(Table))?;
            let removed = match table.remove(id).map_err(map_err!(Write))? {
                Some(guard) => {
                    Some(serde_json::from_slice::<R>(guard.value()).map_err(map_err!(Deserialize))?)
                }
                None => None,
            };
            if let Some(record) = &removed {
                let mut index = txn.open_table(R::INDEX).map_err(map_err!(Table))?;
                index
                    .remove(record.index_key().as_str())
                    .map_err(map_err!(Write))?;
            }
            removed
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, existed = removed.is_some(), collection = R::COLLECTION.name(), "record deleted");
        if let Some(record) = &removed {
            self.feed.publish(self, record.shift_id(), R::COLLECTION);
        }
        Ok(removed.is_some())
    }

    /// List a partition newest-first via a reverse scan of the index.
    fn list_records<R: Record>(&self, shift: &ShiftKey) -> StateResult<Vec<R>> {
        let Some(db) = self.db.as_deref() else {
            return Ok(Vec::new());
        };
        let txn = db.begin_read().map_err(map_err!(Transaction))?;
        let index = open_index(&txn, R::INDEX)?;
        let table = txn.open_table(R::TABLE).map_err(map_err!(Table))?;
        let (start, end) = partition_range(shift);
        let mut results = Vec::new();
        for entry in index
            .range(start.as_str()..end.as_str())
            .map_err(map_err!(Read))?
            .rev()
        {
            let (_, id) = entry.map_err(map_err!(Read))?;
            let id = id.value();
            match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    let record: R =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    results.push(record);
                }
                None => warn!(%id, collection = R::COLLECTION.name(), "index entry without record"),
            }
        }
        Ok(results)
    }

    fn subscribe_records<R, F>(&self, shift: &ShiftKey, on_change: F) -> Subscription
    where
        R: Record,
        F: Fn(StateResult<Vec<R>>) + Send + Sync + 'static,
    {
        let partition = shift.clone();
        let notify: Notify =
            Arc::new(move |store: &StateStore| on_change(store.list_records::<R>(&partition)));
        self.subscribe(shift, R::COLLECTION, notify)
    }

    fn subscribe(&self, shift: &ShiftKey, collection: Collection, notify: Notify) -> Subscription {
        if !self.is_online() {
            return Subscription::inert();
        }
        let subscription = self.feed.register(shift.clone(), collection, Arc::clone(&notify));
        notify(self);
        subscription
    }

    // ── Faults ─────────────────────────────────────────────────────

    /// Store a new fault report in the shift's partition.
    pub fn add_fault(&self, shift: &ShiftKey, fault: NewFault) -> StateResult<Fault> {
        self.db()?;
        let fault = fault.into_fault(Self::next_id(), shift.clone(), self.next_timestamp());
        self.insert_record(&fault)?;
        Ok(fault)
    }

    /// Apply a partial update in place.
    pub fn update_fault(&self, id: &str, update: FaultUpdate) -> StateResult<Fault> {
        self.modify_record(id, |fault: &mut Fault| update.apply(fault))
    }

    /// Flip `open ↔ closed` atomically.
    pub fn toggle_fault(&self, id: &str) -> StateResult<Fault> {
        self.modify_record(id, |fault: &mut Fault| fault.status = fault.status.toggled())
    }

    /// Delete a fault by id. Returns true if it existed.
    pub fn delete_fault(&self, id: &str) -> StateResult<bool> {
        self.delete_record::<Fault>(id)
    }

    /// Faults of a shift, newest first.
    pub fn list_faults(&self, shift: &ShiftKey) -> StateResult<Vec<Fault>> {
        self.list_records(shift)
    }

    pub fn subscribe_faults<F>(&self, shift: &ShiftKey, on_change: F) -> Subscription
    where
        F: Fn(StateResult<Vec<Fault>>) + Send + Sync + 'static,
    {
        self.subscribe_records(shift, on_change)
    }

    // ── Planned works ──────────────────────────────────────────────

    pub fn add_planned(&self, shift: &ShiftKey, description: &str) -> StateResult<PlannedWork> {
        self.db()?;
        let work = PlannedWork {
            id: Self::next_id(),
            description: description.to_string(),
            shift_id: shift.clone(),
            created_at: self.next_timestamp(),
        };
        self.insert_record(&work)?;
        Ok(work)
    }

    pub fn delete_planned(&self, id: &str) -> StateResult<bool> {
        self.delete_record::<PlannedWork>(id)
    }

    pub fn list_planned(&self, shift: &ShiftKey) -> StateResult<Vec<PlannedWork>> {
        self.list_records(shift)
    }

    pub fn subscribe_planned<F>(&self, shift: &ShiftKey, on_change: F) -> Subscription
    where
        F: Fn(StateResult<Vec<PlannedWork>>) + Send + Sync + 'static,
    {
        self.subscribe_records(shift, on_change)
    }

    // ── General notes ──────────────────────────────────────────────

    pub fn add_note(&self, shift: &ShiftKey, content: &str) -> StateResult<GeneralNote> {
        self.db()?;
        let note = GeneralNote {
            id: Self::next_id(),
            content: content.to_string(),
            shift_id: shift.clone(),
            created_at: self.next_timestamp(),
        };
        self.insert_record(&note)?;
        Ok(note)
    }

    pub fn delete_note(&self, id: &str) -> StateResult<bool> {
        self.delete_record::<GeneralNote>(id)
    }

    pub fn list_notes(&self, shift: &ShiftKey) -> StateResult<Vec<GeneralNote>> {
        self.list_records(shift)
    }

    pub fn subscribe_notes<F>(&self, shift: &ShiftKey, on_change: F) -> Subscription
    where
        F: Fn(StateResult<Vec<GeneralNote>>) + Send + Sync + 'static,
    {
        self.subscribe_records(shift, on_change)
    }

    // ── Shift details ──────────────────────────────────────────────

    /// Upsert the controller pair of a shift as a whole.
    pub fn put_shift_details(
        &self,
        shift: &ShiftKey,
        controllers: [String; 2],
    ) -> StateResult<ShiftDetails> {
        let details = ShiftDetails {
            shift_id: Some(shift.clone()),
            controllers,
        };
        let value = serde_json::to_vec(&details).map_err(map_err!(Serialize))?;
        let txn = self.db()?.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SHIFTS).map_err(map_err!(Table))?;
            table
                .insert(shift.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%shift, "shift details stored");
        self.feed.publish(self, shift, Collection::ShiftDetails);
        Ok(details)
    }

    pub fn get_shift_details(&self, shift: &ShiftKey) -> StateResult<Option<ShiftDetails>> {
        let Some(db) = self.db.as_deref() else {
            return Ok(None);
        };
        let txn = db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SHIFTS).map_err(map_err!(Table))?;
        match table.get(shift.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let details: ShiftDetails =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(details))
            }
            None => Ok(None),
        }
    }

    pub fn subscribe_shift_details<F>(&self, shift: &ShiftKey, on_change: F) -> Subscription
    where
        F: Fn(StateResult<Option<ShiftDetails>>) + Send + Sync + 'static,
    {
        let partition = shift.clone();
        let notify: Notify =
            Arc::new(move |store: &StateStore| on_change(store.get_shift_details(&partition)));
        self.subscribe(shift, Collection::ShiftDetails, notify)
    }
}

/// Open an index table for reading; a missing one means the ordered
/// partition query cannot run at all. Any other failure is classified
/// from its message, which may itself point at index infrastructure.
fn open_index(
    txn: &ReadTransaction,
    definition: TableDefinition<'static, &'static str, &'static str>,
) -> StateResult<redb::ReadOnlyTable<&'static str, &'static str>> {
    txn.open_table(definition).map_err(|e| match e {
        TableError::TableDoesNotExist(_) => StateError::MissingIndex { link: None },
        other => StateError::from_query_message(&other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use shift_core::FaultStatus;
    use shift_core::shift::shift_key;

    fn key(day: u32, label: &str) -> ShiftKey {
        let moment = NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        shift_key(moment, label)
    }

    fn morning() -> ShiftKey {
        key(2, "בוקר")
    }

    fn new_fault(number: &str, name: &str) -> NewFault {
        NewFault {
            site_number: number.to_string(),
            site_name: name.to_string(),
            reason: "תקשורת".to_string(),
            downtime: "12:45".to_string(),
            ..Default::default()
        }
    }

    fn site_numbers(faults: &[Fault]) -> Vec<&str> {
        faults.iter().map(|f| f.site_number.as_str()).collect()
    }

    /// Records every delivery a subscription receives.
    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(StateResult<T>) + Send + Sync + 'static)
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |result: StateResult<T>| {
            sink.lock().unwrap().push(result.unwrap());
        })
    }

    // ── Faults ─────────────────────────────────────────────────────

    #[test]
    fn fault_add_and_list() {
        let store = StateStore::open_in_memory().unwrap();
        let fault = store.add_fault(&morning(), new_fault("12", "צפון")).unwrap();

        assert_eq!(fault.status, FaultStatus::Open);
        assert!(fault.treatment.is_empty());
        assert!(!fault.id.is_empty());
        assert_eq!(store.list_faults(&morning()).unwrap(), vec![fault]);
    }

    #[test]
    fn faults_listed_newest_first() {
        let store = StateStore::open_in_memory().unwrap();
        for n in ["1", "2", "3"] {
            store.add_fault(&morning(), new_fault(n, "x")).unwrap();
        }
        let faults = store.list_faults(&morning()).unwrap();
        assert_eq!(site_numbers(&faults), ["3", "2", "1"]);
        assert!(faults.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }

    #[test]
    fn partitions_are_isolated() {
        let store = StateStore::open_in_memory().unwrap();
        store.add_fault(&key(2, "בוקר"), new_fault("1", "a")).unwrap();
        store.add_fault(&key(2, "ערב"), new_fault("2", "b")).unwrap();
        store.add_fault(&key(3, "בוקר"), new_fault("3", "c")).unwrap();

        assert_eq!(site_numbers(&store.list_faults(&key(2, "בוקר")).unwrap()), ["1"]);
        assert_eq!(site_numbers(&store.list_faults(&key(2, "ערב")).unwrap()), ["2"]);
        assert_eq!(site_numbers(&store.list_faults(&key(3, "בוקר")).unwrap()), ["3"]);
        assert!(store.list_faults(&key(3, "לילה")).unwrap().is_empty());
    }

    #[test]
    fn fault_partial_update() {
        let store = StateStore::open_in_memory().unwrap();
        let fault = store.add_fault(&morning(), new_fault("12", "צפון")).unwrap();

        let updated = store
            .update_fault(
                &fault.id,
                FaultUpdate {
                    treatment: Some("הוחלף ספק".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.treatment, "הוחלף ספק");
        assert_eq!(updated.downtime, "12:45");
        assert_eq!(updated.created_at, fault.created_at);

        let listed = store.list_faults(&morning()).unwrap();
        assert_eq!(listed, vec![updated]);
    }

    #[test]
    fn fault_toggle_round_trip() {
        let store = StateStore::open_in_memory().unwrap();
        let fault = store.add_fault(&morning(), new_fault("12", "צפון")).unwrap();

        assert_eq!(store.toggle_fault(&fault.id).unwrap().status, FaultStatus::Closed);
        assert_eq!(store.toggle_fault(&fault.id).unwrap().status, FaultStatus::Open);
    }

    #[test]
    fn fault_update_missing_is_not_found() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.toggle_fault("nope").unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
    }

    #[test]
    fn fault_delete() {
        let store = StateStore::open_in_memory().unwrap();
        let fault = store.add_fault(&morning(), new_fault("12", "צפון")).unwrap();

        assert!(store.delete_fault(&fault.id).unwrap());
        assert!(!store.delete_fault(&fault.id).unwrap());
        assert!(store.list_faults(&morning()).unwrap().is_empty());
    }

    // ── Planned works & notes ──────────────────────────────────────

    #[test]
    fn planned_add_list_delete() {
        let store = StateStore::open_in_memory().unwrap();
        let first = store.add_planned(&morning(), "בדיקת גנרטור").unwrap();
        let second = store.add_planned(&morning(), "החלפת סוללות").unwrap();

        let listed = store.list_planned(&morning()).unwrap();
        assert_eq!(listed, vec![second.clone(), first]);

        assert!(store.delete_planned(&second.id).unwrap());
        assert_eq!(store.list_planned(&morning()).unwrap().len(), 1);
    }

    #[test]
    fn notes_add_list_delete() {
        let store = StateStore::open_in_memory().unwrap();
        let note = store.add_note(&morning(), "הפסקת חשמל אזורית").unwrap();
        assert_eq!(store.list_notes(&morning()).unwrap(), vec![note.clone()]);
        assert!(store.delete_note(&note.id).unwrap());
        assert!(store.list_notes(&morning()).unwrap().is_empty());
    }

    // ── Shift details ──────────────────────────────────────────────

    #[test]
    fn shift_details_upsert() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_shift_details(&morning()).unwrap().is_none());

        store
            .put_shift_details(&morning(), ["דנה".to_string(), String::new()])
            .unwrap();
        store
            .put_shift_details(&morning(), ["דנה".to_string(), "עומר".to_string()])
            .unwrap();

        let details = store.get_shift_details(&morning()).unwrap().unwrap();
        assert_eq!(details.controllers, ["דנה", "עומר"]);
        assert_eq!(details.shift_id, Some(morning()));
        assert!(store.get_shift_details(&key(3, "בוקר")).unwrap().is_none());
    }

    // ── Live feed ──────────────────────────────────────────────────

    #[test]
    fn subscription_delivers_initial_and_full_snapshots() {
        let store = StateStore::open_in_memory().unwrap();
        store.add_fault(&morning(), new_fault("1", "a")).unwrap();

        let (seen, on_change) = recorder::<Vec<Fault>>();
        let sub = store.subscribe_faults(&morning(), on_change);

        store.add_fault(&morning(), new_fault("2", "b")).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(site_numbers(&seen[0]), ["1"]);
        assert_eq!(site_numbers(&seen[1]), ["2", "1"]);
        drop(seen);
        sub.unsubscribe();
    }

    #[test]
    fn subscription_ignores_other_partitions_and_collections() {
        let store = StateStore::open_in_memory().unwrap();
        let (seen, on_change) = recorder::<Vec<Fault>>();
        let _sub = store.subscribe_faults(&morning(), on_change);

        store.add_fault(&key(2, "ערב"), new_fault("9", "z")).unwrap();
        store.add_note(&morning(), "note").unwrap();
        store.add_planned(&morning(), "work").unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn updates_and_deletes_are_pushed() {
        let store = StateStore::open_in_memory().unwrap();
        let fault = store.add_fault(&morning(), new_fault("1", "a")).unwrap();
        let (seen, on_change) = recorder::<Vec<Fault>>();
        let _sub = store.subscribe_faults(&morning(), on_change);

        store.toggle_fault(&fault.id).unwrap();
        store.delete_fault(&fault.id).unwrap();
        // Deleting something that is already gone publishes nothing.
        store.delete_fault(&fault.id).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1][0].status, FaultStatus::Closed);
        assert!(seen[2].is_empty());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let store = StateStore::open_in_memory().unwrap();
        let (seen, on_change) = recorder::<Vec<PlannedWork>>();
        let sub = store.subscribe_planned(&morning(), on_change);
        assert_eq!(store.listener_count(), 1);

        sub.unsubscribe();
        assert_eq!(store.listener_count(), 0);

        store.add_planned(&morning(), "work").unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let store = StateStore::open_in_memory().unwrap();
        let (seen, on_change) = recorder::<Vec<GeneralNote>>();
        {
            let _sub = store.subscribe_notes(&morning(), on_change);
        }
        store.add_note(&morning(), "n").unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn shift_details_feed() {
        let store = StateStore::open_in_memory().unwrap();
        let (seen, on_change) = recorder::<Option<ShiftDetails>>();
        let _sub = store.subscribe_shift_details(&morning(), on_change);

        store
            .put_shift_details(&morning(), ["דנה".to_string(), String::new()])
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_none());
        assert_eq!(seen[1].as_ref().unwrap().controllers[0], "דנה");
    }

    #[test]
    fn clones_share_the_feed() {
        let store = StateStore::open_in_memory().unwrap();
        let writer = store.clone();
        let (seen, on_change) = recorder::<Vec<GeneralNote>>();
        let _sub = store.subscribe_notes(&morning(), on_change);

        writer.add_note(&morning(), "from another handle").unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    // ── Offline ────────────────────────────────────────────────────

    #[test]
    fn offline_store_is_a_no_op() {
        let store = StateStore::offline();
        assert!(!store.is_online());

        assert!(store.add_fault(&morning(), new_fault("1", "a")).unwrap_err().is_offline());
        assert!(store.add_planned(&morning(), "w").unwrap_err().is_offline());
        assert!(store.add_note(&morning(), "n").unwrap_err().is_offline());
        assert!(store.toggle_fault("x").unwrap_err().is_offline());
        assert!(store.delete_note("x").unwrap_err().is_offline());
        assert!(
            store
                .put_shift_details(&morning(), [String::new(), String::new()])
                .unwrap_err()
                .is_offline()
        );

        assert!(store.list_faults(&morning()).unwrap().is_empty());
        assert!(store.get_shift_details(&morning()).unwrap().is_none());

        let (seen, on_change) = recorder::<Vec<Fault>>();
        let sub = store.subscribe_faults(&morning(), on_change);
        assert!(!sub.is_live());
        assert!(seen.lock().unwrap().is_empty());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("shift.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.add_fault(&morning(), new_fault("12", "צפון")).unwrap();
            store
                .put_shift_details(&morning(), ["דנה".to_string(), String::new()])
                .unwrap();
        }

        let store = StateStore::open(&db_path).unwrap();
        let faults = store.list_faults(&morning()).unwrap();
        assert_eq!(site_numbers(&faults), ["12"]);
        assert!(store.get_shift_details(&morning()).unwrap().is_some());
    }

    #[test]
    fn timestamps_strictly_increase() {
        let store = StateStore::open_in_memory().unwrap();
        let stamps: Vec<u64> = (0..50).map(|_| store.next_timestamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn database_without_index_tables_reports_missing_index() {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .unwrap();
        let store = StateStore::with_database(db);

        let err = store.list_faults(&morning()).unwrap_err();
        assert!(err.is_missing_index());
        assert!(matches!(err, StateError::MissingIndex { link: None }));

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let _subscription = store.subscribe_faults(&morning(), move |result| {
            sink.lock().unwrap().push(result.is_err_and(|e| e.is_missing_index()));
        });
        assert_eq!(*errors.lock().unwrap(), [true]);

        store.ensure_tables().unwrap();
        assert!(store.list_faults(&morning()).unwrap().is_empty());
    }
}

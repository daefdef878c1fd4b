//! The live shift board.
//!
//! `ShiftBoard` holds the working set of the active shift: the three record
//! lists, the controller pair, the connection and index state, and the last
//! AI summary. It is fed by store subscriptions on the active partition and
//! re-derives the partition from the clock on every access, so crossing a
//! shift boundary swaps the subscriptions over without a restart.
//!
//! Every change to the working set is announced on a broadcast channel as a
//! [`BoardEvent`] naming the part that changed.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use shift_core::summary::build_summary;
use shift_core::{
    Clock, Fault, FaultUpdate, GeneralNote, NewFault, PlannedWork, ShiftContext, ShiftDetails,
    ShiftKey, ShiftSchedule, SummaryContext, SummaryFormat, SummarySnapshot,
};
use shift_state::{StateError, StateResult, StateStore, Subscription};

use crate::debounce::Debouncer;
use crate::summarizer::{SummarizeError, Summarizer, SummaryRequest};

const EVENT_CAPACITY: usize = 64;

/// Shown when the index exists nowhere and no remediation link was given.
pub const MISSING_INDEX_MESSAGE: &str = "חסר אינדקס במאגר הנתונים.";

/// Which part of the board changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    Faults,
    Planned,
    Notes,
    Controllers,
    /// Connection or index banner state.
    Status,
    AiSummary,
    /// The active partition moved to a new shift.
    ShiftChanged,
}

impl BoardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::Faults => "faults",
            BoardEvent::Planned => "planned",
            BoardEvent::Notes => "notes",
            BoardEvent::Controllers => "controllers",
            BoardEvent::Status => "status",
            BoardEvent::AiSummary => "ai",
            BoardEvent::ShiftChanged => "shift",
        }
    }
}

/// Persistent warning that the ordered fault query cannot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBanner {
    pub link: Option<String>,
}

impl IndexBanner {
    pub fn message(&self) -> &str {
        self.link.as_deref().unwrap_or(MISSING_INDEX_MESSAGE)
    }
}

struct WorkingSet {
    context: ShiftContext,
    faults: Vec<Fault>,
    planned: Vec<PlannedWork>,
    notes: Vec<GeneralNote>,
    controllers: [String; 2],
    connected: bool,
    index_banner: Option<IndexBanner>,
    ai_summary: Option<String>,
    subscriptions: Vec<Subscription>,
    closed: bool,
}

impl WorkingSet {
    fn new(context: ShiftContext) -> Self {
        Self {
            context,
            faults: Vec::new(),
            planned: Vec::new(),
            notes: Vec::new(),
            controllers: Default::default(),
            connected: false,
            index_banner: None,
            ai_summary: None,
            subscriptions: Vec::new(),
            closed: false,
        }
    }

    fn clear_partition(&mut self) {
        self.faults.clear();
        self.planned.clear();
        self.notes.clear();
        self.controllers = Default::default();
        self.index_banner = None;
    }
}

/// Point-in-time copy of the board, safe to render from.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub context: ShiftContext,
    pub faults: Vec<Fault>,
    pub planned: Vec<PlannedWork>,
    pub notes: Vec<GeneralNote>,
    pub controllers: [String; 2],
    pub connected: bool,
    pub online: bool,
    pub index_banner: Option<IndexBanner>,
    pub ai_summary: Option<String>,
}

impl BoardSnapshot {
    pub fn summary_input(&self) -> SummarySnapshot<'_> {
        SummarySnapshot {
            faults: &self.faults,
            planned: &self.planned,
            notes: &self.notes,
            controllers: &self.controllers,
            shift_label: &self.context.label,
            date_display: &self.context.date_display,
            ai_summary: self.ai_summary.as_deref(),
        }
    }

    /// Handover report built from this snapshot.
    pub fn summary(&self, format: SummaryFormat) -> String {
        build_summary(&self.summary_input(), format)
    }
}

pub struct ShiftBoard {
    store: StateStore,
    clock: Arc<dyn Clock>,
    schedule: ShiftSchedule,
    state: Arc<Mutex<WorkingSet>>,
    events: broadcast::Sender<BoardEvent>,
    closing: watch::Sender<bool>,
    debouncer: Debouncer,
}

impl ShiftBoard {
    /// Create the board and subscribe to the current shift's partition.
    pub fn new(
        store: StateStore,
        clock: Arc<dyn Clock>,
        schedule: ShiftSchedule,
        debounce: Duration,
    ) -> Self {
        let context = ShiftContext::capture(clock.as_ref(), &schedule);
        info!(shift = %context.key, label = %context.label, online = store.is_online(), "shift board started");
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (closing, _) = watch::channel(false);
        let board = Self {
            store,
            clock,
            schedule,
            state: Arc::new(Mutex::new(WorkingSet::new(context.clone()))),
            events,
            closing,
            debouncer: Debouncer::new(debounce),
        };
        board.attach(&context.key);
        board
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Receiver that flips to `true` once the board is shut down.
    pub fn closing(&self) -> watch::Receiver<bool> {
        self.closing.subscribe()
    }

    /// Resolves once the board is shut down.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static + use<> {
        let mut closing = self.closing.subscribe();
        async move {
            // A dropped sender means the board is gone, which counts too.
            let _ = closing.wait_for(|closed| *closed).await;
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closing.borrow()
    }

    /// Current shift context, re-derived from the clock. Moves the board to
    /// the new partition when the shift key has changed.
    pub fn context(&self) -> ShiftContext {
        let current = ShiftContext::capture(self.clock.as_ref(), &self.schedule);
        let (previous, stale) = {
            let mut ws = self.lock();
            if ws.closed {
                return ws.context.clone();
            }
            if ws.context.key == current.key {
                ws.context = current.clone();
                return current;
            }
            let previous = std::mem::replace(&mut ws.context, current.clone());
            ws.clear_partition();
            (previous, std::mem::take(&mut ws.subscriptions))
        };
        drop(stale);
        info!(from = %previous.key, to = %current.key, "shift changed, re-subscribing");
        self.attach(&current.key);
        self.notify(BoardEvent::ShiftChanged);
        current
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.context();
        let ws = self.lock();
        BoardSnapshot {
            context: ws.context.clone(),
            faults: ws.faults.clone(),
            planned: ws.planned.clone(),
            notes: ws.notes.clone(),
            controllers: ws.controllers.clone(),
            connected: ws.connected,
            online: self.store.is_online(),
            index_banner: ws.index_banner.clone(),
            ai_summary: ws.ai_summary.clone(),
        }
    }

    // ── Mutations ──────────────────────────────────────────────────

    pub fn report_fault(&self, fault: NewFault) -> StateResult<Fault> {
        let context = self.context();
        self.store.add_fault(&context.key, fault)
    }

    pub fn update_fault(&self, id: &str, update: FaultUpdate) -> StateResult<Fault> {
        self.store.update_fault(id, update)
    }

    pub fn toggle_fault(&self, id: &str) -> StateResult<Fault> {
        self.store.toggle_fault(id)
    }

    pub fn delete_fault(&self, id: &str) -> StateResult<bool> {
        self.store.delete_fault(id)
    }

    pub fn add_planned(&self, description: &str) -> StateResult<PlannedWork> {
        let context = self.context();
        self.store.add_planned(&context.key, description)
    }

    pub fn delete_planned(&self, id: &str) -> StateResult<bool> {
        self.store.delete_planned(id)
    }

    pub fn add_note(&self, content: &str) -> StateResult<GeneralNote> {
        let context = self.context();
        self.store.add_note(&context.key, content)
    }

    pub fn delete_note(&self, id: &str) -> StateResult<bool> {
        self.store.delete_note(id)
    }

    /// Take the new controller pair at once and write it after the typing
    /// pause. Must be called from within a tokio runtime.
    pub fn edit_controllers(&self, controllers: [String; 2]) {
        let key = self.context().key;
        {
            let mut ws = self.lock();
            if ws.closed {
                debug!(shift = %key, "board is shut down, controller edit dropped");
                return;
            }
            ws.controllers = controllers.clone();
        }

        let store = self.store.clone();
        self.debouncer.schedule(async move {
            match store.put_shift_details(&key, controllers) {
                Ok(_) => debug!(shift = %key, "controllers written"),
                Err(e) => warn!(shift = %key, error = %e, "failed to write controllers"),
            }
        });
    }

    pub fn has_pending_controllers(&self) -> bool {
        self.debouncer.is_pending()
    }

    // ── AI summary ─────────────────────────────────────────────────

    /// Ask the summarizer about the current snapshot. On success the
    /// result replaces the board's AI summary; on failure it is untouched.
    pub async fn request_ai_summary(
        &self,
        summarizer: &dyn Summarizer,
    ) -> Result<String, SummarizeError> {
        let snapshot = self.snapshot();
        let context = SummaryContext::from_snapshot(&snapshot.summary_input());
        let request = SummaryRequest {
            faults: snapshot.faults,
            planned_works: snapshot.planned,
            context,
        };
        let text = summarizer.summarize(&request).await?;
        self.lock().ai_summary = Some(text.clone());
        self.notify(BoardEvent::AiSummary);
        Ok(text)
    }

    pub fn dismiss_ai_summary(&self) -> bool {
        let dismissed = self.lock().ai_summary.take().is_some();
        if dismissed {
            self.notify(BoardEvent::AiSummary);
        }
        dismissed
    }

    /// Cancel the pending controller write, dispose all subscriptions and
    /// end every open event stream. Later calls do nothing.
    pub fn shutdown(&self) {
        let subscriptions = {
            let mut ws = self.lock();
            if ws.closed {
                return;
            }
            ws.closed = true;
            std::mem::take(&mut ws.subscriptions)
        };
        let cancelled = self.debouncer.cancel();
        self.closing.send_replace(true);
        let count = subscriptions.len();
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        info!(subscriptions = count, pending_write_cancelled = cancelled, "shift board shut down");
    }

    // ── Wiring ─────────────────────────────────────────────────────

    fn attach(&self, key: &ShiftKey) {
        let subscriptions = vec![
            self.store.subscribe_faults(key, self.listener(key, apply_faults)),
            self.store.subscribe_planned(key, self.listener(key, apply_planned)),
            self.store.subscribe_notes(key, self.listener(key, apply_notes)),
            self.store
                .subscribe_shift_details(key, self.listener(key, apply_details)),
        ];
        let mut ws = self.lock();
        if !ws.closed && ws.context.key == *key {
            ws.subscriptions = subscriptions;
        }
        // Otherwise the board moved on meanwhile and they drop here.
    }

    /// Wrap a working-set update into a feed callback bound to `key`.
    fn listener<T, F>(
        &self,
        key: &ShiftKey,
        apply: F,
    ) -> impl Fn(StateResult<T>) + Send + Sync + 'static + use<T, F>
    where
        T: 'static,
        F: Fn(&mut WorkingSet, StateResult<T>) -> Option<BoardEvent> + Send + Sync + 'static,
    {
        let state = Arc::downgrade(&self.state);
        let events = self.events.clone();
        let key = key.clone();
        move |result| {
            let Some(state) = state.upgrade() else {
                return;
            };
            let event = {
                let mut ws = lock(&state);
                if ws.context.key != key {
                    return;
                }
                apply(&mut ws, result)
            };
            if let Some(event) = event {
                let _ = events.send(event);
            }
        }
    }

    fn notify(&self, event: BoardEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, WorkingSet> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<WorkingSet>) -> MutexGuard<'_, WorkingSet> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn apply_faults(ws: &mut WorkingSet, result: StateResult<Vec<Fault>>) -> Option<BoardEvent> {
    match result {
        Ok(faults) => {
            ws.faults = faults;
            ws.connected = true;
            ws.index_banner = None;
            Some(BoardEvent::Faults)
        }
        Err(StateError::MissingIndex { link }) => {
            warn!(shift = %ws.context.key, link = ?link, "fault query has no index");
            ws.index_banner = Some(IndexBanner { link });
            Some(BoardEvent::Status)
        }
        Err(e) => {
            warn!(shift = %ws.context.key, error = %e, "fault feed error");
            None
        }
    }
}

fn apply_planned(ws: &mut WorkingSet, result: StateResult<Vec<PlannedWork>>) -> Option<BoardEvent> {
    match result {
        Ok(planned) => {
            ws.planned = planned;
            Some(BoardEvent::Planned)
        }
        Err(e) => {
            warn!(shift = %ws.context.key, error = %e, "planned works feed error");
            None
        }
    }
}

fn apply_notes(ws: &mut WorkingSet, result: StateResult<Vec<GeneralNote>>) -> Option<BoardEvent> {
    match result {
        Ok(notes) => {
            ws.notes = notes;
            Some(BoardEvent::Notes)
        }
        Err(e) => {
            warn!(shift = %ws.context.key, error = %e, "notes feed error");
            None
        }
    }
}

fn apply_details(
    ws: &mut WorkingSet,
    result: StateResult<Option<ShiftDetails>>,
) -> Option<BoardEvent> {
    match result {
        Ok(Some(details)) => {
            ws.controllers = details.controllers;
            Some(BoardEvent::Controllers)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(shift = %ws.context.key, error = %e, "shift details feed error");
            None
        }
    }
}

//! shift-dashboard: live shift board and server-rendered web UI.
//!
//! [`ShiftBoard`] mirrors the active shift's partition of the store and
//! announces changes as [`BoardEvent`]s. The axum handlers render Askama
//! templates from board snapshots; HTMX swaps partials in when the event
//! stream names them.
//!
//! # Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | Shift board page |
//! | `GET /partials/{faults,planned,notes,controllers,status,ai}` | Section fragments |
//! | `POST /faults`, `/faults/{id}/{treatment,downtime,toggle,delete}` | Fault actions |
//! | `POST /planned`, `/planned/{id}/delete` | Planned work actions |
//! | `POST /notes`, `/notes/{id}/delete` | Note actions |
//! | `POST /controllers` | Debounced controller edit |
//! | `POST /ai-summary`, `/ai-summary/dismiss` | AI summary |
//! | `GET /export/plain`, `/export/share` | Handover report |
//! | `GET /events` | Server-sent board events |
//! | `GET /healthz` | Liveness |

pub mod actions;
pub mod board;
pub mod debounce;
pub mod events;
pub mod pages;
pub mod partials;
pub mod summarizer;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

pub use board::{BoardEvent, BoardSnapshot, IndexBanner, ShiftBoard};
pub use summarizer::{HttpSummarizer, SummarizeError, Summarizer, UnconfiguredSummarizer};

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub board: Arc<ShiftBoard>,
    pub summarizer: Arc<dyn Summarizer>,
}

/// Build the dashboard router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::board))
        .route("/healthz", get(pages::healthz))
        .route("/events", get(events::stream))
        // Partials
        .route("/partials/faults", get(partials::faults))
        .route("/partials/planned", get(partials::planned))
        .route("/partials/notes", get(partials::notes))
        .route("/partials/controllers", get(partials::controllers))
        .route("/partials/status", get(partials::status))
        .route("/partials/ai", get(partials::ai))
        // Actions
        .route("/faults", post(actions::report_fault))
        .route("/faults/{id}/treatment", post(actions::update_treatment))
        .route("/faults/{id}/downtime", post(actions::update_downtime))
        .route("/faults/{id}/toggle", post(actions::toggle_fault))
        .route("/faults/{id}/delete", post(actions::delete_fault))
        .route("/planned", post(actions::add_planned))
        .route("/planned/{id}/delete", post(actions::delete_planned))
        .route("/notes", post(actions::add_note))
        .route("/notes/{id}/delete", post(actions::delete_note))
        .route("/controllers", post(actions::edit_controllers))
        .route("/ai-summary", post(actions::request_ai_summary))
        .route("/ai-summary/dismiss", post(actions::dismiss_ai_summary))
        .route("/export/plain", get(actions::export_plain))
        .route("/export/share", get(actions::export_share))
        .with_state(state)
}

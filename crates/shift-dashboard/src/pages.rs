//! Dashboard page handlers.
//!
//! The board page renders every section at once from a single snapshot.
//! HTMX partials are in `partials.rs`.

use askama::Template;
use axum::Json;
use axum::extract::State;
use axum::response::Html;
use serde_json::{Value, json};

use crate::DashboardState;
use crate::partials::render;
use crate::views::*;

// ── Board ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "board.html")]
struct BoardTemplate {
    status: StatusView,
    faults: Vec<FaultView>,
    planned: Vec<ItemView>,
    notes: Vec<ItemView>,
    controllers: [String; 2],
    ai_summary: Option<String>,
}

pub async fn board(State(state): State<DashboardState>) -> Html<String> {
    let view = BoardView::from_snapshot(&state.board.snapshot());
    render(BoardTemplate {
        status: view.status,
        faults: view.faults,
        planned: view.planned,
        notes: view.notes,
        controllers: view.controllers,
        ai_summary: view.ai_summary,
    })
}

// ── Health ──────────────────────────────────────────────────────

pub async fn healthz(State(state): State<DashboardState>) -> Json<Value> {
    let snapshot = state.board.snapshot();
    Json(json!({
        "status": "ok",
        "online": snapshot.online,
        "connected": snapshot.connected,
        "shift": snapshot.context.key.as_str(),
        "listeners": state.board.store().listener_count(),
    }))
}

//! HTMX partial endpoints.
//!
//! These return HTML fragments (not full pages) for HTMX to swap into
//! specific board sections. The page refetches a section whenever the
//! event stream names it.

use askama::Template;
use axum::extract::State;
use axum::response::Html;

use crate::DashboardState;
use crate::board::BoardSnapshot;
use crate::views::*;

pub(crate) fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

// ── Faults ──────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/faults.html")]
struct FaultsPartial {
    faults: Vec<FaultView>,
    status: StatusView,
}

pub(crate) fn render_faults(snapshot: &BoardSnapshot) -> Html<String> {
    render(FaultsPartial {
        faults: snapshot.faults.iter().map(FaultView::from_fault).collect(),
        status: StatusView::from_snapshot(snapshot),
    })
}

pub async fn faults(State(state): State<DashboardState>) -> Html<String> {
    render_faults(&state.board.snapshot())
}

// ── Planned Works ───────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/planned.html")]
struct PlannedPartial {
    planned: Vec<ItemView>,
}

pub(crate) fn render_planned(snapshot: &BoardSnapshot) -> Html<String> {
    render(PlannedPartial {
        planned: snapshot.planned.iter().map(ItemView::from_planned).collect(),
    })
}

pub async fn planned(State(state): State<DashboardState>) -> Html<String> {
    render_planned(&state.board.snapshot())
}

// ── Notes ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/notes.html")]
struct NotesPartial {
    notes: Vec<ItemView>,
}

pub(crate) fn render_notes(snapshot: &BoardSnapshot) -> Html<String> {
    render(NotesPartial {
        notes: snapshot.notes.iter().map(ItemView::from_note).collect(),
    })
}

pub async fn notes(State(state): State<DashboardState>) -> Html<String> {
    render_notes(&state.board.snapshot())
}

// ── Controllers ─────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/controllers.html")]
struct ControllersPartial {
    controllers: [String; 2],
}

pub async fn controllers(State(state): State<DashboardState>) -> Html<String> {
    render(ControllersPartial {
        controllers: state.board.snapshot().controllers,
    })
}

// ── Connection Status ───────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/status.html")]
struct StatusPartial {
    status: StatusView,
}

pub async fn status(State(state): State<DashboardState>) -> Html<String> {
    render(StatusPartial {
        status: StatusView::from_snapshot(&state.board.snapshot()),
    })
}

// ── AI Summary ──────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/ai.html")]
struct AiPartial {
    ai_summary: Option<String>,
}

pub(crate) fn render_ai(snapshot: &BoardSnapshot) -> Html<String> {
    render(AiPartial {
        ai_summary: snapshot.ai_summary.clone(),
    })
}

pub async fn ai(State(state): State<DashboardState>) -> Html<String> {
    render_ai(&state.board.snapshot())
}

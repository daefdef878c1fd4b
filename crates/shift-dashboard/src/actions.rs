//! Dashboard action endpoints.
//!
//! HTMX form handlers that perform mutations and return updated HTML
//! fragments. A failed write is logged and dropped; the fragment is
//! rendered from whatever the board currently holds.

use axum::Form;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect};
use serde::Deserialize;
use tracing::{debug, warn};

use shift_core::share::chat_share_url;
use shift_core::{FaultUpdate, NewFault, SummaryFormat, is_blank};
use shift_state::StateResult;

use crate::DashboardState;
use crate::partials::{render_ai, render_faults, render_notes, render_planned};

/// Log a failed mutation and carry on.
fn settle<T>(action: &'static str, result: StateResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(action, error = %e, "mutation failed");
            None
        }
    }
}

fn rejected(message: &str) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html(format!(
            r#"<div class="text-rose-500 text-sm font-bold">{message}</div>"#
        )),
    )
        .into_response()
}

// ── Faults ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FaultForm {
    pub site_number: String,
    pub site_name: String,
    pub reason: String,
    pub downtime: String,
    /// Checkbox: present only when ticked.
    pub is_power_issue: Option<String>,
    pub battery_backup_time: String,
}

impl FaultForm {
    fn into_new_fault(self) -> NewFault {
        let is_power_issue = self.is_power_issue.is_some();
        NewFault {
            site_number: self.site_number.trim().to_string(),
            site_name: self.site_name.trim().to_string(),
            reason: self.reason,
            downtime: self.downtime,
            is_power_issue,
            battery_backup_time: if is_power_issue {
                self.battery_backup_time
            } else {
                String::new()
            },
        }
    }
}

pub async fn report_fault(
    State(state): State<DashboardState>,
    Form(form): Form<FaultForm>,
) -> impl IntoResponse {
    let fault = form.into_new_fault();
    if !fault.is_complete() {
        return rejected("מספר אתר ושם אתר הם שדות חובה");
    }
    if let Some(fault) = settle("report_fault", state.board.report_fault(fault)) {
        debug!(id = %fault.id, site = %fault.site_number, "fault reported");
    }
    render_faults(&state.board.snapshot()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct TreatmentForm {
    #[serde(default)]
    pub treatment: String,
}

pub async fn update_treatment(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
    Form(form): Form<TreatmentForm>,
) -> StatusCode {
    let update = FaultUpdate {
        treatment: Some(form.treatment),
        ..Default::default()
    };
    settle("update_treatment", state.board.update_fault(&id, update));
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct DowntimeForm {
    #[serde(default)]
    pub downtime: String,
}

pub async fn update_downtime(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
    Form(form): Form<DowntimeForm>,
) -> StatusCode {
    let update = FaultUpdate {
        downtime: Some(form.downtime),
        ..Default::default()
    };
    settle("update_downtime", state.board.update_fault(&id, update));
    StatusCode::NO_CONTENT
}

pub async fn toggle_fault(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> Html<String> {
    settle("toggle_fault", state.board.toggle_fault(&id));
    render_faults(&state.board.snapshot())
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirmed: bool,
}

/// Deleting a fault is permanent, so the request must carry the
/// operator's confirmation.
pub async fn delete_fault(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> impl IntoResponse {
    if !form.confirmed {
        return (
            StatusCode::BAD_REQUEST,
            Html(r#"<div class="text-amber-500 text-sm font-bold">נדרש אישור מחיקה</div>"#.to_string()),
        )
            .into_response();
    }
    settle("delete_fault", state.board.delete_fault(&id));
    render_faults(&state.board.snapshot()).into_response()
}

// ── Planned Works ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlannedForm {
    #[serde(default)]
    pub description: String,
}

pub async fn add_planned(
    State(state): State<DashboardState>,
    Form(form): Form<PlannedForm>,
) -> Html<String> {
    if !is_blank(&form.description) {
        settle("add_planned", state.board.add_planned(&form.description));
    }
    render_planned(&state.board.snapshot())
}

pub async fn delete_planned(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> Html<String> {
    settle("delete_planned", state.board.delete_planned(&id));
    render_planned(&state.board.snapshot())
}

// ── Notes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub content: String,
}

pub async fn add_note(
    State(state): State<DashboardState>,
    Form(form): Form<NoteForm>,
) -> Html<String> {
    if !is_blank(&form.content) {
        settle("add_note", state.board.add_note(&form.content));
    }
    render_notes(&state.board.snapshot())
}

pub async fn delete_note(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> Html<String> {
    settle("delete_note", state.board.delete_note(&id));
    render_notes(&state.board.snapshot())
}

// ── Controllers ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ControllersForm {
    pub first: String,
    pub second: String,
}

pub async fn edit_controllers(
    State(state): State<DashboardState>,
    Form(form): Form<ControllersForm>,
) -> StatusCode {
    state.board.edit_controllers([form.first, form.second]);
    StatusCode::NO_CONTENT
}

// ── AI Summary ──────────────────────────────────────────────────

pub async fn request_ai_summary(State(state): State<DashboardState>) -> Html<String> {
    if let Err(e) = state
        .board
        .request_ai_summary(state.summarizer.as_ref())
        .await
    {
        warn!(error = %e, "AI summary unavailable");
    }
    render_ai(&state.board.snapshot())
}

pub async fn dismiss_ai_summary(State(state): State<DashboardState>) -> Html<String> {
    state.board.dismiss_ai_summary();
    render_ai(&state.board.snapshot())
}

// ── Export ──────────────────────────────────────────────────────

/// Plain-text handover report, ready for the clipboard.
pub async fn export_plain(State(state): State<DashboardState>) -> impl IntoResponse {
    let text = state.board.snapshot().summary(SummaryFormat::Plain);
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
}

/// Redirect to the chat share link carrying the emphasized report.
pub async fn export_share(State(state): State<DashboardState>) -> impl IntoResponse {
    let text = state.board.snapshot().summary(SummaryFormat::Chat);
    match chat_share_url(&text) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to build share link");
            (StatusCode::INTERNAL_SERVER_ERROR, "share link unavailable").into_response()
        }
    }
}

//! View types for dashboard template rendering.
//!
//! These types are purpose-built for Askama templates: they carry
//! pre-formatted strings and computed fields so templates stay simple.

use chrono::{DateTime, Local};

use shift_core::{Fault, GeneralNote, PlannedWork};

use crate::board::BoardSnapshot;

// ── Status ──────────────────────────────────────────────────────

pub struct StatusView {
    pub online: bool,
    pub connected: bool,
    pub shift_label: String,
    pub date_display: String,
    pub shift_key: String,
    pub banner: Option<BannerView>,
}

pub struct BannerView {
    pub message: String,
    pub link: Option<String>,
}

impl StatusView {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            online: snapshot.online,
            connected: snapshot.connected,
            shift_label: snapshot.context.label.clone(),
            date_display: snapshot.context.date_display.clone(),
            shift_key: snapshot.context.key.to_string(),
            banner: snapshot.index_banner.as_ref().map(|b| BannerView {
                message: b.message().to_string(),
                link: b.link.clone(),
            }),
        }
    }
}

// ── Faults ──────────────────────────────────────────────────────

pub struct FaultView {
    pub id: String,
    pub site_number: String,
    pub site_name: String,
    pub reason: String,
    pub downtime: String,
    pub treatment: String,
    pub is_power_issue: bool,
    pub battery_backup_time: String,
    pub is_closed: bool,
    pub row_class: &'static str,
    pub toggle_title: &'static str,
    pub reported_at: String,
}

impl FaultView {
    pub fn from_fault(fault: &Fault) -> Self {
        let is_closed = fault.status.is_closed();
        Self {
            id: fault.id.clone(),
            site_number: fault.site_number.clone(),
            site_name: fault.site_name.clone(),
            reason: fault.reason.clone(),
            downtime: fault.downtime.clone(),
            treatment: fault.treatment.clone(),
            is_power_issue: fault.is_power_issue,
            battery_backup_time: fault.battery_backup_time.clone(),
            is_closed,
            row_class: if is_closed {
                "bg-green-50/40 opacity-70"
            } else {
                "hover:bg-gray-50/50"
            },
            toggle_title: if is_closed { "פתח מחדש" } else { "סגור תקלה" },
            reported_at: clock_display(fault.created_at),
        }
    }
}

// ── Planned works & notes ───────────────────────────────────────

/// A single-text record: a planned work or a general note.
pub struct ItemView {
    pub id: String,
    pub text: String,
    pub reported_at: String,
}

impl ItemView {
    pub fn from_planned(work: &PlannedWork) -> Self {
        Self {
            id: work.id.clone(),
            text: work.description.clone(),
            reported_at: clock_display(work.created_at),
        }
    }

    pub fn from_note(note: &GeneralNote) -> Self {
        Self {
            id: note.id.clone(),
            text: note.content.clone(),
            reported_at: clock_display(note.created_at),
        }
    }
}

// ── Whole board ─────────────────────────────────────────────────

pub struct BoardView {
    pub status: StatusView,
    pub faults: Vec<FaultView>,
    pub planned: Vec<ItemView>,
    pub notes: Vec<ItemView>,
    pub controllers: [String; 2],
    pub ai_summary: Option<String>,
}

impl BoardView {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            status: StatusView::from_snapshot(snapshot),
            faults: snapshot.faults.iter().map(FaultView::from_fault).collect(),
            planned: snapshot.planned.iter().map(ItemView::from_planned).collect(),
            notes: snapshot.notes.iter().map(ItemView::from_note).collect(),
            controllers: snapshot.controllers.clone(),
            ai_summary: snapshot.ai_summary.clone(),
        }
    }
}

/// Local wall-clock `HH:MM` of an epoch-millisecond stamp.
fn clock_display(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

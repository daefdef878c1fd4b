//! Shared record types for a shift partition.
//!
//! Every record carries the `ShiftKey` of the shift it was logged in and
//! is never referenced from another partition.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server-assigned record identifier.
pub type RecordId = String;

// ── Shift key ─────────────────────────────────────────────────────

/// Coarse operational period of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPeriod {
    Morning,
    Evening,
    Night,
}

impl ShiftPeriod {
    pub fn tag(&self) -> &'static str {
        match self {
            ShiftPeriod::Morning => "morning",
            ShiftPeriod::Evening => "evening",
            ShiftPeriod::Night => "night",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "morning" => Some(ShiftPeriod::Morning),
            "evening" => Some(ShiftPeriod::Evening),
            "night" => Some(ShiftPeriod::Night),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid shift key {0:?}: expected YYYY-MM-DD_<morning|evening|night>")]
pub struct InvalidShiftKey(pub String);

/// Partition key: `YYYY-MM-DD_<period>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftKey(String);

impl ShiftKey {
    pub(crate) fn new(date: NaiveDate, period: ShiftPeriod) -> Self {
        Self(format!("{}_{}", date.format("%Y-%m-%d"), period.tag()))
    }

    /// Parse a key previously produced by [`crate::shift::shift_key`].
    pub fn parse(raw: &str) -> Result<Self, InvalidShiftKey> {
        let invalid = || InvalidShiftKey(raw.to_string());
        let (date, tag) = raw.split_once('_').ok_or_else(invalid)?;
        // Zero padding is part of the format.
        if date.len() != 10 || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(invalid());
        }
        ShiftPeriod::from_tag(tag).ok_or_else(invalid)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn period(&self) -> ShiftPeriod {
        self.0
            .split_once('_')
            .and_then(|(_, tag)| ShiftPeriod::from_tag(tag))
            .unwrap_or(ShiftPeriod::Night)
    }
}

impl fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Faults ────────────────────────────────────────────────────────

/// Lifecycle of a site outage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultStatus {
    #[default]
    Open,
    Closed,
}

impl FaultStatus {
    pub fn toggled(self) -> Self {
        match self {
            FaultStatus::Open => FaultStatus::Closed,
            FaultStatus::Closed => FaultStatus::Open,
        }
    }

    pub fn is_closed(self) -> bool {
        self == FaultStatus::Closed
    }
}

/// A site outage logged during a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    pub id: RecordId,
    pub site_number: String,
    pub site_name: String,
    pub reason: String,
    /// Free text as typed by the controller (e.g. "12:45").
    pub downtime: String,
    pub is_power_issue: bool,
    /// Remaining battery backup, free text (e.g. "4 שעות").
    pub battery_backup_time: String,
    pub treatment: String,
    pub status: FaultStatus,
    pub shift_id: ShiftKey,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: u64,
}

/// Fields submitted by the fault report form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewFault {
    pub site_number: String,
    pub site_name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub downtime: String,
    #[serde(default)]
    pub is_power_issue: bool,
    #[serde(default)]
    pub battery_backup_time: String,
}

impl NewFault {
    /// Site number and site name are mandatory.
    pub fn is_complete(&self) -> bool {
        !self.site_number.trim().is_empty() && !self.site_name.trim().is_empty()
    }

    pub fn into_fault(self, id: RecordId, shift_id: ShiftKey, created_at: u64) -> Fault {
        Fault {
            id,
            site_number: self.site_number,
            site_name: self.site_name,
            reason: self.reason,
            downtime: self.downtime,
            is_power_issue: self.is_power_issue,
            battery_backup_time: self.battery_backup_time,
            treatment: String::new(),
            status: FaultStatus::Open,
            shift_id,
            created_at,
        }
    }
}

/// Partial in-place update of a fault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultUpdate {
    pub treatment: Option<String>,
    pub downtime: Option<String>,
    pub status: Option<FaultStatus>,
}

impl FaultUpdate {
    pub fn is_empty(&self) -> bool {
        self.treatment.is_none() && self.downtime.is_none() && self.status.is_none()
    }

    pub fn apply(self, fault: &mut Fault) {
        if let Some(treatment) = self.treatment {
            fault.treatment = treatment;
        }
        if let Some(downtime) = self.downtime {
            fault.downtime = downtime;
        }
        if let Some(status) = self.status {
            fault.status = status;
        }
    }
}

// ── Planned works & notes ─────────────────────────────────────────

/// Scheduled maintenance logged for visibility. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWork {
    pub id: RecordId,
    pub description: String,
    pub shift_id: ShiftKey,
    pub created_at: u64,
}

/// Free-text shift note. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralNote {
    pub id: RecordId,
    pub content: String,
    pub shift_id: ShiftKey,
    pub created_at: u64,
}

/// Single-line text inputs (planned works, notes) must not be blank.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

// ── Shift details ─────────────────────────────────────────────────

/// The controllers on duty, upserted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftDetails {
    pub shift_id: Option<ShiftKey>,
    pub controllers: [String; 2],
}

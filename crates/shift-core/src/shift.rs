//! Shift identification: which shift is on now, and which partition it
//! writes to.
//!
//! The schedule table maps the local hour to a shift label; the label is
//! then classified into a [`ShiftPeriod`] and combined with the calendar
//! date into the [`ShiftKey`] every record is partitioned by.

use std::sync::Mutex;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ShiftKey, ShiftPeriod};

/// Label substring that marks a morning shift.
pub const MORNING_MARKER: &str = "בוקר";
/// Label substring that marks an evening shift.
pub const EVENING_MARKER: &str = "ערב";

/// Classify a free-form shift label. Morning wins over evening when a
/// label contains both; anything else is night.
pub fn classify_label(label: &str) -> ShiftPeriod {
    if label.contains(MORNING_MARKER) {
        ShiftPeriod::Morning
    } else if label.contains(EVENING_MARKER) {
        ShiftPeriod::Evening
    } else {
        ShiftPeriod::Night
    }
}

/// Derive the partition key for `label` at the given local moment.
pub fn shift_key(moment: NaiveDateTime, label: &str) -> ShiftKey {
    ShiftKey::new(moment.date(), classify_label(label))
}

/// Date as shown to controllers (`2.3.2025`).
pub fn display_date(moment: NaiveDateTime) -> String {
    moment.format("%-d.%-m.%Y").to_string()
}

// ── Schedule ──────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("shift window {label:?}: hour {hour} is out of range 0..24")]
    HourOutOfRange { label: String, hour: u32 },

    #[error("shift window {label:?} is empty (start == end)")]
    EmptyWindow { label: String },

    #[error("shift label must not be blank")]
    BlankLabel,
}

/// Half-open local hour range `[start_hour, end_hour)`; wraps past
/// midnight when `end_hour < start_hour`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub label: String,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ShiftWindow {
    pub fn new(label: &str, start_hour: u32, end_hour: u32) -> Self {
        Self {
            label: label.to_string(),
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// The `{hour-range → label}` table supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftSchedule {
    #[serde(rename = "window")]
    pub windows: Vec<ShiftWindow>,
    /// Label for every hour no window covers.
    pub fallback: String,
}

impl Default for ShiftSchedule {
    fn default() -> Self {
        Self {
            windows: vec![
                ShiftWindow::new("בוקר", 7, 15),
                ShiftWindow::new("ערב", 15, 23),
            ],
            fallback: "לילה".to_string(),
        }
    }
}

impl ShiftSchedule {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.fallback.trim().is_empty() {
            return Err(ScheduleError::BlankLabel);
        }
        for window in &self.windows {
            if window.label.trim().is_empty() {
                return Err(ScheduleError::BlankLabel);
            }
            for hour in [window.start_hour, window.end_hour] {
                if hour >= 24 {
                    return Err(ScheduleError::HourOutOfRange {
                        label: window.label.clone(),
                        hour,
                    });
                }
            }
            if window.start_hour == window.end_hour {
                return Err(ScheduleError::EmptyWindow {
                    label: window.label.clone(),
                });
            }
        }
        Ok(())
    }

    /// First window covering the moment's hour wins.
    pub fn label_at(&self, moment: NaiveDateTime) -> &str {
        let hour = moment.hour();
        self.windows
            .iter()
            .find(|w| w.contains(hour))
            .map(|w| w.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

// ── Clock ─────────────────────────────────────────────────────────

/// Source of the local wall-clock moment.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveDateTime>);

impl FixedClock {
    pub fn new(moment: NaiveDateTime) -> Self {
        Self(Mutex::new(moment))
    }

    pub fn set(&self, moment: NaiveDateTime) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = moment;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Context ───────────────────────────────────────────────────────

/// Everything derived from one reading of the clock. The displayed date
/// and the partition key always come from the same moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftContext {
    pub key: ShiftKey,
    pub label: String,
    pub date_display: String,
}

impl ShiftContext {
    pub fn at(moment: NaiveDateTime, schedule: &ShiftSchedule) -> Self {
        let label = schedule.label_at(moment).to_string();
        Self {
            key: shift_key(moment, &label),
            date_display: display_date(moment),
            label,
        }
    }

    pub fn capture(clock: &dyn Clock, schedule: &ShiftSchedule) -> Self {
        Self::at(clock.now(), schedule)
    }
}

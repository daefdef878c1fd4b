//! End-of-shift summary text.
//!
//! Renders an in-memory snapshot of the shift into the handover report
//! shared with the next shift. Pure: the same snapshot and format always
//! produce byte-identical text.

use serde::{Deserialize, Serialize};

use crate::types::{Fault, GeneralNote, PlannedWork};

const TITLE: &str = "סיכום משמרת NOC";
const DATE_LABEL: &str = "תאריך";
const CONTROLLERS_LABEL: &str = "בקרים";
const CONTROLLER_JOINER: &str = " ו- ";
const CLOSED_HEADER: &str = "תקלות שנסגרו:";
const OPEN_HEADER: &str = "תקלות פתוחות:";
const PLANNED_HEADER: &str = "עבודות יזומות:";
const NOTES_HEADER: &str = "אירועים חריגים:";
const AI_HEADER: &str = "סיכום AI:";
const NONE_PLACEHOLDER: &str = "אין";

/// Bold marker understood by the chat share target.
pub const EMPHASIS_MARKER: char = '*';

/// Output variant of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFormat {
    /// Plain text for the clipboard.
    Plain,
    /// Headers wrapped in [`EMPHASIS_MARKER`] for the chat share link.
    Chat,
}

impl SummaryFormat {
    pub fn is_emphasized(self) -> bool {
        self == SummaryFormat::Chat
    }

    fn header(self, text: &str) -> String {
        match self {
            SummaryFormat::Plain => text.to_string(),
            SummaryFormat::Chat => format!("{EMPHASIS_MARKER}{text}{EMPHASIS_MARKER}"),
        }
    }
}

impl std::str::FromStr for SummaryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(SummaryFormat::Plain),
            "chat" => Ok(SummaryFormat::Chat),
            other => Err(format!("unknown summary format {other:?} (expected plain or chat)")),
        }
    }
}

/// The working set a summary is built from.
#[derive(Debug, Clone, Copy)]
pub struct SummarySnapshot<'a> {
    pub faults: &'a [Fault],
    pub planned: &'a [PlannedWork],
    pub notes: &'a [GeneralNote],
    pub controllers: &'a [String; 2],
    pub shift_label: &'a str,
    pub date_display: &'a str,
    pub ai_summary: Option<&'a str>,
}

/// Non-empty controller names joined with the localized conjunction.
pub fn controller_line(controllers: &[String; 2]) -> String {
    controllers
        .iter()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(CONTROLLER_JOINER)
}

/// Stable split into `(closed, open)`, each keeping input order.
pub fn partition_faults(faults: &[Fault]) -> (Vec<&Fault>, Vec<&Fault>) {
    faults.iter().partition(|f| f.status.is_closed())
}

fn fault_line(fault: &Fault) -> String {
    format!("אתר {} ({})", fault.site_number, fault.site_name)
}

fn section<I>(format: SummaryFormat, header: &str, items: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let lines: Vec<String> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect();
    let body = if lines.is_empty() {
        NONE_PLACEHOLDER.to_string()
    } else {
        lines.join("\n")
    };
    format!("{}\n{body}", format.header(header))
}

/// Render the handover report.
pub fn build_summary(snapshot: &SummarySnapshot<'_>, format: SummaryFormat) -> String {
    let (closed, open) = partition_faults(snapshot.faults);

    let mut parts = vec![
        format!(
            "{}\n{DATE_LABEL}: {}\n{CONTROLLERS_LABEL}: {}",
            format.header(&format!("{TITLE} - {}", snapshot.shift_label)),
            snapshot.date_display,
            controller_line(snapshot.controllers),
        ),
        section(format, CLOSED_HEADER, closed.into_iter().map(fault_line)),
        section(format, OPEN_HEADER, open.into_iter().map(fault_line)),
        section(
            format,
            PLANNED_HEADER,
            snapshot.planned.iter().map(|p| p.description.clone()),
        ),
        section(
            format,
            NOTES_HEADER,
            snapshot.notes.iter().map(|n| n.content.clone()),
        ),
    ];

    if let Some(ai) = snapshot.ai_summary.filter(|s| !s.is_empty()) {
        parts.push(format!("{}\n{ai}", format.header(AI_HEADER)));
    }

    parts.join("\n\n")
}

/// Context bundle sent alongside faults and planned works to the
/// summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryContext {
    pub controllers: [String; 2],
    pub shift_type: String,
    pub date: String,
    /// Note contents joined with `", "`.
    pub general_notes: String,
}

impl SummaryContext {
    pub fn from_snapshot(snapshot: &SummarySnapshot<'_>) -> Self {
        Self {
            controllers: snapshot.controllers.clone(),
            shift_type: snapshot.shift_label.to_string(),
            date: snapshot.date_display.to_string(),
            general_notes: snapshot
                .notes
                .iter()
                .map(|n| n.content.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::shift_key;
    use crate::types::{FaultStatus, NewFault, ShiftKey};
    use chrono::NaiveDate;

    fn key() -> ShiftKey {
        let moment = NaiveDate::from_ymd_opt(2025, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        shift_key(moment, "בוקר")
    }

    fn fault(number: &str, name: &str, status: FaultStatus) -> Fault {
        let mut f = NewFault {
            site_number: number.to_string(),
            site_name: name.to_string(),
            reason: "תקשורת".to_string(),
            downtime: "12:45".to_string(),
            ..Default::default()
        }
        .into_fault(format!("f-{number}"), key(), 1000);
        f.status = status;
        f.treatment = "טכנאי בדרך".to_string();
        f
    }

    fn planned(text: &str) -> PlannedWork {
        PlannedWork {
            id: format!("p-{text}"),
            description: text.to_string(),
            shift_id: key(),
            created_at: 1000,
        }
    }

    fn note(text: &str) -> GeneralNote {
        GeneralNote {
            id: format!("n-{text}"),
            content: text.to_string(),
            shift_id: key(),
            created_at: 1000,
        }
    }

    fn names(a: &str, b: &str) -> [String; 2] {
        [a.to_string(), b.to_string()]
    }

    fn snapshot<'a>(
        faults: &'a [Fault],
        planned: &'a [PlannedWork],
        notes: &'a [GeneralNote],
        controllers: &'a [String; 2],
        ai: Option<&'a str>,
    ) -> SummarySnapshot<'a> {
        SummarySnapshot {
            faults,
            planned,
            notes,
            controllers,
            shift_label: "בוקר",
            date_display: "2.3.2025",
            ai_summary: ai,
        }
    }

    /// Lines of the section following `header`, up to the next blank line.
    fn section_lines<'a>(text: &'a str, header: &str) -> Vec<&'a str> {
        text.split("\n\n")
            .find_map(|block| {
                let mut lines = block.lines();
                (lines.next()? == header).then(|| lines.collect())
            })
            .unwrap_or_default()
    }

    #[test]
    fn controller_line_variants() {
        assert_eq!(controller_line(&names("", "")), "");
        assert_eq!(controller_line(&names("דנה", "")), "דנה");
        assert_eq!(controller_line(&names("", "עומר")), "עומר");
        assert_eq!(controller_line(&names("דנה", "עומר")), "דנה ו- עומר");
    }

    #[test]
    fn partition_is_stable() {
        let faults = vec![
            fault("1", "a", FaultStatus::Open),
            fault("2", "b", FaultStatus::Closed),
            fault("3", "c", FaultStatus::Open),
            fault("4", "d", FaultStatus::Closed),
        ];
        let (closed, open) = partition_faults(&faults);
        let ids = |v: &[&Fault]| v.iter().map(|f| f.site_number.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&closed[..]), ["2", "4"]);
        assert_eq!(ids(&open[..]), ["1", "3"]);
        assert_eq!(closed.len() + open.len(), faults.len());
    }

    #[test]
    fn end_to_end_plain() {
        let faults = vec![
            fault("12", "צפון", FaultStatus::Closed),
            fault("34", "דרום", FaultStatus::Open),
        ];
        let planned = vec![planned("בדיקת גנרטור")];
        let controllers = names("דנה", "עומר");
        let text = build_summary(
            &snapshot(&faults, &planned, &[], &controllers, None),
            SummaryFormat::Plain,
        );

        assert_eq!(section_lines(&text, CLOSED_HEADER), ["1. אתר 12 (צפון)"]);
        assert_eq!(section_lines(&text, OPEN_HEADER), ["1. אתר 34 (דרום)"]);
        assert_eq!(section_lines(&text, PLANNED_HEADER), ["1. בדיקת גנרטור"]);
        assert_eq!(section_lines(&text, NOTES_HEADER), [NONE_PLACEHOLDER]);
        assert!(!text.contains(AI_HEADER));
        assert!(!text.contains(EMPHASIS_MARKER));
        // Reason, downtime and treatment never reach the summary.
        assert!(!text.contains("תקשורת"));
        assert!(!text.contains("12:45"));
        assert!(!text.contains("טכנאי"));
    }

    #[test]
    fn exact_plain_layout() {
        let faults = vec![fault("12", "צפון", FaultStatus::Closed)];
        let notes = vec![note("הפסקת חשמל אזורית"), note("עדכון נהלים")];
        let controllers = names("דנה", "");
        let text = build_summary(
            &snapshot(&faults, &[], &notes, &controllers, Some("הכל תקין")),
            SummaryFormat::Plain,
        );

        let expected = "סיכום משמרת NOC - בוקר\n\
                        תאריך: 2.3.2025\n\
                        בקרים: דנה\n\
                        \n\
                        תקלות שנסגרו:\n\
                        1. אתר 12 (צפון)\n\
                        \n\
                        תקלות פתוחות:\n\
                        אין\n\
                        \n\
                        עבודות יזומות:\n\
                        אין\n\
                        \n\
                        אירועים חריגים:\n\
                        1. הפסקת חשמל אזורית\n\
                        2. עדכון נהלים\n\
                        \n\
                        סיכום AI:\n\
                        הכל תקין";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_snapshot_renders_placeholders() {
        let controllers = names("", "");
        let text = build_summary(
            &snapshot(&[], &[], &[], &controllers, None),
            SummaryFormat::Plain,
        );
        assert!(text.contains("בקרים: \n"));
        for header in [CLOSED_HEADER, OPEN_HEADER, PLANNED_HEADER, NOTES_HEADER] {
            assert_eq!(section_lines(&text, header), [NONE_PLACEHOLDER]);
        }
    }

    #[test]
    fn numbered_lines_match_input_lengths() {
        let faults: Vec<Fault> = (0..5)
            .map(|i| {
                let status = if i % 2 == 0 { FaultStatus::Open } else { FaultStatus::Closed };
                fault(&i.to_string(), "x", status)
            })
            .collect();
        let planned: Vec<PlannedWork> = (0..3).map(|i| planned(&format!("עבודה {i}"))).collect();
        let controllers = names("a", "b");
        let text = build_summary(
            &snapshot(&faults, &planned, &[], &controllers, None),
            SummaryFormat::Plain,
        );

        assert_eq!(section_lines(&text, CLOSED_HEADER).len(), 2);
        assert_eq!(section_lines(&text, OPEN_HEADER).len(), 3);
        assert_eq!(
            section_lines(&text, PLANNED_HEADER),
            ["1. עבודה 0", "2. עבודה 1", "3. עבודה 2"]
        );
    }

    #[test]
    fn chat_format_emphasizes_headers_only() {
        let faults = vec![fault("12", "צפון", FaultStatus::Open)];
        let notes = vec![note("בדיקה")];
        let controllers = names("דנה", "עומר");
        let text = build_summary(
            &snapshot(&faults, &[], &notes, &controllers, Some("סיכום")),
            SummaryFormat::Chat,
        );

        assert!(text.starts_with("*סיכום משמרת NOC - בוקר*\n"));
        for header in [CLOSED_HEADER, OPEN_HEADER, PLANNED_HEADER, NOTES_HEADER, AI_HEADER] {
            assert!(text.contains(&format!("*{header}*\n")), "{header} not emphasized");
        }
        for line in text.lines().filter(|l| l.starts_with(char::is_numeric)) {
            assert!(!line.contains(EMPHASIS_MARKER));
        }
        // Exactly two markers per header: title + five sections.
        assert_eq!(text.matches(EMPHASIS_MARKER).count(), 12);
    }

    #[test]
    fn empty_ai_summary_is_omitted() {
        let controllers = names("", "");
        let text = build_summary(
            &snapshot(&[], &[], &[], &controllers, Some("")),
            SummaryFormat::Plain,
        );
        assert!(!text.contains(AI_HEADER));
    }

    #[test]
    fn build_is_idempotent() {
        let faults = vec![
            fault("1", "a", FaultStatus::Closed),
            fault("2", "b", FaultStatus::Open),
        ];
        let notes = vec![note("x")];
        let controllers = names("דנה", "עומר");
        let snap = snapshot(&faults, &[], &notes, &controllers, Some("ai"));
        for format in [SummaryFormat::Plain, SummaryFormat::Chat] {
            assert_eq!(build_summary(&snap, format), build_summary(&snap, format));
        }
    }

    #[test]
    fn context_joins_notes() {
        let notes = vec![note("א"), note("ב")];
        let controllers = names("דנה", "");
        let ctx = SummaryContext::from_snapshot(&snapshot(&[], &[], &notes, &controllers, None));
        assert_eq!(ctx.general_notes, "א, ב");
        assert_eq!(ctx.shift_type, "בוקר");
        assert_eq!(ctx.date, "2.3.2025");
    }

    #[test]
    fn format_parses() {
        assert_eq!("plain".parse::<SummaryFormat>(), Ok(SummaryFormat::Plain));
        assert_eq!("chat".parse::<SummaryFormat>(), Ok(SummaryFormat::Chat));
        assert!("bold".parse::<SummaryFormat>().is_err());
    }
}

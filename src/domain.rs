use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DURATION_MIN: u32 = 1;
pub const DURATION_MAX: u32 = 180;
pub const DEFAULT_DURATION_MIN: u32 = 25;

/// Label stamped on history entries when neither the session nor the
/// selector carries a category. Part of the persisted history format;
/// changing the literal would orphan existing records.
pub const UNSELECTED_LABEL: &str = "未选择";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Running,
    Paused,
}

/// One timed focus interval. At most one is active at a time.
///
/// Decoding is lenient to stay compatible with records written by older
/// versions: a missing `status` reads as running, a missing or
/// non-numeric `pausedTotalMs` reads as 0, and an undefined `pausedAt`
/// reads as null. Decoding never invents a category or duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub duration_min: u32,
    pub start_at: i64,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default, deserialize_with = "paused_total_or_zero")]
    pub paused_total_ms: u64,
    #[serde(default)]
    pub paused_at: Option<i64>,
    #[serde(default)]
    pub category: String,
}

fn paused_total_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

impl Session {
    pub fn start(duration_min: u32, category: String, now_ms: i64) -> Self {
        Self {
            duration_min,
            start_at: now_ms,
            status: SessionStatus::Running,
            paused_total_ms: 0,
            paused_at: None,
            category,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn pause(&mut self, now_ms: i64) {
        if self.status == SessionStatus::Paused {
            return;
        }
        self.status = SessionStatus::Paused;
        self.paused_at = Some(now_ms);
    }

    pub fn resume(&mut self, now_ms: i64) {
        if self.status == SessionStatus::Running {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total_ms += (now_ms - paused_at).max(0) as u64;
        }
        self.status = SessionStatus::Running;
    }

    /// Focus time elapsed so far, with paused stretches subtracted.
    pub fn elapsed_ms(&self, now_ms: i64) -> u64 {
        let pause_in_progress = match (self.status, self.paused_at) {
            (SessionStatus::Paused, Some(paused_at)) => (now_ms - paused_at).max(0) as u64,
            _ => 0,
        };
        let wall = (now_ms - self.start_at).max(0) as u64;
        wall.saturating_sub(self.paused_total_ms + pause_in_progress)
    }

    pub fn remaining_ms(&self, now_ms: i64) -> u64 {
        u64::from(self.duration_min)
            .saturating_mul(60_000)
            .saturating_sub(self.elapsed_ms(now_ms))
    }
}

/// Lenient decode of a stored session record. Old records get their
/// status and pause fields backfilled; anything that does not look like
/// a session at all (including JSON null) reads as "no session".
pub fn normalize_session(record: serde_json::Value) -> Option<Session> {
    serde_json::from_value(record).ok()
}

/// Rounds and clamps a requested duration into the allowed range.
/// Invalid input degrades to the minimum rather than being rejected.
pub fn clamp_duration_min(minutes: f64) -> u32 {
    if !minutes.is_finite() {
        return DURATION_MIN;
    }
    minutes
        .round()
        .clamp(f64::from(DURATION_MIN), f64::from(DURATION_MAX)) as u32
}

/// The remembered default for the next start. Absent or nonsense values
/// fall back to 25 minutes.
pub fn sanitize_last_duration(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        return DEFAULT_DURATION_MIN;
    }
    value.round() as u32
}

/// Per-day total of completed focus minutes, keyed by local calendar
/// date. Absent days mean zero.
pub type DayTotals = BTreeMap<NaiveDate, u32>;

pub fn credit_day(totals: &mut DayTotals, day: NaiveDate, minutes: u32) {
    *totals.entry(day).or_insert(0) += minutes;
}

/// Permanent record of one completed session. Never mutated or deleted
/// once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub start_at: i64,
    pub duration_min: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub note: String,
}

impl HistoryEntry {
    pub fn from_session(session: &Session, current_category: &str, note: &str) -> Self {
        Self {
            start_at: session.start_at,
            duration_min: session.duration_min,
            category: resolve_category(&session.category, current_category),
            note: note.trim().to_string(),
        }
    }
}

/// Category precedence: the session's own label, then the process-wide
/// selector, then the unselected placeholder.
pub fn resolve_category(session_category: &str, current_category: &str) -> String {
    if !session_category.is_empty() {
        session_category.to_string()
    } else if !current_category.is_empty() {
        current_category.to_string()
    } else {
        UNSELECTED_LABEL.to_string()
    }
}

pub fn format_countdown(remaining_ms: u64) -> String {
    let total_seconds = remaining_ms.div_ceil(1000);
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn clamps_requested_duration() {
        assert_eq!(clamp_duration_min(0.0), 1);
        assert_eq!(clamp_duration_min(500.0), 180);
        assert_eq!(clamp_duration_min(25.6), 26);
        assert_eq!(clamp_duration_min(f64::NAN), 1);
    }

    #[test]
    fn sanitizes_last_duration() {
        assert_eq!(sanitize_last_duration(40.0), 40);
        assert_eq!(sanitize_last_duration(25.4), 25);
        assert_eq!(sanitize_last_duration(0.0), DEFAULT_DURATION_MIN);
        assert_eq!(sanitize_last_duration(f64::NAN), DEFAULT_DURATION_MIN);
    }

    #[test]
    fn backfills_legacy_session_fields() {
        let record = json!({ "durationMin": 25, "startAt": 1_700_000_000_000i64 });
        let session = normalize_session(record).expect("legacy record should decode");
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.paused_total_ms, 0);
        assert_eq!(session.paused_at, None);
        assert_eq!(session.category, "");
    }

    #[test]
    fn treats_non_numeric_pause_total_as_zero() {
        let record = json!({
            "durationMin": 25,
            "startAt": 1_700_000_000_000i64,
            "pausedTotalMs": "bogus",
        });
        let session = normalize_session(record).expect("record should decode");
        assert_eq!(session.paused_total_ms, 0);
    }

    #[test]
    fn normalization_is_idempotent() {
        let record = json!({
            "durationMin": 25,
            "startAt": 1_700_000_000_000i64,
            "pausedTotalMs": null,
        });
        let once = normalize_session(record).expect("record should decode");
        let encoded = serde_json::to_value(&once).expect("session should encode");
        let twice = normalize_session(encoded).expect("round trip should decode");
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_records_that_are_not_sessions() {
        assert_eq!(normalize_session(serde_json::Value::Null), None);
        assert_eq!(normalize_session(json!({ "startAt": 1 })), None);
        assert_eq!(normalize_session(json!("focus")), None);
    }

    #[test]
    fn pause_and_resume_bookkeeping() {
        let start = 1_700_000_000_000i64;
        let mut session = Session::start(25, "写作".to_string(), start);

        session.pause(start + 60_000);
        assert!(session.is_paused());
        // Remaining time stands still while paused.
        assert_eq!(session.remaining_ms(start + 60_000), 24 * 60_000);
        assert_eq!(session.remaining_ms(start + 300_000), 24 * 60_000);

        session.resume(start + 300_000);
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.paused_total_ms, 240_000);
        assert_eq!(session.paused_at, None);
        assert_eq!(session.remaining_ms(start + 300_000), 24 * 60_000);
    }

    #[test]
    fn double_pause_and_double_resume_are_no_ops() {
        let start = 1_700_000_000_000i64;
        let mut session = Session::start(25, String::new(), start);
        session.resume(start + 1_000);
        assert_eq!(session.paused_total_ms, 0);

        session.pause(start + 10_000);
        session.pause(start + 20_000);
        assert_eq!(session.paused_at, Some(start + 10_000));
    }

    #[test]
    fn credits_accumulate_per_day() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 28).expect("date should be valid");
        let next = day.succ_opt().expect("next day should exist");
        let mut totals = DayTotals::new();

        credit_day(&mut totals, day, 10);
        credit_day(&mut totals, day, 15);
        credit_day(&mut totals, next, 5);

        assert_eq!(totals.get(&day), Some(&25));
        assert_eq!(totals.get(&next), Some(&5));
    }

    #[test]
    fn day_totals_serialize_with_date_keys() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 28).expect("date should be valid");
        let mut totals = DayTotals::new();
        credit_day(&mut totals, day, 25);

        let encoded = serde_json::to_value(&totals).expect("totals should encode");
        assert_eq!(encoded, json!({ "2026-08-28": 25 }));
    }

    #[test]
    fn category_precedence() {
        assert_eq!(resolve_category("写作", "Deep Work"), "写作");
        assert_eq!(resolve_category("", "Deep Work"), "Deep Work");
        assert_eq!(resolve_category("", ""), UNSELECTED_LABEL);
    }

    #[test]
    fn history_entry_trims_note() {
        let session = Session::start(25, String::new(), 1_700_000_000_000);
        let entry = HistoryEntry::from_session(&session, "", "  finished the draft  ");
        assert_eq!(entry.note, "finished the draft");
        assert_eq!(entry.category, UNSELECTED_LABEL);
        assert_eq!(entry.duration_min, 25);
    }

    #[test]
    fn formats_countdown() {
        assert_eq!(format_countdown(25 * 60_000), "25:00");
        assert_eq!(format_countdown(24 * 60_000 + 59_001), "25:00");
        assert_eq!(format_countdown(59_000), "00:59");
        assert_eq!(format_countdown(0), "00:00");
    }
}

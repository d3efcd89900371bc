use chrono::NaiveDate;

use crate::domain::{
    DEFAULT_DURATION_MIN, DayTotals, HistoryEntry, Session, clamp_duration_min, credit_day,
    normalize_session, sanitize_last_duration,
};
use crate::store::{Store, StoreError};

pub const KEY_LAST_DURATION: &str = "focus_lastDurationMin";
pub const KEY_CURRENT_CATEGORY: &str = "focus_currentCategory";
pub const KEY_CURRENT_SESSION: &str = "focus_currentSession";
pub const KEY_TODAY_TOTALS: &str = "focus_todayTotals";
pub const KEY_HISTORY: &str = "focus_history";

/// All persisted application state, read and written through an injected
/// store. Every operation loads, mutates, and writes back immediately;
/// nothing is cached between calls.
pub struct FocusApp {
    store: Store,
}

impl FocusApp {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn last_duration_min(&self) -> u32 {
        let raw = self
            .store
            .get(KEY_LAST_DURATION, f64::from(DEFAULT_DURATION_MIN))
            .into_value();
        sanitize_last_duration(raw)
    }

    pub fn set_last_duration_min(&mut self, minutes: u32) -> Result<(), StoreError> {
        self.store.set(KEY_LAST_DURATION, &minutes)
    }

    pub fn current_category(&self) -> String {
        self.store
            .get(KEY_CURRENT_CATEGORY, String::new())
            .into_value()
    }

    pub fn set_current_category(&mut self, category: &str) -> Result<(), StoreError> {
        self.store.set(KEY_CURRENT_CATEGORY, &category)
    }

    pub fn current_session(&self) -> Option<Session> {
        let raw = self
            .store
            .get(KEY_CURRENT_SESSION, serde_json::Value::Null)
            .into_value();
        normalize_session(raw)
    }

    /// Starts a fresh session stamped with the current category,
    /// replacing any unfinished one unconditionally. The clamped
    /// duration becomes the remembered default for the next start.
    /// Navigation to the timer view is the caller's job.
    pub fn start_focus(&mut self, minutes: f64, now_ms: i64) -> Result<Session, StoreError> {
        let duration = clamp_duration_min(minutes);
        self.set_last_duration_min(duration)?;

        let session = Session::start(duration, self.current_category(), now_ms);
        self.store.set(KEY_CURRENT_SESSION, &session)?;
        Ok(session)
    }

    /// Writes back an in-flight session, e.g. after pause bookkeeping.
    pub fn save_session(&mut self, session: &Session) -> Result<(), StoreError> {
        self.store.set(KEY_CURRENT_SESSION, session)
    }

    /// Credits the session's minutes to `today` and deletes the active
    /// record. `today` is the local date at finish time, not at start
    /// time: a session spanning midnight lands entirely on the later
    /// day. Does not navigate, so the review workflow can interpose.
    pub fn finish_session(&mut self, session: &Session, today: NaiveDate) -> Result<(), StoreError> {
        let mut totals = self.day_totals();
        credit_day(&mut totals, today, session.duration_min);
        self.store.set(KEY_TODAY_TOTALS, &totals)?;
        self.store.remove(KEY_CURRENT_SESSION)
    }

    pub fn append_history(&mut self, session: &Session, note: &str) -> Result<(), StoreError> {
        let entry = HistoryEntry::from_session(session, &self.current_category(), note);
        let mut history = self.history();
        history.insert(0, entry);
        self.store.set(KEY_HISTORY, &history)
    }

    /// Commits a finished session. Ordered: history is captured first so
    /// it reads the session before it is cleared, then the ledger update
    /// runs and the active record is deleted.
    pub fn finalize(&mut self, session: &Session, note: &str, today: NaiveDate) -> Result<(), StoreError> {
        self.append_history(session, note)?;
        self.finish_session(session, today)
    }

    pub fn day_totals(&self) -> DayTotals {
        self.store.get(KEY_TODAY_TOTALS, DayTotals::new()).into_value()
    }

    pub fn minutes_for_day(&self, day: NaiveDate) -> u32 {
        self.day_totals().get(&day).copied().unwrap_or(0)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.get(KEY_HISTORY, Vec::new()).into_value()
    }
}

use crate::domain::{Session, resolve_category};

/// Post-completion note prompt, modeled as a pure state machine so both
/// the dashboard popup and headless callers can drive it without a
/// rendering surface. One machine is built per session completion; after
/// an exit transition it stays closed and absorbs further input.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    state: State,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Open {
        session: Session,
        category: String,
        note: String,
    },
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewInput {
    Type(char),
    Backspace,
    /// Finalize with the typed note.
    Save,
    /// Explicit skip or the cancel key. Still records a history entry,
    /// just with an empty note.
    Skip,
}

/// Side effects the caller must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewEffect {
    /// No session to review: go straight to the summary view.
    ShowSummary,
    /// Commit the session: history first, then the ledger update and
    /// session delete, then navigate to the summary view.
    Finalize { session: Session, note: String },
}

impl Review {
    /// Entry point. `interactive` is false when no prompt surface is
    /// available; the session is then finalized immediately with an
    /// empty note rather than blocking the user.
    pub fn open(
        session: Option<Session>,
        current_category: &str,
        interactive: bool,
    ) -> (Self, Option<ReviewEffect>) {
        let closed = Self { state: State::Closed };

        let Some(session) = session else {
            return (closed, Some(ReviewEffect::ShowSummary));
        };

        if !interactive {
            return (
                closed,
                Some(ReviewEffect::Finalize {
                    session,
                    note: String::new(),
                }),
            );
        }

        let category = resolve_category(&session.category, current_category);
        let open = Self {
            state: State::Open {
                session,
                category,
                note: String::new(),
            },
        };
        (open, None)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn category(&self) -> Option<&str> {
        match &self.state {
            State::Open { category, .. } => Some(category),
            State::Closed => None,
        }
    }

    pub fn duration_min(&self) -> Option<u32> {
        match &self.state {
            State::Open { session, .. } => Some(session.duration_min),
            State::Closed => None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match &self.state {
            State::Open { note, .. } => Some(note),
            State::Closed => None,
        }
    }

    /// Applies one input. Exit effects surface at most once.
    pub fn handle(&mut self, input: ReviewInput) -> Option<ReviewEffect> {
        match input {
            ReviewInput::Type(ch) => {
                if let State::Open { note, .. } = &mut self.state {
                    note.push(ch);
                }
                None
            }
            ReviewInput::Backspace => {
                if let State::Open { note, .. } = &mut self.state {
                    note.pop();
                }
                None
            }
            ReviewInput::Save | ReviewInput::Skip => {
                match std::mem::replace(&mut self.state, State::Closed) {
                    State::Open { session, note, .. } => {
                        let note = if input == ReviewInput::Save {
                            note
                        } else {
                            String::new()
                        };
                        Some(ReviewEffect::Finalize { session, note })
                    }
                    State::Closed => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::Session;
    use crate::state::FocusApp;
    use crate::store::Store;

    use super::*;

    fn session() -> Session {
        Session::start(25, "写作".to_string(), 1_700_000_000_000)
    }

    #[test]
    fn no_session_redirects_to_summary() {
        let (review, effect) = Review::open(None, "Deep Work", true);
        assert!(!review.is_open());
        assert_eq!(effect, Some(ReviewEffect::ShowSummary));
    }

    #[test]
    fn headless_entry_finalizes_with_empty_note() {
        let (review, effect) = Review::open(Some(session()), "", false);
        assert!(!review.is_open());
        assert_eq!(
            effect,
            Some(ReviewEffect::Finalize {
                session: session(),
                note: String::new(),
            })
        );
    }

    #[test]
    fn shows_resolved_category_and_duration() {
        let (review, _) = Review::open(Some(session()), "Deep Work", true);
        assert_eq!(review.category(), Some("写作"));
        assert_eq!(review.duration_min(), Some(25));
        assert_eq!(review.note(), Some(""));
    }

    #[test]
    fn save_carries_the_typed_note_exactly_once() {
        let (mut review, effect) = Review::open(Some(session()), "", true);
        assert_eq!(effect, None);

        for ch in "done".chars() {
            assert_eq!(review.handle(ReviewInput::Type(ch)), None);
        }
        assert_eq!(review.handle(ReviewInput::Backspace), None);
        assert_eq!(review.note(), Some("don"));

        let effect = review.handle(ReviewInput::Save);
        assert_eq!(
            effect,
            Some(ReviewEffect::Finalize {
                session: session(),
                note: "don".to_string(),
            })
        );

        // The machine is closed now; a second trigger is a no-op.
        assert_eq!(review.handle(ReviewInput::Save), None);
        assert_eq!(review.handle(ReviewInput::Skip), None);
        assert_eq!(review.handle(ReviewInput::Type('x')), None);
    }

    #[test]
    fn skip_discards_typed_text() {
        let (mut review, _) = Review::open(Some(session()), "", true);
        review.handle(ReviewInput::Type('a'));

        let effect = review.handle(ReviewInput::Skip);
        assert_eq!(
            effect,
            Some(ReviewEffect::Finalize {
                session: session(),
                note: String::new(),
            })
        );
    }

    #[test]
    fn skip_path_still_records_one_history_entry() {
        let mut app = FocusApp::new(Store::in_memory());
        let today: NaiveDate = "2026-08-28".parse().expect("date literal should be valid");
        app.start_focus(25.0, 1_700_000_000_000).expect("start should succeed");

        let (mut review, effect) = Review::open(app.current_session(), &app.current_category(), true);
        assert_eq!(effect, None);

        let Some(ReviewEffect::Finalize { session, note }) = review.handle(ReviewInput::Skip) else {
            panic!("skip should finalize");
        };
        app.finalize(&session, &note, today).expect("finalize should succeed");

        let history = app.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].note, "");
        assert_eq!(app.minutes_for_day(today), 25);
        assert_eq!(app.current_session(), None);
    }

    #[test]
    fn missing_session_guard_mutates_nothing() {
        let app = FocusApp::new(Store::in_memory());
        let (_, effect) = Review::open(app.current_session(), &app.current_category(), true);

        assert_eq!(effect, Some(ReviewEffect::ShowSummary));
        assert!(app.history().is_empty());
        assert!(app.day_totals().is_empty());
    }
}

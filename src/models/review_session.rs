//! Interactive study session over a deck's due queue.
//! Drives the scheduling engine: builds the initial queue, applies
//! ratings, persists updated state, and re-queues failed cards at the end
//! of the session.

use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::database::db;
use crate::models::fuzz::RandomFuzz;
use crate::models::stats::{self, StudyStats};
use crate::models::{Flashcard, Quality, SchedulingState, SessionSettings, clock, queue, sm2};

/// Manages one study session: an ordered queue of due cards plus the
/// plumbing to rate them and persist the results.
pub struct ReviewSession {
    pub deck_name: String,
    pub cards: Vec<(i64, Flashcard, SchedulingState)>,
    /// Indices into `cards`, in presentation order. Grows at the tail when
    /// a card is rated Again.
    pub queue: Vec<usize>,
    pub position: usize,
    pub show_answer: bool,
    pub settings: SessionSettings,
    pub today: NaiveDate,
    pub conn: Arc<Mutex<Connection>>,
    fuzz: RandomFuzz,
}

impl ReviewSession {
    /// Creates a session for a deck, ordering its cards into the day's
    /// study queue.
    pub fn new(
        deck_name: String,
        cards: Vec<(i64, Flashcard, SchedulingState)>,
        settings: SessionSettings,
        today: NaiveDate,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let states: Vec<SchedulingState> = cards.iter().map(|(_, _, s)| s.clone()).collect();
        let queue = queue::build_queue(&states, today, &settings);

        Self {
            deck_name,
            cards,
            queue,
            position: 0,
            show_answer: false,
            settings,
            today,
            conn,
            fuzz: RandomFuzz::from_entropy(),
        }
    }

    pub fn current_card(&self) -> Option<(&Flashcard, &SchedulingState)> {
        self.queue
            .get(self.position)
            .and_then(|&idx| self.cards.get(idx))
            .map(|(_, card, state)| (card, state))
    }

    pub fn toggle_answer(&mut self) {
        self.show_answer = !self.show_answer;
    }

    /// Interval preview labels for the four rating buttons, in
    /// Again/Hard/Good/Easy order.
    pub fn preview_labels(&self) -> Option<[String; 4]> {
        let (_, state) = self.current_card()?;
        let now = clock::midnight_utc(self.today);
        let intervals = sm2::preview_intervals(state, &self.settings, now).ok()?;
        Some(intervals.map(|days| {
            if days == 0 {
                "now".to_string()
            } else {
                format!("{days}d")
            }
        }))
    }

    /// Applies a rating to the current card, persists the result, and
    /// advances the queue. An Again-rated card comes back at the end of
    /// the session.
    pub fn grade_current(&mut self, quality: Quality) {
        let Some(&idx) = self.queue.get(self.position) else {
            return;
        };
        let now = clock::midnight_utc(self.today);

        let (card_id, updated) = {
            let (id, _, state) = &self.cards[idx];
            match sm2::compute_next_review(state, quality, &self.settings, now, &mut self.fuzz) {
                Ok(next) => (*id, next),
                Err(e) => {
                    log::warn!("skipping rating for card {id}: {e}");
                    self.position += 1;
                    self.show_answer = false;
                    return;
                }
            }
        };

        {
            let conn = self.conn.lock().unwrap();
            if let Err(e) = db::update_scheduling(card_id, &updated, &conn) {
                log::warn!("failed to persist card {card_id}: {e}");
            }
        }

        self.cards[idx].2 = updated;
        if quality == Quality::Again {
            self.queue.push(idx);
        }
        self.position += 1;
        self.show_answer = false;
    }

    pub fn reviewed_count(&self) -> usize {
        self.position
    }

    pub fn total_count(&self) -> usize {
        self.queue.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.queue.len().saturating_sub(self.position)
    }

    /// The session ends when the queue, including re-queued lapses, is
    /// exhausted.
    pub fn is_completed(&self) -> bool {
        self.position >= self.queue.len()
    }

    pub fn progress_message(&self) -> String {
        format!(
            "Card {} of {} ({} remaining)",
            (self.position + 1).min(self.queue.len()),
            self.queue.len(),
            self.remaining_count()
        )
    }

    /// Stats snapshot over the whole deck, as of the session date.
    pub fn deck_stats(&self) -> StudyStats {
        let states: Vec<SchedulingState> = self.cards.iter().map(|(_, _, s)| s.clone()).collect();
        stats::compute_stats(&states, self.today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{add_flashcard, create_tables, get_deck_cards, new_deck};

    fn session_fixture(fronts: &[(&str, &str)]) -> ReviewSession {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        new_deck("Spanish", &conn).unwrap();
        for (front, back) in fronts {
            add_flashcard("Spanish", front, back, &conn).unwrap();
        }
        let cards = get_deck_cards("Spanish", &conn).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        ReviewSession::new(
            "Spanish".to_string(),
            cards,
            SessionSettings::default(),
            today,
            Arc::new(Mutex::new(conn)),
        )
    }

    #[test]
    fn test_session_queues_new_cards_in_creation_order() {
        let session = session_fixture(&[("uno", "one"), ("dos", "two")]);
        assert_eq!(session.queue, vec![0, 1]);
        assert_eq!(session.total_count(), 2);
        assert!(!session.is_completed());
    }

    #[test]
    fn test_good_ratings_advance_and_persist() {
        let mut session = session_fixture(&[("uno", "one")]);

        session.grade_current(Quality::Good);
        assert!(session.is_completed());

        // The rated state made it both into memory and into the store.
        assert_eq!(session.cards[0].2.history.len(), 1);
        let conn = session.conn.lock().unwrap();
        let stored = get_deck_cards("Spanish", &conn).unwrap();
        assert_eq!(stored[0].2, session.cards[0].2);
    }

    #[test]
    fn test_again_rated_card_returns_at_the_end() {
        let mut session = session_fixture(&[("uno", "one"), ("dos", "two")]);

        session.grade_current(Quality::Again);
        assert_eq!(session.queue, vec![0, 1, 0]);
        assert!(!session.is_completed());

        session.grade_current(Quality::Good);
        session.grade_current(Quality::Good);
        assert!(session.is_completed());
    }

    #[test]
    fn test_preview_labels_cover_all_buttons() {
        let session = session_fixture(&[("uno", "one")]);
        let labels = session.preview_labels().unwrap();
        // A new card: Again and Hard/Good keep it in learning (due now),
        // Easy graduates at the easy interval.
        assert_eq!(labels[0], "now");
        assert_eq!(labels[3], "4d");
    }

    #[test]
    fn test_deck_stats_track_the_session() {
        let mut session = session_fixture(&[("uno", "one"), ("dos", "two")]);
        assert_eq!(session.deck_stats().new_count, 2);

        session.grade_current(Quality::Easy);
        let stats = session.deck_stats();
        assert_eq!(stats.new_count, 1);
        assert_eq!(stats.review_count, 1);
    }
}

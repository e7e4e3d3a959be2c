//! Collection-level study statistics.
//!
//! Derived summaries over a card collection, consumed by the UI and cached
//! by the persistence layer. Everything here is a pure fold over the
//! supplied states.

use chrono::NaiveDate;

use super::Quality;
use super::scheduling::{CardState, SchedulingState, DEFAULT_EASE_FACTOR};

/// Summary counts for a card collection.
#[derive(Clone, Debug, PartialEq)]
pub struct StudyStats {
    pub total: usize,
    pub new_count: usize,
    pub learning_count: usize,
    pub review_count: usize,
    /// New and Learning cards plus Review cards due on or before the
    /// reference date.
    pub due_today: usize,
    pub average_ease: f64,
}

/// Computes summary counts as of a reference date.
///
/// `average_ease` falls back to the default ease factor for an empty
/// collection so the value stays meaningful without a division by zero.
pub fn compute_stats(cards: &[SchedulingState], as_of: NaiveDate) -> StudyStats {
    let mut new_count = 0;
    let mut learning_count = 0;
    let mut review_count = 0;
    let mut due_today = 0;
    let mut ease_sum = 0.0;

    for card in cards {
        ease_sum += card.ease_factor;
        match card.card_state {
            CardState::New => {
                new_count += 1;
                due_today += 1;
            }
            CardState::Learning => {
                learning_count += 1;
                due_today += 1;
            }
            CardState::Review => {
                review_count += 1;
                if card.due_date.is_some_and(|due| due <= as_of) {
                    due_today += 1;
                }
            }
        }
    }

    let average_ease = if cards.is_empty() {
        DEFAULT_EASE_FACTOR
    } else {
        ease_sum / cards.len() as f64
    };

    StudyStats {
        total: cards.len(),
        new_count,
        learning_count,
        review_count,
        due_today,
        average_ease,
    }
}

/// Share of successful reviews (Good or Easy) across all recorded history,
/// as a percentage. Zero when nothing has been reviewed yet.
pub fn compute_retention(cards: &[SchedulingState]) -> f64 {
    let mut total = 0usize;
    let mut passed = 0usize;

    for card in cards {
        for record in &card.history {
            total += 1;
            if matches!(record.quality, Quality::Good | Quality::Easy) {
                passed += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        100.0 * passed as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scheduling::ReviewRecord;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(quality: Quality) -> ReviewRecord {
        ReviewRecord {
            reviewed_at: date(2024, 3, 1).and_hms_opt(9, 0, 0).unwrap().and_utc(),
            quality,
            interval_days: 3,
            ease_factor: 2.5,
        }
    }

    #[test]
    fn test_empty_collection_uses_default_ease() {
        let stats = compute_stats(&[], date(2024, 3, 1));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.due_today, 0);
        assert_eq!(stats.average_ease, DEFAULT_EASE_FACTOR);
    }

    #[test]
    fn test_counts_by_state_and_due_today() {
        let today = date(2024, 3, 10);
        let mut overdue = SchedulingState::new();
        overdue.card_state = CardState::Review;
        overdue.due_date = Some(date(2024, 3, 5));
        let mut future = SchedulingState::new();
        future.card_state = CardState::Review;
        future.due_date = Some(date(2024, 3, 20));
        let mut learning = SchedulingState::new();
        learning.card_state = CardState::Learning;

        let cards = vec![SchedulingState::new(), learning, overdue, future];
        let stats = compute_stats(&cards, today);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.new_count, 1);
        assert_eq!(stats.learning_count, 1);
        assert_eq!(stats.review_count, 2);
        // New + learning + the overdue review; the future review waits.
        assert_eq!(stats.due_today, 3);
    }

    #[test]
    fn test_average_ease_is_the_mean() {
        let mut a = SchedulingState::new();
        a.ease_factor = 2.0;
        let mut b = SchedulingState::new();
        b.ease_factor = 3.0;

        let stats = compute_stats(&[a, b], date(2024, 3, 1));
        assert_eq!(stats.average_ease, 2.5);
    }

    #[test]
    fn test_retention_without_history_is_zero() {
        let cards = vec![SchedulingState::new()];
        assert_eq!(compute_retention(&cards), 0.0);
    }

    #[test]
    fn test_retention_counts_good_and_easy_as_passed() {
        let mut card = SchedulingState::new();
        card.history = vec![
            record(Quality::Again),
            record(Quality::Hard),
            record(Quality::Good),
            record(Quality::Easy),
        ];

        assert_eq!(compute_retention(&[card]), 50.0);
    }
}

//! Per-card scheduling state consumed and produced by the interval engine.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Quality;

/// Ease factor assigned to cards that have never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
/// Lower bound on the ease factor; SM-2 never lets it fall below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Where a card sits in its learning lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    New,
    Learning,
    Review,
}

/// One entry in a card's review history.
///
/// Interval and ease factor are captured as they were *before* the rating
/// was applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewed_at: DateTime<Utc>,
    pub quality: Quality,
    pub interval_days: i64,
    pub ease_factor: f64,
}

/// Scheduling metadata attached to each flashcard.
///
/// Mutated exclusively by the interval engine, once per rating; the caller
/// persists the result after each update. `due_date` is absent for New and
/// Learning cards, which are always eligible for study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub card_state: CardState,
    pub interval_days: i64,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub learning_step: usize,
    pub due_date: Option<NaiveDate>,
    pub last_review: Option<DateTime<Utc>>,
    pub history: Vec<ReviewRecord>,
}

impl SchedulingState {
    /// State for a card that has never been reviewed.
    pub fn new() -> Self {
        Self {
            card_state: CardState::New,
            interval_days: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
            learning_step: 0,
            due_date: None,
            last_review: None,
            history: Vec::new(),
        }
    }
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_new_state_defaults() {
        let state = SchedulingState::new();
        assert_eq!(state.card_state, CardState::New);
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.learning_step, 0);
        assert!(state.due_date.is_none());
        assert!(state.last_review.is_none());
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let reviewed_at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            .and_utc();
        let state = SchedulingState {
            card_state: CardState::Review,
            interval_days: 12,
            ease_factor: 2.18,
            repetitions: 4,
            learning_step: 0,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 13),
            last_review: Some(reviewed_at),
            history: vec![ReviewRecord {
                reviewed_at,
                quality: Quality::Good,
                interval_days: 6,
                ease_factor: 2.18,
            }],
        };

        let json = serde_json::to_string(&state).unwrap();
        let restored: SchedulingState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}

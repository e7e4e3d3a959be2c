//! SM-2 style interval engine with learning steps.
//!
//! New cards climb a short ladder of learning steps before entering the
//! review regime, where intervals grow geometrically via a per-card ease
//! factor (floored at 1.3). A failed review demotes the card back to the
//! ladder with a softened penalty: the ease factor drops by 0.2 and the
//! interval is halved rather than reset. Intervals longer than a week are
//! fuzzed by up to ±5% to spread cohorts across calendar days.

use chrono::{DateTime, Utc};

use super::Quality;
use super::clock::add_days;
use super::error::SchedulerError;
use super::fuzz::{FuzzSource, NoFuzz};
use super::scheduling::{CardState, MIN_EASE_FACTOR, ReviewRecord, SchedulingState};
use super::settings::SessionSettings;

/// Intervals longer than this many days are fuzzed.
const FUZZ_THRESHOLD_DAYS: i64 = 7;
/// Ease factor penalty applied when a review card lapses.
const LAPSE_EASE_PENALTY: f64 = 0.2;

/// Applies a quality rating to a card's scheduling state and returns the
/// updated state.
///
/// Pure: the input state is untouched, no I/O happens, and the only
/// nondeterminism comes from the injected fuzz source. Every successful
/// call appends exactly one history record capturing the pre-update
/// interval and ease factor, and sets `last_review` to `now`.
pub fn compute_next_review(
    state: &SchedulingState,
    quality: Quality,
    settings: &SessionSettings,
    now: DateTime<Utc>,
    fuzz: &mut dyn FuzzSource,
) -> Result<SchedulingState, SchedulerError> {
    if settings.learning_steps.is_empty() {
        return Err(SchedulerError::InvalidInput(
            "learning step sequence is empty".to_string(),
        ));
    }
    if state.card_state == CardState::Review && state.due_date.is_none() {
        return Err(SchedulerError::MalformedState(
            "review card has no due date".to_string(),
        ));
    }

    let today = now.date_naive();
    let mut next = state.clone();
    next.history.push(ReviewRecord {
        reviewed_at: now,
        quality,
        interval_days: state.interval_days,
        ease_factor: state.ease_factor,
    });
    next.last_review = Some(now);

    match state.card_state {
        CardState::New | CardState::Learning => match quality {
            Quality::Again => {
                next.card_state = CardState::Learning;
                next.learning_step = 0;
                next.repetitions = 0;
                next.due_date = None;
            }
            Quality::Easy => {
                // Immediate graduation, skipping any remaining steps.
                graduate(&mut next, settings.easy_interval, today);
            }
            Quality::Hard | Quality::Good => {
                let advanced = state.learning_step + 1;
                if advanced < settings.learning_steps.len() {
                    next.card_state = CardState::Learning;
                    next.learning_step = advanced;
                    next.repetitions = 0;
                    next.due_date = None;
                } else {
                    // A lapsed card resumes its retained (halved) pre-lapse
                    // interval; a fresh card starts at the graduating interval.
                    let interval = if state.interval_days > 0 {
                        state.interval_days
                    } else {
                        settings.graduating_interval
                    };
                    graduate(&mut next, interval, today);
                }
            }
        },
        CardState::Review => match quality {
            Quality::Again => {
                // Lapse: back to the ladder. The halved interval is carried
                // but not used for scheduling until the card graduates again.
                next.card_state = CardState::Learning;
                next.learning_step = 0;
                next.repetitions = 0;
                next.ease_factor = (state.ease_factor - LAPSE_EASE_PENALTY).max(MIN_EASE_FACTOR);
                next.interval_days = ((state.interval_days as f64 * 0.5).round() as i64).max(1);
                next.due_date = None;
            }
            Quality::Hard | Quality::Good | Quality::Easy => {
                let q = f64::from(quality.as_u8());
                let delta = 0.1 - (3.0 - q) * (0.08 + (3.0 - q) * 0.02);
                let ease = (state.ease_factor + delta).max(MIN_EASE_FACTOR);

                let base = match state.repetitions {
                    0 => 1,
                    1 => 6,
                    _ => (state.interval_days as f64 * ease).round() as i64,
                };
                let modified = match quality {
                    Quality::Hard => (base as f64 * 0.8).round() as i64,
                    Quality::Easy => (base as f64 * 1.3).round() as i64,
                    _ => base,
                };
                let interval = apply_fuzz(modified, fuzz).max(1);

                next.ease_factor = ease;
                next.interval_days = interval;
                next.repetitions = state.repetitions + 1;
                next.due_date = Some(add_days(today, interval));
            }
        },
    }

    Ok(next)
}

fn graduate(next: &mut SchedulingState, interval: i64, today: chrono::NaiveDate) {
    next.card_state = CardState::Review;
    next.interval_days = interval;
    next.repetitions = 1;
    next.learning_step = 0;
    next.due_date = Some(add_days(today, interval));
}

fn apply_fuzz(interval: i64, fuzz: &mut dyn FuzzSource) -> i64 {
    if interval > FUZZ_THRESHOLD_DAYS {
        (interval as f64 * (1.0 + fuzz.factor())).round() as i64
    } else {
        interval
    }
}

/// Interval estimates for all four ratings, for display next to the
/// rating buttons.
///
/// Speculative only: nothing is persisted and fuzz is disabled so repeated
/// calls agree. A zero entry means the card would be due again right away.
pub fn preview_intervals(
    state: &SchedulingState,
    settings: &SessionSettings,
    now: DateTime<Utc>,
) -> Result<[i64; 4], SchedulerError> {
    let mut out = [0i64; 4];
    for (slot, quality) in out.iter_mut().zip(Quality::ALL) {
        let next = compute_next_review(state, quality, settings, now, &mut NoFuzz)?;
        *slot = match next.card_state {
            CardState::Review => next.interval_days,
            _ => 0,
        };
    }
    Ok(out)
}

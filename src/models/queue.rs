//! Study queue construction.
//!
//! Selects the cards eligible on a given date, applies the per-day caps,
//! and produces the presentation order. Queue entries are indices into the
//! caller's card list, which is never mutated; re-inserting a failed card
//! mid-session is the session driver's job.

use std::cmp::Ordering;

use chrono::NaiveDate;

use super::scheduling::{CardState, SchedulingState};
use super::settings::SessionSettings;

/// Indices of cards eligible for study on `as_of`.
///
/// New and Learning cards are always eligible; Review cards become
/// eligible on their due date. A review card with no due date is a corrupt
/// record and is skipped.
pub fn select_due(cards: &[SchedulingState], as_of: NaiveDate) -> Vec<usize> {
    cards
        .iter()
        .enumerate()
        .filter_map(|(i, card)| match card.card_state {
            CardState::New | CardState::Learning => Some(i),
            CardState::Review => match card.due_date {
                Some(due) if due <= as_of => Some(i),
                Some(_) => None,
                None => {
                    log::warn!("review card at index {i} has no due date; skipping");
                    None
                }
            },
        })
        .collect()
}

/// Ordered study queue for `as_of`.
///
/// From the eligible set, at most `new_cards_per_day` New cards (in
/// creation order) and `reviews_per_day` Learning and Review cards
/// combined are taken. Presentation order: overdue reviews by ascending
/// due date, reviews due today by ascending ease factor (harder cards
/// first), learning cards by ascending step, then new cards. Ties keep
/// their relative input order.
pub fn build_queue(
    cards: &[SchedulingState],
    as_of: NaiveDate,
    settings: &SessionSettings,
) -> Vec<usize> {
    let mut overdue = Vec::new();
    let mut due_today = Vec::new();
    let mut learning = Vec::new();
    let mut new_cards = Vec::new();
    let mut review_taken = 0;

    for i in select_due(cards, as_of) {
        match cards[i].card_state {
            CardState::New => {
                if new_cards.len() < settings.new_cards_per_day {
                    new_cards.push(i);
                }
            }
            CardState::Learning => {
                if review_taken < settings.reviews_per_day {
                    review_taken += 1;
                    learning.push(i);
                }
            }
            CardState::Review => {
                if review_taken < settings.reviews_per_day {
                    review_taken += 1;
                    if cards[i].due_date == Some(as_of) {
                        due_today.push(i);
                    } else {
                        overdue.push(i);
                    }
                }
            }
        }
    }

    overdue.sort_by_key(|&i| cards[i].due_date);
    due_today.sort_by(|&a, &b| {
        cards[a]
            .ease_factor
            .partial_cmp(&cards[b].ease_factor)
            .unwrap_or(Ordering::Equal)
    });
    learning.sort_by_key(|&i| cards[i].learning_step);

    let mut queue = overdue;
    queue.extend(due_today);
    queue.extend(learning);
    queue.extend(new_cards);
    queue
}

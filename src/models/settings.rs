//! Per-deck study session configuration.
use serde::{Deserialize, Serialize};

/// Scheduling parameters supplied per deck. Defaults apply when a deck has
/// no stored settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Ladder of learning steps a new or relearning card climbs before
    /// graduating. Must not be empty.
    pub learning_steps: Vec<u32>,
    /// Review interval in days assigned on normal graduation.
    pub graduating_interval: i64,
    /// Review interval in days assigned when a card is rated Easy out of
    /// the learning ladder.
    pub easy_interval: i64,
    /// Daily cap on new cards entering the queue.
    pub new_cards_per_day: usize,
    /// Daily cap on learning and review cards combined.
    pub reviews_per_day: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            learning_steps: vec![1, 10],
            graduating_interval: 1,
            easy_interval: 4,
            new_cards_per_day: 20,
            reviews_per_day: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SessionSettings::default();
        assert_eq!(settings.learning_steps, vec![1, 10]);
        assert_eq!(settings.graduating_interval, 1);
        assert_eq!(settings.easy_interval, 4);
        assert_eq!(settings.new_cards_per_day, 20);
        assert_eq!(settings.reviews_per_day, 200);
    }
}

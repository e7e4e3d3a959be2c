//! Recall quality ratings.
//! A review is graded on a closed four-point scale; anything outside it
//! is rejected rather than clamped.
use serde::{Deserialize, Serialize};

use super::error::SchedulerError;

/// How well a card was recalled during a review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// Failed to recall; the card goes back to the start of the ladder.
    Again,
    /// Recalled with significant difficulty.
    Hard,
    /// Recalled correctly.
    Good,
    /// Recalled effortlessly.
    Easy,
}

impl Quality {
    /// All ratings in ascending order, matching the 0-3 storage scale.
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    /// Numeric value on the 0-3 scale used in storage and history.
    pub fn as_u8(self) -> u8 {
        match self {
            Quality::Again => 0,
            Quality::Hard => 1,
            Quality::Good => 2,
            Quality::Easy => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Again => "Again",
            Quality::Hard => "Hard",
            Quality::Good => "Good",
            Quality::Easy => "Easy",
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Quality::Again),
            1 => Ok(Quality::Hard),
            2 => Ok(Quality::Good),
            3 => Ok(Quality::Easy),
            other => Err(SchedulerError::InvalidInput(format!(
                "quality rating {other} is outside the 0-3 scale"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_u8() {
        for quality in Quality::ALL {
            assert_eq!(Quality::try_from(quality.as_u8()).unwrap(), quality);
        }
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        for value in [4u8, 5, 255] {
            assert!(matches!(
                Quality::try_from(value),
                Err(SchedulerError::InvalidInput(_))
            ));
        }
    }
}

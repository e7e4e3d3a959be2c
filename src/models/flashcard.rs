//! Flashcard is a pair <front, back>. The scheduler never looks inside;
//! it only attaches scheduling metadata to the card.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

pub mod database;
pub mod export;
pub mod models;

pub use models::{
    Deck, DeckSet, Flashcard, Quality, ReviewSession, SchedulerError, SchedulingState,
    SessionSettings, StudyStats,
};

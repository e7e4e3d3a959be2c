pub mod clock;
pub mod deck;
pub mod deck_set;
pub mod error;
pub mod flashcard;
pub mod fuzz;
pub mod quality;
pub mod queue;
pub mod review_session;
pub mod scheduling;
pub mod settings;
pub mod sm2;
pub mod stats;

pub use deck::Deck;
pub use deck_set::DeckSet;
pub use error::SchedulerError;
pub use flashcard::Flashcard;
pub use fuzz::{FuzzSource, NoFuzz, RandomFuzz};
pub use quality::Quality;
pub use review_session::ReviewSession;
pub use scheduling::{CardState, ReviewRecord, SchedulingState};
pub use settings::SessionSettings;
pub use stats::StudyStats;

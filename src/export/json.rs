//! JSON import/export module for flashcard decks.
//! Decks round-trip together with their per-card scheduling state, so a
//! re-imported deck picks up its review schedule where it left off. Files
//! without scheduling blocks (plain term lists) still import as fresh
//! decks.

use crate::models::SchedulingState;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};

/// One exported card. `scheduling` is omitted for cards that have never
/// been reviewed and tolerated as absent on import.
#[derive(Clone, Serialize, Deserialize)]
pub struct CardExport {
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<SchedulingState>,
}

/// A deck as written to disk.
#[derive(Clone, Serialize, Deserialize)]
pub struct DeckExport {
    pub name: String,
    pub cards: Vec<CardExport>,
}

/// Exports a deck to a JSON file at the specified path.
/// Returns an error if file creation or writing fails.
pub fn export_deck_to_path(deck: &DeckExport, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json_string = serde_json::to_string_pretty(deck)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    log::info!("deck '{}' exported to '{path}'", deck.name);
    Ok(())
}

/// Imports a deck from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_deck(filename: &str) -> Result<DeckExport, Box<dyn std::error::Error>> {
    let mut file = File::open(filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: DeckExport = serde_json::from_str(&contents)?;

    log::info!("deck '{}' imported from '{filename}'", deck.name);
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardState, SchedulingState};
    use chrono::NaiveDate;
    use std::fs;

    fn create_test_deck() -> DeckExport {
        let mut reviewed = SchedulingState::new();
        reviewed.card_state = CardState::Review;
        reviewed.interval_days = 6;
        reviewed.ease_factor = 2.6;
        reviewed.repetitions = 2;
        reviewed.due_date = NaiveDate::from_ymd_opt(2024, 3, 12);

        DeckExport {
            name: "Test Deck".to_string(),
            cards: vec![
                CardExport {
                    front: "la casa".to_string(),
                    back: "the house".to_string(),
                    scheduling: Some(reviewed),
                },
                CardExport {
                    front: "el perro".to_string(),
                    back: "the dog".to_string(),
                    scheduling: None,
                },
            ],
        }
    }

    #[test]
    fn test_export_and_import_round_trip() {
        let deck = create_test_deck();
        let test_file = "test_export_roundtrip.json";

        export_deck_to_path(&deck, test_file).unwrap();
        let imported = import_deck(test_file).unwrap();

        assert_eq!(imported.name, deck.name);
        assert_eq!(imported.cards.len(), 2);
        assert_eq!(imported.cards[0].front, "la casa");
        assert_eq!(imported.cards[0].scheduling, deck.cards[0].scheduling);
        assert!(imported.cards[1].scheduling.is_none());

        let _ = fs::remove_file(test_file);
    }

    #[test]
    fn test_import_accepts_files_without_scheduling() {
        let test_file = "test_import_plain.json";
        fs::write(
            test_file,
            r#"{"name":"Plain","cards":[{"front":"uno","back":"one"}]}"#,
        )
        .unwrap();

        let imported = import_deck(test_file).unwrap();
        assert_eq!(imported.name, "Plain");
        assert_eq!(imported.cards.len(), 1);
        assert!(imported.cards[0].scheduling.is_none());

        let _ = fs::remove_file(test_file);
    }

    #[test]
    fn test_import_missing_file_fails() {
        assert!(import_deck("does_not_exist.json").is_err());
    }
}

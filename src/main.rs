mod app;
use recall_app::*;

use app::MyApp;
use database::db::{add_flashcard, get_all_decks, init_database, load_all_decks, new_deck};

fn main() -> eframe::Result<()> {
    env_logger::init();

    let conn = init_database().expect("Failed to initialize database");

    if get_all_decks(&conn).unwrap_or_default().is_empty() {
        let _ = new_deck("Spanish Basics", &conn);

        let _ = add_flashcard("Spanish Basics", "la casa", "the house", &conn);
        let _ = add_flashcard("Spanish Basics", "el perro", "the dog", &conn);
        let _ = add_flashcard("Spanish Basics", "gracias", "thank you", &conn);

        log::info!("sample data created");
    }

    let deck_set = load_all_decks(&conn).expect("Failed to load decks from database");

    log::info!("loaded {} decks from database", deck_set.decks.len());
    for deck in &deck_set.decks {
        log::info!("  - {} ({} cards)", deck.name, deck.cards.len());
    }
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Recall",
        options,
        Box::new(|_cc| Ok(Box::new(MyApp::new_with_deckset(deck_set, conn)))),
    )
}

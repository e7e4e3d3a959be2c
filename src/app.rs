//! Main application UI and state management.
//! Handles the flashcard app interface, deck management, and study sessions.

use crate::database::db;
use crate::export::json::{CardExport, DeckExport, export_deck_to_path, import_deck};
use crate::models::stats;
use crate::models::{
    Deck, DeckSet, Flashcard, Quality, ReviewSession, SchedulingState, StudyStats,
};
use eframe::egui;
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Study,
}

/// Main application state
#[derive(Default)]
pub struct MyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    all_decks: DeckSet,
    selected_deck_index: Option<usize>,
    current_front: String,
    current_back: String,
    new_deck_name: String,
    conn: Option<Arc<Mutex<Connection>>>,

    current_screen: AppScreen,
    review_session: Option<ReviewSession>,

    current_date_display: String,
    deck_stats: Option<StudyStats>,
    deck_retention: f64,

    show_export_dialog: bool,
    show_message_dialog: bool,
    message: String,
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Study => self.render_study_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) {
            if self.allowed_to_close {
                // Allow close
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.show_confirmation_dialog = true;
            }
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }
        // exporting a deck
        if self.show_export_dialog {
            let mut export_deck_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();

                    for (i, deck) in self.all_decks.decks.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", deck.name, deck.cards.len()))
                            .clicked()
                        {
                            export_deck_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_deck_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_message_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_message_dialog = false;
                    }
                });
        }
    }
}

impl MyApp {
    /// Creates a new application instance with decks loaded from database
    pub fn new_with_deckset(deckset: DeckSet, conn: Connection) -> Self {
        let current_date = db::get_current_date(&conn)
            .map(|d| d.to_string())
            .unwrap_or_else(|_| "Unknown".to_string());
        let has_decks = !deckset.decks.is_empty();
        let mut app = Self {
            all_decks: deckset,
            selected_deck_index: if has_decks { Some(0) } else { None },
            conn: Some(Arc::new(Mutex::new(conn))),
            current_date_display: current_date,
            ..Self::default()
        };
        app.refresh_stats();
        app
    }

    /// Recomputes the study stats for the selected deck.
    fn refresh_stats(&mut self) {
        self.deck_stats = None;
        let Some(deck_index) = self.selected_deck_index else {
            return;
        };
        let Some(deck) = self.all_decks.decks.get(deck_index) else {
            return;
        };
        let Some(conn) = &self.conn else {
            return;
        };

        let conn_guard = conn.lock().unwrap();
        let Ok(as_of) = db::get_current_date(&conn_guard) else {
            return;
        };
        let Ok(cards) = db::get_deck_cards(&deck.name, &conn_guard) else {
            return;
        };

        let states: Vec<SchedulingState> = cards.into_iter().map(|(_, _, s)| s).collect();
        self.deck_retention = stats::compute_retention(&states);
        self.deck_stats = Some(stats::compute_stats(&states, as_of));
    }

    /// Renders the main screen with deck management interface
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
        let mut day_advanced = false;

        ui.horizontal(|ui| {
            ui.label(format!("{}", self.current_date_display));

            if ui.button("Next Day").clicked() {
                if let Some(conn) = &self.conn {
                    let conn = conn.lock().unwrap();
                    let _ = db::advance_day(&conn);
                    if let Ok(current_date) = db::get_current_date(&conn) {
                        self.current_date_display = current_date.to_string();
                    }
                }
                day_advanced = true;
            }
        });
        ui.separator();

        // Import/Export buttons
        ui.horizontal(|ui| {
            if ui.button("Export Deck").clicked() {
                self.show_export_dialog = true;
            }
            if ui.button("Import Deck").clicked() {
                self.handle_import();
            }
        });

        ui.separator();

        // Deck creation section
        ui.heading("Create New Deck");
        ui.horizontal(|ui| {
            ui.label("Deck name:");
            ui.text_edit_singleline(&mut self.new_deck_name);
            if ui.button("Create Deck").clicked() {
                if !self.new_deck_name.is_empty() {
                    self.all_decks.decks.push(Deck {
                        name: self.new_deck_name.clone(),
                        cards: Vec::new(),
                    });

                    // Save to database
                    if let Some(conn) = &self.conn {
                        let conn = conn.lock().unwrap();
                        let _ = conn.execute(
                            "INSERT INTO decks (name) VALUES (?1)",
                            params![self.new_deck_name],
                        );
                    }

                    self.new_deck_name.clear();
                }
            }
        });

        ui.separator();

        ui.heading(format!("Decks ({})", self.all_decks.decks.len()));

        // We store actions to execute after UI rendering to avoid borrowing conflicts
        let mut action_select: Option<usize> = None;
        let mut action_study: Option<usize> = None;

        egui::ScrollArea::vertical()
            .id_source("decks_list")
            .max_height(150.0)
            .show(ui, |ui| {
                for (i, deck) in self.all_decks.decks.iter().enumerate() {
                    let is_selected = self.selected_deck_index == Some(i);

                    ui.horizontal(|ui| {
                        if ui.selectable_label(
                            is_selected,
                            format!("{}. {} ({} cards)", i + 1, deck.name, deck.cards.len())
                        ).clicked() {
                            action_select = Some(i);
                        }

                        if ui.button("Study").clicked() {
                            action_study = Some(i);
                        }
                    });
                }
            });

        // Execute deferred actions
        if let Some(i) = action_select {
            self.selected_deck_index = Some(i);
            self.refresh_stats();
        }
        if let Some(i) = action_study {
            self.start_review_session(i);
        }
        if day_advanced {
            self.refresh_stats();
        }

        ui.separator();

        // Flashcard management for selected deck
        if let Some(deck_index) = self.selected_deck_index {
            let mut card_added = false;
            if let Some(current_deck) = self.all_decks.decks.get_mut(deck_index) {
                ui.heading(format!("Selected Deck: {}", current_deck.name));

                if let Some(deck_stats) = &self.deck_stats {
                    ui.label(format!(
                        "New: {} | Learning: {} | Review: {} | Due today: {}",
                        deck_stats.new_count,
                        deck_stats.learning_count,
                        deck_stats.review_count,
                        deck_stats.due_today
                    ));
                    ui.label(format!(
                        "Average ease: {:.2} | Retention: {:.0}%",
                        deck_stats.average_ease, self.deck_retention
                    ));
                }

                ui.horizontal(|ui| {
                    ui.label("Front:");
                    ui.text_edit_singleline(&mut self.current_front);
                });

                ui.horizontal(|ui| {
                    ui.label("Back:");
                    ui.text_edit_singleline(&mut self.current_back);
                });
                if ui.button("Add Flashcard").clicked() {
                    if !self.current_front.is_empty() && !self.current_back.is_empty() {
                        current_deck.cards.push(Flashcard {
                            front: self.current_front.clone(),
                            back: self.current_back.clone(),
                        });
                        // Save to database, with a fresh scheduling record
                        if let Some(conn) = &self.conn {
                            let conn = conn.lock().unwrap();
                            let _ = db::add_flashcard(
                                &current_deck.name,
                                &self.current_front,
                                &self.current_back,
                                &conn,
                            );
                        }
                        self.current_front.clear();
                        self.current_back.clear();
                        card_added = true;
                    }
                }

                ui.separator();

                ui.heading(format!("Flashcards ({})", current_deck.cards.len()));

                egui::ScrollArea::vertical()
                    .id_source("flashcards_list")
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for (i, flashcard) in current_deck.cards.iter().enumerate() {
                            ui.group(|ui| {
                                ui.label(format!("{}. Front: {}", i + 1, flashcard.front));
                                ui.label(format!("   Back: {}", flashcard.back));
                            });
                        }
                    });
            }
            if card_added {
                self.refresh_stats();
            }
        } else {
            ui.label("Select a deck to add flashcards");
        }
    });
    }

    /// Renders the study screen with the due queue and rating buttons
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let mut action_back = false;

            if let Some(session) = &mut self.review_session {
                ui.heading(format!("Studying: {}", session.deck_name));

                if session.is_completed() {
                    ui.heading("Session complete!");
                    ui.label(format!("You reviewed {} cards.", session.reviewed_count()));

                    let deck_stats = session.deck_stats();
                    ui.label(format!(
                        "Due today after this session: {}",
                        deck_stats.due_today
                    ));

                    ui.add_space(20.0);

                    if ui.button("Back to Main Screen").clicked() {
                        action_back = true;
                    }
                } else if let Some((card, _)) = session.current_card() {
                    ui.label(session.progress_message());

                    // Clone values to avoid borrowing issues
                    let show_answer = session.show_answer;
                    let front = card.front.clone();
                    let back = card.back.clone();
                    let previews = session.preview_labels();

                    ui.add_space(20.0);

                    ui.group(|ui| {
                        ui.set_min_height(200.0);
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);

                            ui.heading("Front:");
                            ui.label(&front);

                            ui.add_space(20.0);

                            if show_answer {
                                ui.heading("Back:");
                                ui.label(&back);
                            } else {
                                ui.label("(Click 'Show Answer' to reveal)");
                            }

                            ui.add_space(20.0);
                        });
                    });

                    ui.add_space(20.0);

                    // Store actions to execute after UI rendering
                    let mut action_reveal = false;
                    let mut action_grade: Option<Quality> = None;

                    if !show_answer {
                        if ui.button("Show Answer").clicked() {
                            action_reveal = true;
                        }
                    }

                    // Rating buttons with next-interval estimates,
                    // only shown after revealing the answer
                    if show_answer {
                        ui.label("How well did you remember?");
                        ui.horizontal(|ui| {
                            for (slot, quality) in Quality::ALL.iter().enumerate() {
                                let label = match &previews {
                                    Some(p) => format!("{} ({})", quality.label(), p[slot]),
                                    None => quality.label().to_string(),
                                };
                                if ui.button(label).clicked() {
                                    action_grade = Some(*quality);
                                }
                            }
                        });
                    }

                    ui.add_space(20.0);

                    if ui.button("Back to Main Screen").clicked() {
                        action_back = true;
                    }

                    // Execute deferred actions
                    if action_reveal {
                        session.toggle_answer();
                    }
                    if let Some(quality) = action_grade {
                        session.grade_current(quality);
                    }
                }
            }

            if action_back {
                self.current_screen = AppScreen::Main;
                self.review_session = None;
                self.refresh_stats();
            }
        });
    }

    /// Starts a study session over the deck's due queue
    fn start_review_session(&mut self, deck_index: usize) {
        if let Some(deck) = self.all_decks.decks.get(deck_index) {
            if let Some(conn) = &self.conn {
                let conn_guard = conn.lock().unwrap();

                let today = db::get_current_date(&conn_guard).unwrap_or_else(|_| {
                    crate::models::clock::today()
                });
                let cards = db::get_deck_cards(&deck.name, &conn_guard).unwrap_or_default();
                let settings = db::get_settings(&deck.name, &conn_guard).unwrap_or_default();

                drop(conn_guard);

                let session = ReviewSession::new(
                    deck.name.clone(),
                    cards,
                    settings,
                    today,
                    Arc::clone(self.conn.as_ref().unwrap()),
                );

                if session.total_count() == 0 {
                    self.message = format!("No cards due today in '{}'.", deck.name);
                    self.show_message_dialog = true;
                } else {
                    self.review_session = Some(session);
                    self.current_screen = AppScreen::Study;
                }
            }
        }
    }

    /// Handles deck export to JSON file, scheduling state included
    fn handle_export(&mut self, deck_index: usize) {
        if let Some(deck) = self.all_decks.decks.get(deck_index) {
            // Open file save dialog
            if let Some(path) = rfd::FileDialog::new()
                .set_file_name(format!("{}.json", deck.name))
                .add_filter("JSON files", &["json"])
                .save_file()
            {
                let export = {
                    let conn_guard = self.conn.as_ref().unwrap().lock().unwrap();
                    let cards = db::get_deck_cards(&deck.name, &conn_guard).unwrap_or_default();
                    DeckExport {
                        name: deck.name.clone(),
                        cards: cards
                            .into_iter()
                            .map(|(_, card, state)| CardExport {
                                front: card.front,
                                back: card.back,
                                scheduling: if state == SchedulingState::new() {
                                    None
                                } else {
                                    Some(state)
                                },
                            })
                            .collect(),
                    }
                };

                match export_deck_to_path(&export, path.to_str().unwrap()) {
                    Ok(_) => {
                        self.message = format!("Deck '{}' exported successfully!", deck.name);
                        self.show_message_dialog = true;
                    }
                    Err(e) => {
                        self.message = format!("Export failed: {}", e);
                        self.show_message_dialog = true;
                    }
                }
            }
        }
        self.show_export_dialog = false;
    }

    /// Handles deck import from JSON file
    fn handle_import(&mut self) {
        // Open file selection dialog
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        {
            match import_deck(path.to_str().unwrap()) {
                Ok(imported) => {
                    // Check if deck with this name already exists
                    if self.all_decks.decks.iter().any(|d| d.name == imported.name) {
                        self.message = format!(
                            "Deck '{}' already exists! Please rename it in the JSON file.",
                            imported.name
                        );
                        self.show_message_dialog = true;
                        return;
                    }

                    // Add deck to database
                    if let Some(conn) = &self.conn {
                        let conn_guard = conn.lock().unwrap();

                        // Create deck
                        if let Err(e) = db::new_deck(&imported.name, &conn_guard) {
                            self.message = format!("Failed to create deck: {}", e);
                            self.show_message_dialog = true;
                            return;
                        }

                        // Add flashcards and restore their review schedules
                        for card in &imported.cards {
                            let card_id = match db::add_flashcard(
                                &imported.name,
                                &card.front,
                                &card.back,
                                &conn_guard,
                            ) {
                                Ok(id) => id,
                                Err(e) => {
                                    self.message = format!(
                                        "Failed to import flashcard '{}': {}",
                                        card.front, e
                                    );
                                    self.show_message_dialog = true;
                                    return;
                                }
                            };

                            if let Some(state) = &card.scheduling {
                                if let Err(e) =
                                    db::restore_scheduling(card_id, state, &conn_guard)
                                {
                                    self.message = format!(
                                        "Failed to restore schedule for '{}': {}",
                                        card.front, e
                                    );
                                    self.show_message_dialog = true;
                                    return;
                                }
                            }
                        }

                        drop(conn_guard);
                    }

                    // Add to in-memory DeckSet
                    let card_count = imported.cards.len();
                    self.all_decks.decks.push(Deck {
                        name: imported.name.clone(),
                        cards: imported
                            .cards
                            .into_iter()
                            .map(|card| Flashcard {
                                front: card.front,
                                back: card.back,
                            })
                            .collect(),
                    });

                    self.message = format!(
                        "Deck '{}' imported successfully with {} cards!",
                        imported.name, card_count
                    );
                    self.show_message_dialog = true;
                }
                Err(e) => {
                    self.message = format!(
                        "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"name\": \"Deck Name\",\n  \"cards\": [...]\n}}",
                        e
                    );
                    self.show_message_dialog = true;
                }
            }
        }
    }
}

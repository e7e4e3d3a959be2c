//! Database operations for the flashcard scheduler
//!
//! Handles SQLite initialization and CRUD operations for decks, flashcards,
//! per-card scheduling state, append-only review history, and per-deck
//! session settings. The scheduling engine never touches this layer; the
//! session driver reads state here, runs the engine, and writes the result
//! back.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result, params};

use crate::models::clock;
use crate::models::{
    CardState, Deck, DeckSet, Flashcard, Quality, ReviewRecord, SchedulingState, SessionSettings,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opens the application database and creates any missing tables.
///
/// Also seeds the simulated current date to today if not already set; the
/// date only moves forward through [`advance_day`], so review schedules
/// can be exercised without waiting for the wall clock.
pub fn init_database() -> Result<Connection> {
    let conn = Connection::open("recall.sqlite3")?;
    create_tables(&conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![clock::today().format(DATE_FORMAT).to_string()],
    )?;

    Ok(conn)
}

/// Creates all tables if they do not exist. Split out of [`init_database`]
/// so tests can run against an in-memory connection.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name),
            UNIQUE(deck_name, front)
        )",
        (),
    )?;

    // One scheduling row per card. due_date and last_review are NULL until
    // the card graduates / is first rated.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS scheduling (
            flashcard_id INTEGER PRIMARY KEY,
            card_state TEXT NOT NULL DEFAULT 'new',
            interval_days INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            repetitions INTEGER NOT NULL DEFAULT 0,
            learning_step INTEGER NOT NULL DEFAULT 0,
            due_date TEXT,
            last_review TEXT,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    // Append-only review history, one row per rating.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS review_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            flashcard_id INTEGER NOT NULL,
            reviewed_at TEXT NOT NULL,
            quality INTEGER NOT NULL,
            interval_days INTEGER NOT NULL,
            ease_factor REAL NOT NULL,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS deck_settings (
            deck_name TEXT PRIMARY KEY,
            learning_steps TEXT NOT NULL,
            graduating_interval INTEGER NOT NULL,
            easy_interval INTEGER NOT NULL,
            new_cards_per_day INTEGER NOT NULL,
            reviews_per_day INTEGER NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name)
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn state_to_str(state: CardState) -> &'static str {
    match state {
        CardState::New => "new",
        CardState::Learning => "learning",
        CardState::Review => "review",
    }
}

fn state_from_str(value: &str, column: usize) -> Result<CardState> {
    match value {
        "new" => Ok(CardState::New),
        "learning" => Ok(CardState::Learning),
        "review" => Ok(CardState::Review),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Text,
            format!("unknown card state '{other}'").into(),
        )),
    }
}

fn parse_date(value: &str, column: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

fn parse_timestamp(value: &str, column: usize) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Retrieves the simulated current date.
pub fn get_current_date(conn: &Connection) -> Result<NaiveDate> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;
    parse_date(&value, 0)
}

/// Advances the simulated current date by one day.
pub fn advance_day(conn: &Connection) -> Result<()> {
    let next = clock::add_days(get_current_date(conn)?, 1);
    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
        params![next.format(DATE_FORMAT).to_string()],
    )?;
    Ok(())
}

/// Creates a new deck in the database
pub fn new_deck(name: &str, conn: &Connection) -> Result<()> {
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    log::info!("deck '{name}' created");
    Ok(())
}

/// Adds a flashcard to a deck and initializes its scheduling state.
///
/// Returns the flashcard ID. If the card already exists (same deck +
/// front), it's ignored due to the UNIQUE constraint.
pub fn add_flashcard(deck_name: &str, front: &str, back: &str, conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_name, front, back) VALUES (?1, ?2, ?3)",
        params![deck_name, front, back],
    )?;

    let flashcard_id: i64 = conn.query_row(
        "SELECT id FROM flashcards WHERE deck_name = ?1 AND front = ?2",
        params![deck_name, front],
        |row| row.get(0),
    )?;

    // Fresh cards are New: no due date, no reviews yet.
    conn.execute(
        "INSERT OR IGNORE INTO scheduling (flashcard_id) VALUES (?1)",
        params![flashcard_id],
    )?;

    Ok(flashcard_id)
}

/// Retrieves all flashcards for a given deck, in creation order.
pub fn get_flashcards_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<(i64, Flashcard)>> {
    let mut stmt = conn.prepare(
        "SELECT id, front, back FROM flashcards WHERE deck_name = ?1 ORDER BY id ASC",
    )?;

    let flashcards = stmt
        .query_map(params![deck_name], |row| {
            Ok((
                row.get(0)?,
                Flashcard {
                    front: row.get(1)?,
                    back: row.get(2)?,
                },
            ))
        })?
        .collect::<Result<Vec<(i64, Flashcard)>>>()?;

    Ok(flashcards)
}

/// Retrieves a deck's cards together with their full scheduling state,
/// including review history, in creation order.
pub fn get_deck_cards(
    deck_name: &str,
    conn: &Connection,
) -> Result<Vec<(i64, Flashcard, SchedulingState)>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.front, f.back, s.card_state, s.interval_days, s.ease_factor,
                s.repetitions, s.learning_step, s.due_date, s.last_review
         FROM flashcards f
         JOIN scheduling s ON f.id = s.flashcard_id
         WHERE f.deck_name = ?1
         ORDER BY f.id ASC",
    )?;

    let mut cards = stmt
        .query_map(params![deck_name], |row| {
            let id: i64 = row.get(0)?;
            let card_state = state_from_str(&row.get::<_, String>(3)?, 3)?;
            let due_date = match row.get::<_, Option<String>>(8)? {
                Some(value) => Some(parse_date(&value, 8)?),
                None => None,
            };
            let last_review = match row.get::<_, Option<String>>(9)? {
                Some(value) => Some(parse_timestamp(&value, 9)?),
                None => None,
            };
            Ok((
                id,
                Flashcard {
                    front: row.get(1)?,
                    back: row.get(2)?,
                },
                SchedulingState {
                    card_state,
                    interval_days: row.get(4)?,
                    ease_factor: row.get(5)?,
                    repetitions: row.get::<_, i64>(6)? as u32,
                    learning_step: row.get::<_, i64>(7)? as usize,
                    due_date,
                    last_review,
                    history: Vec::new(),
                },
            ))
        })?
        .collect::<Result<Vec<_>>>()?;

    for (id, _, state) in &mut cards {
        state.history = load_history(*id, conn)?;
    }

    Ok(cards)
}

fn load_history(card_id: i64, conn: &Connection) -> Result<Vec<ReviewRecord>> {
    let mut stmt = conn.prepare(
        "SELECT reviewed_at, quality, interval_days, ease_factor
         FROM review_log WHERE flashcard_id = ?1 ORDER BY id ASC",
    )?;

    stmt.query_map(params![card_id], |row| {
        let reviewed_at = parse_timestamp(&row.get::<_, String>(0)?, 0)?;
        let raw: i64 = row.get(1)?;
        let quality = u8::try_from(raw)
            .ok()
            .and_then(|value| Quality::try_from(value).ok())
            .ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    Type::Integer,
                    format!("quality {raw} is outside the 0-3 scale").into(),
                )
            })?;
        Ok(ReviewRecord {
            reviewed_at,
            quality,
            interval_days: row.get(2)?,
            ease_factor: row.get(3)?,
        })
    })?
    .collect()
}

fn insert_review_record(card_id: i64, record: &ReviewRecord, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO review_log (flashcard_id, reviewed_at, quality, interval_days, ease_factor)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            card_id,
            record.reviewed_at.to_rfc3339(),
            record.quality.as_u8(),
            record.interval_days,
            record.ease_factor
        ],
    )?;
    Ok(())
}

fn write_scheduling_row(card_id: i64, state: &SchedulingState, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE scheduling
         SET card_state = ?1, interval_days = ?2, ease_factor = ?3, repetitions = ?4,
             learning_step = ?5, due_date = ?6, last_review = ?7
         WHERE flashcard_id = ?8",
        params![
            state_to_str(state.card_state),
            state.interval_days,
            state.ease_factor,
            state.repetitions as i64,
            state.learning_step as i64,
            state.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            state.last_review.map(|t| t.to_rfc3339()),
            card_id
        ],
    )?;
    Ok(())
}

/// Persists a freshly rated card's scheduling state.
///
/// The engine appends exactly one history record per rating, so the last
/// entry of `state.history` is logged alongside the row update.
pub fn update_scheduling(card_id: i64, state: &SchedulingState, conn: &Connection) -> Result<()> {
    write_scheduling_row(card_id, state, conn)?;
    if let Some(record) = state.history.last() {
        insert_review_record(card_id, record, conn)?;
    }
    Ok(())
}

/// Writes a complete scheduling state including its whole history.
///
/// Used by deck import, where the review log must be rebuilt rather than
/// appended to.
pub fn restore_scheduling(card_id: i64, state: &SchedulingState, conn: &Connection) -> Result<()> {
    write_scheduling_row(card_id, state, conn)?;
    conn.execute(
        "DELETE FROM review_log WHERE flashcard_id = ?1",
        params![card_id],
    )?;
    for record in &state.history {
        insert_review_record(card_id, record, conn)?;
    }
    Ok(())
}

/// Retrieves a deck's session settings, falling back to defaults when the
/// deck has none stored.
pub fn get_settings(deck_name: &str, conn: &Connection) -> Result<SessionSettings> {
    let result = conn.query_row(
        "SELECT learning_steps, graduating_interval, easy_interval, new_cards_per_day, reviews_per_day
         FROM deck_settings WHERE deck_name = ?1",
        params![deck_name],
        |row| {
            let steps_json: String = row.get(0)?;
            let learning_steps = serde_json::from_str(&steps_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
            })?;
            Ok(SessionSettings {
                learning_steps,
                graduating_interval: row.get(1)?,
                easy_interval: row.get(2)?,
                new_cards_per_day: row.get::<_, i64>(3)? as usize,
                reviews_per_day: row.get::<_, i64>(4)? as usize,
            })
        },
    );

    match result {
        Ok(settings) => Ok(settings),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(SessionSettings::default()),
        Err(e) => Err(e),
    }
}

/// Stores a deck's session settings, replacing any previous row.
pub fn save_settings(
    deck_name: &str,
    settings: &SessionSettings,
    conn: &Connection,
) -> Result<()> {
    let steps_json = serde_json::to_string(&settings.learning_steps)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT OR REPLACE INTO deck_settings
         (deck_name, learning_steps, graduating_interval, easy_interval, new_cards_per_day, reviews_per_day)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            deck_name,
            steps_json,
            settings.graduating_interval,
            settings.easy_interval,
            settings.new_cards_per_day as i64,
            settings.reviews_per_day as i64
        ],
    )?;
    Ok(())
}

/// Retrieves all deck names from database
pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM decks")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>>>()?;
    Ok(decks)
}

/// Loads all decks with their flashcards into memory.
///
/// Scheduling state is not loaded here - it's fetched separately when a
/// study session starts.
pub fn load_all_decks(conn: &Connection) -> Result<DeckSet> {
    let deck_names = get_all_decks(conn)?;

    let mut decks = Vec::new();
    for deck_name in deck_names {
        let cards_with_ids = get_flashcards_for_deck(&deck_name, conn)?;
        let cards = cards_with_ids.into_iter().map(|(_, card)| card).collect();

        decks.push(Deck {
            name: deck_name,
            cards,
        });
    }

    Ok(DeckSet { decks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fuzz::NoFuzz;
    use crate::models::sm2::compute_next_review;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO app_state (key, value) VALUES ('current_date', '2024-03-01')",
            (),
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_new_card_starts_with_fresh_scheduling() {
        let conn = test_conn();
        new_deck("Spanish", &conn).unwrap();
        let id = add_flashcard("Spanish", "la casa", "the house", &conn).unwrap();

        let cards = get_deck_cards("Spanish", &conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].0, id);
        assert_eq!(cards[0].1.front, "la casa");
        assert_eq!(cards[0].2, SchedulingState::new());
    }

    #[test]
    fn test_scheduling_state_round_trips() {
        let conn = test_conn();
        new_deck("Spanish", &conn).unwrap();
        let id = add_flashcard("Spanish", "el perro", "the dog", &conn).unwrap();

        let reviewed_at = NaiveDate::from_ymd_opt(2024, 2, 20)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        let state = SchedulingState {
            card_state: CardState::Review,
            interval_days: 9,
            ease_factor: 2.31,
            repetitions: 3,
            learning_step: 0,
            due_date: NaiveDate::from_ymd_opt(2024, 2, 29),
            last_review: Some(reviewed_at),
            history: vec![
                ReviewRecord {
                    reviewed_at,
                    quality: Quality::Good,
                    interval_days: 4,
                    ease_factor: 2.31,
                },
                ReviewRecord {
                    reviewed_at,
                    quality: Quality::Hard,
                    interval_days: 9,
                    ease_factor: 2.31,
                },
            ],
        };

        restore_scheduling(id, &state, &conn).unwrap();

        let cards = get_deck_cards("Spanish", &conn).unwrap();
        assert_eq!(cards[0].2, state);
    }

    #[test]
    fn test_update_scheduling_logs_the_new_rating() {
        let conn = test_conn();
        new_deck("Spanish", &conn).unwrap();
        let id = add_flashcard("Spanish", "el gato", "the cat", &conn).unwrap();

        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        let fresh = SchedulingState::new();
        let rated = compute_next_review(
            &fresh,
            Quality::Good,
            &SessionSettings::default(),
            now,
            &mut NoFuzz,
        )
        .unwrap();

        update_scheduling(id, &rated, &conn).unwrap();

        let cards = get_deck_cards("Spanish", &conn).unwrap();
        assert_eq!(cards[0].2, rated);
        assert_eq!(cards[0].2.history.len(), 1);
        assert_eq!(cards[0].2.history[0].quality, Quality::Good);
    }

    #[test]
    fn test_settings_fall_back_to_defaults() {
        let conn = test_conn();
        new_deck("Spanish", &conn).unwrap();
        assert_eq!(
            get_settings("Spanish", &conn).unwrap(),
            SessionSettings::default()
        );
    }

    #[test]
    fn test_settings_round_trip() {
        let conn = test_conn();
        new_deck("Spanish", &conn).unwrap();
        let settings = SessionSettings {
            learning_steps: vec![1, 3, 7],
            graduating_interval: 2,
            easy_interval: 5,
            new_cards_per_day: 10,
            reviews_per_day: 50,
        };

        save_settings("Spanish", &settings, &conn).unwrap();
        assert_eq!(get_settings("Spanish", &conn).unwrap(), settings);
    }

    #[test]
    fn test_advance_day_moves_the_date_forward() {
        let conn = test_conn();
        assert_eq!(
            get_current_date(&conn).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );

        advance_day(&conn).unwrap();
        assert_eq!(
            get_current_date(&conn).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }
}

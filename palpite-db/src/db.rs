use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::config::GameConfig;
use crate::models::{format_numbers, parse_date, parse_numbers, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest_number  INTEGER PRIMARY KEY,
    draw_date       TEXT NOT NULL,
    numbers         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS suggestion_usage (
    user_id  TEXT NOT NULL,
    day      TEXT NOT NULL,
    count    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, day)
);

CREATE TABLE IF NOT EXISTS subscriptions (
    user_id     TEXT PRIMARY KEY,
    is_premium  INTEGER NOT NULL DEFAULT 0,
    expires_at  TEXT
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("palpite.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Insère un tirage ; un concours déjà présent est ignoré (retourne false).
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (contest_number, draw_date, numbers) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            draw.contest_number,
            draw.draw_date.format("%Y-%m-%d").to_string(),
            format_numbers(&draw.numbers),
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

pub fn has_contest(conn: &Connection, contest_number: u32) -> Result<bool> {
    let found: Option<u32> = conn
        .query_row(
            "SELECT contest_number FROM draws WHERE contest_number = ?1",
            [contest_number],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

type RawDraw = (u32, String, String);

fn decode_draw(raw: RawDraw, config: &GameConfig) -> Result<Draw> {
    let (contest_number, date, numbers) = raw;
    let draw_date = parse_date(&date)?;
    let numbers = parse_numbers(&numbers)?;
    Draw::new(contest_number, draw_date, numbers, config)
        .with_context(|| format!("Tirage corrompu en base (concours {contest_number})"))
}

fn query_draws(conn: &Connection, sql: &str, limit: Option<u32>, config: &GameConfig) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(sql)?;
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawDraw> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    };
    let rows = match limit {
        Some(limit) => stmt.query_map([limit], map_row)?.collect::<Result<Vec<_>, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
    };
    rows.into_iter().map(|raw| decode_draw(raw, config)).collect()
}

/// Historique complet, ordre croissant des concours.
pub fn fetch_history(conn: &Connection, config: &GameConfig) -> Result<Vec<Draw>> {
    let draws = query_draws(
        conn,
        "SELECT contest_number, draw_date, numbers FROM draws ORDER BY contest_number ASC",
        None,
        config,
    )?;
    log::debug!("{} tirages chargés", draws.len());
    Ok(draws)
}

/// Les `limit` derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32, config: &GameConfig) -> Result<Vec<Draw>> {
    query_draws(
        conn,
        "SELECT contest_number, draw_date, numbers FROM draws ORDER BY contest_number DESC LIMIT ?1",
        Some(limit),
        config,
    )
}

pub fn latest_draw(conn: &Connection, config: &GameConfig) -> Result<Option<Draw>> {
    Ok(fetch_last_draws(conn, 1, config)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn small_config() -> GameConfig {
        GameConfig {
            min_number: 1,
            max_number: 10,
            numbers_per_game: 3,
            recent_draws_window: 5,
        }
    }

    fn test_draw(contest: u32, date: &str, numbers: Vec<u8>) -> Draw {
        let draw_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        Draw::new(contest, draw_date, numbers, &small_config()).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw(1, "2024-01-01", vec![1, 2, 3])).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
        assert!(has_contest(&conn, 1).unwrap());
        assert!(!has_contest(&conn, 2).unwrap());
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw(1, "2024-01-01", vec![1, 2, 3])).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw(1, "2024-01-01", vec![4, 5, 6])).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_history_ascending_by_contest() {
        let conn = memory_db();
        let config = small_config();

        insert_draw(&conn, &test_draw(12, "2024-01-05", vec![1, 2, 3])).unwrap();
        insert_draw(&conn, &test_draw(3, "2024-01-01", vec![4, 5, 6])).unwrap();
        insert_draw(&conn, &test_draw(7, "2024-01-03", vec![7, 8, 9])).unwrap();

        let history = fetch_history(&conn, &config).unwrap();
        let contests: Vec<u32> = history.iter().map(|d| d.contest_number).collect();
        assert_eq!(contests, vec![3, 7, 12]);
        assert_eq!(history[1].numbers, vec![7, 8, 9]);
    }

    #[test]
    fn test_fetch_last_draws_most_recent_first() {
        let conn = memory_db();
        let config = small_config();

        for contest in 1..=5 {
            insert_draw(&conn, &test_draw(contest, "2024-01-01", vec![1, 2, 3])).unwrap();
        }

        let draws = fetch_last_draws(&conn, 2, &config).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].contest_number, 5);
        assert_eq!(draws[1].contest_number, 4);
        assert_eq!(latest_draw(&conn, &config).unwrap().unwrap().contest_number, 5);
    }

    #[test]
    fn test_latest_draw_empty() {
        let conn = memory_db();
        assert!(latest_draw(&conn, &small_config()).unwrap().is_none());
    }

    #[test]
    fn test_fetch_rejects_rows_outside_config() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw(1, "2024-01-01", vec![1, 2, 10])).unwrap();

        let narrower = GameConfig {
            max_number: 9,
            ..small_config()
        };
        assert!(fetch_history(&conn, &narrower).is_err());
    }

    #[test]
    fn test_open_db_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("palpite.db");
        let conn = open_db(&path).unwrap();
        migrate(&conn).unwrap();
        assert!(path.exists());
    }
}

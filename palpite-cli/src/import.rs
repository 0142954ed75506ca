use anyhow::{Context, Result};
use palpite_db::rusqlite::Connection;
use std::path::Path;

use palpite_db::config::GameConfig;
use palpite_db::db::insert_draw;
use palpite_db::models::{parse_date, Draw};

/// Colonnes attendues : concours ; date ; n1 ; ... ; nN (ligne d'en-tête obligatoire).
fn parse_record(record: &csv::StringRecord, config: &GameConfig) -> Result<Draw> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let contest_raw = get(0)?;
    let contest_number: u32 = contest_raw
        .parse()
        .with_context(|| format!("Numéro de concours invalide : '{}'", contest_raw))?;

    let draw_date = parse_date(get(1)?)?;

    let numbers = (2..2 + config.numbers_per_game)
        .map(|idx| {
            let s = get(idx)?;
            s.parse::<u8>()
                .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
        })
        .collect::<Result<Vec<u8>>>()?;

    Draw::new(contest_number, draw_date, numbers, config)
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path, config: &GameConfig, delimiter: u8) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match parse_record(&record, config) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        log::warn!("Erreur insertion ligne {}: {:#}", line, e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    log::warn!("Erreur parsing ligne {}: {:#}", line, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "Import de {:?} : {} insérés, {} doublons, {} erreurs",
        path,
        result.inserted,
        result.skipped,
        result.errors
    );
    Ok(result)
}

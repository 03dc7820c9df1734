use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use instantpick_db::rusqlite::Connection;
use std::path::Path;

use instantpick_db::db::insert_history_draw;

/// Un tirage lu dans le CSV : `date;numéros;complémentaire`.
#[derive(Debug, PartialEq)]
struct CsvDraw {
    date: String,
    main_numbers: String,
    extra: Option<String>,
}

fn parse_record(record: &csv::StringRecord) -> Result<CsvDraw> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let date = parse_date(&get(0)?)?;
    let main_numbers = normalize_numbers(&get(1)?)?;
    let extra = get(2).ok().filter(|s| !s.is_empty());

    Ok(CsvDraw { date, main_numbers, extra })
}

/// Accepte `JJ/MM/AAAA` ou `AAAA-MM-JJ` ; stocke toujours `AAAA-MM-JJ` pour que le tri
/// textuel de la colonne date reste chronologique.
fn parse_date(raw: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// "05 12 33" ou "05-12-33" -> "05,12,33" (les zéros de tête sont conservés tels quels).
fn normalize_numbers(raw: &str) -> Result<String> {
    let tokens: Vec<&str> = raw
        .split(|c: char| c == ',' || c == '-' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        bail!("Aucun numéro dans '{}'", raw);
    }
    if let Some(bad) = tokens.iter().find(|t| !t.chars().all(|c| c.is_ascii_digit())) {
        bail!("Numéro invalide '{}' dans '{}'", bad, raw);
    }
    Ok(tokens.join(","))
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path, game_id: &str) -> Result<ImportResult> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_records(conn, reader, game_id)
}

fn import_records<R: std::io::Read>(
    conn: &Connection,
    mut reader: csv::Reader<R>,
    game_id: &str,
) -> Result<ImportResult> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: 0,
        inserted: 0,
        skipped: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result {
            Ok(record) => {
                match parse_record(&record) {
                    Ok(draw) => {
                        match insert_history_draw(&tx, game_id, &draw.date, &draw.main_numbers, draw.extra.as_deref()) {
                            Ok(true) => result.inserted += 1,
                            Ok(false) => result.skipped += 1,
                            Err(e) => {
                                log::warn!("Erreur insertion tirage {}: {}", result.total_records, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Erreur parsing ligne {}: {}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

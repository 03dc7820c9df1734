use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{
    HistoryError, HistoryProvider, HistoryQuery, HistoryRow, ModuleParams, ModuleRecord,
    ModuleStore,
};

/// Table d'historique par défaut alimentée par `instantpick import`.
pub const DEFAULT_HISTORY_TABLE: &str = "draws";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS modules (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    module  TEXT NOT NULL,
    title   TEXT NOT NULL DEFAULT '',
    params  TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS draws (
    game_id       TEXT NOT NULL,
    draw_date     TEXT NOT NULL,
    main_numbers  TEXT NOT NULL,
    extra         TEXT,
    PRIMARY KEY (game_id, draw_date)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("instantpick.db");
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

pub fn insert_module(conn: &Connection, kind: &str, title: &str, params: &ModuleParams) -> Result<i64> {
    let json = serde_json::to_string(params).context("Échec de la sérialisation des paramètres")?;
    conn.execute(
        "INSERT INTO modules (module, title, params) VALUES (?1, ?2, ?3)",
        rusqlite::params![kind, title, json],
    ).context("Échec de l'insertion du module")?;
    Ok(conn.last_insert_rowid())
}

pub fn load_module_by_id(conn: &Connection, id: i64) -> Result<Option<ModuleRecord>> {
    let record = conn
        .query_row(
            "SELECT id, module, title, params FROM modules WHERE id = ?1 LIMIT 1",
            [id],
            |row| {
                Ok(ModuleRecord {
                    id: row.get(0)?,
                    module: row.get(1)?,
                    title: row.get(2)?,
                    params: row.get(3)?,
                })
            },
        )
        .optional()
        .with_context(|| format!("Échec de la lecture du module {id}"))?;
    Ok(record)
}

pub fn list_modules(conn: &Connection) -> Result<Vec<ModuleRecord>> {
    let mut stmt = conn.prepare("SELECT id, module, title, params FROM modules ORDER BY id")?;
    let modules = stmt.query_map([], |row| {
        Ok(ModuleRecord {
            id: row.get(0)?,
            module: row.get(1)?,
            title: row.get(2)?,
            params: row.get(3)?,
        })
    })?.collect::<Result<Vec<_>, _>>()?;
    Ok(modules)
}

/// Insère un tirage dans la table par défaut. Renvoie false si le tirage existe déjà.
pub fn insert_history_draw(
    conn: &Connection,
    game_id: &str,
    date: &str,
    main_numbers: &str,
    extra: Option<&str>,
) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (game_id, draw_date, main_numbers, extra)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![game_id, date, main_numbers, extra],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

pub fn count_history_draws(conn: &Connection, game_id: &str) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM draws WHERE game_id = ?1",
        [game_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Les noms de table et de colonnes viennent de la configuration : on n'accepte
/// que `[A-Za-z0-9_]+` avant de les citer.
pub fn quote_identifier(name: &str) -> Result<String, HistoryError> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(HistoryError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{name}\""))
}

fn cell_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn history_sql(query: &HistoryQuery) -> Result<String, HistoryError> {
    let date_col = quote_identifier(&query.date_column)?;
    let mut select = vec![date_col.clone()];
    for col in &query.main_columns {
        select.push(quote_identifier(col)?);
    }
    if let Some(extra) = &query.extra_column {
        select.push(quote_identifier(extra)?);
    }
    Ok(format!(
        "SELECT {} FROM {} WHERE \"game_id\" = ?1 ORDER BY {} DESC LIMIT ?2",
        select.join(", "),
        quote_identifier(&query.table)?,
        date_col,
    ))
}

impl HistoryProvider for Connection {
    fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRow>, HistoryError> {
        let sql = history_sql(query)?;
        let main_len = query.main_columns.len();
        let has_extra = query.extra_column.is_some();
        let db_err = |e: rusqlite::Error| HistoryError::QueryError(e.to_string());

        let mut stmt = self.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(rusqlite::params![query.game_id, query.limit], |row| {
                let date = cell_to_string(row.get_ref(0)?).unwrap_or_default();
                let mut main_values = Vec::with_capacity(main_len);
                for i in 0..main_len {
                    main_values.push(cell_to_string(row.get_ref(i + 1)?));
                }
                let extra_value = if has_extra {
                    cell_to_string(row.get_ref(main_len + 1)?)
                } else {
                    None
                };
                Ok(HistoryRow { date, main_values, extra_value })
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        if rows.is_empty() {
            return Err(HistoryError::NoRows);
        }
        Ok(rows)
    }
}

impl ModuleStore for Connection {
    fn load_module(&self, id: i64) -> Result<Option<ModuleRecord>> {
        load_module_by_id(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn default_query(limit: u32) -> HistoryQuery {
        HistoryQuery {
            table: DEFAULT_HISTORY_TABLE.to_string(),
            game_id: "pb".to_string(),
            date_column: "draw_date".to_string(),
            main_columns: vec!["main_numbers".to_string()],
            extra_column: Some("extra".to_string()),
            limit,
        }
    }

    #[test]
    fn test_insert_and_count() {
        let conn = test_conn();
        assert_eq!(count_history_draws(&conn, "pb").unwrap(), 0);

        insert_history_draw(&conn, "pb", "2024-01-01", "1,2,3,4,5", Some("6")).unwrap();
        insert_history_draw(&conn, "mm", "2024-01-01", "1,2,3,4,5", None).unwrap();
        assert_eq!(count_history_draws(&conn, "pb").unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = test_conn();
        assert!(insert_history_draw(&conn, "pb", "2024-01-01", "1,2,3", None).unwrap());
        assert!(!insert_history_draw(&conn, "pb", "2024-01-01", "4,5,6", None).unwrap());
        assert_eq!(count_history_draws(&conn, "pb").unwrap(), 1);
    }

    #[test]
    fn test_fetch_history_newest_first() {
        let conn = test_conn();
        insert_history_draw(&conn, "pb", "2024-01-01", "1,2,3,4,5", Some("6")).unwrap();
        insert_history_draw(&conn, "pb", "2024-01-05", "07,08,09,10,11", Some("12")).unwrap();
        insert_history_draw(&conn, "pb", "2024-01-03", "13,14,15,16,17", None).unwrap();
        insert_history_draw(&conn, "other", "2024-01-09", "1,2,3,4,5", None).unwrap();

        let rows = conn.fetch_history(&default_query(50)).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "2024-01-05");
        assert_eq!(rows[0].main_values, vec![Some("07,08,09,10,11".to_string())]);
        assert_eq!(rows[0].extra_value.as_deref(), Some("12"));
        assert_eq!(rows[1].date, "2024-01-03");
        assert_eq!(rows[1].extra_value, None);
        assert_eq!(rows[2].date, "2024-01-01");
    }

    #[test]
    fn test_fetch_history_integer_columns() {
        let conn = test_conn();
        conn.execute_batch(
            "CREATE TABLE results (game_id TEXT, drawn_on TEXT, b1 INTEGER, b2 INTEGER, bonus INTEGER);
             INSERT INTO results VALUES ('g', '2024-02-01', 4, NULL, 9);",
        ).unwrap();
        let query = HistoryQuery {
            table: "results".to_string(),
            game_id: "g".to_string(),
            date_column: "drawn_on".to_string(),
            main_columns: vec!["b1".to_string(), "b2".to_string()],
            extra_column: Some("bonus".to_string()),
            limit: 50,
        };
        let rows = conn.fetch_history(&query).unwrap();
        assert_eq!(rows[0].main_values, vec![Some("4".to_string()), None]);
        assert_eq!(rows[0].extra_value.as_deref(), Some("9"));
    }

    #[test]
    fn test_fetch_history_respects_limit() {
        let conn = test_conn();
        for day in 1..=28 {
            for month in 1..=3 {
                let date = format!("2024-{month:02}-{day:02}");
                insert_history_draw(&conn, "pb", &date, "1,2,3", None).unwrap();
            }
        }
        let rows = conn.fetch_history(&default_query(50)).unwrap();
        assert_eq!(rows.len(), 50);
        assert_eq!(rows[0].date, "2024-03-28");
    }

    #[test]
    fn test_fetch_history_no_rows() {
        let conn = test_conn();
        assert!(matches!(
            conn.fetch_history(&default_query(50)),
            Err(HistoryError::NoRows)
        ));
    }

    #[test]
    fn test_fetch_history_unknown_table() {
        let conn = test_conn();
        let mut query = default_query(50);
        query.table = "missing_table".to_string();
        assert!(matches!(
            conn.fetch_history(&query),
            Err(HistoryError::QueryError(_))
        ));
    }

    #[test]
    fn test_quote_identifier_rejects_injection() {
        assert_eq!(quote_identifier("draw_date").unwrap(), "\"draw_date\"");
        assert!(quote_identifier("draws; DROP TABLE modules").is_err());
        assert!(quote_identifier("a\"b").is_err());
        assert!(quote_identifier("").is_err());
    }

    #[test]
    fn test_module_roundtrip() {
        let conn = test_conn();
        let params = ModuleParams {
            game_key: "powerball".to_string(),
            ..ModuleParams::default()
        };
        let id = insert_module(&conn, crate::models::MODULE_KIND, "Powerball", &params).unwrap();

        let record = conn.load_module(id).unwrap().unwrap();
        assert_eq!(record.module, crate::models::MODULE_KIND);
        assert_eq!(record.title, "Powerball");
        assert_eq!(record.params().game_key, "powerball");

        assert!(conn.load_module(id + 1).unwrap().is_none());
        assert_eq!(list_modules(&conn).unwrap().len(), 1);
    }
}

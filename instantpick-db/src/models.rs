use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Type de module attendu dans la table `modules`.
pub const MODULE_KIND: &str = "mod_instantpick";

pub const HISTORY_LIMIT_MIN: u32 = 50;
pub const HISTORY_LIMIT_MAX: u32 = 5000;

/// Un tirage normalisé : numéros uniques, triés, dans la plage du jeu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub date: String,
    pub numbers: Vec<u32>,
}

/// Ligne brute renvoyée par le fournisseur d'historique.
/// `main_values[i]` correspond à `HistoryQuery::main_columns[i]` (None si NULL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub date: String,
    pub main_values: Vec<Option<String>>,
    pub extra_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub table: String,
    pub game_id: String,
    pub date_column: String,
    pub main_columns: Vec<String>,
    pub extra_column: Option<String>,
    pub limit: u32,
}

impl HistoryQuery {
    /// Construit la requête à partir des paramètres du module.
    /// Table, identifiant de jeu et colonnes principales sont obligatoires.
    pub fn from_params(params: &ModuleParams) -> Result<Self, HistoryError> {
        let table = params.db_table.trim();
        let game_id = params.db_game_id.trim();
        let main_columns: Vec<String> = params
            .main_cols_csv
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        if table.is_empty() || game_id.is_empty() || main_columns.is_empty() {
            return Err(HistoryError::MissingConfig(
                "db_table/db_game_id/main_cols_csv".to_string(),
            ));
        }

        let date_column = match params.draw_date_col.trim() {
            "" => "draw_date".to_string(),
            col => col.to_string(),
        };
        let extra_column = Some(params.extra_col.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            table: table.to_string(),
            game_id: game_id.to_string(),
            date_column,
            main_columns,
            extra_column,
            limit: clamp_history_limit(params.history_limit),
        })
    }
}

pub fn clamp_history_limit(limit: i64) -> u32 {
    limit.clamp(HISTORY_LIMIT_MIN as i64, HISTORY_LIMIT_MAX as i64) as u32
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Missing history config: {0}")]
    MissingConfig(String),

    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("DB error: {0}")]
    QueryError(String),

    #[error("No draw rows returned")]
    NoRows,

    #[error("Not enough draws after normalization ({found} < {required})")]
    InsufficientHistory { found: usize, required: usize },
}

/// Source des tirages passés. Les lignes sont renvoyées du plus récent au plus ancien.
pub trait HistoryProvider {
    fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryRow>, HistoryError>;
}

/// Accès en lecture aux modules enregistrés.
pub trait ModuleStore {
    fn load_module(&self, id: i64) -> Result<Option<ModuleRecord>>;
}

#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: i64,
    pub module: String,
    pub title: String,
    pub params: String,
}

impl ModuleRecord {
    /// Paramètres décodés ; un JSON illisible retombe sur les valeurs par défaut.
    pub fn params(&self) -> ModuleParams {
        match serde_json::from_str::<ModuleParams>(&self.params) {
            Ok(params) => params,
            Err(e) => {
                log::warn!("Module {}: unreadable params ({e}), using defaults", self.id);
                ModuleParams::default()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleParams {
    pub game_key: String,
    pub timezone: String,
    #[serde(deserialize_with = "int_or_string")]
    pub min_lines: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub max_lines: i64,

    #[serde(deserialize_with = "int_or_string")]
    pub main_count: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub main_min: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub main_max: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub extra_enabled: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub extra_count: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub extra_min: i64,
    #[serde(deserialize_with = "int_or_string")]
    pub extra_max: i64,
    pub extra_label: String,

    pub db_table: String,
    pub db_game_id: String,
    pub draw_date_col: String,
    pub main_cols_csv: String,
    pub extra_col: String,
    #[serde(deserialize_with = "int_or_string")]
    pub history_limit: i64,

    pub default_method: String,
    #[serde(deserialize_with = "int_or_string")]
    pub default_lines: i64,
    pub ajax_url: String,
}

impl Default for ModuleParams {
    fn default() -> Self {
        Self {
            game_key: "game".to_string(),
            timezone: "America/New_York".to_string(),
            min_lines: 3,
            max_lines: 10,
            main_count: 5,
            main_min: 1,
            main_max: 69,
            extra_enabled: 1,
            extra_count: 1,
            extra_min: 1,
            extra_max: 26,
            extra_label: "X".to_string(),
            db_table: String::new(),
            db_game_id: String::new(),
            draw_date_col: "draw_date".to_string(),
            main_cols_csv: String::new(),
            extra_col: String::new(),
            history_limit: 400,
            default_method: "random".to_string(),
            default_lines: 5,
            ajax_url: "index.php?option=com_ajax&module=instantpick&method=getPicks&format=json"
                .to_string(),
        }
    }
}

// Les formulaires d'administration stockent souvent les entiers en texte ("5").
fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| D::Error::custom(format!("entier invalide: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("entier invalide: '{s}'"))),
        serde_json::Value::Bool(b) => Ok(b as i64),
        other => Err(D::Error::custom(format!("entier attendu, reçu {other}"))),
    }
}

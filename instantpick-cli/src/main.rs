mod display;
mod import;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use instantpick_db::rusqlite::Connection;
use rand::SeedableRng;
use rand::rngs::StdRng;

use instantpick_db::db::{db_path, insert_module, list_modules, load_module_by_id, migrate, open_db};
use instantpick_db::models::{HistoryProvider, HistoryQuery, ModuleParams, ModuleRecord, MODULE_KIND};
use instantpick_engine::ajax::{get_picks, AjaxRequest, AjaxResponse};
use instantpick_engine::history::normalize_history;
use instantpick_engine::hot_cold::frequency_table;
use instantpick_engine::rules::GameRuleConfig;
use instantpick_engine::skip_hit::skip_hit_stats;
use crate::display::{display_draws, display_import_summary, display_modules, display_picks, display_stats};

#[derive(Parser)]
#[command(name = "instantpick", about = "Générateur de grilles : aléatoire, chaud/froid, skip-hit")]
struct Cli {
    /// Chemin de la base SQLite (défaut : ./data/instantpick.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer l'historique des tirages depuis un CSV (date;numéros;complémentaire)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,

        /// Identifiant du jeu (colonne game_id)
        #[arg(short, long)]
        game_id: String,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Enregistrer un module à partir d'un fichier de paramètres JSON
    ModuleAdd {
        /// Fichier JSON des paramètres du module
        #[arg(short, long)]
        params: PathBuf,

        /// Titre du module
        #[arg(short, long, default_value = "")]
        title: String,
    },

    /// Lister les modules enregistrés
    Modules,

    /// Lister les derniers tirages normalisés d'un module
    History {
        #[arg(short, long)]
        module_id: i64,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Afficher fréquences et statistiques skip-hit d'un module
    Stats {
        #[arg(short, long)]
        module_id: i64,
    },

    /// Générer des grilles
    Picks {
        #[arg(short, long)]
        module_id: i64,

        /// Méthode : random, hotcold ou skiphit
        #[arg(long, default_value = "random")]
        method: String,

        /// Nombre de lignes (borné par min_lines/max_lines du module)
        #[arg(short, long, default_value = "5")]
        lines: i64,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Sortie JSON brute, telle que renvoyée au client
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = cli.db.unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file, game_id } => cmd_import(&conn, &file, &game_id),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::ModuleAdd { params, title } => cmd_module_add(&conn, &params, &title),
        Command::Modules => {
            display_modules(&list_modules(&conn)?);
            Ok(())
        }
        Command::History { module_id, last } => cmd_history(&conn, module_id, last),
        Command::Stats { module_id } => cmd_stats(&conn, module_id),
        Command::Picks {
            module_id,
            method,
            lines,
            seed,
            json,
        } => cmd_picks(&conn, module_id, method, lines, seed, json),
    }
}

fn cmd_import(conn: &Connection, file: &PathBuf, game_id: &str) -> Result<()> {
    let result = import::import_csv(conn, file, game_id)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_module_add(conn: &Connection, params_path: &PathBuf, title: &str) -> Result<()> {
    let json = std::fs::read_to_string(params_path)
        .with_context(|| format!("Impossible de lire {:?}", params_path))?;
    let params: ModuleParams = serde_json::from_str(&json)
        .with_context(|| format!("Paramètres invalides dans {:?}", params_path))?;
    let id = insert_module(conn, MODULE_KIND, title, &params)?;
    println!("Module enregistré : id {id}");
    Ok(())
}

fn require_module(conn: &Connection, module_id: i64) -> Result<ModuleRecord> {
    match load_module_by_id(conn, module_id)? {
        Some(module) if module.module == MODULE_KIND => Ok(module),
        _ => bail!("Module {} introuvable", module_id),
    }
}

fn load_draws(conn: &Connection, params: &ModuleParams) -> Result<Vec<instantpick_db::models::Draw>> {
    let rules = GameRuleConfig::from_params(params);
    let query = HistoryQuery::from_params(params)?;
    let rows = conn.fetch_history(&query)?;
    let draws = normalize_history(&rows, rules.main_min, rules.main_max, rules.exclude_zero)?;
    Ok(draws)
}

fn cmd_history(conn: &Connection, module_id: i64, last: usize) -> Result<()> {
    let params = require_module(conn, module_id)?.params();
    let draws = load_draws(conn, &params)?;
    display_draws(&draws, last);
    Ok(())
}

fn cmd_stats(conn: &Connection, module_id: i64) -> Result<()> {
    let params = require_module(conn, module_id)?.params();
    let rules = GameRuleConfig::from_params(&params);
    let draws = load_draws(conn, &params)?;

    let frequencies = frequency_table(&draws, rules.main_min, rules.main_max, rules.exclude_zero);
    let skip_stats = skip_hit_stats(&draws, rules.main_min, rules.main_max, rules.exclude_zero);
    display_stats(&frequencies, &skip_stats, draws.len());
    Ok(())
}

fn cmd_picks(
    conn: &Connection,
    module_id: i64,
    method: String,
    lines: i64,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let request = AjaxRequest {
        module_id,
        pick_method: method,
        lines,
    };
    let response = get_picks(conn, conn, &request, &mut rng);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        AjaxResponse::Success { payload, .. } => {
            display_picks(&payload);
            Ok(())
        }
        AjaxResponse::Failure { error, .. } => bail!("{}", error),
    }
}

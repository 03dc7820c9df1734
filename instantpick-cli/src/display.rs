use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use instantpick_db::models::{Draw, ModuleRecord};
use instantpick_engine::hot_cold::NumberFrequency;
use instantpick_engine::payload::PicksPayload;
use instantpick_engine::pool::PoolMeta;
use instantpick_engine::skip_hit::SkipHitStats;

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_modules(modules: &[ModuleRecord]) {
    if modules.is_empty() {
        println!("Aucun module enregistré.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Id", "Type", "Titre", "Jeu", "Plage", "Historique"]);

    for module in modules {
        let params = module.params();
        let range = format!(
            "{} × {}-{}",
            params.main_count, params.main_min, params.main_max
        );
        let history = if params.db_table.is_empty() {
            "—".to_string()
        } else {
            format!("{}/{}", params.db_table, params.db_game_id)
        };
        table.add_row(vec![
            &module.id.to_string(),
            &module.module,
            &module.title,
            &params.game_key,
            &range,
            &history,
        ]);
    }
    println!("{table}");
}

/// `draws` est chronologique ; on affiche les plus récents en premier.
pub fn display_draws(draws: &[Draw], last: usize) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Numéros"]);

    for draw in draws.iter().rev().take(last) {
        table.add_row(vec![&draw.date, &join_numbers(&draw.numbers)]);
    }
    println!("{table}");
}

pub fn display_stats(frequencies: &[NumberFrequency], skip_stats: &[SkipHitStats], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    println!("── Fréquences ──");
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéro", "Fréquence"]);

    let mut sorted = frequencies.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for stat in &sorted {
        table.add_row(vec![
            &format!("{:2}", stat.number),
            &stat.frequency.to_string(),
        ]);
    }
    println!("{table}");

    println!("\n── Skip-hit ──");
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéro", "Sorties", "Retard", "P(hit|retard)", "Score"]);

    // skip_stats arrive déjà classé par score
    for stat in skip_stats {
        table.add_row(vec![
            &format!("{:2}", stat.number),
            &stat.draw_count.to_string(),
            &stat.current_skip.to_string(),
            &format!("{:.4}", stat.hit_probability),
            &format!("{:.4}", stat.score),
        ]);
    }
    println!("{table}");
}

pub fn display_picks(payload: &PicksPayload) {
    let meta = &payload.meta;
    println!("\n🎲 Grilles {} ({}, {} lignes)\n", meta.game_key, meta.method, meta.lines);
    if let Some(fallback) = &meta.fallback {
        println!("⚠ Méthode {} indisponible : {}\n", meta.requested_method, fallback);
    }

    match &meta.pool {
        Some(PoolMeta::HotCold { hot_top, cold_top }) => {
            println!("Chauds : {}", join_numbers(hot_top));
            println!("Froids : {}\n", join_numbers(cold_top));
        }
        Some(PoolMeta::SkipHit { top_ranked }) => {
            println!("Mieux classés : {}\n", join_numbers(top_ranked));
        }
        None => {}
    }

    let rules = &payload.rules;
    let mut header = vec!["#", "Numéros"];
    if rules.extra_enabled {
        header.push(rules.extra_label.as_str());
    }
    header.push("Copie");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for (i, line) in payload.picks.iter().enumerate() {
        let mut row = vec![
            Cell::new(i + 1),
            Cell::new(join_numbers(&line.main)),
        ];
        if rules.extra_enabled {
            row.push(Cell::new(join_numbers(&line.extra)).fg(Color::Yellow));
        }
        row.push(Cell::new(line.copy_text()));
        table.add_row(row);
    }
    println!("{table}");
    println!("Généré le {}", payload.generated_at);
}

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;

use instantpick_db::models::{HistoryProvider, ModuleParams};

use crate::pool::PoolMeta;
use crate::rules::{clamp_lines, GameRuleConfig, PickMethod};
use crate::sampler::{sample_from_pool, sample_uniform};
use crate::strategy::{resolve_strategy, StrategyResolution};

/// Une grille : numéros principaux et numéros complémentaires, triés.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub main: Vec<u32>,
    pub extra: Vec<u32>,
}

impl Line {
    /// Texte copié par le client : `1-2-3-4-5 | 6`.
    pub fn copy_text(&self) -> String {
        let join = |numbers: &[u32]| {
            numbers.iter().map(u32::to_string).collect::<Vec<_>>().join("-")
        };
        if self.extra.is_empty() {
            join(&self.main)
        } else {
            format!("{} | {}", join(&self.main), join(&self.extra))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PicksMeta {
    pub method: PickMethod,
    pub requested_method: PickMethod,
    pub lines: usize,
    pub tz: String,
    pub game_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolMeta>,
}

/// Règles renvoyées au client pour l'étiquetage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesView {
    pub main_count: usize,
    pub main_min: u32,
    pub main_max: u32,
    pub extra_enabled: bool,
    pub extra_count: usize,
    pub extra_min: u32,
    pub extra_max: u32,
    pub extra_label: String,
}

impl From<&GameRuleConfig> for RulesView {
    fn from(rules: &GameRuleConfig) -> Self {
        Self {
            main_count: rules.main_count,
            main_min: rules.main_min,
            main_max: rules.main_max,
            extra_enabled: rules.extra_enabled,
            extra_count: rules.extra_count,
            extra_min: rules.extra_min,
            extra_max: rules.extra_max,
            extra_label: rules.extra_label.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PicksPayload {
    pub meta: PicksMeta,
    pub rules: RulesView,
    pub picks: Vec<Line>,
    #[serde(rename = "now")]
    pub generated_at: String,
    pub ajax_url: String,
}

pub fn build_picks_payload(
    params: &ModuleParams,
    method: &str,
    lines: i64,
    provider: &impl HistoryProvider,
    rng: &mut impl Rng,
) -> PicksPayload {
    let requested = PickMethod::parse(method);
    let lines = clamp_lines(lines, params.min_lines, params.max_lines);
    let rules = GameRuleConfig::from_params(params);

    let resolution = resolve_strategy(requested, params, &rules, provider);
    let picks = (0..lines)
        .map(|_| generate_line(&rules, &resolution, rng))
        .collect();

    let StrategyResolution { method, pool, fallback_reason } = resolution;

    PicksPayload {
        meta: PicksMeta {
            method,
            requested_method: requested,
            lines,
            tz: params.timezone.clone(),
            game_key: params.game_key.clone(),
            fallback: fallback_reason,
            pool: pool.map(|p| p.meta),
        },
        rules: RulesView::from(&rules),
        picks,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        ajax_url: params.ajax_url.clone(),
    }
}

/// Premier rendu du module, avec la méthode et le nombre de lignes par défaut.
pub fn build_initial_payload(
    params: &ModuleParams,
    provider: &impl HistoryProvider,
    rng: &mut impl Rng,
) -> PicksPayload {
    build_picks_payload(params, &params.default_method, params.default_lines, provider, rng)
}

fn generate_line(rules: &GameRuleConfig, resolution: &StrategyResolution, rng: &mut impl Rng) -> Line {
    let main = match &resolution.pool {
        Some(pool) => sample_from_pool(
            rng,
            rules.main_count,
            &pool.numbers,
            rules.main_min,
            rules.main_max,
            rules.exclude_zero,
        ),
        None => sample_uniform(rng, rules.main_count, rules.main_min, rules.main_max, rules.exclude_zero),
    };

    // Les complémentaires restent aléatoires, quelle que soit la méthode ; zéro autorisé.
    let extra = if rules.draws_extras() {
        sample_uniform(rng, rules.extra_count, rules.extra_min, rules.extra_max, false)
    } else {
        Default::default()
    };

    // BTreeSet : itération déjà croissante
    Line {
        main: main.into_iter().collect(),
        extra: extra.into_iter().collect(),
    }
}

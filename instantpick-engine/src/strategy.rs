use instantpick_db::models::{Draw, HistoryError, HistoryProvider, HistoryQuery, ModuleParams};

use crate::history::normalize_history;
use crate::hot_cold::build_hot_cold_pool;
use crate::pool::Pool;
use crate::rules::{GameRuleConfig, PickMethod};
use crate::skip_hit::build_skip_hit_pool;

pub const HISTORY_FALLBACK_NOTE: &str = "random (history unavailable)";

/// Méthode effectivement retenue, calculée une seule fois avant la génération des lignes.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResolution {
    pub method: PickMethod,
    pub pool: Option<Pool>,
    pub fallback_reason: Option<String>,
}

impl StrategyResolution {
    fn random() -> Self {
        Self {
            method: PickMethod::Random,
            pool: None,
            fallback_reason: None,
        }
    }
}

/// Un historique indisponible ou insuffisant ne fait jamais échouer la requête :
/// on repasse en tirage aléatoire avec une note de repli.
pub fn resolve_strategy(
    requested: PickMethod,
    params: &ModuleParams,
    rules: &GameRuleConfig,
    provider: &impl HistoryProvider,
) -> StrategyResolution {
    let builder: PoolBuilder = match requested {
        PickMethod::Random => return StrategyResolution::random(),
        PickMethod::HotCold => build_hot_cold_pool,
        PickMethod::SkipHit => build_skip_hit_pool,
    };

    match build_pool(builder, params, rules, provider) {
        Ok(pool) => StrategyResolution {
            method: requested,
            pool: Some(pool),
            fallback_reason: None,
        },
        Err(e) => {
            log::warn!("{requested} unavailable, falling back to random: {e}");
            StrategyResolution {
                fallback_reason: Some(HISTORY_FALLBACK_NOTE.to_string()),
                ..StrategyResolution::random()
            }
        }
    }
}

type PoolBuilder = fn(&[Draw], u32, u32, bool) -> Pool;

fn build_pool(
    builder: PoolBuilder,
    params: &ModuleParams,
    rules: &GameRuleConfig,
    provider: &impl HistoryProvider,
) -> Result<Pool, HistoryError> {
    let query = HistoryQuery::from_params(params)?;
    let rows = provider.fetch_history(&query)?;
    let draws = normalize_history(&rows, rules.main_min, rules.main_max, rules.exclude_zero)?;
    Ok(builder(&draws, rules.main_min, rules.main_max, rules.exclude_zero))
}

use std::collections::BTreeMap;

use instantpick_db::models::Draw;

use crate::pool::{Pool, PoolMeta};

pub const SKIP_HIT_POOL_SIZE: usize = 28;
pub const SKIP_HIT_META_TOP: usize = 20;

const FREQ_WEIGHT: f64 = 0.35;
const SKIP_WEIGHT: f64 = 0.25;
const HIT_WEIGHT: f64 = 0.40;
const SCORE_EPSILON: f64 = 1e-12;

/// Statistiques d'écart d'un numéro sur la série chronologique.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipHitStats {
    pub number: u32,
    pub draw_count: u32,
    pub last_seen: Option<usize>,
    /// écart observé -> nombre d'occurrences
    pub skip_histogram: BTreeMap<usize, u32>,
    pub current_skip: usize,
    pub hit_probability: f64,
    pub score: f64,
}

impl SkipHitStats {
    fn unseen(number: u32) -> Self {
        Self {
            number,
            draw_count: 0,
            last_seen: None,
            skip_histogram: BTreeMap::from([(0, 1)]),
            current_skip: 0,
            hit_probability: 0.0,
            score: 0.0,
        }
    }
}

/// Calcule les statistiques pour chaque numéro légal, classées par score décroissant.
/// `draws` doit être chronologique (du plus ancien au plus récent).
pub fn skip_hit_stats(draws: &[Draw], min: u32, max: u32, exclude_zero: bool) -> Vec<SkipHitStats> {
    let total = draws.len();

    let mut seen: BTreeMap<u32, SkipHitStats> = BTreeMap::new();
    for (i, draw) in draws.iter().enumerate() {
        for &n in &draw.numbers {
            let entry = seen.entry(n).or_insert_with(|| SkipHitStats {
                skip_histogram: BTreeMap::new(),
                ..SkipHitStats::unseen(n)
            });
            entry.draw_count += 1;
            let skip = match entry.last_seen {
                Some(prev) => i - prev - 1,
                None => 0,
            };
            *entry.skip_histogram.entry(skip).or_insert(0) += 1;
            entry.last_seen = Some(i);
        }
    }

    let mut stats: Vec<SkipHitStats> = (min..=max)
        .filter(|&n| !(exclude_zero && n == 0))
        .map(|n| seen.remove(&n).unwrap_or_else(|| SkipHitStats::unseen(n)))
        .collect();

    let max_count = stats.iter().map(|s| s.draw_count).max().unwrap_or(0).max(1);

    for s in &mut stats {
        s.current_skip = match s.last_seen {
            Some(last) => total - last - 1,
            None => total,
        };
        let observations: u32 = s.skip_histogram.values().sum();
        s.hit_probability = match s.skip_histogram.get(&s.current_skip) {
            Some(&hits) if observations > 0 => hits as f64 / observations as f64,
            _ => 0.0,
        };
        s.score = FREQ_WEIGHT * (s.draw_count as f64 / max_count as f64)
            + SKIP_WEIGHT * (1.0 / (s.current_skip as f64 + 1.0))
            + HIT_WEIGHT * s.hit_probability;
    }

    rank_by_score(&mut stats);
    stats
}

/// Score décroissant ; les scores égaux à `SCORE_EPSILON` près sont départagés par numéro croissant.
fn rank_by_score(stats: &mut [SkipHitStats]) {
    stats.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.number.cmp(&b.number)));

    let mut start = 0;
    while start < stats.len() {
        let mut end = start + 1;
        while end < stats.len() && (stats[end - 1].score - stats[end].score).abs() < SCORE_EPSILON {
            end += 1;
        }
        if end - start > 1 {
            stats[start..end].sort_by_key(|s| s.number);
        }
        start = end;
    }
}

pub fn build_skip_hit_pool(draws: &[Draw], min: u32, max: u32, exclude_zero: bool) -> Pool {
    let ranked: Vec<u32> = skip_hit_stats(draws, min, max, exclude_zero)
        .iter()
        .map(|s| s.number)
        .collect();

    log::debug!("Skip-hit ranking over {} numbers", ranked.len());

    Pool {
        numbers: ranked.iter().copied().take(SKIP_HIT_POOL_SIZE).collect(),
        meta: PoolMeta::SkipHit {
            top_ranked: ranked.iter().copied().take(SKIP_HIT_META_TOP).collect(),
        },
    }
}

use std::collections::BTreeSet;

use rand::{Rng, RngExt};

const UNIFORM_MAX_ATTEMPTS: usize = 20_000;
const UNIFORM_ATTEMPTS_PER_NUMBER: usize = 10;
const POOL_MAX_ATTEMPTS: usize = 3_000;
const POOL_ATTEMPTS_PER_PICK: usize = 50;
/// Au-delà, on ne matérialise pas la liste des numéros restants.
const COMPLETION_SPAN_LIMIT: usize = 1_000_000;

/// Nombre de numéros légaux dans `[min, max]`.
pub fn theoretical_pool_size(min: u32, max: u32, exclude_zero: bool) -> usize {
    if min > max {
        return 0;
    }
    let span = (max - min) as usize + 1;
    if exclude_zero && min == 0 {
        span - 1
    } else {
        span
    }
}

fn is_legal(n: u32, min: u32, max: u32, exclude_zero: bool) -> bool {
    n >= min && n <= max && !(exclude_zero && n == 0)
}

/// Tire `count` numéros distincts uniformément dans `[min, max]`.
/// `count` est d'abord ramené à la taille théorique de la plage.
pub fn sample_uniform(
    rng: &mut impl Rng,
    count: usize,
    min: u32,
    max: u32,
    exclude_zero: bool,
) -> BTreeSet<u32> {
    let target = count.min(theoretical_pool_size(min, max, exclude_zero));
    let mut out = BTreeSet::new();
    fill_uniform(rng, &mut out, target, min, max, exclude_zero);
    out
}

/// Tire `count` numéros distincts en privilégiant `pool`, puis complète au hasard dans la plage.
pub fn sample_from_pool(
    rng: &mut impl Rng,
    count: usize,
    pool: &[u32],
    min: u32,
    max: u32,
    exclude_zero: bool,
) -> BTreeSet<u32> {
    let target = count.min(theoretical_pool_size(min, max, exclude_zero));
    let mut out = BTreeSet::new();
    if target == 0 {
        return out;
    }

    let pool = sanitize_pool(pool, min, max, exclude_zero);
    let max_attempts = POOL_MAX_ATTEMPTS.min(target * POOL_ATTEMPTS_PER_PICK);
    let mut attempts = 0;

    while out.len() < target && attempts < max_attempts {
        attempts += 1;
        let n = if pool.is_empty() {
            rng.random_range(min..=max)
        } else {
            pool[rng.random_range(0..pool.len())]
        };
        if is_legal(n, min, max, exclude_zero) {
            out.insert(n);
        }
    }

    if out.len() < target {
        log::debug!("Pool sampling short by {}, backfilling", target - out.len());
        fill_uniform(rng, &mut out, target, min, max, exclude_zero);
    }

    out
}

/// Dédoublonne en gardant l'ordre et retire les numéros illégaux.
fn sanitize_pool(pool: &[u32], min: u32, max: u32, exclude_zero: bool) -> Vec<u32> {
    let mut seen = BTreeSet::new();
    pool.iter()
        .copied()
        .filter(|&n| is_legal(n, min, max, exclude_zero))
        .filter(|&n| seen.insert(n))
        .collect()
}

/// Complète `out` jusqu'à `target` numéros ; `target` ne dépasse jamais la taille de la plage.
fn fill_uniform(
    rng: &mut impl Rng,
    out: &mut BTreeSet<u32>,
    target: usize,
    min: u32,
    max: u32,
    exclude_zero: bool,
) {
    if out.len() >= target {
        return;
    }

    let pool_size = theoretical_pool_size(min, max, exclude_zero);
    let max_attempts = UNIFORM_MAX_ATTEMPTS.min(pool_size.saturating_mul(UNIFORM_ATTEMPTS_PER_NUMBER));
    let mut attempts = 0;

    while out.len() < target && attempts < max_attempts {
        attempts += 1;
        let n = rng.random_range(min..=max);
        if exclude_zero && n == 0 {
            continue;
        }
        out.insert(n);
    }

    if out.len() < target && pool_size <= COMPLETION_SPAN_LIMIT {
        let mut remaining: Vec<u32> = (min..=max)
            .filter(|&n| !(exclude_zero && n == 0) && !out.contains(&n))
            .collect();
        log::warn!(
            "Uniform sampling exhausted its budget, completing {} numbers from {} remaining",
            target - out.len(),
            remaining.len()
        );
        while out.len() < target && !remaining.is_empty() {
            let idx = rng.random_range(0..remaining.len());
            out.insert(remaining.swap_remove(idx));
        }
    }
}

use std::cmp::Ordering;

use instantpick_db::models::Draw;

use crate::pool::{Pool, PoolMeta};

pub const HOT_COLD_SLICE: usize = 20;
pub const HOT_COLD_META_TOP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFrequency {
    pub number: u32,
    pub frequency: u32,
}

/// Fréquence de chaque numéro légal de `[min, max]`, zéro compris pour les absents.
pub fn frequency_table(draws: &[Draw], min: u32, max: u32, exclude_zero: bool) -> Vec<NumberFrequency> {
    let mut table: Vec<NumberFrequency> = (min..=max)
        .filter(|&n| !(exclude_zero && n == 0))
        .map(|number| NumberFrequency { number, frequency: 0 })
        .collect();

    for draw in draws {
        for &n in &draw.numbers {
            // table triée par numéro
            if let Ok(idx) = table.binary_search_by_key(&n, |f| f.number) {
                table[idx].frequency += 1;
            }
        }
    }

    table
}

fn hot_order(a: &NumberFrequency, b: &NumberFrequency) -> Ordering {
    b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number))
}

fn cold_order(a: &NumberFrequency, b: &NumberFrequency) -> Ordering {
    a.frequency.cmp(&b.frequency).then(a.number.cmp(&b.number))
}

/// Pool = 20 numéros chauds, puis les froids qui ne sont pas déjà chauds.
pub fn build_hot_cold_pool(draws: &[Draw], min: u32, max: u32, exclude_zero: bool) -> Pool {
    let table = frequency_table(draws, min, max, exclude_zero);

    let mut hot = table.clone();
    hot.sort_by(hot_order);
    let hot_list: Vec<u32> = hot.iter().take(HOT_COLD_SLICE).map(|f| f.number).collect();

    let mut cold = table;
    cold.sort_by(cold_order);
    let cold_list: Vec<u32> = cold.iter().take(HOT_COLD_SLICE).map(|f| f.number).collect();

    let mut numbers = hot_list.clone();
    for &n in &cold_list {
        if !numbers.contains(&n) {
            numbers.push(n);
        }
    }

    log::debug!("Hot/cold pool: {} numbers", numbers.len());

    Pool {
        numbers,
        meta: PoolMeta::HotCold {
            hot_top: hot_list.into_iter().take(HOT_COLD_META_TOP).collect(),
            cold_top: cold_list.into_iter().take(HOT_COLD_META_TOP).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(numbers: &[u32]) -> Draw {
        Draw {
            date: "2024-01-01".to_string(),
            numbers: numbers.to_vec(),
        }
    }

    fn varied_draws(n: usize) -> Vec<Draw> {
        (0..n)
            .map(|i| {
                let base = (i % 10) as u32;
                draw(&[base * 5 + 1, base * 5 + 2, base * 5 + 3, 60 + (i % 3) as u32, 69])
            })
            .collect()
    }

    #[test]
    fn test_frequency_table_covers_range() {
        let draws = varied_draws(30);
        let table = frequency_table(&draws, 1, 69, true);
        assert_eq!(table.len(), 69);
        for (i, f) in table.iter().enumerate() {
            assert_eq!(f.number, i as u32 + 1);
        }
        let total: u32 = table.iter().map(|f| f.frequency).sum();
        assert_eq!(total, 30 * 5);
        assert_eq!(table[68].frequency, 30);
        assert_eq!(table[49].frequency, 0);
    }

    #[test]
    fn test_frequency_table_digit_game_includes_zero() {
        let table = frequency_table(&[draw(&[0, 3])], 0, 9, false);
        assert_eq!(table.len(), 10);
        assert_eq!(table[0], NumberFrequency { number: 0, frequency: 1 });

        let table = frequency_table(&[draw(&[3])], 0, 20, true);
        assert_eq!(table.len(), 20);
        assert_eq!(table[0].number, 1);
    }

    #[test]
    fn test_hot_first_cold_after() {
        let draws = varied_draws(30);
        let pool = build_hot_cold_pool(&draws, 1, 69, true);

        assert!(pool.numbers.len() <= 2 * HOT_COLD_SLICE);
        assert_eq!(pool.numbers[0], 69);

        let mut seen = pool.numbers.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), pool.numbers.len(), "pool sans doublon");

        match &pool.meta {
            PoolMeta::HotCold { hot_top, cold_top } => {
                assert_eq!(hot_top.len(), HOT_COLD_META_TOP);
                assert_eq!(cold_top.len(), HOT_COLD_META_TOP);
                assert_eq!(&pool.numbers[..HOT_COLD_META_TOP], hot_top.as_slice());
                // jamais tirés : les plus petits numéros absents
                assert_eq!(cold_top[0], 4);
            }
            other => panic!("méta hot/cold attendue, reçu {:?}", other),
        }
    }

    #[test]
    fn test_ties_broken_by_number() {
        // tous les numéros à égalité : ordre croissant des deux côtés
        let pool = build_hot_cold_pool(&[], 1, 30, true);
        let expected: Vec<u32> = (1..=20).collect();
        assert_eq!(pool.numbers, expected);
    }

    #[test]
    fn test_single_number_always_drawn_is_hottest() {
        let draws: Vec<Draw> = (0..20).map(|_| draw(&[7])).collect();
        let pool = build_hot_cold_pool(&draws, 1, 69, true);
        assert_eq!(pool.numbers[0], 7);
        match &pool.meta {
            PoolMeta::HotCold { hot_top, cold_top } => {
                assert_eq!(hot_top[0], 7);
                assert!(!cold_top.contains(&7));
            }
            other => panic!("méta hot/cold attendue, reçu {:?}", other),
        }
    }

    #[test]
    fn test_small_range_pool() {
        let pool = build_hot_cold_pool(&[draw(&[2])], 0, 9, false);
        assert_eq!(pool.numbers.len(), 10);
        assert_eq!(pool.numbers[0], 2);
    }

    #[test]
    fn test_deterministic() {
        let draws = varied_draws(40);
        assert_eq!(
            build_hot_cold_pool(&draws, 1, 69, true),
            build_hot_cold_pool(&draws, 1, 69, true)
        );
    }
}

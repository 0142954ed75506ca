use std::collections::HashSet;

use serde::Serialize;

use palpite_db::config::GameConfig;

use crate::analysis::{round2, RangeDistribution, StatisticsSnapshot};

/// Indicateurs descriptifs d'une grille. Le score mesure l'équilibre
/// pair/impair, chaud/froid et par tranche ; il ne prédit rien.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionMetadata {
    pub hot_numbers_count: usize,
    pub cold_numbers_count: usize,
    pub even_count: usize,
    pub odd_count: usize,
    pub range_distribution: RangeDistribution,
    pub sum: u32,
    pub quality_score: f64,
}

/// Tiers chaud et froid du classement, calculés une fois par générateur.
#[derive(Debug, Clone)]
pub(crate) struct Tiers {
    hot: HashSet<u8>,
    cold: HashSet<u8>,
}

impl Tiers {
    pub(crate) fn new(snapshot: &StatisticsSnapshot) -> Self {
        Self {
            hot: snapshot.hot_tier().iter().map(|f| f.number).collect(),
            cold: snapshot.cold_tier().iter().map(|f| f.number).collect(),
        }
    }
}

pub(crate) fn compute_metadata(numbers: &[u8], tiers: &Tiers, config: &GameConfig) -> SuggestionMetadata {
    let pick = config.numbers_per_game as f64;

    let even_count = numbers.iter().filter(|&&n| n % 2 == 0).count();
    let odd_count = numbers.len() - even_count;

    let hot_numbers_count = numbers.iter().filter(|&&n| tiers.hot.contains(&n)).count();
    let cold_numbers_count = numbers.iter().filter(|&&n| tiers.cold.contains(&n)).count();

    let range_distribution = RangeDistribution::from_numbers(numbers, config);
    let sum = numbers.iter().map(|&n| n as u32).sum();

    let even_odd_balance = 1.0 - even_count.abs_diff(odd_count) as f64 / pick;
    let hot_cold_balance = if hot_numbers_count + cold_numbers_count > 0 {
        1.0 - hot_numbers_count.abs_diff(cold_numbers_count) as f64 / pick
    } else {
        0.5
    };
    let range_balance = 1.0 - range_distribution.max_count() as f64 / pick;

    let quality_score = round2((even_odd_balance + hot_cold_balance + range_balance) / 3.0).clamp(0.0, 1.0);

    SuggestionMetadata {
        hot_numbers_count,
        cold_numbers_count,
        even_count,
        odd_count,
        range_distribution,
        sum,
        quality_score,
    }
}

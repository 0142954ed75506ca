use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use palpite_db::config::GameConfig;
use palpite_db::models::{validate_numbers, Draw};

use crate::config::StrategyTuning;
use crate::error::{EngineError, EngineResult};

pub const NO_DATA_MESSAGE: &str = "No data available for analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberFrequency {
    pub number: u8,
    pub frequency: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    #[serde(rename = "first_draw")]
    pub first: NaiveDate,
    #[serde(rename = "last_draw")]
    pub last: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvenOddDistribution {
    pub even_count: u32,
    pub odd_count: u32,
    pub even_pct: f64,
    pub odd_pct: f64,
}

/// Tranche inclusive `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeBucket {
    pub label: String,
    pub start: u8,
    pub end: u8,
    pub count: u32,
}

/// Trois tranches contiguës couvrant `[min, max]` : les deux premières font
/// `domain_size / 3` numéros, la dernière reçoit le reste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RangeDistribution {
    pub buckets: Vec<RangeBucket>,
}

impl RangeDistribution {
    /// Suppose une config validée (au moins 3 numéros).
    pub(crate) fn empty(config: &GameConfig) -> Self {
        let size = (config.domain_size() / 3) as u32;
        let min = config.min_number as u32;
        let bounds = [
            (min, min + size - 1),
            (min + size, min + 2 * size - 1),
            (min + 2 * size, config.max_number as u32),
        ];
        let buckets = bounds
            .iter()
            .map(|&(start, end)| RangeBucket {
                label: format!("{}-{}", start, end),
                start: start as u8,
                end: end as u8,
                count: 0,
            })
            .collect();
        Self { buckets }
    }

    pub(crate) fn from_numbers<'a>(numbers: impl IntoIterator<Item = &'a u8>, config: &GameConfig) -> Self {
        let mut dist = Self::empty(config);
        for &n in numbers {
            dist.record(n);
        }
        dist
    }

    fn record(&mut self, n: u8) {
        let last = self.buckets.len() - 1;
        let idx = self
            .buckets
            .iter()
            .position(|b| n <= b.end)
            .unwrap_or(last);
        self.buckets[idx].count += 1;
    }

    pub fn counts(&self) -> Vec<u32> {
        self.buckets.iter().map(|b| b.count).collect()
    }

    pub fn max_count(&self) -> u32 {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub total_contests: usize,
    pub date_range: DateRange,
    /// Tout le domaine, fréquences nulles comprises.
    pub number_frequencies: BTreeMap<u8, u32>,
    /// Fréquence décroissante, puis numéro croissant.
    pub ranking: Vec<NumberFrequency>,
    pub most_common_numbers: Vec<NumberFrequency>,
    pub least_common_numbers: Vec<NumberFrequency>,
    pub average_sum: f64,
    pub even_odd_distribution: EvenOddDistribution,
    pub range_distribution: RangeDistribution,
    pub total_numbers_analyzed: usize,
}

impl StatisticsSnapshot {
    pub fn frequency(&self, number: u8) -> u32 {
        self.number_frequencies.get(&number).copied().unwrap_or(0)
    }

    /// Les `n` premiers du classement.
    pub fn top(&self, n: usize) -> &[NumberFrequency] {
        &self.ranking[..n.min(self.ranking.len())]
    }

    /// Les `n` derniers du classement.
    pub fn bottom(&self, n: usize) -> &[NumberFrequency] {
        let len = self.ranking.len();
        &self.ranking[len - n.min(len)..]
    }

    /// Premier tiers du classement (par position).
    pub fn hot_tier(&self) -> &[NumberFrequency] {
        &self.ranking[..self.ranking.len() / 3]
    }

    /// Dernier tiers du classement (par position).
    pub fn cold_tier(&self) -> &[NumberFrequency] {
        &self.ranking[2 * self.ranking.len() / 3..]
    }
}

/// Résultat de l'analyse : un historique vide n'est pas une erreur.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statistics {
    Empty { error: String, total_contests: usize },
    Computed(Box<StatisticsSnapshot>),
}

impl Statistics {
    fn no_data() -> Self {
        Statistics::Empty {
            error: NO_DATA_MESSAGE.to_string(),
            total_contests: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Statistics::Empty { .. })
    }

    pub fn total_contests(&self) -> usize {
        match self {
            Statistics::Empty { total_contests, .. } => *total_contests,
            Statistics::Computed(snapshot) => snapshot.total_contests,
        }
    }

    pub fn snapshot(&self) -> Option<&StatisticsSnapshot> {
        match self {
            Statistics::Empty { .. } => None,
            Statistics::Computed(snapshot) => Some(&**snapshot),
        }
    }

    pub fn into_snapshot(self) -> EngineResult<StatisticsSnapshot> {
        match self {
            Statistics::Empty { .. } => Err(EngineError::EmptyHistory),
            Statistics::Computed(snapshot) => Ok(*snapshot),
        }
    }
}

pub(crate) fn check_config(config: &GameConfig) -> EngineResult<()> {
    config
        .validate()
        .map_err(|e| EngineError::InvalidArgument(e.to_string()))
}

/// Chaque tirage doit respecter la config et les concours doivent croître strictement.
pub(crate) fn check_history(history: &[Draw], config: &GameConfig) -> EngineResult<()> {
    let mut previous: Option<u32> = None;
    for draw in history {
        validate_numbers(&draw.numbers, config).map_err(|e| EngineError::InvalidDraw {
            contest: draw.contest_number,
            reason: e.to_string(),
        })?;
        if let Some(prev) = previous {
            if draw.contest_number <= prev {
                return Err(EngineError::InvalidDraw {
                    contest: draw.contest_number,
                    reason: format!("historique non trié ou doublon (précédent : {prev})"),
                });
            }
        }
        previous = Some(draw.contest_number);
    }
    Ok(())
}

/// Comptage par numéro sur tout le domaine.
pub fn tally<'a>(draws: impl IntoIterator<Item = &'a Draw>, config: &GameConfig) -> BTreeMap<u8, u32> {
    let mut counts: BTreeMap<u8, u32> = config.domain().map(|n| (n, 0)).collect();
    for draw in draws {
        for &n in &draw.numbers {
            *counts.entry(n).or_insert(0) += 1;
        }
    }
    counts
}

/// Fréquence décroissante, égalités départagées par numéro croissant.
pub fn rank(counts: &BTreeMap<u8, u32>) -> Vec<NumberFrequency> {
    let mut ranking: Vec<NumberFrequency> = counts
        .iter()
        .map(|(&number, &frequency)| NumberFrequency { number, frequency })
        .collect();
    ranking.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.number.cmp(&b.number))
    });
    ranking
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn compute_statistics(
    history: &[Draw],
    config: &GameConfig,
    tuning: &StrategyTuning,
) -> EngineResult<Statistics> {
    check_config(config)?;
    if history.is_empty() {
        log::debug!("Historique vide, pas de statistiques");
        return Ok(Statistics::no_data());
    }
    check_history(history, config)?;

    let number_frequencies = tally(history, config);
    let ranking = rank(&number_frequencies);

    let list_size = tuning.ranking_size.min(ranking.len());
    let most_common_numbers = ranking[..list_size].to_vec();
    let least_common_numbers = ranking[ranking.len() - list_size..].to_vec();

    let total_sum: u64 = history.iter().map(|d| d.sum() as u64).sum();
    let average_sum = total_sum as f64 / history.len() as f64;

    let all_numbers = || history.iter().flat_map(|d| d.numbers.iter());
    let total_numbers_analyzed = all_numbers().count();

    let even_count = all_numbers().filter(|&&n| n % 2 == 0).count() as u32;
    let odd_count = total_numbers_analyzed as u32 - even_count;
    let total = total_numbers_analyzed as f64;
    let even_odd_distribution = EvenOddDistribution {
        even_count,
        odd_count,
        even_pct: round2(even_count as f64 / total * 100.0),
        odd_pct: round2(odd_count as f64 / total * 100.0),
    };

    let range_distribution = RangeDistribution::from_numbers(all_numbers(), config);

    // Les dates ne suivent pas forcément l'ordre des concours.
    let first = history.iter().map(|d| d.draw_date).min().unwrap_or_default();
    let last = history.iter().map(|d| d.draw_date).max().unwrap_or_default();

    Ok(Statistics::Computed(Box::new(StatisticsSnapshot {
        total_contests: history.len(),
        date_range: DateRange { first, last },
        number_frequencies,
        ranking,
        most_common_numbers,
        least_common_numbers,
        average_sum,
        even_odd_distribution,
        range_distribution,
        total_numbers_analyzed,
    })))
}

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use palpite_db::config::GameConfig;
use palpite_db::models::Draw;

use crate::analysis::{check_config, check_history, rank, tally, StatisticsSnapshot};
use crate::config::{portion, StrategyTuning};
use crate::error::{EngineError, EngineResult};
use crate::metadata::{compute_metadata, SuggestionMetadata, Tiers};
use crate::strategy::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub strategy: Strategy,
    /// Triés par ordre croissant.
    pub numbers: Vec<u8>,
    pub metadata: SuggestionMetadata,
    pub generated_at: DateTime<Utc>,
}

/// Générateur de grilles à partir d'un instantané et de l'historique brut.
/// Aucun état mutable : le hasard vient du `Rng` passé à chaque appel.
#[derive(Debug)]
pub struct SuggestionGenerator<'a> {
    snapshot: &'a StatisticsSnapshot,
    history: &'a [Draw],
    config: &'a GameConfig,
    tuning: StrategyTuning,
    tiers: Tiers,
}

impl<'a> SuggestionGenerator<'a> {
    pub fn new(
        snapshot: &'a StatisticsSnapshot,
        history: &'a [Draw],
        config: &'a GameConfig,
        tuning: StrategyTuning,
    ) -> EngineResult<Self> {
        check_config(config)?;
        tuning.validate()?;
        check_history(history, config)?;

        let domain_matches = snapshot.number_frequencies.len() == config.domain_size()
            && snapshot.number_frequencies.keys().all(|&n| config.contains(n));
        if !domain_matches {
            return Err(EngineError::InvalidArgument(format!(
                "L'instantané ne couvre pas le domaine {}-{}",
                config.min_number, config.max_number
            )));
        }

        Ok(Self {
            snapshot,
            history,
            config,
            tuning,
            tiers: Tiers::new(snapshot),
        })
    }

    /// `count` grilles indépendantes, sans dédoublonnage entre elles.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        strategy: Strategy,
        count: usize,
        rng: &mut R,
    ) -> EngineResult<Vec<Suggestion>> {
        if count < 1 {
            return Err(EngineError::InvalidArgument(
                "Le nombre de suggestions doit être >= 1".into(),
            ));
        }

        let mut suggestions = Vec::with_capacity(count);
        for _ in 0..count {
            let mut numbers = self.pick(strategy, rng)?;
            numbers.sort_unstable();
            debug_assert_eq!(numbers.len(), self.config.numbers_per_game);

            let metadata = compute_metadata(&numbers, &self.tiers, self.config);
            suggestions.push(Suggestion {
                strategy,
                numbers,
                metadata,
                generated_at: Utc::now(),
            });
        }
        log::debug!("{} suggestion(s) générée(s) avec {}", suggestions.len(), strategy);
        Ok(suggestions)
    }

    /// Comme `generate`, avec un `StdRng` neuf (graine fixe ou entropie).
    pub fn generate_seeded(
        &self,
        strategy: Strategy,
        count: usize,
        seed: Option<u64>,
    ) -> EngineResult<Vec<Suggestion>> {
        let mut rng: StdRng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        self.generate(strategy, count, &mut rng)
    }

    fn pick<R: Rng + ?Sized>(&self, strategy: Strategy, rng: &mut R) -> EngineResult<Vec<u8>> {
        match strategy {
            Strategy::Balanced => self.balanced(rng),
            Strategy::HotNumbers => self.hot_numbers(rng),
            Strategy::ColdNumbers => self.cold_numbers(rng),
            Strategy::WeightedRandom => self.weighted_random(rng),
            Strategy::RecentPatterns => self.recent_patterns(rng),
        }
    }

    fn pick_count(&self) -> usize {
        self.config.numbers_per_game
    }

    /// Complète `chosen` jusqu'à `target` avec des numéros du domaine non encore pris.
    fn fill_uniform<R: Rng + ?Sized>(
        &self,
        chosen: &mut BTreeSet<u8>,
        target: usize,
        rng: &mut R,
    ) -> EngineResult<()> {
        let missing = target.saturating_sub(chosen.len());
        if missing == 0 {
            return Ok(());
        }
        let available: Vec<u8> = self.config.domain().filter(|n| !chosen.contains(n)).collect();
        if available.len() < missing {
            return Err(EngineError::InsufficientDomain {
                required: target,
                available: chosen.len() + available.len(),
            });
        }
        chosen.extend(available.choose_multiple(rng, missing).copied());
        Ok(())
    }

    fn sample_pool<R: Rng + ?Sized>(&self, pool: &[u8], rng: &mut R) -> EngineResult<Vec<u8>> {
        let n = self.pick_count();
        if pool.len() < n {
            return Err(EngineError::InsufficientDomain {
                required: n,
                available: pool.len(),
            });
        }
        Ok(pool.choose_multiple(rng, n).copied().collect())
    }

    fn balanced<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<Vec<u8>> {
        let n = self.pick_count();
        if self.config.domain_size() < n {
            return Err(EngineError::InsufficientDomain {
                required: n,
                available: self.config.domain_size(),
            });
        }

        let hot: Vec<u8> = self.snapshot.most_common_numbers.iter().map(|f| f.number).collect();
        let cold: Vec<u8> = self.snapshot.least_common_numbers.iter().map(|f| f.number).collect();
        let hot_count = portion(n, self.tuning.balanced_hot_fraction).min(hot.len());
        let cold_count = portion(n, self.tuning.balanced_cold_fraction).min(cold.len());

        let mut chosen = BTreeSet::new();
        chosen.extend(hot.choose_multiple(rng, hot_count).copied());
        chosen.extend(cold.choose_multiple(rng, cold_count).copied());

        // Part aléatoire, plus le complément si chaud et froid se recoupent.
        self.fill_uniform(&mut chosen, n, rng)?;
        Ok(chosen.into_iter().collect())
    }

    fn hot_numbers<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<Vec<u8>> {
        let pool: Vec<u8> = self
            .snapshot
            .top(2 * self.pick_count())
            .iter()
            .map(|f| f.number)
            .collect();
        self.sample_pool(&pool, rng)
    }

    fn cold_numbers<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<Vec<u8>> {
        let pool: Vec<u8> = self
            .snapshot
            .bottom(2 * self.pick_count())
            .iter()
            .map(|f| f.number)
            .collect();
        self.sample_pool(&pool, rng)
    }

    /// Tirage séquentiel sans remise, poids = fréquence historique des restants.
    fn weighted_random<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<Vec<u8>> {
        let n = self.pick_count();
        let mut available: Vec<(u8, u32)> = self
            .snapshot
            .number_frequencies
            .iter()
            .map(|(&number, &frequency)| (number, frequency))
            .collect();
        if available.len() < n {
            return Err(EngineError::InsufficientDomain {
                required: n,
                available: available.len(),
            });
        }

        let mut selected = Vec::with_capacity(n);
        for _ in 0..n {
            let total: u64 = available.iter().map(|&(_, w)| w as u64).sum();
            let idx = if total == 0 {
                rng.random_range(0..available.len())
            } else {
                let weights: Vec<u32> = available.iter().map(|&(_, w)| w).collect();
                let dist = WeightedIndex::new(&weights)
                    .map_err(|e| EngineError::InvalidArgument(format!("Poids invalides : {e}")))?;
                dist.sample(rng)
            };
            let (number, _) = available.remove(idx);
            selected.push(number);
        }
        Ok(selected)
    }

    fn recent_patterns<R: Rng + ?Sized>(&self, rng: &mut R) -> EngineResult<Vec<u8>> {
        let n = self.pick_count();
        let window_start = self.history.len().saturating_sub(self.config.recent_draws_window);
        let window = &self.history[window_start..];
        if window.is_empty() {
            log::debug!("Fenêtre récente vide, repli sur la stratégie équilibrée");
            return self.balanced(rng);
        }

        let mut counts = tally(window, self.config);
        counts.retain(|_, &mut c| c > 0);
        let trending: Vec<u8> = rank(&counts)
            .into_iter()
            .take(2 * n)
            .map(|f| f.number)
            .collect();

        let take = portion(n, self.tuning.recent_trending_fraction).min(trending.len());
        let mut chosen: BTreeSet<u8> = trending.choose_multiple(rng, take).copied().collect();
        self.fill_uniform(&mut chosen, n, rng)?;
        Ok(chosen.into_iter().collect())
    }
}

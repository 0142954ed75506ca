use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Constantes heuristiques des stratégies. Aucune n'est calibrée : elles
/// produisent seulement un échantillon mixte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyTuning {
    /// Taille des listes « plus / moins fréquents ».
    pub ranking_size: usize,
    pub balanced_hot_fraction: f64,
    pub balanced_cold_fraction: f64,
    pub recent_trending_fraction: f64,
}

impl Default for StrategyTuning {
    fn default() -> Self {
        Self {
            ranking_size: 10,
            balanced_hot_fraction: 0.4,
            balanced_cold_fraction: 0.3,
            recent_trending_fraction: 0.7,
        }
    }
}

impl StrategyTuning {
    pub fn validate(&self) -> EngineResult<()> {
        let fractions = [
            ("balanced_hot_fraction", self.balanced_hot_fraction),
            ("balanced_cold_fraction", self.balanced_cold_fraction),
            ("recent_trending_fraction", self.recent_trending_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidArgument(format!(
                    "{name} doit être dans [0, 1] (reçu {value})"
                )));
            }
        }
        if self.balanced_hot_fraction + self.balanced_cold_fraction > 1.0 {
            return Err(EngineError::InvalidArgument(
                "balanced_hot_fraction + balanced_cold_fraction > 1".into(),
            ));
        }
        Ok(())
    }
}

/// Part entière de `n * fraction`, comme une troncature.
pub(crate) fn portion(n: usize, fraction: f64) -> usize {
    (n as f64 * fraction).floor() as usize
}

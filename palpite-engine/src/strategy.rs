use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Strategy {
    Balanced,
    HotNumbers,
    ColdNumbers,
    WeightedRandom,
    RecentPatterns,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Balanced,
        Strategy::HotNumbers,
        Strategy::ColdNumbers,
        Strategy::WeightedRandom,
        Strategy::RecentPatterns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Balanced => "balanced",
            Strategy::HotNumbers => "hot_numbers",
            Strategy::ColdNumbers => "cold_numbers",
            Strategy::WeightedRandom => "weighted_random",
            Strategy::RecentPatterns => "recent_patterns",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Balanced => "Mélange de numéros chauds, froids et aléatoires",
            Strategy::HotNumbers => "Tirage parmi les numéros les plus fréquents",
            Strategy::ColdNumbers => "Tirage parmi les numéros les moins fréquents",
            Strategy::WeightedRandom => "Aléatoire pondéré par la fréquence historique",
            Strategy::RecentPatterns => "Tendances des derniers tirages",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == key)
            .ok_or_else(|| EngineError::InvalidArgument(format!("Stratégie inconnue : '{}'", s)))
    }
}

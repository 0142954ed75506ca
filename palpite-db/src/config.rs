use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Paramètres du jeu. Par défaut : Lotofácil (15 numéros parmi 1-25).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub min_number: u8,
    pub max_number: u8,
    pub numbers_per_game: usize,
    pub recent_draws_window: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_number: 1,
            max_number: 25,
            numbers_per_game: 15,
            recent_draws_window: 10,
        }
    }
}

impl GameConfig {
    pub fn domain(&self) -> RangeInclusive<u8> {
        self.min_number..=self.max_number
    }

    /// Nombre de numéros jouables (0 si la config est incohérente).
    pub fn domain_size(&self) -> usize {
        if self.max_number < self.min_number {
            return 0;
        }
        (self.max_number - self.min_number) as usize + 1
    }

    pub fn contains(&self, n: u8) -> bool {
        self.domain().contains(&n)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_number > self.max_number {
            bail!(
                "Domaine invalide : min {} > max {}",
                self.min_number,
                self.max_number
            );
        }
        if self.numbers_per_game == 0 {
            bail!("numbers_per_game doit être >= 1");
        }
        if self.domain_size() < 3 {
            bail!("Le domaine doit compter au moins 3 numéros (répartition en tranches)");
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("JSON invalide dans {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
        Ok(())
    }

    /// Surcharge par les variables d'environnement LOTTERY_MIN_NUMBER,
    /// LOTTERY_MAX_NUMBER, NUMBERS_PER_GAME et RECENT_DRAWS_WINDOW.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Some(v) = env_var::<u8>("LOTTERY_MIN_NUMBER")? {
            self.min_number = v;
        }
        if let Some(v) = env_var::<u8>("LOTTERY_MAX_NUMBER")? {
            self.max_number = v;
        }
        if let Some(v) = env_var::<usize>("NUMBERS_PER_GAME")? {
            self.numbers_per_game = v;
        }
        if let Some(v) = env_var::<usize>("RECENT_DRAWS_WINDOW")? {
            self.recent_draws_window = v;
        }
        Ok(self)
    }

    /// Fichier (optionnel) puis environnement, puis validation.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        let config = base.apply_env()?;
        config.validate()?;
        log::debug!("Configuration du jeu : {:?}", config);
        Ok(config)
    }
}

/// Quota journalier des utilisateurs gratuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub suggestions_per_day: u32,
    pub premium_unlimited: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            suggestions_per_day: 3,
            premium_unlimited: true,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_var::<u32>("RATE_LIMIT_SUGGESTIONS_PER_DAY")? {
            config.suggestions_per_day = v;
        }
        if let Some(v) = env_var::<bool>("RATE_LIMIT_PREMIUM_UNLIMITED")? {
            config.premium_unlimited = v;
        }
        Ok(config)
    }
}

fn env_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("Valeur invalide pour {name} : '{raw}'"))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

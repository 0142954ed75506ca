use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use palpite_db::config::{GameConfig, RateLimitConfig};
use palpite_engine::config::StrategyTuning;

/// Configuration effective : fichier JSON (optionnel) puis environnement.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub game: GameConfig,
    pub tuning: StrategyTuning,
    pub rate_limit: RateLimitConfig,
}

/// Le fichier porte les champs du jeu à la racine et un objet `tuning` optionnel.
#[derive(Debug, Default, Deserialize)]
struct TuningSection {
    #[serde(default)]
    tuning: StrategyTuning,
}

fn load_tuning(path: Option<&Path>) -> Result<StrategyTuning> {
    let Some(path) = path else {
        return Ok(StrategyTuning::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let section: TuningSection = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;
    Ok(section.tuning)
}

impl Settings {
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let game = GameConfig::resolve(path)?;
        let tuning = load_tuning(path)?;
        tuning.validate()?;
        let rate_limit = RateLimitConfig::from_env()?;
        Ok(Self {
            game,
            tuning,
            rate_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        assert_eq!(load_tuning(None).unwrap(), StrategyTuning::default());
    }

    #[test]
    fn test_tuning_section_from_file() {
        let file = write_json(
            r#"{"max_number": 60, "numbers_per_game": 6,
                "tuning": {"ranking_size": 5, "balanced_hot_fraction": 0.5}}"#,
        );
        let tuning = load_tuning(Some(file.path())).unwrap();
        assert_eq!(tuning.ranking_size, 5);
        assert!((tuning.balanced_hot_fraction - 0.5).abs() < 1e-12);
        assert!((tuning.balanced_cold_fraction - 0.3).abs() < 1e-12);

        let game = GameConfig::load(file.path()).unwrap();
        assert_eq!(game.max_number, 60);
        assert_eq!(game.numbers_per_game, 6);
    }

    #[test]
    fn test_missing_tuning_section() {
        let file = write_json(r#"{"max_number": 30}"#);
        assert_eq!(load_tuning(Some(file.path())).unwrap(), StrategyTuning::default());
    }

    #[test]
    fn test_invalid_json() {
        let file = write_json("{ pas du json");
        assert!(load_tuning(Some(file.path())).is_err());
    }
}

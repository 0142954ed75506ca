use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub contest_number: u32,
    pub draw_date: NaiveDate,
    /// Triés par ordre croissant.
    pub numbers: Vec<u8>,
}

impl Draw {
    /// Construit un tirage validé ; les numéros sont triés.
    pub fn new(
        contest_number: u32,
        draw_date: NaiveDate,
        mut numbers: Vec<u8>,
        config: &GameConfig,
    ) -> Result<Self> {
        if contest_number == 0 {
            bail!("Numéro de concours invalide : 0");
        }
        validate_numbers(&numbers, config)
            .with_context(|| format!("Concours {contest_number}"))?;
        numbers.sort_unstable();
        Ok(Self {
            contest_number,
            draw_date,
            numbers,
        })
    }

    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|&n| n as u32).sum()
    }
}

/// Nombre exact, bornes et unicité.
pub fn validate_numbers(numbers: &[u8], config: &GameConfig) -> Result<()> {
    if numbers.len() != config.numbers_per_game {
        bail!(
            "{} numéros au lieu de {}",
            numbers.len(),
            config.numbers_per_game
        );
    }
    for &n in numbers {
        if !config.contains(n) {
            bail!(
                "Numéro {} hors limites ({}-{})",
                n,
                config.min_number,
                config.max_number
            );
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

/// Accepte JJ/MM/AAAA ou AAAA-MM-JJ.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

/// Numéros séparés par des espaces ou des virgules.
pub fn parse_numbers(raw: &str) -> Result<Vec<u8>> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Impossible de parser '{}'", s))
        })
        .collect()
}

pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_validate_numbers_ok() {
        let config = GameConfig::default();
        let numbers: Vec<u8> = (1..=15).collect();
        assert!(validate_numbers(&numbers, &config).is_ok());
        let numbers: Vec<u8> = (11..=25).collect();
        assert!(validate_numbers(&numbers, &config).is_ok());
    }

    #[test]
    fn test_validate_numbers_wrong_count() {
        let config = GameConfig::default();
        let numbers: Vec<u8> = (1..=14).collect();
        assert!(validate_numbers(&numbers, &config).is_err());
    }

    #[test]
    fn test_validate_numbers_out_of_range() {
        let config = GameConfig::default();
        let mut numbers: Vec<u8> = (1..=15).collect();
        numbers[14] = 26;
        assert!(validate_numbers(&numbers, &config).is_err());
        numbers[14] = 0;
        assert!(validate_numbers(&numbers, &config).is_err());
    }

    #[test]
    fn test_validate_numbers_duplicate() {
        let config = GameConfig::default();
        let mut numbers: Vec<u8> = (1..=15).collect();
        numbers[3] = 1;
        assert!(validate_numbers(&numbers, &config).is_err());
    }

    #[test]
    fn test_draw_new_sorts() {
        let config = GameConfig {
            max_number: 10,
            numbers_per_game: 3,
            ..GameConfig::default()
        };
        let draw = Draw::new(7, date("2024-01-01"), vec![9, 2, 5], &config).unwrap();
        assert_eq!(draw.numbers, vec![2, 5, 9]);
        assert_eq!(draw.sum(), 16);
    }

    #[test]
    fn test_draw_new_rejects_contest_zero() {
        let config = GameConfig::default();
        assert!(Draw::new(0, date("2024-01-01"), (1..=15).collect(), &config).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("17/02/2026").unwrap(), date("2026-02-17"));
        assert_eq!(parse_date("2020-01-01").unwrap(), date("2020-01-01"));
        assert!(parse_date("2020/01/01").is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("1 2 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_numbers("01,02, 25").unwrap(), vec![1, 2, 25]);
        assert!(parse_numbers("1 x 3").is_err());
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_numbers(&[1, 12, 25]), "01 12 25");
        assert_eq!(parse_numbers(&format_numbers(&[3, 14, 25])).unwrap(), vec![3, 14, 25]);
    }
}

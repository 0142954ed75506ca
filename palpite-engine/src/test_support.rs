use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;

use palpite_db::config::GameConfig;
use palpite_db::models::Draw;

pub fn draw(contest: u32, date: &str, numbers: &[u8], config: &GameConfig) -> Draw {
    let draw_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    Draw::new(contest, draw_date, numbers.to_vec(), config).unwrap()
}

/// [1..15], [2..16], [3..17] sur le domaine Lotofácil.
pub fn shifted_history() -> Vec<Draw> {
    let config = GameConfig::default();
    vec![
        draw(1, "2024-01-01", &(1..=15).collect::<Vec<u8>>(), &config),
        draw(2, "2024-01-03", &(2..=16).collect::<Vec<u8>>(), &config),
        draw(3, "2024-01-05", &(3..=17).collect::<Vec<u8>>(), &config),
    ]
}

/// Historique pseudo-aléatoire reproductible.
pub fn random_history(n: usize, config: &GameConfig, seed: u64) -> Vec<Draw> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (1..=n)
        .map(|i| {
            let numbers: Vec<u8> = rand::seq::index::sample(&mut rng, config.domain_size(), config.numbers_per_game)
                .into_iter()
                .map(|idx| config.min_number + idx as u8)
                .collect();
            let draw_date = start + Duration::days(i as i64 * 3);
            Draw::new(i as u32, draw_date, numbers, config).unwrap()
        })
        .collect()
}

pub fn lotofacil_history(n: usize) -> Vec<Draw> {
    random_history(n, &GameConfig::default(), 42)
}

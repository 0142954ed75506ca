use serde::{Deserialize, Serialize};

use palpite_db::config::GameConfig;
use palpite_db::models::Draw;

use crate::analysis::{compute_statistics, StatisticsSnapshot};
use crate::config::StrategyTuning;
use crate::error::EngineResult;
use crate::sampler::{Suggestion, SuggestionGenerator};
use crate::strategy::Strategy;

pub const DEFAULT_SUGGESTIONS_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub strategy: Strategy,
    pub count: usize,
    pub seed: Option<u64>,
}

impl Default for SuggestionRequest {
    fn default() -> Self {
        Self {
            strategy: Strategy::Balanced,
            count: DEFAULT_SUGGESTIONS_COUNT,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub statistics: StatisticsSnapshot,
    pub suggestions: Vec<Suggestion>,
}

/// Historique → statistiques → suggestions. Échoue sur un historique vide.
pub fn analyze(
    history: &[Draw],
    config: &GameConfig,
    tuning: &StrategyTuning,
    request: &SuggestionRequest,
) -> EngineResult<Report> {
    let statistics = compute_statistics(history, config, tuning)?.into_snapshot()?;
    let generator = SuggestionGenerator::new(&statistics, history, config, tuning.clone())?;
    let suggestions = generator.generate_seeded(request.strategy, request.count, request.seed)?;
    log::info!(
        "{} tirages analysés, {} suggestion(s) {}",
        statistics.total_contests,
        suggestions.len(),
        request.strategy
    );
    Ok(Report {
        statistics,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::test_support::lotofacil_history;

    #[test]
    fn test_analyze_end_to_end() {
        let config = GameConfig::default();
        let history = lotofacil_history(40);
        let request = SuggestionRequest {
            strategy: Strategy::HotNumbers,
            count: 2,
            seed: Some(7),
        };
        let report = analyze(&history, &config, &StrategyTuning::default(), &request).unwrap();
        assert_eq!(report.statistics.total_contests, 40);
        assert_eq!(report.suggestions.len(), 2);
        assert!(report.suggestions.iter().all(|s| s.strategy == Strategy::HotNumbers));
    }

    #[test]
    fn test_analyze_empty_history() {
        let err = analyze(
            &[],
            &GameConfig::default(),
            &StrategyTuning::default(),
            &SuggestionRequest::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::EmptyHistory);
    }

    #[test]
    fn test_report_json_shape() {
        let config = GameConfig::default();
        let history = lotofacil_history(10);
        let request = SuggestionRequest {
            seed: Some(1),
            ..SuggestionRequest::default()
        };
        let report = analyze(&history, &config, &StrategyTuning::default(), &request).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["statistics"]["total_contests"], 10);
        assert_eq!(json["suggestions"][0]["strategy"], "balanced");
        assert_eq!(json["suggestions"][0]["numbers"].as_array().unwrap().len(), 15);
        assert!(json["suggestions"][0]["metadata"]["quality_score"].is_number());
        assert_eq!(json["statistics"]["range_distribution"].as_array().unwrap().len(), 3);
    }
}

pub mod analysis;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod sampler;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::{compute_statistics, Statistics, StatisticsSnapshot};
pub use error::{EngineError, EngineResult};
pub use sampler::{Suggestion, SuggestionGenerator};
pub use strategy::Strategy;

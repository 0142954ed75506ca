use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Historique vide : aucune donnée à analyser")]
    EmptyHistory,

    #[error("Argument invalide : {0}")]
    InvalidArgument(String),

    #[error("Domaine insuffisant : {required} numéros requis, {available} disponibles")]
    InsufficientDomain { required: usize, available: usize },

    #[error("Tirage invalide (concours {contest}) : {reason}")]
    InvalidDraw { contest: u32, reason: String },
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

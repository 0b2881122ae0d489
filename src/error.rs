// File: src/error.rs
use thiserror::Error;

/// Every failure the game engine can surface to a caller.
///
/// An unknown guess word is NOT an error: it is reported as an invalid
/// `GuessVerdict`. Cache misses and round evictions are handled internally.
#[derive(Debug, Error)]
pub enum GameError {
    /// Malformed or missing caller input. Recoverable by resubmitting.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The round id is unknown, already solved, or was evicted.
    #[error("Round not found or expired: {0}")]
    RoundNotFound(String),

    /// The embedding model or the session store could not serve the call.
    #[error("Dependency unavailable: {dependency}: {message}")]
    DependencyUnavailable { dependency: String, message: String },

    /// Startup artifacts are missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model cache error: {0}")]
    ModelCache(#[from] bincode::Error),
}

impl GameError {
    pub fn dependency(dependency: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DependencyUnavailable { dependency: dependency.into(), message: message.into() }
    }

    /// Stable machine-readable tag for drivers.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidInput(_) => "invalid_input",
            GameError::RoundNotFound(_) => "round_not_found",
            GameError::DependencyUnavailable { .. } => "dependency_unavailable",
            GameError::Configuration(_) => "configuration",
            GameError::Io(_) => "io",
            GameError::Serialization(_) | GameError::ModelCache(_) => "serialization",
        }
    }
}

impl From<rusqlite::Error> for GameError {
    fn from(e: rusqlite::Error) -> Self {
        GameError::dependency("session store", e.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(GameError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(GameError::RoundNotFound("abc".into()).kind(), "round_not_found");
        assert_eq!(GameError::Configuration("empty".into()).kind(), "configuration");
    }

    #[test]
    fn sqlite_errors_become_dependency_failures() {
        let err: GameError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.kind(), "dependency_unavailable");
        assert!(err.to_string().contains("session store"));
    }
}

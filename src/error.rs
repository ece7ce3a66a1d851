use thiserror::Error;

use crate::validate::Violation;

#[derive(Error, Debug)]
pub enum LangforgeError {
    #[error("Specification rejected with {} violation(s): {}", .0.len(), summarize(.0))]
    Invalid(Vec<Violation>),
    #[error("Generation already in progress for '{0}'")]
    GenerationInProgress(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Name already taken: {0}")]
    NameTaken(String),
    #[error("Collaborator error {code}: {message}")]
    Collaborator { code: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("Empty archive returned for '{0}'")]
    EmptyArchive(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl LangforgeError {
    /// Short stable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "StructuralViolation",
            Self::GenerationInProgress(_) => "GenerationInProgress",
            Self::NotFound(_) => "NotFound",
            Self::NameTaken(_) => "NameTaken",
            Self::Collaborator { .. } => "CollaboratorError",
            Self::Transport(_) => "TransportError",
            Self::Generation(_) => "GenerationError",
            Self::EmptyArchive(_) => "EmptyArchive",
            Self::Config(_) => "ConfigError",
            Self::Persistence(_) => "PersistenceError",
            Self::DataCorruption { .. } => "DataCorruption",
            Self::Serialization(_) => "SerializationError",
            Self::Invariant(_) => "InternalError",
            Self::Lock(_) => "InternalError",
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Invalid(violations) => violations,
            _ => &[],
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, LangforgeError>;

// Helper conversions
impl From<rusqlite::Error> for LangforgeError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<serde_json::Error> for LangforgeError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<config::ConfigError> for LangforgeError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<reqwest::Error> for LangforgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {e}"))
        } else {
            Self::Transport(e.to_string())
        }
    }
}
impl From<zip::result::ZipError> for LangforgeError {
    fn from(e: zip::result::ZipError) -> Self { Self::Generation(e.to_string()) }
}
impl From<std::io::Error> for LangforgeError {
    fn from(e: std::io::Error) -> Self { Self::Generation(e.to_string()) }
}

//! Request and response shapes exchanged with the generation/storage service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::construct::LanguageSpecification;
use crate::primitive::LanguageType;
use crate::validate::Violation;

/// Plain acknowledgement of a save, update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One line of the stored-specification listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationSummary {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub language_type: LanguageType,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&LanguageSpecification> for SpecificationSummary {
    fn from(spec: &LanguageSpecification) -> Self {
        Self {
            name: spec.name().to_string(),
            version: spec.version().to_string(),
            description: spec.description().to_string(),
            language_type: spec.language_type(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default = "enabled")]
    pub include_examples: bool,
    #[serde(default = "enabled")]
    pub include_documentation: bool,
}

fn enabled() -> bool {
    true
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            include_examples: true,
            include_documentation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub specification: LanguageSpecification,
    #[serde(flatten)]
    pub options: GenerateOptions,
}

/// Manifest of what the engine produced for one snapshot of a specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub language_name: String,
    pub language_type: LanguageType,
    /// Relative paths, in the order they were produced.
    pub files_generated: Vec<String>,
}

/// A downloaded `<language_name>.zip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Archive {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn archive_name(language_name: &str) -> String {
    format!("{language_name}.zip")
}

/// Body sent back by the service whenever an operation fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub violations: Vec<Violation>,
}

//! # contract: data model and the provider seam
//!
//! This module defines the request/response types that flow through the conversion pipeline
//! and the single trait ([`Generator`]) behind which any generative text-completion provider
//! is plugged in.
//!
//! ## Interface & Extensibility
//! - Implement [`Generator`] to add a provider (HTTP client, local model, test double).
//! - The trait is async and returns a typed [`GenerationError`]; it never panics on provider
//!   failure.
//! - Retry policy belongs to the implementor: [`GenerationRequest::max_retries`] bounds it.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; with the default `test-export-mocks` feature the
//!   generated `MockGenerator` is exported for downstream crates' tests as well.
//!
//! ## Wire shape
//! - All request and result types serialize to the JSON shape of `POST /api/convert`
//!   (`files`, `targetLanguage`, `targetVersion`, `path`, `content`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use mockall::automock;

/// Sentinel version meaning "let the provider choose".
pub const LATEST_VERSION: &str = "latest";

/// One source file submitted for conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Relative path, may include directories (e.g. `src/App.tsx`).
    #[serde(default)]
    pub path: String,
    /// Raw source text.
    #[serde(default)]
    pub content: String,
    /// Base filename, informational only.
    #[serde(default)]
    pub name: String,
}

impl InputFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit(['/', '\\']).next().unwrap_or_default().to_owned();
        Self {
            path,
            content: content.into(),
            name,
        }
    }
}

/// A batch of files plus the conversion target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    #[serde(default)]
    pub files: Vec<InputFile>,
    pub target_language: String,
    #[serde(default = "default_target_version")]
    pub target_version: String,
}

fn default_target_version() -> String {
    LATEST_VERSION.to_owned()
}

/// Whether a result came back from the provider or is the annotated original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    #[default]
    Converted,
    Fallback,
}

/// One converted (or fallback) file, positionally matching an [`InputFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedFile {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub status: ConversionStatus,
}

impl ConvertedFile {
    pub fn is_fallback(&self) -> bool {
        self.status == ConversionStatus::Fallback
    }
}

/// Ordered results of a batch, 1:1 with the request's files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub files: Vec<ConvertedFile>,
}

impl ConversionResult {
    pub fn fallback_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_fallback()).count()
    }
}

/// Everything a provider needs for one schema-constrained generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// JSON Schema the returned object must satisfy.
    pub schema: Value,
    pub model: String,
    /// Upper bound on provider-internal retries of transient failures.
    pub max_retries: u32,
}

/// Failure of a single generation call. Every variant is absorbed by the single-file
/// converter; none reaches the batch or request level.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("provider output is not valid JSON: {0}")]
    InvalidOutput(String),

    #[error("provider output does not match schema: {0}")]
    SchemaMismatch(String),

    #[error("invalid or empty conversion result: missing {0}")]
    EmptyField(&'static str),

    #[error("failed after {attempts} attempts. Last error: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Transient failures a provider may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Transport(_) | GenerationError::RateLimited(_) => true,
            GenerationError::Http { status, .. } => {
                matches!(*status, 408 | 409) || *status >= 500
            }
            _ => false,
        }
    }
}

/// Seam to the external generative text-completion provider.
///
/// Implementors return the raw structured object; schema gating happens in
/// [`crate::schema::generate_object`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Submit one prompt and return the provider's structured JSON object.
    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError>;
}

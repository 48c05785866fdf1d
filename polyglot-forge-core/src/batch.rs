//! High-level pipeline: drives the single-file converter over a whole batch.
//!
//! This module provides the top-level orchestration for one conversion request. It:
//!   - Rejects request-shape problems up front, before any provider call
//!   - Converts each file strictly one after another, in input order
//!   - Waits a fixed pacing delay between provider calls so the provider is never burst
//!   - Returns exactly one [`ConvertedFile`] per input file, in the same order
//!
//! # Major Types
//! - [`BatchSettings`]: model, retry bound and pacing delay for a run
//! - [`BatchError`]: request-level rejection (the only way a batch can fail)
//!
//! # Error Handling
//! Per-file failures never surface here; [`convert_file`] resolves them into fallback files.
//! Only an empty batch or a blank target language is rejected, and in that case the generator
//! is never called.
//!
//! # Navigation
//! - Main entrypoint: [`convert_batch`]

use std::time::Duration;

use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::contract::{ConversionRequest, ConversionResult, ConvertedFile, Generator};
use crate::convert::{convert_file, ConvertSettings};
use crate::schema::ConvertedFileSchema;

pub const DEFAULT_PACE: Duration = Duration::from_millis(200);

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub convert: ConvertSettings,
    /// Delay between consecutive provider calls.
    pub pace: Duration,
}

impl BatchSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            convert: ConvertSettings::new(model),
            pace: DEFAULT_PACE,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("No files provided")]
    EmptyBatch,
    #[error("No target language provided")]
    MissingTargetLanguage,
}

/// Request-shape checks that must pass before any provider call.
pub fn validate_request(request: &ConversionRequest) -> Result<(), BatchError> {
    if request.files.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    if request.target_language.trim().is_empty() {
        return Err(BatchError::MissingTargetLanguage);
    }
    Ok(())
}

pub async fn convert_batch<G>(
    request: &ConversionRequest,
    generator: &G,
    settings: &BatchSettings,
) -> Result<ConversionResult, BatchError>
where
    G: Generator + ?Sized,
{
    if let Err(e) = validate_request(request) {
        warn!(error = %e, "[BATCH] Rejected conversion request");
        return Err(e);
    }

    let batch_id = Uuid::new_v4();
    let span = info_span!(
        "batch",
        %batch_id,
        files = request.files.len(),
        target_language = %request.target_language,
        target_version = %request.target_version,
    );

    async move {
        info!("[BATCH] Starting conversion batch");
        let schema = ConvertedFileSchema::new();
        let mut files: Vec<ConvertedFile> = Vec::with_capacity(request.files.len());

        for (index, file) in request.files.iter().enumerate() {
            if index > 0 && !settings.pace.is_zero() {
                tokio::time::sleep(settings.pace).await;
            }
            info!(index, path = %file.path, "[BATCH] Converting file");
            let converted = convert_file(
                generator,
                &schema,
                &settings.convert,
                file,
                &request.target_language,
                &request.target_version,
            )
            .await;
            files.push(converted);
        }

        let result = ConversionResult { files };
        info!(
            converted = result.files.len() - result.fallback_count(),
            fallback = result.fallback_count(),
            "[BATCH] Conversion batch complete"
        );
        Ok(result)
    }
    .instrument(span)
    .await
}

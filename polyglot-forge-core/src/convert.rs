//! Single-file conversion with a guaranteed result.
//!
//! [`convert_file`] never fails: any provider error, schema rejection or empty field is turned
//! into a fallback [`ConvertedFile`] carrying the original source behind a comment marker. This
//! is the only place generation errors are absorbed, which is what lets a batch always return
//! every file.

use tracing::{error, info};

use crate::contract::{ConversionStatus, ConvertedFile, GenerationError, Generator, InputFile};
use crate::prompt::build_prompt;
use crate::schema::{generate_object, ConvertedFileSchema};

/// Path used for fallbacks when the input itself had no path.
pub const UNKNOWN_PATH: &str = "unknown";

pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Per-call generation settings.
#[derive(Debug, Clone)]
pub struct ConvertSettings {
    pub model: String,
    pub max_retries: u32,
}

impl ConvertSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

pub async fn convert_file<G>(
    generator: &G,
    schema: &ConvertedFileSchema,
    settings: &ConvertSettings,
    file: &InputFile,
    target_language: &str,
    target_version: &str,
) -> ConvertedFile
where
    G: Generator + ?Sized,
{
    let prompt = build_prompt(file, target_language, target_version);

    let outcome = generate_object(
        generator,
        prompt,
        schema,
        &settings.model,
        settings.max_retries,
    )
    .await
    .and_then(require_non_empty);

    match outcome {
        Ok(converted) => {
            info!(
                input_path = %file.path,
                output_path = %converted.path,
                "[CONVERT] File converted"
            );
            converted
        }
        Err(e) => {
            error!(path = %file.path, error = %e, "[CONVERT][ERROR] Conversion failed, returning original");
            fallback(file, &e)
        }
    }
}

fn require_non_empty(file: ConvertedFile) -> Result<ConvertedFile, GenerationError> {
    if file.content.is_empty() {
        return Err(GenerationError::EmptyField("content"));
    }
    if file.path.is_empty() {
        return Err(GenerationError::EmptyField("path"));
    }
    Ok(file)
}

/// The original file, annotated with why it was not converted.
pub fn fallback(file: &InputFile, cause: &GenerationError) -> ConvertedFile {
    let path = if file.path.is_empty() {
        UNKNOWN_PATH.to_owned()
    } else {
        file.path.clone()
    };
    ConvertedFile {
        path,
        content: format!("{}\n{}", failure_marker(cause), file.content),
        status: ConversionStatus::Fallback,
    }
}

fn failure_marker(cause: &GenerationError) -> String {
    // Keep the comment well-formed even if the message itself contains a terminator.
    let message = cause.to_string().replace("*/", "* /");
    format!("/* Failed to convert file: {message} */")
}

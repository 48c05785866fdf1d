//! Output schema for a single converted file, and the schema-gated generation call.
//!
//! The same JSON Schema is handed to the provider (so it knows the shape to produce) and used
//! locally to accept or reject what comes back.

use jsonschema::Validator;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::contract::{ConversionStatus, ConvertedFile, GenerationError, GenerationRequest, Generator};

/// Compiled schema for `{ "path": string, "content": string }`.
pub struct ConvertedFileSchema {
    schema: Value,
    validator: Validator,
}

#[derive(Deserialize)]
struct GeneratedFile {
    path: String,
    content: String,
}

impl ConvertedFileSchema {
    pub fn new() -> Self {
        let schema = json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        });
        let validator =
            jsonschema::validator_for(&schema).expect("static converted-file schema compiles");
        Self { schema, validator }
    }

    /// Raw JSON Schema, for embedding into provider requests.
    pub fn as_json(&self) -> &Value {
        &self.schema
    }

    /// Checks shape only: both fields present and strings. Emptiness is the caller's concern.
    pub fn validate(&self, instance: &Value) -> Result<(), GenerationError> {
        if self.validator.is_valid(instance) {
            return Ok(());
        }
        let msgs: Vec<String> = self
            .validator
            .iter_errors(instance)
            .take(3)
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect();
        Err(GenerationError::SchemaMismatch(msgs.join("; ")))
    }

    /// Validate and convert into a [`ConvertedFile`].
    pub fn parse(&self, instance: Value) -> Result<ConvertedFile, GenerationError> {
        self.validate(&instance)?;
        let generated: GeneratedFile = serde_json::from_value(instance)
            .map_err(|e| GenerationError::SchemaMismatch(e.to_string()))?;
        Ok(ConvertedFile {
            path: generated.path,
            content: generated.content,
            status: ConversionStatus::Converted,
        })
    }
}

impl Default for ConvertedFileSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// One schema-constrained generation: submit the prompt and gate the result on `schema`.
pub async fn generate_object<G>(
    generator: &G,
    prompt: String,
    schema: &ConvertedFileSchema,
    model: &str,
    max_retries: u32,
) -> Result<ConvertedFile, GenerationError>
where
    G: Generator + ?Sized,
{
    let request = GenerationRequest {
        prompt,
        schema: schema.as_json().clone(),
        model: model.to_owned(),
        max_retries,
    };
    let value = generator.generate(request).await?;
    debug!(model, "[GENERATE] Provider returned object");
    schema.parse(value).inspect_err(|e| {
        warn!(error = %e, "[GENERATE] Provider object rejected by schema");
    })
}

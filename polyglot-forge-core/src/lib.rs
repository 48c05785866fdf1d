#![doc = "polyglot-forge-core: core conversion pipeline for polyglot-forge."]

//! This crate contains the per-file conversion pipeline: data models, prompt rendering,
//! schema-checked generation, the never-fail single-file converter and the paced batch
//! orchestrator. It knows nothing about HTTP servers or any concrete provider; those live in
//! the outer `polyglot-forge` crate and plug in through [`contract::Generator`].
//!
//! # Usage
//! Implement [`contract::Generator`] for a provider, then call [`batch::convert_batch`].

pub mod batch;
pub mod contract;
pub mod convert;
pub mod prompt;
pub mod schema;

pub use batch::{convert_batch, BatchError, BatchSettings};
pub use contract::{
    ConversionRequest, ConversionResult, ConversionStatus, ConvertedFile, GenerationError,
    GenerationRequest, Generator, InputFile,
};
pub use convert::{convert_file, ConvertSettings};

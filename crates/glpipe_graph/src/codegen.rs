// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boundary interface for the source-code emission backend.
//!
//! The emitter consumes the validated graph read-only: block kinds,
//! property values, connection topology and edge properties. It never
//! mutates the pipeline. The concrete emitters live outside the core.

use crate::pipeline::Pipeline;
use serde::{Deserialize, Serialize};

/// Language the emitter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLanguage {
    /// C++ source
    Cpp,
    /// C source
    C,
    /// Python source
    Python,
}

/// Graphics API the emitted source drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetApi {
    /// Desktop OpenGL
    OpenGl,
    /// OpenGL ES
    OpenGlEs,
}

/// Errors an emitter can report.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The pipeline failed validation badly enough to stop emission
    #[error("pipeline is not translatable: {0}")]
    NotTranslatable(String),

    /// The language/API combination is not supported
    #[error("unsupported target: {language:?} for {api:?}")]
    UnsupportedTarget {
        /// Requested language
        language: TargetLanguage,
        /// Requested API
        api: TargetApi,
    },
}

/// A backend that turns a validated pipeline into source text.
pub trait SourceEmitter {
    /// The language this emitter writes.
    fn language(&self) -> TargetLanguage;

    /// The API the emitted source drives.
    fn api(&self) -> TargetApi;

    /// Emit source text for the pipeline.
    fn emit(&mut self, pipeline: &Pipeline) -> Result<String, EmitError>;
}

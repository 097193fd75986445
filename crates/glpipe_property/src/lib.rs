// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observable typed property system for GLPipe Studio.
//!
//! Blocks and connections in the pipeline graph configure themselves
//! through ordered lists of typed properties. This crate provides:
//! - Closed value/kind sum types with a canonical, lossless text codec
//! - Change tracking with lazy unchanged-value snapshots
//! - Value delegation to external owners for computed values
//! - Reentrant batched updates with a single aggregate notification
//! - Serialization-boundary records for the document collaborator

pub mod value;
pub mod property;
pub mod list;

pub use list::{PropertyList, PropertyRecord};
pub use property::{Property, PropertyError, PropertyId, ValueDelegate, ValueSource};
pub use value::{Value, ValueKind, ValueParseError};

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline graph core for GLPipe Studio.
//!
//! Users assemble OpenGL rendering pipelines as directed graphs of
//! typed blocks connected through typed ports. This crate provides:
//! - The block/port/connection/pipeline graph model with arena-based
//!   ownership and pipeline-owned id allocation
//! - Per-kind connection legality and lazy edge configuration
//! - The validation engine computing per-block health and the
//!   pipeline-wide aggregate
//! - A content-addressed cache for expensive derived data such as
//!   decoded images
//! - Boundary interfaces for the serialization and code-generation
//!   collaborators

pub mod status;
pub mod port;
pub mod block;
pub mod connection;
pub mod command;
pub mod pipeline;
pub mod validation;
pub mod cache;
pub mod codegen;

pub use block::{Block, BlockId, BlockKind};
pub use cache::{CacheOutcome, CachePool, CacheSource, ImageData, ImageDataSource};
pub use command::{CommandKind, DrawMode, RenderCommand};
pub use connection::{Connection, ConnectionId};
pub use pipeline::{CommandError, ConnectError, Pipeline, PipelineError};
pub use port::{FeatureVersion, Port, PortDirection, PortId, PortType};
pub use status::HealthStatus;
pub use validation::{Finding, Subject, ValidationReport, Validator};

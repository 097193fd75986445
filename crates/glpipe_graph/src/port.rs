// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for block inputs/outputs.

use serde::{Deserialize, Serialize};

/// OpenGL feature version gating ports and properties, written as the
/// usual three-digit shorthand (330 = 3.3, 430 = 4.3, ...).
pub type FeatureVersion = u16;

/// Baseline version every port supports.
pub const VERSION_330: FeatureVersion = 330;
/// Tessellation stages.
pub const VERSION_400: FeatureVersion = 400;
/// Atomic counters.
pub const VERSION_420: FeatureVersion = 420;
/// Shader storage buffers, compute shaders, texture views.
pub const VERSION_430: FeatureVersion = 430;
/// Highest version the editor targets by default.
pub const VERSION_450: FeatureVersion = 450;

/// Index of a port within its owning block's port vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u16);

impl PortId {
    /// Index into the owning block's port vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Incoming connections attach here
    Input,
    /// Outgoing connections originate here
    Output,
}

/// Semantic type of data crossing a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Stage-to-stage pipeline flow
    Generic,
    /// Vertex attribute data from a buffer
    VertexData,
    /// Element index list for indexed drawing
    Index,
    /// Texture image binding
    Texture,
    /// Separate sampler object binding
    Sampler,
    /// Plain uniform values
    Uniform,
    /// Uniform buffer block binding
    UniformBlock,
    /// Shader storage buffer binding
    ShaderStorage,
    /// Atomic counter buffer binding
    AtomicCounter,
    /// Framebuffer attachment image
    Attachment,
}

impl PortType {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::VertexData => "vertex data",
            Self::Index => "index list",
            Self::Texture => "texture",
            Self::Sampler => "sampler",
            Self::Uniform => "uniform",
            Self::UniformBlock => "uniform block",
            Self::ShaderStorage => "shader storage",
            Self::AtomicCounter => "atomic counter",
            Self::Attachment => "attachment",
        }
    }
}

/// A typed, directional attachment point on a block.
///
/// Ports are created once during block initialization and never change
/// afterwards. Connections attached to a port are tracked by the
/// pipeline, not by the port itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Human-readable label
    pub label: String,
    /// Semantic data type
    pub port_type: PortType,
    /// Direction
    pub direction: PortDirection,
    /// Minimum feature version required to use this port
    pub min_version: FeatureVersion,
}

impl Port {
    /// Create an input port available from the baseline version.
    pub fn input(label: impl Into<String>, port_type: PortType) -> Self {
        Self {
            label: label.into(),
            port_type,
            direction: PortDirection::Input,
            min_version: VERSION_330,
        }
    }

    /// Create an output port available from the baseline version.
    pub fn output(label: impl Into<String>, port_type: PortType) -> Self {
        Self {
            label: label.into(),
            port_type,
            direction: PortDirection::Output,
            min_version: VERSION_330,
        }
    }

    /// Gate the port behind a minimum feature version.
    pub fn with_min_version(mut self, version: FeatureVersion) -> Self {
        self.min_version = version;
        self
    }

    /// Whether the port is usable under a target version.
    pub fn available_at(&self, target: FeatureVersion) -> bool {
        self.min_version <= target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_gate() {
        let port = Port::input("Storage In", PortType::ShaderStorage).with_min_version(VERSION_430);
        assert!(port.available_at(450));
        assert!(port.available_at(430));
        assert!(!port.available_at(330));
    }

    #[test]
    fn test_defaults_are_baseline() {
        let port = Port::output("Stage Out", PortType::Generic);
        assert_eq!(port.min_version, VERSION_330);
        assert_eq!(port.direction, PortDirection::Output);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Block definitions: the typed nodes of the pipeline graph.

use crate::port::{Port, PortDirection, PortId, PortType, VERSION_400, VERSION_420, VERSION_430};
use crate::status::HealthStatus;
use glpipe_property::{Property, PropertyList, Value};
use serde::{Deserialize, Serialize};

/// Stable identifier of a block, allocated by the pipeline's monotonic
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Property ids used by block and connection property lists.
pub mod prop {
    /// Buffer usage hint
    pub const USAGE: &str = "usage";
    /// Buffer size in bytes
    pub const BYTE_SIZE: &str = "byte_size";
    /// Vertex puller attribute count
    pub const ATTRIBUTE_COUNT: &str = "attribute_count";
    /// Shader source text
    pub const SHADER_SOURCE: &str = "shader_source";
    /// Texture image file path
    pub const SOURCE_FILE: &str = "source_file";
    /// Texture atlas grid columns
    pub const GRID_COLS: &str = "grid_cols";
    /// Texture atlas grid rows
    pub const GRID_ROWS: &str = "grid_rows";
    /// Texture minification filter
    pub const MIN_FILTER: &str = "min_filter";
    /// Texture magnification filter
    pub const MAG_FILTER: &str = "mag_filter";
    /// Texture wrap mode, S axis
    pub const WRAP_S: &str = "wrap_s";
    /// Texture wrap mode, T axis
    pub const WRAP_T: &str = "wrap_t";
    /// Decoded image width (computed)
    pub const IMAGE_WIDTH: &str = "image_width";
    /// Decoded image height (computed)
    pub const IMAGE_HEIGHT: &str = "image_height";
    /// Texture view base mip level
    pub const BASE_LEVEL: &str = "base_level";
    /// Texture view mip level count
    pub const LEVEL_COUNT: &str = "level_count";
    /// Multisample count
    pub const SAMPLES: &str = "samples";
    /// Render buffer width
    pub const WIDTH: &str = "width";
    /// Render buffer height
    pub const HEIGHT: &str = "height";
    /// Render buffer storage format
    pub const FORMAT: &str = "format";
    /// Display vertical sync
    pub const VSYNC: &str = "vsync";
    /// Mixer blend factor
    pub const MIX_FACTOR: &str = "mix_factor";
    /// Mixer blend mode
    pub const BLEND_MODE: &str = "blend_mode";
    /// Code generator target language
    pub const TARGET_LANGUAGE: &str = "target_language";
    /// Code generator target API
    pub const TARGET_API: &str = "target_api";
    /// Code generator output path
    pub const OUTPUT_PATH: &str = "output_path";
    /// Rasterization cull face
    pub const CULL_FACE: &str = "cull_face";
    /// Rasterization polygon mode
    pub const POLYGON_MODE: &str = "polygon_mode";
    /// Rasterization line width
    pub const LINE_WIDTH: &str = "line_width";
    /// Depth test toggle
    pub const DEPTH_TEST: &str = "depth_test";
    /// Depth comparison function
    pub const DEPTH_FUNC: &str = "depth_func";
    /// Stencil test toggle
    pub const STENCIL_TEST: &str = "stencil_test";
    /// Blending toggle
    pub const BLEND_ENABLED: &str = "blend_enabled";
    /// Transform feedback captured varyings
    pub const FEEDBACK_VARYINGS: &str = "feedback_varyings";
    /// Rasterizer discard toggle
    pub const RASTERIZER_DISCARD: &str = "rasterizer_discard";
    /// Tessellation patch vertex count
    pub const PATCH_VERTICES: &str = "patch_vertices";
    /// Camera field of view in degrees
    pub const FIELD_OF_VIEW: &str = "field_of_view";
    /// Camera near plane
    pub const NEAR_PLANE: &str = "near_plane";
    /// Camera far plane
    pub const FAR_PLANE: &str = "far_plane";
    /// Model matrix
    pub const MODEL_MATRIX: &str = "model_matrix";
    /// View matrix
    pub const VIEW_MATRIX: &str = "view_matrix";
    /// Projection matrix
    pub const PROJECTION_MATRIX: &str = "projection_matrix";

    /// Edge: texture unit binding
    pub const TEXTURE_UNIT: &str = "texture_unit";
    /// Edge: declared sampler name in the shader
    pub const TEXTURE_NAME: &str = "texture_name";
    /// Edge: declared uniform name in the shader
    pub const UNIFORM_NAME: &str = "uniform_name";
    /// Edge: framebuffer attachment point
    pub const ATTACHMENT_POINT: &str = "attachment_point";
    /// Edge: buffer binding index
    pub const BINDING_INDEX: &str = "binding_index";
}

/// Kind of a pipeline block. Immutable after construction; fixes the
/// block's port and property shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Vertex/index/storage data container
    Buffer,
    /// Assembles vertices from buffers for drawing
    VertexPuller,
    /// Vertex shader stage
    VertexShader,
    /// Tessellation control shader stage
    TessControlShader,
    /// Tessellation evaluation shader stage
    TessEvalShader,
    /// Geometry shader stage
    GeometryShader,
    /// Fragment shader stage
    FragmentShader,
    /// Compute shader (outside the draw pipeline)
    ComputeShader,
    /// Image-backed texture source
    Texture,
    /// Re-typed view of another texture
    TextureView,
    /// Render target composed of attachments
    Framebuffer,
    /// Attachment storage without sampling support
    RenderBuffer,
    /// Final on-screen output
    Display,
    /// Blends two texture sources
    Mixer,
    /// Emits target source code for the assembled pipeline
    CodeGenerator,
    /// Fixed-function rasterization stage
    Rasterization,
    /// Fixed-function per-fragment test stage
    FragmentTests,
    /// Fixed-function transform feedback stage
    TransformFeedback,
    /// Fixed-function tessellation primitive generator
    TessPrimitiveGenerator,
    /// Interactive camera parameter source
    CameraControl,
    /// Model/view/projection matrix provider
    ModelViewProjection,
}

impl BlockKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::VertexPuller => "vertex puller",
            Self::VertexShader => "vertex shader",
            Self::TessControlShader => "tess control shader",
            Self::TessEvalShader => "tess eval shader",
            Self::GeometryShader => "geometry shader",
            Self::FragmentShader => "fragment shader",
            Self::ComputeShader => "compute shader",
            Self::Texture => "texture",
            Self::TextureView => "texture view",
            Self::Framebuffer => "framebuffer",
            Self::RenderBuffer => "render buffer",
            Self::Display => "display",
            Self::Mixer => "mixer",
            Self::CodeGenerator => "code generator",
            Self::Rasterization => "rasterization",
            Self::FragmentTests => "fragment tests",
            Self::TransformFeedback => "transform feedback",
            Self::TessPrimitiveGenerator => "tess primitive generator",
            Self::CameraControl => "camera control",
            Self::ModelViewProjection => "model view projection",
        }
    }

    /// Shader stages, including compute.
    pub fn is_shader_stage(self) -> bool {
        matches!(
            self,
            Self::VertexShader
                | Self::TessControlShader
                | Self::TessEvalShader
                | Self::GeometryShader
                | Self::FragmentShader
                | Self::ComputeShader
        )
    }

    /// Fixed-function stages sharing the exactly-one-incoming rule.
    pub fn is_fixed_function(self) -> bool {
        matches!(
            self,
            Self::Rasterization
                | Self::FragmentTests
                | Self::TransformFeedback
                | Self::TessPrimitiveGenerator
        )
    }

    /// Terminal sinks exempt from the orphan check.
    pub fn is_sink(self) -> bool {
        matches!(self, Self::Display | Self::CodeGenerator)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const MAT4_IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A typed node in the pipeline graph.
///
/// The kind is fixed at construction; kind-specific setup builds the
/// port and property shape exactly once (re-initialization clears the
/// previous shape first, so the factory may safely call it again).
#[derive(Debug)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    /// Display name, editable by the user
    pub name: String,
    /// Configuration properties
    pub properties: PropertyList,
    ports: Vec<Port>,
    status: HealthStatus,
    status_message: String,
}

impl Block {
    /// Create an uninitialized block. The pipeline factory calls
    /// [`Block::initialize`] immediately afterwards.
    pub fn new(id: BlockId, kind: BlockKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            properties: PropertyList::new(),
            ports: Vec::new(),
            status: HealthStatus::Healthy,
            status_message: String::new(),
        }
    }

    /// Build the kind-specific property and port shape.
    pub fn initialize(&mut self) {
        self.create_properties();
        self.create_ports();
    }

    /// Stable identifier.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Immutable kind tag.
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Current health status from the last validation run.
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// Message attached to the current status.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Overwrite the health verdict. Used by the validator.
    pub fn set_status(&mut self, status: HealthStatus, message: impl Into<String>) {
        self.status = status;
        self.status_message = message.into();
    }

    /// All ports in declaration order.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports
            .iter()
            .enumerate()
            .map(|(i, p)| (PortId(i as u16), p))
    }

    /// Look up a port.
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.index())
    }

    /// Find a port by label.
    pub fn port_by_label(&self, label: &str) -> Option<PortId> {
        self.ports
            .iter()
            .position(|p| p.label == label)
            .map(|i| PortId(i as u16))
    }

    /// Find the first port with a given type and direction.
    pub fn port_by_type(&self, port_type: PortType, direction: PortDirection) -> Option<PortId> {
        self.ports
            .iter()
            .position(|p| p.port_type == port_type && p.direction == direction)
            .map(|i| PortId(i as u16))
    }

    /// Populate the kind-specific properties. Clears any previous
    /// properties first, so repeated initialization is idempotent.
    pub fn create_properties(&mut self) {
        self.properties.clear();
        let p = &mut self.properties;
        match self.kind {
            BlockKind::Buffer => {
                p.insert(
                    Property::new(prop::USAGE, "Usage", Value::Choice(0)).with_choices([
                        "Static Draw",
                        "Dynamic Draw",
                        "Stream Draw",
                    ]),
                );
                p.create(prop::BYTE_SIZE, "Size (bytes)", Value::UInt(0));
            }
            BlockKind::VertexPuller => {
                p.create(prop::ATTRIBUTE_COUNT, "Attribute count", Value::UInt(1));
            }
            BlockKind::VertexShader
            | BlockKind::TessControlShader
            | BlockKind::TessEvalShader
            | BlockKind::GeometryShader
            | BlockKind::FragmentShader
            | BlockKind::ComputeShader => {
                p.create(prop::SHADER_SOURCE, "Source", Value::Text(String::new()));
            }
            BlockKind::Texture => {
                p.create(prop::SOURCE_FILE, "Image file", Value::Text(String::new()));
                p.create(prop::GRID_COLS, "Grid columns", Value::UInt(1));
                p.create(prop::GRID_ROWS, "Grid rows", Value::UInt(1));
                p.insert(
                    Property::new(prop::MIN_FILTER, "Min filter", Value::Choice(1))
                        .with_choices(["Nearest", "Linear"]),
                );
                p.insert(
                    Property::new(prop::MAG_FILTER, "Mag filter", Value::Choice(1))
                        .with_choices(["Nearest", "Linear"]),
                );
                p.insert(Property::new(prop::WRAP_S, "Wrap S", Value::Choice(0)).with_choices([
                    "Repeat",
                    "Clamp To Edge",
                    "Mirrored Repeat",
                ]));
                p.insert(Property::new(prop::WRAP_T, "Wrap T", Value::Choice(0)).with_choices([
                    "Repeat",
                    "Clamp To Edge",
                    "Mirrored Repeat",
                ]));
                // Computed from the decoded image; rebound to cache
                // data on refresh.
                p.insert(
                    Property::new(prop::IMAGE_WIDTH, "Image width", Value::UInt(0))
                        .with_read_only()
                        .with_transient(),
                );
                p.insert(
                    Property::new(prop::IMAGE_HEIGHT, "Image height", Value::UInt(0))
                        .with_read_only()
                        .with_transient(),
                );
            }
            BlockKind::TextureView => {
                p.create(prop::BASE_LEVEL, "Base level", Value::UInt(0));
                p.create(prop::LEVEL_COUNT, "Level count", Value::UInt(1));
            }
            BlockKind::Framebuffer => {
                p.create(prop::SAMPLES, "Samples", Value::UInt(0));
            }
            BlockKind::RenderBuffer => {
                p.create(prop::WIDTH, "Width", Value::UInt(256));
                p.create(prop::HEIGHT, "Height", Value::UInt(256));
                p.insert(
                    Property::new(prop::FORMAT, "Format", Value::Choice(0)).with_choices([
                        "RGBA8",
                        "Depth 24",
                        "Depth 24 Stencil 8",
                    ]),
                );
                p.create(prop::SAMPLES, "Samples", Value::UInt(0));
            }
            BlockKind::Display => {
                p.create(prop::VSYNC, "V-sync", Value::Bool(true));
            }
            BlockKind::Mixer => {
                p.create(prop::MIX_FACTOR, "Mix factor", Value::Float(0.5));
                p.insert(
                    Property::new(prop::BLEND_MODE, "Blend mode", Value::Choice(0))
                        .with_choices(["Mix", "Add", "Multiply"]),
                );
            }
            BlockKind::CodeGenerator => {
                p.insert(
                    Property::new(prop::TARGET_LANGUAGE, "Language", Value::Choice(0))
                        .with_choices(["C++", "C", "Python"]),
                );
                p.insert(
                    Property::new(prop::TARGET_API, "API", Value::Choice(0))
                        .with_choices(["OpenGL", "OpenGL ES"]),
                );
                p.create(prop::OUTPUT_PATH, "Output path", Value::Text(String::new()));
            }
            BlockKind::Rasterization => {
                p.insert(
                    Property::new(prop::CULL_FACE, "Cull face", Value::Choice(1))
                        .with_choices(["None", "Back", "Front"]),
                );
                p.insert(
                    Property::new(prop::POLYGON_MODE, "Polygon mode", Value::Choice(0))
                        .with_choices(["Fill", "Line", "Point"]),
                );
                p.create(prop::LINE_WIDTH, "Line width", Value::Float(1.0));
            }
            BlockKind::FragmentTests => {
                p.create(prop::DEPTH_TEST, "Depth test", Value::Bool(true));
                p.insert(
                    Property::new(prop::DEPTH_FUNC, "Depth function", Value::Choice(0))
                        .with_choices(["Less", "Less Equal", "Greater", "Always"]),
                );
                p.create(prop::STENCIL_TEST, "Stencil test", Value::Bool(false));
                p.create(prop::BLEND_ENABLED, "Blending", Value::Bool(false));
            }
            BlockKind::TransformFeedback => {
                p.create(prop::FEEDBACK_VARYINGS, "Varyings", Value::Text(String::new()));
                p.create(prop::RASTERIZER_DISCARD, "Rasterizer discard", Value::Bool(false));
            }
            BlockKind::TessPrimitiveGenerator => {
                p.create(prop::PATCH_VERTICES, "Patch vertices", Value::UInt(3));
            }
            BlockKind::CameraControl => {
                p.create(prop::FIELD_OF_VIEW, "Field of view", Value::Float(60.0));
                p.create(prop::NEAR_PLANE, "Near plane", Value::Float(0.1));
                p.create(prop::FAR_PLANE, "Far plane", Value::Float(100.0));
            }
            BlockKind::ModelViewProjection => {
                p.create(prop::MODEL_MATRIX, "Model", Value::Mat4(MAT4_IDENTITY));
                p.create(prop::VIEW_MATRIX, "View", Value::Mat4(MAT4_IDENTITY));
                p.create(prop::PROJECTION_MATRIX, "Projection", Value::Mat4(MAT4_IDENTITY));
            }
        }
    }

    /// Populate the kind-specific ports. Clears any previous ports
    /// first, so repeated initialization is idempotent.
    pub fn create_ports(&mut self) {
        self.ports.clear();
        let ports = &mut self.ports;
        match self.kind {
            BlockKind::Buffer => {
                ports.push(Port::input("Feedback In", PortType::VertexData));
                ports.push(
                    Port::input("Storage In", PortType::ShaderStorage)
                        .with_min_version(VERSION_430),
                );
                ports.push(Port::output("Data Out", PortType::VertexData));
                ports.push(
                    Port::output("Storage Out", PortType::ShaderStorage)
                        .with_min_version(VERSION_430),
                );
                ports.push(
                    Port::output("Atomic Out", PortType::AtomicCounter)
                        .with_min_version(VERSION_420),
                );
            }
            BlockKind::VertexPuller => {
                ports.push(Port::input("Vertex Data", PortType::VertexData));
                ports.push(Port::input("Index List", PortType::Index));
                ports.push(Port::output("Assembly Out", PortType::Generic));
            }
            BlockKind::VertexShader
            | BlockKind::TessControlShader
            | BlockKind::TessEvalShader
            | BlockKind::GeometryShader
            | BlockKind::FragmentShader => {
                let stage_version = match self.kind {
                    BlockKind::TessControlShader | BlockKind::TessEvalShader => VERSION_400,
                    _ => crate::port::VERSION_330,
                };
                ports.push(Port::input("Stage In", PortType::Generic).with_min_version(stage_version));
                ports.push(
                    Port::output("Stage Out", PortType::Generic).with_min_version(stage_version),
                );
                Self::push_resource_ports(ports);
            }
            BlockKind::ComputeShader => {
                Self::push_resource_ports(ports);
            }
            BlockKind::Texture => {
                ports.push(Port::output("Texture Out", PortType::Texture));
            }
            BlockKind::TextureView => {
                ports.push(Port::input("Texture In", PortType::Texture).with_min_version(VERSION_430));
                ports.push(Port::output("Sampler Out", PortType::Sampler).with_min_version(VERSION_430));
                ports.push(
                    Port::output("Attachment Out", PortType::Attachment)
                        .with_min_version(VERSION_430),
                );
            }
            BlockKind::Framebuffer => {
                ports.push(Port::input("Pass In", PortType::Generic));
                ports.push(Port::input("Color Attachment", PortType::Attachment));
                ports.push(Port::input("Depth Stencil", PortType::Attachment));
                ports.push(Port::output("Pass Out", PortType::Generic));
            }
            BlockKind::RenderBuffer => {
                ports.push(Port::output("Attachment Out", PortType::Attachment));
            }
            BlockKind::Display => {
                ports.push(Port::input("Image In", PortType::Generic));
            }
            BlockKind::Mixer => {
                ports.push(Port::input("Source A", PortType::Texture));
                ports.push(Port::input("Source B", PortType::Texture));
                ports.push(Port::output("Mix Out", PortType::Texture));
            }
            BlockKind::CodeGenerator => {
                ports.push(Port::input("Pipeline In", PortType::Generic));
            }
            BlockKind::Rasterization => {
                ports.push(Port::input("Primitives In", PortType::Generic));
                ports.push(Port::output("Fragments Out", PortType::Generic));
            }
            BlockKind::FragmentTests => {
                ports.push(Port::input("Fragments In", PortType::Generic));
                ports.push(Port::output("Stage Out", PortType::Generic));
            }
            BlockKind::TransformFeedback => {
                ports.push(Port::input("Primitives In", PortType::Generic));
                ports.push(Port::output("Primitives Out", PortType::Generic));
                ports.push(Port::output("Feedback Out", PortType::VertexData));
            }
            BlockKind::TessPrimitiveGenerator => {
                ports.push(Port::input("Patches In", PortType::Generic).with_min_version(VERSION_400));
                ports.push(
                    Port::output("Primitives Out", PortType::Generic).with_min_version(VERSION_400),
                );
            }
            BlockKind::CameraControl => {
                ports.push(Port::output("Control Out", PortType::Generic));
            }
            BlockKind::ModelViewProjection => {
                ports.push(Port::input("Control In", PortType::Generic));
                ports.push(Port::output("Matrices Out", PortType::Uniform));
            }
        }
    }

    fn push_resource_ports(ports: &mut Vec<Port>) {
        ports.push(Port::input("Textures", PortType::Texture));
        ports.push(Port::input("Uniforms", PortType::Uniform));
        ports.push(Port::input("Uniform Blocks", PortType::UniformBlock));
        ports.push(Port::input("Storage In", PortType::ShaderStorage).with_min_version(VERSION_430));
        ports.push(
            Port::output("Storage Out", PortType::ShaderStorage).with_min_version(VERSION_430),
        );
        ports.push(
            Port::input("Atomic Counters", PortType::AtomicCounter).with_min_version(VERSION_420),
        );
    }

    /// Decide whether a connection from one of this block's output
    /// ports to a port on a destination block is legal.
    ///
    /// Evaluated from the source block's side against a per-kind
    /// whitelist of `(destination kind, destination port type)` pairs;
    /// anything outside the whitelist is denied with a human-readable
    /// reason.
    pub fn can_accept_connection(
        &self,
        src_port: PortId,
        dest_kind: BlockKind,
        dest_port_type: PortType,
    ) -> Result<(), String> {
        let port = self
            .port(src_port)
            .ok_or_else(|| format!("{} has no port {:?}", self.kind, src_port))?;
        if port.direction != PortDirection::Output {
            return Err(format!(
                "{} port of {} is not an output",
                port.label, self.kind
            ));
        }
        let allowed = match (self.kind, port.port_type) {
            (BlockKind::Buffer, PortType::VertexData) => {
                dest_kind == BlockKind::VertexPuller
                    && matches!(dest_port_type, PortType::VertexData | PortType::Index)
            }
            (BlockKind::Buffer, PortType::ShaderStorage) => {
                dest_kind.is_shader_stage() && dest_port_type == PortType::ShaderStorage
            }
            (BlockKind::Buffer, PortType::AtomicCounter) => {
                dest_kind.is_shader_stage() && dest_port_type == PortType::AtomicCounter
            }
            (BlockKind::VertexPuller, PortType::Generic) => {
                dest_kind == BlockKind::VertexShader && dest_port_type == PortType::Generic
            }
            (BlockKind::VertexShader, PortType::Generic) => {
                matches!(
                    dest_kind,
                    BlockKind::TessControlShader
                        | BlockKind::GeometryShader
                        | BlockKind::TransformFeedback
                        | BlockKind::Rasterization
                ) && dest_port_type == PortType::Generic
            }
            (BlockKind::TessControlShader, PortType::Generic) => {
                dest_kind == BlockKind::TessPrimitiveGenerator
                    && dest_port_type == PortType::Generic
            }
            (BlockKind::TessPrimitiveGenerator, PortType::Generic) => {
                dest_kind == BlockKind::TessEvalShader && dest_port_type == PortType::Generic
            }
            (BlockKind::TessEvalShader, PortType::Generic) => {
                matches!(
                    dest_kind,
                    BlockKind::GeometryShader
                        | BlockKind::TransformFeedback
                        | BlockKind::Rasterization
                ) && dest_port_type == PortType::Generic
            }
            (BlockKind::GeometryShader, PortType::Generic) => {
                matches!(
                    dest_kind,
                    BlockKind::TransformFeedback | BlockKind::Rasterization
                ) && dest_port_type == PortType::Generic
            }
            (BlockKind::TransformFeedback, PortType::Generic) => {
                dest_kind == BlockKind::Rasterization && dest_port_type == PortType::Generic
            }
            (BlockKind::TransformFeedback, PortType::VertexData) => {
                dest_kind == BlockKind::Buffer && dest_port_type == PortType::VertexData
            }
            (BlockKind::Rasterization, PortType::Generic) => {
                dest_kind == BlockKind::FragmentShader && dest_port_type == PortType::Generic
            }
            (BlockKind::FragmentShader, PortType::Generic) => {
                dest_kind == BlockKind::FragmentTests && dest_port_type == PortType::Generic
            }
            (BlockKind::FragmentTests, PortType::Generic) => {
                matches!(dest_kind, BlockKind::Framebuffer | BlockKind::CodeGenerator)
                    && dest_port_type == PortType::Generic
            }
            (BlockKind::Framebuffer, PortType::Generic) => {
                dest_kind == BlockKind::Display && dest_port_type == PortType::Generic
            }
            (kind, PortType::ShaderStorage) if kind.is_shader_stage() => {
                dest_kind == BlockKind::Buffer && dest_port_type == PortType::ShaderStorage
            }
            (BlockKind::Texture, PortType::Texture) => {
                (dest_kind.is_shader_stage() || dest_kind == BlockKind::Mixer)
                    && dest_port_type == PortType::Texture
                    || dest_kind == BlockKind::TextureView && dest_port_type == PortType::Texture
            }
            (BlockKind::TextureView, PortType::Sampler) => {
                (dest_kind.is_shader_stage() || dest_kind == BlockKind::Mixer)
                    && dest_port_type == PortType::Texture
            }
            (BlockKind::TextureView, PortType::Attachment)
            | (BlockKind::RenderBuffer, PortType::Attachment) => {
                dest_kind == BlockKind::Framebuffer && dest_port_type == PortType::Attachment
            }
            (BlockKind::Mixer, PortType::Texture) => {
                (dest_kind.is_shader_stage() || dest_kind == BlockKind::Mixer)
                    && dest_port_type == PortType::Texture
            }
            (BlockKind::CameraControl, PortType::Generic) => {
                dest_kind == BlockKind::ModelViewProjection && dest_port_type == PortType::Generic
            }
            (BlockKind::ModelViewProjection, PortType::Uniform) => {
                dest_kind.is_shader_stage() && dest_port_type == PortType::Uniform
            }
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(format!(
                "{} of {} cannot feed the {} port of {}",
                port.label,
                self.kind,
                dest_port_type.name(),
                dest_kind
            ))
        }
    }

    /// Lazily populate an edge's property list according to the
    /// port-type pairing of a freshly established connection.
    ///
    /// Called exactly once per connection, right after the legality
    /// check passed and the edge was created.
    pub fn prepare_connection(
        src_type: PortType,
        dest_type: PortType,
        edge: &mut PropertyList,
    ) {
        match (src_type, dest_type) {
            (PortType::Texture | PortType::Sampler, PortType::Texture) => {
                edge.create(prop::TEXTURE_UNIT, "Texture unit", Value::UInt(0));
                edge.create(prop::TEXTURE_NAME, "Sampler name", Value::Text(String::new()));
            }
            (PortType::Uniform, PortType::Uniform) => {
                edge.create(prop::UNIFORM_NAME, "Uniform name", Value::Text(String::new()));
            }
            (_, PortType::Attachment) => {
                edge.insert(
                    Property::new(prop::ATTACHMENT_POINT, "Attachment point", Value::Choice(0))
                        .with_choices([
                            "Color 0",
                            "Color 1",
                            "Color 2",
                            "Color 3",
                            "Depth",
                            "Stencil",
                            "Depth Stencil",
                        ]),
                );
            }
            (PortType::ShaderStorage, PortType::ShaderStorage)
            | (PortType::AtomicCounter, PortType::AtomicCounter)
            | (_, PortType::UniformBlock) => {
                edge.create(prop::BINDING_INDEX, "Binding index", Value::UInt(0));
            }
            _ => {}
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BlockDoc {
    id: BlockId,
    kind: BlockKind,
    name: String,
    properties: Vec<glpipe_property::PropertyRecord>,
}

impl Serialize for Block {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BlockDoc {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            properties: self.properties.records(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = BlockDoc::deserialize(deserializer)?;
        let mut block = Block::new(doc.id, doc.kind, doc.name);
        block.initialize();
        block
            .properties
            .apply_records(&doc.properties)
            .map_err(serde::de::Error::custom)?;
        Ok(block)
    }
}

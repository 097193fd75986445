// SPDX-License-Identifier: MIT OR Apache-2.0
//! The validation engine: walks the whole pipeline and computes a
//! health verdict per block plus a pipeline-wide aggregate.

use crate::block::{prop, Block, BlockId, BlockKind};
use crate::cache::{CacheSource, ImageDataSource};
use crate::connection::{Connection, ConnectionId};
use crate::pipeline::Pipeline;
use crate::port::{PortDirection, PortId, PortType};
use crate::status::HealthStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// The item a finding is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// A block
    Block(BlockId),
    /// A port on a block
    Port {
        /// Owning block
        block: BlockId,
        /// Port on the block
        port: PortId,
    },
    /// A connection
    Connection(ConnectionId),
    /// A render command, by position
    Command(usize),
}

/// One non-healthy verdict from a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The item the verdict is attached to
    pub subject: Subject,
    /// Severity
    pub status: HealthStatus,
    /// Human-readable diagnostic
    pub message: String,
}

/// Result of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Worst status observed across every visited item
    pub pipeline_status: HealthStatus,
    /// First item that reached the worst status; ties keep the
    /// earliest, a strictly worse item replaces it
    pub worst_subject: Option<Subject>,
    /// Every non-healthy verdict, in visit order
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// Findings attached to one block.
    pub fn findings_for_block(&self, block: BlockId) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |f| f.subject == Subject::Block(block))
    }
}

/// Single-pass graph walker. Stateless between runs: every run starts
/// from a clean aggregate and recomputes every verdict.
#[derive(Debug, Default)]
pub struct Validator {
    worst: HealthStatus,
    worst_subject: Option<Subject>,
    findings: Vec<Finding>,
}

impl Validator {
    /// Create a fresh walker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk all blocks, connections, ports and commands, write each
    /// block's verdict back onto it and return the report.
    pub fn run(mut self, pipeline: &mut Pipeline) -> ValidationReport {
        let verdicts: Vec<(BlockId, HealthStatus, String)> = pipeline
            .blocks()
            .map(|block| {
                let (status, message) = visit_block(pipeline, block);
                (block.id(), status, message)
            })
            .collect();
        for (id, status, message) in verdicts {
            if status == HealthStatus::Sick {
                tracing::warn!(block = %id, %message, "block is sick");
            } else {
                tracing::debug!(block = %id, status = status.name(), "block visited");
            }
            self.observe(Subject::Block(id), status, message.clone());
            pipeline
                .block_mut(id)
                .expect("visited block vanished from the arena")
                .set_status(status, message);
        }

        let connection_findings: Vec<(ConnectionId, HealthStatus, String)> = pipeline
            .connections()
            .map(|connection| visit_connection(pipeline, connection))
            .collect();
        for (id, status, message) in connection_findings {
            self.observe(Subject::Connection(id), status, message);
        }

        for (block_id, port_id, status, message) in visit_ports(pipeline) {
            self.observe(
                Subject::Port {
                    block: block_id,
                    port: port_id,
                },
                status,
                message,
            );
        }

        let command_findings: Vec<(usize, HealthStatus, String)> = pipeline
            .commands()
            .iter()
            .enumerate()
            .map(|(index, command)| {
                let block = pipeline
                    .block(command.block)
                    .expect("command assigned to a block absent from the arena");
                if command.kind.compatible_with(block.kind()) {
                    (index, HealthStatus::Healthy, String::new())
                } else {
                    (
                        index,
                        HealthStatus::Sick,
                        format!("command cannot execute through a {} block", block.kind()),
                    )
                }
            })
            .collect();
        for (index, status, message) in command_findings {
            self.observe(Subject::Command(index), status, message);
        }

        ValidationReport {
            pipeline_status: self.worst,
            worst_subject: self.worst_subject,
            findings: self.findings,
        }
    }

    fn observe(&mut self, subject: Subject, status: HealthStatus, message: String) {
        if status > self.worst {
            self.worst = status;
            self.worst_subject = Some(subject);
        }
        if status > HealthStatus::Healthy {
            self.findings.push(Finding {
                subject,
                status,
                message,
            });
        }
    }
}

struct Verdict {
    status: HealthStatus,
    message: String,
}

impl Verdict {
    fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: String::new(),
        }
    }

    fn set(&mut self, status: HealthStatus, message: impl Into<String>) {
        self.status = status;
        self.message = message.into();
    }
}

/// Compute one block's verdict. Checks run in a fixed order; a later
/// check that fires overwrites the earlier verdict, and the
/// kind-specific rules may return early to protect a verdict from
/// being overwritten.
fn visit_block(pipeline: &Pipeline, block: &Block) -> (HealthStatus, String) {
    let id = block.id();
    let kind = block.kind();
    let mut verdict = Verdict::healthy();

    // Orphan check runs before the kind rules.
    let out_count = pipeline.connections_out_of_block(id).count();
    if !kind.is_sink() && out_count == 0 {
        verdict.set(HealthStatus::Chilled, "orphaned: no outgoing connections");
    }

    match kind {
        BlockKind::Buffer => visit_buffer(pipeline, id, out_count, &mut verdict),
        k if k.is_shader_stage() => visit_shader(pipeline, block, &mut verdict),
        k if k.is_fixed_function() => {
            let in_count = pipeline.connections_into_block(id).count();
            if in_count != 1 {
                verdict.set(
                    HealthStatus::Sick,
                    format!("{kind} requires exactly one incoming connection"),
                );
            }
        }
        BlockKind::VertexPuller => visit_vertex_puller(pipeline, block, &mut verdict),
        BlockKind::CodeGenerator => visit_code_generator(pipeline, id, &mut verdict),
        BlockKind::Framebuffer => visit_framebuffer(pipeline, block, &mut verdict),
        BlockKind::Display => {
            if pipeline.connections_into_block(id).count() == 0 {
                verdict.set(HealthStatus::Chilled, "nothing to display");
            }
        }
        BlockKind::Texture => visit_texture(pipeline, block, &mut verdict),
        _ => {}
    }

    (verdict.status, verdict.message)
}

/// The historical buffer rule, kept bit-for-bit: the buffer is sick
/// when it has outgoing data and some port it feeds has a feeder
/// count other than one; otherwise the rule sets Healthy outright,
/// overwriting the orphan verdict for a fully unconnected buffer.
fn visit_buffer(pipeline: &Pipeline, id: BlockId, out_count: usize, verdict: &mut Verdict) {
    let bad_fan_in = pipeline.connections_out_of_block(id).any(|c| {
        pipeline
            .connections_into_port(c.to_block, c.to_port)
            .count()
            != 1
    });
    if out_count > 0 && bad_fan_in {
        verdict.set(
            HealthStatus::Sick,
            "buffer must be the only feeder of the port it supplies",
        );
    } else {
        verdict.set(HealthStatus::Healthy, "");
    }
}

fn visit_shader(pipeline: &Pipeline, block: &Block, verdict: &mut Verdict) {
    let id = block.id();
    let incoming: Vec<&Connection> = pipeline.connections_into_block(id).collect();
    let edges_into = |port_type: PortType| {
        incoming.iter().filter(move |c| {
            block
                .port(c.to_port)
                .is_some_and(|p| p.port_type == port_type)
        })
    };

    // Duplicate declared names across textures and uniforms are fatal
    // and must survive every later check for this block.
    let mut names = HashSet::new();
    let declared = edges_into(PortType::Texture)
        .filter_map(|c| c.properties.text(prop::TEXTURE_NAME))
        .chain(edges_into(PortType::Uniform).filter_map(|c| c.properties.text(prop::UNIFORM_NAME)))
        .filter(|name| !name.is_empty());
    for name in declared {
        if !names.insert(name.clone()) {
            verdict.set(
                HealthStatus::Sick,
                format!("duplicate declared name '{name}'"),
            );
            return;
        }
    }

    let generic_in = block.port_by_type(PortType::Generic, PortDirection::Input);
    let generic_count = generic_in
        .map(|port| pipeline.connections_into_port(id, port).count())
        .unwrap_or(0);
    if generic_in.is_some() && generic_count > 1 {
        verdict.set(
            HealthStatus::Sick,
            "more than one incoming stage connection",
        );
        return;
    }

    let mut units = HashSet::new();
    for connection in edges_into(PortType::Texture) {
        if let Some(unit) = connection.properties.uint(prop::TEXTURE_UNIT) {
            if !units.insert(unit) {
                verdict.set(
                    HealthStatus::Chilled,
                    format!("texture unit {unit} bound more than once"),
                );
                return;
            }
        }
    }

    if generic_in.is_some() && generic_count == 0 {
        verdict.set(HealthStatus::Chilled, "no incoming stage connection");
    }
}

fn visit_vertex_puller(pipeline: &Pipeline, block: &Block, verdict: &mut Verdict) {
    let id = block.id();
    let vertex_port = block.port_by_type(PortType::VertexData, PortDirection::Input);
    let vertex_count = vertex_port
        .map(|port| pipeline.connections_into_port(id, port).count())
        .unwrap_or(0);
    if vertex_count != 1 {
        verdict.set(
            HealthStatus::Sick,
            "vertex puller requires exactly one vertex data connection",
        );
        return;
    }
    let indexed_draw = pipeline
        .commands_for_block(id)
        .any(|command| command.is_indexed_draw());
    if indexed_draw {
        let index_count = block
            .port_by_type(PortType::Index, PortDirection::Input)
            .map(|port| pipeline.connections_into_port(id, port).count())
            .unwrap_or(0);
        if index_count == 0 {
            verdict.set(
                HealthStatus::Sick,
                "indexed draw requires an index list connection",
            );
        }
    }
}

fn visit_code_generator(pipeline: &Pipeline, id: BlockId, verdict: &mut Verdict) {
    let incoming: Vec<&Connection> = pipeline.connections_into_block(id).collect();
    if incoming.len() != 1 {
        verdict.set(
            HealthStatus::Sick,
            "code generator requires exactly one incoming connection",
        );
        return;
    }
    let source_kind = pipeline
        .block(incoming[0].from_block)
        .expect("connection endpoints must exist in the arena")
        .kind();
    if source_kind != BlockKind::FragmentTests {
        verdict.set(
            HealthStatus::Sick,
            "code generator input must originate from fragment tests",
        );
    }
}

fn visit_framebuffer(pipeline: &Pipeline, block: &Block, verdict: &mut Verdict) {
    let id = block.id();
    let pass_count = block
        .port_by_label("Pass In")
        .map(|port| pipeline.connections_into_port(id, port).count())
        .unwrap_or(0);
    let attachment_count = pipeline
        .connections_into_block(id)
        .filter(|c| {
            block
                .port(c.to_port)
                .is_some_and(|p| p.port_type == PortType::Attachment)
        })
        .count();
    if pass_count > 0 && attachment_count == 0 {
        verdict.set(HealthStatus::Sick, "framebuffer has no attachments");
    } else if pass_count > 1 {
        // Multiple passes into one framebuffer are still a beta
        // feature; keep the soft verdict.
        verdict.set(
            HealthStatus::Chilled,
            "multiple incoming passes are experimental",
        );
    }
}

fn visit_texture(pipeline: &Pipeline, block: &Block, verdict: &mut Verdict) {
    let file = block.properties.text(prop::SOURCE_FILE).unwrap_or_default();
    if file.is_empty() {
        return;
    }
    let source = ImageDataSource {
        path: PathBuf::from(&file),
        grid_cols: block.properties.uint(prop::GRID_COLS).unwrap_or(1),
        grid_rows: block.properties.uint(prop::GRID_ROWS).unwrap_or(1),
    };
    if !pipeline.image_cache().contains(&source.cache_key()) {
        verdict.set(HealthStatus::Chilled, format!("image not loaded: {file}"));
    }
}

fn visit_connection(
    pipeline: &Pipeline,
    connection: &Connection,
) -> (ConnectionId, HealthStatus, String) {
    let target = pipeline.target_version();
    let endpoints = [
        (connection.from_block, connection.from_port),
        (connection.to_block, connection.to_port),
    ];
    for (block_id, port_id) in endpoints {
        let port = pipeline
            .block(block_id)
            .and_then(|b| b.port(port_id))
            .expect("connection endpoints must exist in the arena");
        if !port.available_at(target) {
            return (
                connection.id(),
                HealthStatus::Sick,
                format!(
                    "connection uses port '{}' requiring version {}, pipeline targets {}",
                    port.label, port.min_version, target
                ),
            );
        }
    }
    (connection.id(), HealthStatus::Healthy, String::new())
}

fn visit_ports(pipeline: &Pipeline) -> Vec<(BlockId, PortId, HealthStatus, String)> {
    pipeline
        .blocks()
        .flat_map(|block| {
            block
                .ports()
                .map(move |(port_id, _)| (block.id(), port_id, HealthStatus::Healthy, String::new()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{DrawMode, RenderCommand};
    use crate::port::VERSION_330;
    use glpipe_property::Value;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("glpipe_graph=debug")
            .with_test_writer()
            .try_init();
    }

    fn connect_labels(
        pipeline: &mut Pipeline,
        from: BlockId,
        from_label: &str,
        to: BlockId,
        to_label: &str,
    ) -> ConnectionId {
        let from_port = pipeline
            .block(from)
            .unwrap()
            .port_by_label(from_label)
            .unwrap();
        let to_port = pipeline.block(to).unwrap().port_by_label(to_label).unwrap();
        pipeline.connect(from, from_port, to, to_port).unwrap()
    }

    /// Puller -> vertex shader -> rasterization -> fragment shader ->
    /// fragment tests, with a buffer feeding the puller.
    fn draw_chain(pipeline: &mut Pipeline) -> (BlockId, BlockId, BlockId, BlockId) {
        let buffer = pipeline.add_block(BlockKind::Buffer);
        let puller = pipeline.add_block(BlockKind::VertexPuller);
        let vs = pipeline.add_block(BlockKind::VertexShader);
        let raster = pipeline.add_block(BlockKind::Rasterization);
        let fs = pipeline.add_block(BlockKind::FragmentShader);
        let tests = pipeline.add_block(BlockKind::FragmentTests);
        connect_labels(pipeline, buffer, "Data Out", puller, "Vertex Data");
        connect_labels(pipeline, puller, "Assembly Out", vs, "Stage In");
        connect_labels(pipeline, vs, "Stage Out", raster, "Primitives In");
        connect_labels(pipeline, raster, "Fragments Out", fs, "Stage In");
        connect_labels(pipeline, fs, "Stage Out", tests, "Fragments In");
        (puller, vs, fs, tests)
    }

    #[test]
    fn test_orphaned_node_is_chilled() {
        init_tracing();
        let mut p = Pipeline::new();
        let camera = p.add_block(BlockKind::CameraControl);
        let report = p.validate();
        let block = p.block(camera).unwrap();
        assert_eq!(block.status(), HealthStatus::Chilled);
        assert!(block.status_message().contains("orphaned"));
        assert_eq!(report.pipeline_status, HealthStatus::Chilled);
    }

    #[test]
    fn test_buffer_with_one_consumer_is_healthy() {
        let mut p = Pipeline::new();
        let buffer = p.add_block(BlockKind::Buffer);
        let puller = p.add_block(BlockKind::VertexPuller);
        connect_labels(&mut p, buffer, "Data Out", puller, "Vertex Data");
        p.validate();
        assert_eq!(p.block(buffer).unwrap().status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_unconnected_buffer_is_healthy_not_orphaned() {
        let mut p = Pipeline::new();
        let buffer = p.add_block(BlockKind::Buffer);
        p.validate();
        // The buffer rule's else branch overwrites the orphan verdict.
        assert_eq!(p.block(buffer).unwrap().status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_two_buffers_feeding_one_port_are_sick() {
        let mut p = Pipeline::new();
        let a = p.add_block(BlockKind::Buffer);
        let b = p.add_block(BlockKind::Buffer);
        let puller = p.add_block(BlockKind::VertexPuller);
        connect_labels(&mut p, a, "Data Out", puller, "Vertex Data");
        connect_labels(&mut p, b, "Data Out", puller, "Vertex Data");
        p.validate();
        assert_eq!(p.block(a).unwrap().status(), HealthStatus::Sick);
        assert_eq!(p.block(b).unwrap().status(), HealthStatus::Sick);
        // The puller requires exactly one vertex data feeder as well.
        assert_eq!(p.block(puller).unwrap().status(), HealthStatus::Sick);
    }

    #[test]
    fn test_duplicate_texture_units_chill_the_shader() {
        let mut p = Pipeline::new();
        let (_, _, fs, _) = draw_chain(&mut p);
        let tex_a = p.add_block(BlockKind::Texture);
        let tex_b = p.add_block(BlockKind::Texture);
        let edge_a = connect_labels(&mut p, tex_a, "Texture Out", fs, "Textures");
        let edge_b = connect_labels(&mut p, tex_b, "Texture Out", fs, "Textures");
        for edge in [edge_a, edge_b] {
            p.connection_mut(edge)
                .unwrap()
                .properties
                .set_value(prop::TEXTURE_UNIT, Value::UInt(0))
                .unwrap();
        }
        // Unit 0 is the default on both edges already; make it explicit
        // and distinct names so only the unit rule fires.
        p.connection_mut(edge_a)
            .unwrap()
            .properties
            .set_value(prop::TEXTURE_NAME, Value::Text("diffuse".into()))
            .unwrap();
        p.connection_mut(edge_b)
            .unwrap()
            .properties
            .set_value(prop::TEXTURE_NAME, Value::Text("normal".into()))
            .unwrap();
        p.validate();
        let shader = p.block(fs).unwrap();
        assert_eq!(shader.status(), HealthStatus::Chilled);
        assert!(shader.status_message().contains("unit 0"));
    }

    #[test]
    fn test_duplicate_names_are_sick_and_not_overwritten() {
        let mut p = Pipeline::new();
        let (_, _, fs, _) = draw_chain(&mut p);
        let tex_a = p.add_block(BlockKind::Texture);
        let tex_b = p.add_block(BlockKind::Texture);
        let edge_a = connect_labels(&mut p, tex_a, "Texture Out", fs, "Textures");
        let edge_b = connect_labels(&mut p, tex_b, "Texture Out", fs, "Textures");
        // Duplicate units too: the name rule must win and stay.
        for edge in [edge_a, edge_b] {
            let properties = &mut p.connection_mut(edge).unwrap().properties;
            properties.set_value(prop::TEXTURE_UNIT, Value::UInt(0)).unwrap();
            properties
                .set_value(prop::TEXTURE_NAME, Value::Text("diffuse".into()))
                .unwrap();
        }
        p.validate();
        let shader = p.block(fs).unwrap();
        assert_eq!(shader.status(), HealthStatus::Sick);
        assert!(shader.status_message().contains("diffuse"));
    }

    #[test]
    fn test_shader_without_stage_input_is_chilled() {
        let mut p = Pipeline::new();
        let vs = p.add_block(BlockKind::VertexShader);
        let raster = p.add_block(BlockKind::Rasterization);
        connect_labels(&mut p, vs, "Stage Out", raster, "Primitives In");
        p.validate();
        let shader = p.block(vs).unwrap();
        assert_eq!(shader.status(), HealthStatus::Chilled);
        assert!(shader.status_message().contains("no incoming stage"));
    }

    #[test]
    fn test_shader_with_two_stage_inputs_is_sick() {
        let mut p = Pipeline::new();
        let puller_a = p.add_block(BlockKind::VertexPuller);
        let puller_b = p.add_block(BlockKind::VertexPuller);
        let vs = p.add_block(BlockKind::VertexShader);
        let raster = p.add_block(BlockKind::Rasterization);
        connect_labels(&mut p, puller_a, "Assembly Out", vs, "Stage In");
        connect_labels(&mut p, puller_b, "Assembly Out", vs, "Stage In");
        connect_labels(&mut p, vs, "Stage Out", raster, "Primitives In");
        p.validate();
        assert_eq!(p.block(vs).unwrap().status(), HealthStatus::Sick);
    }

    #[test]
    fn test_fixed_function_requires_exactly_one_incoming() {
        let mut p = Pipeline::new();
        let raster = p.add_block(BlockKind::Rasterization);
        let fs = p.add_block(BlockKind::FragmentShader);
        connect_labels(&mut p, raster, "Fragments Out", fs, "Stage In");
        p.validate();
        let block = p.block(raster).unwrap();
        assert_eq!(block.status(), HealthStatus::Sick);
        assert!(block.status_message().contains("exactly one incoming"));
    }

    #[test]
    fn test_code_generator_requires_fragment_tests_source() {
        let mut p = Pipeline::new();
        let generator = p.add_block(BlockKind::CodeGenerator);
        p.validate();
        assert_eq!(p.block(generator).unwrap().status(), HealthStatus::Sick);

        let (_, _, _, tests) = draw_chain(&mut p);
        connect_labels(&mut p, tests, "Stage Out", generator, "Pipeline In");
        p.validate();
        assert_eq!(p.block(generator).unwrap().status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_framebuffer_multi_pass_is_only_chilled() {
        let mut p = Pipeline::new();
        let fb = p.add_block(BlockKind::Framebuffer);
        let display = p.add_block(BlockKind::Display);
        let rb = p.add_block(BlockKind::RenderBuffer);
        connect_labels(&mut p, rb, "Attachment Out", fb, "Color Attachment");
        connect_labels(&mut p, fb, "Pass Out", display, "Image In");
        for _ in 0..2 {
            let (_, _, _, tests) = draw_chain(&mut p);
            connect_labels(&mut p, tests, "Stage Out", fb, "Pass In");
        }
        p.validate();
        let block = p.block(fb).unwrap();
        assert_eq!(block.status(), HealthStatus::Chilled);
        assert!(block.status_message().contains("experimental"));
    }

    #[test]
    fn test_framebuffer_pass_without_attachments_is_sick() {
        let mut p = Pipeline::new();
        let fb = p.add_block(BlockKind::Framebuffer);
        let display = p.add_block(BlockKind::Display);
        connect_labels(&mut p, fb, "Pass Out", display, "Image In");
        let (_, _, _, tests) = draw_chain(&mut p);
        connect_labels(&mut p, tests, "Stage Out", fb, "Pass In");
        p.validate();
        assert_eq!(p.block(fb).unwrap().status(), HealthStatus::Sick);
    }

    #[test]
    fn test_aggregate_is_the_maximum() {
        let mut p = Pipeline::new();
        // One orphan (chilled)...
        p.add_block(BlockKind::CameraControl);
        // ...and one sick fixed-function stage.
        let raster = p.add_block(BlockKind::Rasterization);
        let fs = p.add_block(BlockKind::FragmentShader);
        connect_labels(&mut p, raster, "Fragments Out", fs, "Stage In");
        let report = p.validate();
        assert_eq!(report.pipeline_status, HealthStatus::Sick);
        assert_eq!(report.worst_subject, Some(Subject::Block(raster)));
    }

    #[test]
    fn test_ties_keep_the_first_worst_subject() {
        let mut p = Pipeline::new();
        let first = p.add_block(BlockKind::CameraControl);
        p.add_block(BlockKind::CameraControl);
        let report = p.validate();
        assert_eq!(report.pipeline_status, HealthStatus::Chilled);
        assert_eq!(report.worst_subject, Some(Subject::Block(first)));
    }

    #[test]
    fn test_lowered_target_version_flags_connection() {
        let mut p = Pipeline::new();
        let buffer = p.add_block(BlockKind::Buffer);
        let cs = p.add_block(BlockKind::ComputeShader);
        let out_buffer = p.add_block(BlockKind::Buffer);
        let edge = connect_labels(&mut p, buffer, "Storage Out", cs, "Storage In");
        connect_labels(&mut p, cs, "Storage Out", out_buffer, "Storage In");
        assert_eq!(p.validate().pipeline_status, HealthStatus::Healthy);

        p.set_target_version(VERSION_330);
        let report = p.validate();
        assert_eq!(report.pipeline_status, HealthStatus::Sick);
        assert!(report
            .findings
            .iter()
            .any(|f| f.subject == Subject::Connection(edge)
                && f.message.contains("requiring version 430")));
    }

    #[test]
    fn test_indexed_draw_without_index_connection_is_sick() {
        let mut p = Pipeline::new();
        let (puller, _, _, _) = draw_chain(&mut p);
        p.add_command(RenderCommand::draw(puller, DrawMode::Triangles, true, 6))
            .unwrap();
        p.validate();
        let block = p.block(puller).unwrap();
        assert_eq!(block.status(), HealthStatus::Sick);
        assert!(block.status_message().contains("index list"));

        // Wiring an index buffer cures it.
        let index_buffer = p.add_block(BlockKind::Buffer);
        connect_labels(&mut p, index_buffer, "Data Out", puller, "Index List");
        p.validate();
        assert_eq!(p.block(puller).unwrap().status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_repeated_validation_is_deterministic() {
        let mut p = Pipeline::new();
        draw_chain(&mut p);
        p.add_block(BlockKind::CameraControl);
        let first = p.validate();
        let second = p.validate();
        assert_eq!(first, second);
    }
}

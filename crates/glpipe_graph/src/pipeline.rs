// SPDX-License-Identifier: MIT OR Apache-2.0
//! The pipeline graph container.

use crate::block::{prop, Block, BlockId, BlockKind};
use crate::cache::{CacheOutcome, CachePool, ImageData, ImageDataSource, ImageSizeDelegate, SizeAxis};
use crate::command::RenderCommand;
use crate::connection::{Connection, ConnectionId};
use crate::port::{FeatureVersion, PortDirection, PortId, VERSION_450};
use crate::status::HealthStatus;
use crate::validation::{ValidationReport, Validator};
use glpipe_property::{PropertyError, PropertyRecord, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Errors raised by the pipeline's connect operation.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// An endpoint block is not in the arena
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    /// An endpoint port is not on its block
    #[error("block {block} has no port {port:?}")]
    PortNotFound {
        /// Block looked up
        block: BlockId,
        /// Port looked up
        port: PortId,
    },

    /// The source port is not an output
    #[error("source port {0:?} is not an output")]
    NotAnOutput(PortId),

    /// The destination port is not an input
    #[error("destination port {0:?} is not an input")]
    NotAnInput(PortId),

    /// Both endpoints are on the same block
    #[error("connection endpoints must belong to different blocks")]
    SelfLoop,

    /// The identical edge already exists
    #[error("the two ports are already connected")]
    Duplicate(ConnectionId),

    /// A port requires a feature version above the pipeline target
    #[error("port {label} requires version {required}, pipeline targets {target}")]
    VersionGated {
        /// Port label
        label: String,
        /// Required minimum version
        required: FeatureVersion,
        /// Current pipeline target version
        target: FeatureVersion,
    },

    /// The source block's whitelist rejected the pairing
    #[error("{0}")]
    Denied(String),
}

/// Errors raised when assigning render commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The assigned block is not in the arena
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    /// The command kind cannot execute through the assigned block
    #[error("command cannot be assigned to a {0} block")]
    Incompatible(BlockKind),
}

/// Errors raised by pipeline-level property operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The block is not in the arena
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    /// The block has the wrong kind for the operation
    #[error("expected a {expected} block, found {found}")]
    WrongKind {
        /// Kind the operation needs
        expected: BlockKind,
        /// Kind actually found
        found: BlockKind,
    },

    /// Underlying property failure
    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// The pipeline graph: all blocks, connections and render commands,
/// plus the global target feature version and the derived-data cache.
///
/// Identifiers come from pipeline-owned monotonic counters and are
/// never reused. All mutation is serialized through `&mut self`; the
/// model is single-threaded by design.
#[derive(Debug)]
pub struct Pipeline {
    blocks: IndexMap<BlockId, Block>,
    connections: IndexMap<ConnectionId, Connection>,
    commands: Vec<RenderCommand>,
    next_block_id: u32,
    next_connection_id: u32,
    target_version: FeatureVersion,
    images: CachePool<ImageData>,
    validation_stale: bool,
}

impl Pipeline {
    /// Create an empty pipeline targeting the default feature version.
    pub fn new() -> Self {
        Self {
            blocks: IndexMap::new(),
            connections: IndexMap::new(),
            commands: Vec::new(),
            next_block_id: 1,
            next_connection_id: 1,
            target_version: VERSION_450,
            images: CachePool::new(),
            validation_stale: true,
        }
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Create, initialize and insert a block of the given kind.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        let mut block = Block::new(id, kind, format!("{} {}", kind.name(), id.0));
        block.initialize();
        tracing::debug!(block = %id, %kind, "block added");
        self.blocks.insert(id, block);
        self.validation_stale = true;
        id
    }

    /// Remove a block together with its incident connections and
    /// assigned commands.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.shift_remove(&id)?;
        self.connections.retain(|_, c| !c.involves_block(id));
        self.commands.retain(|c| c.block != id);
        self.validation_stale = true;
        tracing::debug!(block = %id, "block removed");
        Some(block)
    }

    /// Look up a block.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Look up a block, mutably.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }

    /// All blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Establish a connection after the full legality check.
    ///
    /// Rejection performs no mutation: the arena, both blocks and
    /// their properties are untouched. On success the source block's
    /// edge-preparation rule populates the new edge's property list.
    pub fn connect(
        &mut self,
        from_block: BlockId,
        from_port: PortId,
        to_block: BlockId,
        to_port: PortId,
    ) -> Result<ConnectionId, ConnectError> {
        let src = self
            .blocks
            .get(&from_block)
            .ok_or(ConnectError::BlockNotFound(from_block))?;
        let dst = self
            .blocks
            .get(&to_block)
            .ok_or(ConnectError::BlockNotFound(to_block))?;
        let src_port = src.port(from_port).ok_or(ConnectError::PortNotFound {
            block: from_block,
            port: from_port,
        })?;
        let dst_port = dst.port(to_port).ok_or(ConnectError::PortNotFound {
            block: to_block,
            port: to_port,
        })?;

        if src_port.direction != PortDirection::Output {
            return Err(ConnectError::NotAnOutput(from_port));
        }
        if dst_port.direction != PortDirection::Input {
            return Err(ConnectError::NotAnInput(to_port));
        }
        if from_block == to_block {
            return Err(ConnectError::SelfLoop);
        }
        if let Some(existing) = self.connections.values().find(|c| {
            c.from_block == from_block
                && c.from_port == from_port
                && c.to_block == to_block
                && c.to_port == to_port
        }) {
            return Err(ConnectError::Duplicate(existing.id()));
        }
        for port in [src_port, dst_port] {
            if !port.available_at(self.target_version) {
                return Err(ConnectError::VersionGated {
                    label: port.label.clone(),
                    required: port.min_version,
                    target: self.target_version,
                });
            }
        }
        src.can_accept_connection(from_port, dst.kind(), dst_port.port_type)
            .map_err(ConnectError::Denied)?;

        let src_type = src_port.port_type;
        let dst_type = dst_port.port_type;
        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        let mut connection = Connection::new(id, from_block, from_port, to_block, to_port);
        Block::prepare_connection(src_type, dst_type, &mut connection.properties);
        tracing::debug!(connection = %id, from = %from_block, to = %to_block, "connected");
        self.connections.insert(id, connection);
        self.validation_stale = true;
        Ok(id)
    }

    /// Remove a connection.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.shift_remove(&id);
        if removed.is_some() {
            tracing::debug!(connection = %id, "disconnected");
            self.validation_stale = true;
        }
        removed
    }

    /// Look up a connection.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Look up a connection, mutably.
    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections arriving at a block.
    pub fn connections_into_block(&self, block: BlockId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.to_block == block)
    }

    /// Connections leaving a block.
    pub fn connections_out_of_block(&self, block: BlockId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.from_block == block)
    }

    /// Connections arriving at one specific port.
    pub fn connections_into_port(
        &self,
        block: BlockId,
        port: PortId,
    ) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.to_block == block && c.to_port == port)
    }

    /// Connections leaving one specific port.
    pub fn connections_out_of_port(
        &self,
        block: BlockId,
        port: PortId,
    ) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.from_block == block && c.from_port == port)
    }

    // ------------------------------------------------------------------
    // Render commands
    // ------------------------------------------------------------------

    /// Append a render command after checking block compatibility.
    pub fn add_command(&mut self, command: RenderCommand) -> Result<(), CommandError> {
        let block = self
            .blocks
            .get(&command.block)
            .ok_or(CommandError::BlockNotFound(command.block))?;
        if !command.kind.compatible_with(block.kind()) {
            return Err(CommandError::Incompatible(block.kind()));
        }
        self.commands.push(command);
        self.validation_stale = true;
        Ok(())
    }

    /// Remove a command by position.
    pub fn remove_command(&mut self, index: usize) -> Option<RenderCommand> {
        if index >= self.commands.len() {
            return None;
        }
        self.validation_stale = true;
        Some(self.commands.remove(index))
    }

    /// All commands in execution order.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Commands assigned to a block.
    pub fn commands_for_block(&self, block: BlockId) -> impl Iterator<Item = &RenderCommand> {
        self.commands.iter().filter(move |c| c.block == block)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// The global target feature version.
    pub fn target_version(&self) -> FeatureVersion {
        self.target_version
    }

    /// Change the target feature version.
    ///
    /// Existing connections against now-gated ports are kept and
    /// flagged by the next validation run rather than silently
    /// dropped.
    pub fn set_target_version(&mut self, version: FeatureVersion) {
        if self.target_version != version {
            tracing::debug!(from = self.target_version, to = version, "target version changed");
            self.target_version = version;
            self.validation_stale = true;
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Assign a block property, folding the change notification into
    /// the validation-stale flag.
    pub fn set_property(
        &mut self,
        block: BlockId,
        id: &str,
        value: Value,
    ) -> Result<bool, PipelineError> {
        let b = self
            .blocks
            .get_mut(&block)
            .ok_or(PipelineError::BlockNotFound(block))?;
        let notified = b.properties.set_value(id, value)?;
        if notified {
            self.validation_stale = true;
        }
        Ok(notified)
    }

    /// Enter a batched property-update scope on a block.
    pub fn begin_property_update(&mut self, block: BlockId) -> Result<(), PipelineError> {
        self.blocks
            .get_mut(&block)
            .ok_or(PipelineError::BlockNotFound(block))?
            .properties
            .begin_update();
        Ok(())
    }

    /// Leave a batched property-update scope on a block. Returns
    /// whether the aggregate notification fired.
    pub fn end_property_update(
        &mut self,
        block: BlockId,
        apply: bool,
    ) -> Result<bool, PipelineError> {
        let fired = self
            .blocks
            .get_mut(&block)
            .ok_or(PipelineError::BlockNotFound(block))?
            .properties
            .end_update(apply);
        if fired {
            self.validation_stale = true;
        }
        Ok(fired)
    }

    // ------------------------------------------------------------------
    // Derived image data
    // ------------------------------------------------------------------

    /// Re-resolve a texture block's decoded image through the cache.
    ///
    /// The cache key is built from the block's file and grid
    /// properties, so any change to those inputs resolves under a new
    /// key. A failed load chills the block with a diagnostic and binds
    /// the computed size properties to the neutral empty image.
    pub fn refresh_texture_image(&mut self, block: BlockId) -> Result<CacheOutcome, PipelineError> {
        let b = self
            .blocks
            .get(&block)
            .ok_or(PipelineError::BlockNotFound(block))?;
        if b.kind() != BlockKind::Texture {
            return Err(PipelineError::WrongKind {
                expected: BlockKind::Texture,
                found: b.kind(),
            });
        }
        let source = ImageDataSource {
            path: PathBuf::from(b.properties.text(prop::SOURCE_FILE).unwrap_or_default()),
            grid_cols: b.properties.uint(prop::GRID_COLS).unwrap_or(1),
            grid_rows: b.properties.uint(prop::GRID_ROWS).unwrap_or(1),
        };
        let fetch = self.images.fetch(&source);

        let b = self
            .blocks
            .get_mut(&block)
            .expect("texture block present moments ago");
        if let CacheOutcome::Failed(message) = &fetch.outcome {
            b.set_status(HealthStatus::Chilled, message.clone());
        }
        for (id, axis) in [
            (prop::IMAGE_WIDTH, SizeAxis::Width),
            (prop::IMAGE_HEIGHT, SizeAxis::Height),
        ] {
            let property = b
                .properties
                .get_mut(id)
                .expect("texture blocks carry computed size properties");
            property.install_delegate(Box::new(ImageSizeDelegate::new(fetch.data.clone(), axis)));
        }
        self.validation_stale = true;
        Ok(fetch.outcome)
    }

    /// The image cache pool.
    pub fn image_cache(&self) -> &CachePool<ImageData> {
        &self.images
    }

    /// The image cache pool, mutably.
    pub fn image_cache_mut(&mut self) -> &mut CachePool<ImageData> {
        &mut self.images
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Whether graph or property mutations happened since the last
    /// validation run.
    pub fn is_validation_stale(&self) -> bool {
        self.validation_stale
    }

    /// Re-walk the whole graph, updating every block's status and
    /// computing the pipeline-wide aggregate.
    pub fn validate(&mut self) -> ValidationReport {
        let report = Validator::new().run(self);
        self.validation_stale = false;
        report
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------
// Document serialization
// ----------------------------------------------------------------------

#[derive(Serialize)]
struct PipelineDocRef<'a> {
    blocks: Vec<&'a Block>,
    connections: Vec<&'a Connection>,
    commands: &'a [RenderCommand],
    next_block_id: u32,
    next_connection_id: u32,
    target_version: FeatureVersion,
}

#[derive(Deserialize)]
struct PipelineDoc {
    blocks: Vec<Block>,
    connections: Vec<ConnectionDoc>,
    commands: Vec<RenderCommand>,
    next_block_id: u32,
    next_connection_id: u32,
    target_version: FeatureVersion,
}

#[derive(Deserialize)]
struct ConnectionDoc {
    id: ConnectionId,
    from_block: BlockId,
    from_port: PortId,
    to_block: BlockId,
    to_port: PortId,
    properties: Vec<PropertyRecord>,
}

impl Serialize for Pipeline {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PipelineDocRef {
            blocks: self.blocks.values().collect(),
            connections: self.connections.values().collect(),
            commands: &self.commands,
            next_block_id: self.next_block_id,
            next_connection_id: self.next_connection_id,
            target_version: self.target_version,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pipeline {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let doc = PipelineDoc::deserialize(deserializer)?;
        let mut pipeline = Pipeline::new();
        pipeline.next_block_id = doc.next_block_id;
        pipeline.next_connection_id = doc.next_connection_id;
        pipeline.target_version = doc.target_version;
        for block in doc.blocks {
            pipeline.blocks.insert(block.id(), block);
        }
        for doc_edge in doc.connections {
            let src = pipeline
                .blocks
                .get(&doc_edge.from_block)
                .ok_or_else(|| D::Error::custom("connection references a missing source block"))?;
            let dst = pipeline
                .blocks
                .get(&doc_edge.to_block)
                .ok_or_else(|| D::Error::custom("connection references a missing target block"))?;
            let src_type = src
                .port(doc_edge.from_port)
                .ok_or_else(|| D::Error::custom("connection references a missing source port"))?
                .port_type;
            let dst_type = dst
                .port(doc_edge.to_port)
                .ok_or_else(|| D::Error::custom("connection references a missing target port"))?
                .port_type;
            let mut connection = Connection::new(
                doc_edge.id,
                doc_edge.from_block,
                doc_edge.from_port,
                doc_edge.to_block,
                doc_edge.to_port,
            );
            Block::prepare_connection(src_type, dst_type, &mut connection.properties);
            connection
                .properties
                .apply_records(&doc_edge.properties)
                .map_err(D::Error::custom)?;
            pipeline.connections.insert(doc_edge.id, connection);
        }
        for command in doc.commands {
            if !pipeline.blocks.contains_key(&command.block) {
                return Err(D::Error::custom("command references a missing block"));
            }
            pipeline.commands.push(command);
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DrawMode;
    use crate::port::VERSION_330;

    fn connected_pair(
        pipeline: &mut Pipeline,
        from_kind: BlockKind,
        from_label: &str,
        to_kind: BlockKind,
        to_label: &str,
    ) -> (BlockId, BlockId, ConnectionId) {
        let from = pipeline.add_block(from_kind);
        let to = pipeline.add_block(to_kind);
        let from_port = pipeline.block(from).unwrap().port_by_label(from_label).unwrap();
        let to_port = pipeline.block(to).unwrap().port_by_label(to_label).unwrap();
        let id = pipeline.connect(from, from_port, to, to_port).unwrap();
        (from, to, id)
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut p = Pipeline::new();
        let a = p.add_block(BlockKind::Buffer);
        p.remove_block(a);
        let b = p.add_block(BlockKind::Buffer);
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_connect_populates_edge_properties() {
        let mut p = Pipeline::new();
        let (_, _, id) = connected_pair(
            &mut p,
            BlockKind::Texture,
            "Texture Out",
            BlockKind::FragmentShader,
            "Textures",
        );
        let edge = p.connection(id).unwrap();
        assert!(edge.properties.get(prop::TEXTURE_UNIT).is_some());
        assert!(edge.properties.get(prop::TEXTURE_NAME).is_some());
    }

    #[test]
    fn test_rejected_connect_mutates_nothing() {
        let mut p = Pipeline::new();
        let buffer = p.add_block(BlockKind::Buffer);
        let display = p.add_block(BlockKind::Display);
        let out = p.block(buffer).unwrap().port_by_label("Data Out").unwrap();
        let image_in = p.block(display).unwrap().port_by_label("Image In").unwrap();
        let err = p.connect(buffer, out, display, image_in).unwrap_err();
        assert!(matches!(err, ConnectError::Denied(_)));
        assert_eq!(p.connection_count(), 0);
    }

    #[test]
    fn test_duplicate_connection_is_rejected() {
        let mut p = Pipeline::new();
        let (from, to, _) = connected_pair(
            &mut p,
            BlockKind::Buffer,
            "Data Out",
            BlockKind::VertexPuller,
            "Vertex Data",
        );
        let from_port = p.block(from).unwrap().port_by_label("Data Out").unwrap();
        let to_port = p.block(to).unwrap().port_by_label("Vertex Data").unwrap();
        assert!(matches!(
            p.connect(from, from_port, to, to_port),
            Err(ConnectError::Duplicate(_))
        ));
    }

    #[test]
    fn test_gated_port_rejects_connect_under_low_target() {
        let mut p = Pipeline::new();
        p.set_target_version(VERSION_330);
        let buffer = p.add_block(BlockKind::Buffer);
        let shader = p.add_block(BlockKind::FragmentShader);
        let storage_out = p.block(buffer).unwrap().port_by_label("Storage Out").unwrap();
        let storage_in = p.block(shader).unwrap().port_by_label("Storage In").unwrap();
        assert!(matches!(
            p.connect(buffer, storage_out, shader, storage_in),
            Err(ConnectError::VersionGated { required: 430, .. })
        ));
    }

    #[test]
    fn test_remove_block_cascades() {
        let mut p = Pipeline::new();
        let (from, to, _) = connected_pair(
            &mut p,
            BlockKind::Buffer,
            "Data Out",
            BlockKind::VertexPuller,
            "Vertex Data",
        );
        p.add_command(RenderCommand::draw(to, DrawMode::Triangles, false, 3))
            .unwrap();
        p.remove_block(to);
        assert_eq!(p.connection_count(), 0);
        assert!(p.commands().is_empty());
        assert!(p.block(from).is_some());
    }

    #[test]
    fn test_draw_command_rejected_on_wrong_block() {
        let mut p = Pipeline::new();
        let fb = p.add_block(BlockKind::Framebuffer);
        let err = p
            .add_command(RenderCommand::draw(fb, DrawMode::Triangles, false, 3))
            .unwrap_err();
        assert!(matches!(err, CommandError::Incompatible(BlockKind::Framebuffer)));
    }

    #[test]
    fn test_property_edits_mark_validation_stale() {
        let mut p = Pipeline::new();
        let texture = p.add_block(BlockKind::Texture);
        p.validate();
        assert!(!p.is_validation_stale());
        p.set_property(texture, prop::GRID_COLS, Value::UInt(2)).unwrap();
        assert!(p.is_validation_stale());
    }

    #[test]
    fn test_batched_property_edits_notify_once() {
        let mut p = Pipeline::new();
        let texture = p.add_block(BlockKind::Texture);
        p.begin_property_update(texture).unwrap();
        p.set_property(texture, prop::GRID_COLS, Value::UInt(2)).unwrap();
        p.set_property(texture, prop::GRID_ROWS, Value::UInt(3)).unwrap();
        assert!(p.end_property_update(texture, true).unwrap());
        let list = &p.block(texture).unwrap().properties;
        assert_eq!(list.notification_count(), 1);
    }

    #[test]
    fn test_document_round_trip() {
        let mut p = Pipeline::new();
        let (from, to, edge) = connected_pair(
            &mut p,
            BlockKind::Texture,
            "Texture Out",
            BlockKind::FragmentShader,
            "Textures",
        );
        p.connection_mut(edge)
            .unwrap()
            .properties
            .set_value(prop::TEXTURE_UNIT, Value::UInt(3))
            .unwrap();
        p.set_property(from, prop::SOURCE_FILE, Value::Text("photo.png".into()))
            .unwrap();
        p.set_target_version(430);

        let text = ron::to_string(&p).unwrap();
        let back: Pipeline = ron::from_str(&text).unwrap();
        assert_eq!(back.block_count(), 2);
        assert_eq!(back.connection_count(), 1);
        assert_eq!(back.target_version(), 430);
        assert_eq!(
            back.block(from).unwrap().properties.text(prop::SOURCE_FILE),
            Some("photo.png".to_string())
        );
        let edge = back.connection(edge).unwrap();
        assert_eq!(edge.properties.uint(prop::TEXTURE_UNIT), Some(3));
        // Empty-text edge properties were rebuilt by edge preparation.
        assert!(edge.properties.get(prop::TEXTURE_NAME).is_some());
        assert!(back.block(to).unwrap().port_by_label("Textures").is_some());
    }

    #[test]
    fn test_refresh_texture_image_resolves_size_properties() {
        let path = std::env::temp_dir().join("glpipe_pipeline_tex.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([0, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let mut p = Pipeline::new();
        let texture = p.add_block(BlockKind::Texture);
        p.set_property(
            texture,
            prop::SOURCE_FILE,
            Value::Text(path.display().to_string()),
        )
        .unwrap();
        let outcome = p.refresh_texture_image(texture).unwrap();
        assert_eq!(outcome, CacheOutcome::Loaded);
        let block = p.block(texture).unwrap();
        assert_eq!(block.properties.value(prop::IMAGE_WIDTH), Some(Value::UInt(8)));
        assert_eq!(block.properties.value(prop::IMAGE_HEIGHT), Some(Value::UInt(4)));
    }

    #[test]
    fn test_refresh_texture_image_failure_chills_block() {
        let mut p = Pipeline::new();
        let texture = p.add_block(BlockKind::Texture);
        p.set_property(
            texture,
            prop::SOURCE_FILE,
            Value::Text("/missing/void.png".into()),
        )
        .unwrap();
        let outcome = p.refresh_texture_image(texture).unwrap();
        assert!(matches!(outcome, CacheOutcome::Failed(_)));
        let block = p.block(texture).unwrap();
        assert_eq!(block.status(), HealthStatus::Chilled);
        assert!(!block.status_message().is_empty());
        // Dependents see the neutral empty image, not an absent value.
        assert_eq!(block.properties.value(prop::IMAGE_WIDTH), Some(Value::UInt(0)));
    }
}

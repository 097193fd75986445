// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline-scoped render commands.

use crate::block::{BlockId, BlockKind};
use serde::{Deserialize, Serialize};

/// Primitive assembly mode of a draw command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    /// Point primitives
    Points,
    /// Line primitives
    Lines,
    /// Triangle primitives
    Triangles,
    /// Tessellation patches
    Patches,
}

/// What a render command does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Issue a draw call through a vertex puller
    Draw {
        /// Primitive mode
        mode: DrawMode,
        /// Whether the draw reads an element index list
        indexed: bool,
        /// Vertex or index count
        count: u32,
    },
    /// Clear a render target
    Clear {
        /// Clear color
        color: [f32; 4],
        /// Clear the depth buffer
        depth: bool,
        /// Clear the stencil buffer
        stencil: bool,
    },
}

impl CommandKind {
    /// Whether a command of this kind may be assigned to a block of
    /// the given kind.
    pub fn compatible_with(&self, kind: BlockKind) -> bool {
        match self {
            Self::Draw { .. } => kind == BlockKind::VertexPuller,
            Self::Clear { .. } => matches!(kind, BlockKind::Framebuffer | BlockKind::Display),
        }
    }
}

/// An ordered, pipeline-scoped operation assigned to exactly one
/// compatible block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderCommand {
    /// The operation
    pub kind: CommandKind,
    /// The block the command executes through
    pub block: BlockId,
}

impl RenderCommand {
    /// Create a draw command.
    pub fn draw(block: BlockId, mode: DrawMode, indexed: bool, count: u32) -> Self {
        Self {
            kind: CommandKind::Draw { mode, indexed, count },
            block,
        }
    }

    /// Create a clear command.
    pub fn clear(block: BlockId, color: [f32; 4], depth: bool, stencil: bool) -> Self {
        Self {
            kind: CommandKind::Clear { color, depth, stencil },
            block,
        }
    }

    /// Whether this is an indexed draw.
    pub fn is_indexed_draw(&self) -> bool {
        matches!(self.kind, CommandKind::Draw { indexed: true, .. })
    }
}

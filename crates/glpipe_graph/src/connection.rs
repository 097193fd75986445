// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the pipeline graph.

use crate::block::BlockId;
use crate::port::PortId;
use glpipe_property::PropertyList;
use serde::{Deserialize, Serialize};

/// Stable identifier of a connection, allocated by the pipeline's
/// monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "~{}", self.0)
    }
}

/// A directed edge between two ports, owned exclusively by the
/// pipeline arena.
///
/// The edge carries its own property list for edge-scoped
/// configuration (texture unit, attachment point, binding index, ...),
/// populated lazily when the connection is established.
#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    id: ConnectionId,
    /// Source block
    pub from_block: BlockId,
    /// Source port on the source block
    pub from_port: PortId,
    /// Destination block
    pub to_block: BlockId,
    /// Destination port on the destination block
    pub to_port: PortId,
    /// Edge-scoped configuration
    pub properties: PropertyList,
}

impl Connection {
    /// Create a connection between two ports.
    pub fn new(
        id: ConnectionId,
        from_block: BlockId,
        from_port: PortId,
        to_block: BlockId,
        to_port: PortId,
    ) -> Self {
        Self {
            id,
            from_block,
            from_port,
            to_block,
            to_port,
            properties: PropertyList::new(),
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether either endpoint belongs to a block.
    pub fn involves_block(&self, block: BlockId) -> bool {
        self.from_block == block || self.to_block == block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves_block() {
        let c = Connection::new(ConnectionId(1), BlockId(2), PortId(0), BlockId(3), PortId(1));
        assert!(c.involves_block(BlockId(2)));
        assert!(c.involves_block(BlockId(3)));
        assert!(!c.involves_block(BlockId(4)));
    }
}

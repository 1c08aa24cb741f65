use ripd_common::NodeId;

use crate::error::TableError;

pub const SEND_PORT_MIN: u16 = 1024;
pub const SEND_PORT_MAX: u16 = 64_000;
pub const LINK_COST_MIN: u8 = 1;
pub const LINK_COST_MAX: u8 = 16;

/// A configured neighbor: the UDP port it listens on, the direct link cost to reach it, and
/// its node identifier. Immutable once the daemon starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborDescriptor {
    pub send_port: u16,
    pub link_cost: u8,
    pub neighbor_id: NodeId,
}

impl NeighborDescriptor {
    pub fn new(send_port: u16, link_cost: u8, neighbor_id: NodeId) -> Result<Self, TableError> {
        if send_port < SEND_PORT_MIN || send_port > SEND_PORT_MAX {
            return Err(TableError::SendPortOutOfRange(send_port));
        }
        if link_cost < LINK_COST_MIN || link_cost > LINK_COST_MAX {
            return Err(TableError::LinkCostOutOfRange(link_cost));
        }
        Ok(Self {
            send_port,
            link_cost,
            neighbor_id,
        })
    }
}

impl TryFrom<(u16, u8, NodeId)> for NeighborDescriptor {
    type Error = TableError;

    fn try_from((send_port, link_cost, neighbor_id): (u16, u8, NodeId)) -> Result<Self, Self::Error> {
        Self::new(send_port, link_cost, neighbor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u32) -> NodeId {
        NodeId::new(value).unwrap()
    }

    #[test]
    fn accepts_boundary_ports() {
        assert!(NeighborDescriptor::new(SEND_PORT_MIN, 1, id(2)).is_ok());
        assert!(NeighborDescriptor::new(SEND_PORT_MAX, 1, id(2)).is_ok());
    }

    #[test]
    fn rejects_port_below_min() {
        assert!(matches!(
            NeighborDescriptor::new(1023, 1, id(2)),
            Err(TableError::SendPortOutOfRange(1023))
        ));
    }

    #[test]
    fn rejects_port_above_max() {
        assert!(matches!(
            NeighborDescriptor::new(64_001, 1, id(2)),
            Err(TableError::SendPortOutOfRange(64_001))
        ));
    }
}

#![no_std]

use core::fmt::{
    Debug,
    Display,
    Formatter,
};
use core::num::ParseIntError;
use core::str::FromStr;
use thiserror::Error;

/// Lowest and highest identifiers a node may be configured with, per the
/// wire format's 16-bit sender field and the configuration record's range
/// checks.
pub const NODE_ID_MIN: u32 = 1;
pub const NODE_ID_MAX: u32 = 64_000;

/// Routes to the node itself are held at metric 0; 16 means unreachable.
pub const METRIC_SELF: u8 = 0;
pub const METRIC_INFINITY: u8 = 16;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("node id {0} is out of range [{NODE_ID_MIN}, {NODE_ID_MAX}]")]
    NodeIdOutOfRange(u32),
    #[error("unable to parse integer => '{0}'")]
    IntParse(#[from] ParseIntError),
}

/// A validated node identifier, shared by the codec, the routing table and
/// the configuration loader so that an out-of-range value can never enter
/// the system silently.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone, Copy)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(value: u32) -> Result<Self, CommonError> {
        if (NODE_ID_MIN..=NODE_ID_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CommonError::NodeIdOutOfRange(value))
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for NodeId {
    type Err = CommonError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Self::new(string.parse::<u32>()?)
    }
}

impl TryFrom<u32> for NodeId {
    type Error = CommonError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeId> for u32 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

impl Debug for NodeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> core::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl Display for NodeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> core::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert!(NodeId::new(1).is_ok());
        assert!(NodeId::new(64_000).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(NodeId::new(0).is_err());
        assert!(NodeId::new(64_001).is_err());
    }

    #[test]
    fn parses_from_str() {
        let id: NodeId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
    }
}

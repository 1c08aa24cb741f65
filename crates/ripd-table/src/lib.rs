//! The routing table component of the daemon: the in-memory route store, its update algorithm
//! (distance-vector relaxation under split horizon with poisoned reverse), and the three
//! timers (TIMEOUT, GARBAGECOLLECTION, periodic UPDATE) that drive its lifecycle.
//!
//! All mutation is expected to come from a single task. Timers never call back into the table
//! directly -- they post a [`timer::TableEvent`] onto an `mpsc` channel that one event loop
//! drains, so there is never more than one `&mut RoutingTable` in flight and no mutex is
//! needed. Stale timer firings (an entry already moved on by the time a delayed event is
//! processed) are tolerated as no-ops rather than guarded against with extra coordination.

pub mod error;
pub mod neighbor;
pub mod table;
pub mod timer;

pub use error::TableError;
pub use neighbor::NeighborDescriptor;
pub use table::{RoutingTable, SnapshotRow, Transport};
pub use timer::{TableEvent, TimerConstants, TimerHandle, TimerKind};

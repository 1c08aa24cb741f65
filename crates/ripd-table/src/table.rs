use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use ripd_common::{NodeId, METRIC_INFINITY, METRIC_SELF};
use ripd_proto::RouteAdvertisement;
use tokio::sync::mpsc;

use crate::neighbor::NeighborDescriptor;
use crate::timer::{TableEvent, TimerConstants, TimerHandle, TimerKind};

/// Destination for an outbound datagram. Implementations are expected to be fire-and-forget:
/// a send failure is logged and swallowed by the implementation, since the next periodic tick
/// will simply retry.
pub trait Transport: Send + Sync {
    fn send_to(&self, port: u16, datagram: &[u8]);
}

struct RouteEntry {
    destination: u32,
    metric: u8,
    next_hop: u32,
    #[allow(dead_code)]
    change_flag: bool,
    timer: Option<TimerHandle>,
}

/// A read-only row of table state, as surfaced to the daemon's snapshot renderer.
pub struct SnapshotRow {
    pub destination: u32,
    pub metric: u8,
    pub next_hop: u32,
    pub timer_kind: Option<TimerKind>,
    pub timer_elapsed: Duration,
}

/// The routing table for a single node. Every mutating method assumes it is the only thing
/// ever calling into it -- callers are expected to serialize access through one task (see the
/// daemon's event loop), not to guard this type with a mutex.
pub struct RoutingTable {
    self_id: NodeId,
    neighbors: Vec<NeighborDescriptor>,
    entries: BTreeMap<u32, RouteEntry>,
    events_tx: mpsc::UnboundedSender<TableEvent>,
    transport: Arc<dyn Transport>,
    constants: TimerConstants,
    update_timer: Option<TimerHandle>,
}

impl RoutingTable {
    pub fn new(
        self_id: NodeId,
        neighbors: Vec<NeighborDescriptor>,
        transport: Arc<dyn Transport>,
        constants: TimerConstants,
        events_tx: mpsc::UnboundedSender<TableEvent>,
    ) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            self_id.get(),
            RouteEntry {
                destination: self_id.get(),
                metric: METRIC_SELF,
                next_hop: 0,
                change_flag: false,
                timer: None,
            },
        );

        for neighbor in &neighbors {
            let dest = neighbor.neighbor_id.get();
            let timer = TimerHandle::spawn(
                TimerKind::Timeout,
                constants.timeout,
                TableEvent::Timeout(dest),
                events_tx.clone(),
            );
            entries.insert(
                dest,
                RouteEntry {
                    destination: dest,
                    metric: neighbor.link_cost,
                    next_hop: dest,
                    change_flag: false,
                    timer: Some(timer),
                },
            );
        }

        let update_delay = constants.jittered_update();
        let update_timer = TimerHandle::spawn(
            TimerKind::Update,
            update_delay,
            TableEvent::PeriodicUpdate,
            events_tx.clone(),
        );

        info!(
            "routing table initialized for node {self_id} with {} neighbor(s)",
            neighbors.len()
        );

        Self {
            self_id,
            neighbors,
            entries,
            events_tx,
            transport,
            constants,
            update_timer: Some(update_timer),
        }
    }

    fn cost_via(&self, sender_id: NodeId) -> u8 {
        self.entries.get(&sender_id.get()).map(|e| e.metric).unwrap_or(0)
    }

    fn link_cost_to(&self, neighbor_id: NodeId) -> u8 {
        self.neighbors
            .iter()
            .find(|n| n.neighbor_id == neighbor_id)
            .map(|n| n.link_cost)
            .unwrap_or(METRIC_INFINITY)
    }

    fn reset_timer(&mut self, d: u32, kind: TimerKind, delay: Duration) {
        let event = match kind {
            TimerKind::Timeout => TableEvent::Timeout(d),
            TimerKind::Garbage => TableEvent::Garbage(d),
            TimerKind::Update => unreachable!("per-entry timers are never Update"),
        };
        if let Some(entry) = self.entries.get_mut(&d) {
            if let Some(old) = entry.timer.take() {
                old.cancel();
            }
            entry.timer = Some(TimerHandle::spawn(kind, delay, event, self.events_tx.clone()));
        }
    }

    fn poison_route(&mut self, d: u32) {
        if let Some(entry) = self.entries.get_mut(&d) {
            entry.metric = METRIC_INFINITY;
        }
        self.reset_timer(d, TimerKind::Garbage, self.constants.garbage);
    }

    fn update_route_metric(&mut self, d: u32, metric: u8, next_hop: u32) {
        if let Some(entry) = self.entries.get_mut(&d) {
            entry.metric = metric;
            entry.next_hop = next_hop;
        }
        self.reset_timer(d, TimerKind::Timeout, self.constants.timeout);
    }

    fn insert_new_route(&mut self, d: u32, metric: u8, next_hop: u32) {
        let timer = TimerHandle::spawn(
            TimerKind::Timeout,
            self.constants.timeout,
            TableEvent::Timeout(d),
            self.events_tx.clone(),
        );
        self.entries.insert(
            d,
            RouteEntry {
                destination: d,
                metric,
                next_hop,
                change_flag: false,
                timer: Some(timer),
            },
        );
    }

    /// Applies one neighbor's advertisement to the table, per the decision table described in
    /// the crate-level docs. Destinations equal to this node's own id are ignored.
    pub fn apply_advertisement(&mut self, sender_id: NodeId, advertised: &[RouteAdvertisement]) {
        for entry in advertised {
            let d = entry.destination;
            if d == self.self_id.get() {
                continue;
            }

            let cost_via_sender = self.cost_via(sender_id);
            let new_metric =
                ((entry.metric as u32 + cost_via_sender as u32).min(METRIC_INFINITY as u32)) as u8;

            let present = self.entries.contains_key(&d);
            if !present {
                if new_metric < METRIC_INFINITY {
                    self.insert_new_route(d, new_metric, sender_id.get());
                }
                continue;
            }

            self.apply_to_existing(d, sender_id, entry.metric, new_metric);
        }
    }

    fn apply_to_existing(&mut self, d: u32, sender_id: NodeId, advertised_metric: u8, new_metric: u8) {
        let sender = sender_id.get();
        let (route_metric, route_next_hop) = {
            let route = self.entries.get(&d).expect("caller checked presence");
            (route.metric, route.next_hop)
        };

        if sender == d {
            // Direct refresh from the destination itself: leave metric and next hop alone.
            // Guarded by route_metric < INFINITY (see Q5 in DESIGN.md) so a still-draining
            // GARBAGE entry doesn't get flipped back to a TIMEOUT timer while it is still
            // advertised as unreachable, which would violate I3.
            if route_metric < METRIC_INFINITY {
                self.reset_timer(d, TimerKind::Timeout, self.constants.timeout);
            }
            return;
        }

        if sender == route_next_hop {
            if advertised_metric == route_metric {
                if route_metric < METRIC_INFINITY {
                    self.reset_timer(d, TimerKind::Timeout, self.constants.timeout);
                }
                // else: already GARBAGE and re-advertised as unreachable again, no-op.
            } else if route_metric < METRIC_INFINITY && advertised_metric >= METRIC_INFINITY {
                self.poison_route(d);
            } else {
                // advertised_metric < INFINITY: accept it (also revives a GARBAGE entry).
                self.update_route_metric(d, new_metric, sender);
            }
            return;
        }

        if new_metric < route_metric {
            self.update_route_metric(d, new_metric, sender);
        }
    }

    /// Called by the event loop when a TIMEOUT timer fires. A stale firing -- the entry was
    /// already removed or moved onto a different timer kind by the time this runs -- is a
    /// no-op, tolerating the cancellation race described in the crate docs.
    pub fn on_timeout(&mut self, d: u32) {
        let is_current = matches!(
            self.entries.get(&d).and_then(|e| e.timer.as_ref()).map(TimerHandle::kind),
            Some(TimerKind::Timeout)
        );
        if !is_current {
            return;
        }
        self.poison_route(d);
        info!("route to {d} timed out, advertising as unreachable");
        self.send_periodic();
    }

    /// Called by the event loop when a GARBAGE timer fires. Same stale-firing tolerance as
    /// [`on_timeout`](Self::on_timeout).
    pub fn on_garbage(&mut self, d: u32) {
        let is_current = matches!(
            self.entries.get(&d).and_then(|e| e.timer.as_ref()).map(TimerHandle::kind),
            Some(TimerKind::Garbage)
        );
        if is_current {
            self.entries.remove(&d);
            info!("garbage-collected route to {d}");
        }
    }

    /// Computes the advertisement to send to one neighbor: split horizon with poisoned
    /// reverse (any entry whose next hop is that neighbor is reported as unreachable), and the
    /// self-entry reported at the direct link cost to that neighbor rather than 0.
    pub fn advertised_entries(&self, neighbor_id: NodeId) -> Vec<RouteAdvertisement> {
        self.entries
            .values()
            .map(|entry| {
                let metric = if entry.next_hop == neighbor_id.get() {
                    METRIC_INFINITY
                } else if entry.destination == self.self_id.get() {
                    self.link_cost_to(neighbor_id)
                } else {
                    entry.metric
                };
                RouteAdvertisement {
                    destination: entry.destination,
                    metric,
                }
            })
            .collect()
    }

    /// Sends an advertisement to every configured neighbor and reschedules the next periodic
    /// tick with a fresh jittered delay. Also the triggered-update path: [`on_timeout`] calls
    /// this directly so poisoning propagates within one TIMEOUT rather than one UPDATE period.
    pub fn send_periodic(&mut self) {
        for neighbor in &self.neighbors {
            let entries = self.advertised_entries(neighbor.neighbor_id);
            let datagram = ripd_proto::encode_response(self.self_id, &entries);
            self.transport.send_to(neighbor.send_port, &datagram);
        }
        self.reschedule_update();
    }

    fn reschedule_update(&mut self) {
        if let Some(old) = self.update_timer.take() {
            old.cancel();
        }
        let delay = self.constants.jittered_update();
        self.update_timer = Some(TimerHandle::spawn(
            TimerKind::Update,
            delay,
            TableEvent::PeriodicUpdate,
            self.events_tx.clone(),
        ));
    }

    /// A read-only, destination-sorted view of the table, for logging/rendering.
    pub fn snapshot(&self) -> Vec<SnapshotRow> {
        self.entries
            .values()
            .map(|entry| SnapshotRow {
                destination: entry.destination,
                metric: entry.metric,
                next_hop: entry.next_hop,
                timer_kind: entry.timer.as_ref().map(TimerHandle::kind),
                timer_elapsed: entry.timer.as_ref().map(TimerHandle::elapsed).unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ripd_common::NodeId;

    use super::*;

    struct RecordingTransport {
        sent: Mutex<Vec<(u16, Vec<u8>)>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for RecordingTransport {
        fn send_to(&self, port: u16, datagram: &[u8]) {
            self.sent.lock().unwrap().push((port, datagram.to_vec()));
        }
    }

    fn id(value: u32) -> NodeId {
        NodeId::new(value).unwrap()
    }

    fn fast_constants() -> TimerConstants {
        TimerConstants {
            update: Duration::from_millis(50),
            timeout: Duration::from_millis(100),
            garbage: Duration::from_millis(100),
        }
    }

    fn table_with_one_neighbor() -> (RoutingTable, mpsc::UnboundedReceiver<TableEvent>, Arc<RecordingTransport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(RecordingTransport::new());
        let neighbor = NeighborDescriptor::new(5002, 3, id(2)).unwrap();
        let table = RoutingTable::new(id(1), vec![neighbor], transport.clone(), fast_constants(), tx);
        (table, rx, transport)
    }

    #[tokio::test]
    async fn startup_learns_direct_neighbor() {
        let (table, _rx, _transport) = table_with_one_neighbor();
        let rows = table.snapshot();
        assert_eq!(rows.len(), 2);
        let neighbor_row = rows.iter().find(|r| r.destination == 2).unwrap();
        assert_eq!(neighbor_row.metric, 3);
        assert_eq!(neighbor_row.next_hop, 2);
        assert_eq!(neighbor_row.timer_kind, Some(TimerKind::Timeout));
    }

    #[tokio::test]
    async fn transitive_route_is_relaxed_through_neighbor() {
        let (mut table, _rx, _transport) = table_with_one_neighbor();
        table.apply_advertisement(id(2), &[RouteAdvertisement { destination: 3, metric: 4 }]);
        let rows = table.snapshot();
        let row = rows.iter().find(|r| r.destination == 3).unwrap();
        assert_eq!(row.metric, 7);
        assert_eq!(row.next_hop, 2);
    }

    #[tokio::test]
    async fn split_horizon_poisons_reverse_path() {
        let (mut table, _rx, _transport) = table_with_one_neighbor();
        table.apply_advertisement(id(2), &[RouteAdvertisement { destination: 3, metric: 4 }]);
        let advertisement = table.advertised_entries(id(2));
        let reverse = advertisement.iter().find(|e| e.destination == 3).unwrap();
        assert_eq!(reverse.metric, METRIC_INFINITY);
        let self_entry = advertisement.iter().find(|e| e.destination == 1).unwrap();
        assert_eq!(self_entry.metric, 3);
    }

    #[tokio::test]
    async fn better_path_is_adopted() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let transport = Arc::new(RecordingTransport::new());
        let neighbors = vec![
            NeighborDescriptor::new(5002, 3, id(2)).unwrap(),
            NeighborDescriptor::new(5003, 2, id(4)).unwrap(),
        ];
        let mut table = RoutingTable::new(id(1), neighbors, transport, fast_constants(), tx);
        table.apply_advertisement(id(2), &[RouteAdvertisement { destination: 3, metric: 4 }]);
        table.apply_advertisement(id(4), &[RouteAdvertisement { destination: 3, metric: 3 }]);
        let rows = table.snapshot();
        let row = rows.iter().find(|r| r.destination == 3).unwrap();
        assert_eq!(row.metric, 5);
        assert_eq!(row.next_hop, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_poisons_and_garbage_collects() {
        let (mut table, mut rx, _transport) = table_with_one_neighbor();
        table.apply_advertisement(id(2), &[RouteAdvertisement { destination: 3, metric: 4 }]);

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        match event {
            TableEvent::Timeout(d) => table.on_timeout(d),
            other => panic!("expected a Timeout event first, got {other:?}"),
        }

        let row = table.snapshot().into_iter().find(|r| r.destination == 3).unwrap();
        assert_eq!(row.metric, METRIC_INFINITY);
        assert_eq!(row.timer_kind, Some(TimerKind::Garbage));

        loop {
            let event = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
            if let TableEvent::Garbage(d) = event {
                table.on_garbage(d);
                break;
            }
        }

        assert!(table.snapshot().iter().all(|r| r.destination != 3));
    }

    #[tokio::test]
    async fn stale_timeout_after_removal_is_a_no_op() {
        let (mut table, _rx, _transport) = table_with_one_neighbor();
        table.on_timeout(999);
        assert_eq!(table.snapshot().len(), 2);
    }
}

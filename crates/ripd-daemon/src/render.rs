// Copyright 2025 Cedric Hammes
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log::info;
use ripd_table::{RoutingTable, TimerKind};

/// Renders the table's current snapshot as a human-readable, destination-sorted listing and
/// logs it at info level.
pub fn log_snapshot(router_id: u32, table: &RoutingTable) {
    let mut lines = Vec::new();
    lines.push(format!("---------------------ROUTER {router_id}---------------------"));
    lines.push("DESTINATION | METRIC | NEXT HOP |       TIMER".to_string());
    for row in table.snapshot() {
        let timer = match row.timer_kind {
            Some(TimerKind::Timeout) => format!("TIMEOUT: {:.2}", row.timer_elapsed.as_secs_f64()),
            Some(TimerKind::Garbage) => format!("GARBAGECOLLECTION: {:.2}", row.timer_elapsed.as_secs_f64()),
            Some(TimerKind::Update) => format!("UPDATE: {:.2}", row.timer_elapsed.as_secs_f64()),
            None => "-".to_string(),
        };
        lines.push(format!(
            "{:>11} | {:>6} | {:>8} | {}",
            row.destination, row.metric, row.next_hop, timer
        ));
    }
    info!("\n{}", lines.join("\n"));
}

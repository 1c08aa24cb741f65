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

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use log::warn;
use ripd_table::{RoutingTable, TableEvent, TimerConstants};
use socket2::{Domain, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::config::DaemonConfig;
use crate::render;
use crate::transport::UdpTransport;

/// Maximum datagram size read per recv. 1024 bytes is enough for ~50 route entries, well past
/// what this single-node setup will ever see.
const MAX_DATAGRAM_SIZE: usize = 1024;

fn bind_socket(port: u16) -> anyhow::Result<UdpSocket> {
    let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&address.into())?;
    Ok(UdpSocket::from_std(socket.into())?)
}

/// Runs the node forever: binds every configured input port, constructs the routing table,
/// then dispatches inbound datagrams and timer events through it. Never returns under normal
/// operation.
pub async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let mut input_sockets = Vec::with_capacity(config.inputs.len());
    for port in &config.inputs {
        input_sockets.push(Arc::new(bind_socket(*port)?));
    }

    let transport = Arc::new(UdpTransport::new(input_sockets[0].clone()));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut table = RoutingTable::new(
        config.router_id,
        config.outputs.clone(),
        transport,
        TimerConstants::default(),
        events_tx,
    );
    render::log_snapshot(config.router_id.get(), &table);

    let (datagram_tx, mut datagram_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    for socket in &input_sockets {
        let socket = socket.clone();
        let datagram_tx = datagram_tx.clone();
        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, _peer)) => {
                        if datagram_tx.send(buffer[..len].to_vec()).is_err() {
                            return;
                        }
                    }
                    Err(err) => warn!("failed to read datagram on a listening socket => {err}"),
                }
            }
        });
    }
    drop(datagram_tx);

    loop {
        tokio::select! {
            Some(datagram) = datagram_rx.recv() => {
                match ripd_proto::decode_response(&datagram) {
                    Ok((sender_id, entries)) => {
                        table.apply_advertisement(sender_id, &entries);
                        render::log_snapshot(config.router_id.get(), &table);
                    }
                    Err(err) => warn!("dropping invalid advertisement => {err}"),
                }
            }
            Some(event) = events_rx.recv() => {
                match event {
                    TableEvent::Timeout(d) => table.on_timeout(d),
                    TableEvent::Garbage(d) => table.on_garbage(d),
                    TableEvent::PeriodicUpdate => table.send_periodic(),
                }
                render::log_snapshot(config.router_id.get(), &table);
            }
            else => {
                warn!("all datagram and timer sources closed, shutting down");
                break;
            }
        }
    }

    Ok(())
}

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
use ripd_table::Transport;
use tokio::net::UdpSocket;

/// Sends advertisements over the daemon's first listening socket. Per-neighbor sends are
/// fire-and-forget: a failure is logged and dropped, since the next periodic tick retries.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, port: u16, datagram: &[u8]) {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        if let Err(err) = self.socket.try_send_to(datagram, addr) {
            warn!("failed to send advertisement to 127.0.0.1:{port} => {err}");
        }
    }
}

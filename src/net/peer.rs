// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `PeerNode`: a remote connection's identity plus its serialized write half.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::core::types::Address;

/// Whether a peer session exchanges consensus traffic symmetrically, or is a
/// one-way bootstrap puller connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerKind {
    /// Exchanges keepalive, publish, confirm_req/ack, telemetry.
    Live,
    /// One-way `bulk_pull` puller connection.
    Bootstrap,
}

/// A connected remote peer. Outbound writes are serialized through `write_half`;
/// no read lock is ever held while writing.
pub struct PeerNode {
    /// `ip:port` as dialed or accepted; the key workers use to identify this peer.
    pub remote_addr: String,
    /// The peer's node-id account, known once the handshake completes.
    pub node_id: Option<Address>,
    /// Live vs. bootstrap.
    pub kind: PeerKind,
    write_half: Mutex<OwnedWriteHalf>,
}

impl PeerNode {
    /// Wrap a connection's write half for serialized outbound writes.
    pub fn new(remote_addr: String, kind: PeerKind, write_half: OwnedWriteHalf) -> Arc<Self> {
        Arc::new(Self {
            remote_addr,
            node_id: None,
            kind,
            write_half: Mutex::new(write_half),
        })
    }

    /// Write a full frame, holding the write lock for the whole call so two
    /// concurrent senders can never interleave their bytes.
    pub async fn send(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut half = self.write_half.lock().await;
        half.write_all(bytes).await?;
        half.flush().await
    }
}

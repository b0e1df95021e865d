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

//! Networking: wire-level peer sessions, the peers manager, the bootstrap
//! puller, and the confirm_req/confirm_ack/telemetry/keepalive workers that
//! sit behind a session's dispatch loop.

/// Dedicated bootstrap connection driving `bulk_pull`.
pub mod bootstrap;
/// `ConfirmAckWorker`: vote validation and the Trusted-PR cementation shortcut.
pub mod confirm_ack;
/// `ConfirmReqWorker`: outbound vote solicitation, inbound request queues.
pub mod confirm_req;
/// Keepalive endpoint gossip.
pub mod keepalive;
/// `PeerNode`: a single connection's identity and serialized write half.
pub mod peer;
/// `PeersManager`: live/bootstrap registries and outbound dialing.
pub mod peers_manager;
/// Per-connection handshake and dispatch loop.
pub mod session;
/// Telemetry snapshot construction and parsing.
pub mod telemetry;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::core::crypto::Keypair;
use crate::core::types::{Address, Hash};
use crate::ledger::cementation::CementationPipeline;
use crate::ledger::unchecked::UncheckedPool;
use crate::ledger::LedgerFacade;
use crate::monitoring::metrics::Metrics;
use crate::net::confirm_req::ConfirmReqWorker;
use crate::net::peers_manager::PeersManager;
use crate::net::session::NetworkParams;

/// Everything a session's dispatch loop needs to route an inbound message to
/// the right worker. Constructed once at startup and shared behind an `Arc`
/// across every peer session task.
pub struct NodeHandles {
    /// Wire-level network identity every session validates against.
    pub net: NetworkParams,
    /// This node's ed25519-blake2b keypair.
    pub identity: Arc<Keypair>,
    /// The durable ledger backend.
    pub ledger: Arc<dyn LedgerFacade>,
    /// Validated-signature, not-yet-cemented block staging area.
    pub unchecked: UncheckedPool,
    /// Live/bootstrap peer registries and outbound dialing.
    pub peers_manager: Arc<PeersManager>,
    /// Vote solicitation and inbound confirm_req queues.
    pub confirm_req: Arc<ConfirmReqWorker>,
    /// Chain-walk, gap detection, and ascending-height ledger writes.
    pub cementation: CementationPipeline,
    /// Representative addresses whose single final vote cements a hash.
    pub trusted_prs: HashSet<Address>,
    /// This network's genesis block hash, reported in telemetry snapshots.
    pub genesis_hash: Hash,
    /// The `using` component of our advertised protocol version triple.
    pub protocol_version_byte: u8,
    /// Process start time, for telemetry's uptime field.
    pub started_at: Instant,
    /// Prometheus collectors for peer counts, cementation, votes, and bootstrap.
    pub metrics: Arc<Metrics>,
}

impl NodeHandles {
    /// Milliseconds elapsed since this node started, for telemetry snapshots.
    pub fn uptime_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

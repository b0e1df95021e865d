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

//! The fixed 202-byte telemetry payload: local snapshot construction for
//! `telemetry_req`, and best-effort parsing of an inbound `telemetry_ack`
//! (whose contents this core otherwise discards).

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::core::crypto::Keypair;
use crate::core::types::{Address, Hash, Signature};
use crate::ledger::unchecked::UncheckedPool;
use crate::ledger::LedgerFacade;
use crate::net::peers_manager::PeersManager;

/// A parsed or locally-built telemetry snapshot, wire layout per
/// `original_source`'s `telemetry_ack` body (202 bytes total):
/// signature(64) ‖ node_id(32) ‖ block_count(8) ‖ cemented_count(8) ‖
/// unchecked_count(8) ‖ account_count(8) ‖ bandwidth_cap(8) ‖ peer_count(4)
/// ‖ protocol_version(1) ‖ uptime_ms(8) ‖ genesis_hash(32) ‖ major(1) ‖
/// minor(1) ‖ patch(1) ‖ pre_release(1) ‖ maker(1) ‖ timestamp(8) ‖
/// active_difficulty(8).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryData {
    /// Signature over every field below, by `node_id`.
    pub signature: Signature,
    /// The reporting node's identity.
    pub node_id: Address,
    /// Total blocks ever written to the ledger.
    pub block_count: u64,
    /// Same as `block_count` in this core (no separate unconfirmed tip tracking).
    pub cemented_count: u64,
    /// Blocks currently staged in the unchecked pool.
    pub unchecked_count: u64,
    /// Number of accounts opened.
    pub account_count: u64,
    /// Configured outbound bandwidth cap in bytes/sec (0 = uncapped).
    pub bandwidth_cap: u64,
    /// Live peer count at snapshot time.
    pub peer_count: u32,
    /// Protocol version in use.
    pub protocol_version: u8,
    /// Milliseconds since process start.
    pub uptime_ms: u64,
    /// The network's genesis block hash.
    pub genesis_hash: Hash,
    /// Node software major version.
    pub major_version: u8,
    /// Node software minor version.
    pub minor_version: u8,
    /// Node software patch version.
    pub patch_version: u8,
    /// Node software pre-release version (0 = release).
    pub pre_release_version: u8,
    /// Maker identifier (0 = this implementation).
    pub maker: u8,
    /// Unix timestamp (seconds) this snapshot was taken.
    pub timestamp: u64,
    /// Active network difficulty threshold (not enforced by this core).
    pub active_difficulty: u64,
}

/// Total wire size of a telemetry payload.
pub const TELEMETRY_SIZE: usize = 202;

impl TelemetryData {
    /// Encode to the fixed 202-byte wire layout.
    pub fn to_bytes(&self) -> [u8; TELEMETRY_SIZE] {
        let mut out = [0u8; TELEMETRY_SIZE];
        let mut o = 0;
        out[o..o + 64].copy_from_slice(&self.signature.0);
        o += 64;
        out[o..o + 32].copy_from_slice(&self.node_id.0);
        o += 32;
        out[o..o + 8].copy_from_slice(&self.block_count.to_be_bytes());
        o += 8;
        out[o..o + 8].copy_from_slice(&self.cemented_count.to_be_bytes());
        o += 8;
        out[o..o + 8].copy_from_slice(&self.unchecked_count.to_be_bytes());
        o += 8;
        out[o..o + 8].copy_from_slice(&self.account_count.to_be_bytes());
        o += 8;
        out[o..o + 8].copy_from_slice(&self.bandwidth_cap.to_be_bytes());
        o += 8;
        out[o..o + 4].copy_from_slice(&self.peer_count.to_be_bytes());
        o += 4;
        out[o] = self.protocol_version;
        o += 1;
        out[o..o + 8].copy_from_slice(&self.uptime_ms.to_be_bytes());
        o += 8;
        out[o..o + 32].copy_from_slice(&self.genesis_hash.0);
        o += 32;
        out[o] = self.major_version;
        o += 1;
        out[o] = self.minor_version;
        o += 1;
        out[o] = self.patch_version;
        o += 1;
        out[o] = self.pre_release_version;
        o += 1;
        out[o] = self.maker;
        o += 1;
        out[o..o + 8].copy_from_slice(&self.timestamp.to_be_bytes());
        o += 8;
        out[o..o + 8].copy_from_slice(&self.active_difficulty.to_be_bytes());
        o += 8;
        debug_assert_eq!(o, TELEMETRY_SIZE);
        out
    }

    /// Decode a 202-byte telemetry payload. Returns `None` on the wrong length.
    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        if b.len() != TELEMETRY_SIZE {
            return None;
        }
        let mut o = 0;
        let mut take = |n: usize| {
            let s = &b[o..o + n];
            o += n;
            s
        };
        let signature = Signature(take(64).try_into().unwrap());
        let node_id = Address(take(32).try_into().unwrap());
        let block_count = u64::from_be_bytes(take(8).try_into().unwrap());
        let cemented_count = u64::from_be_bytes(take(8).try_into().unwrap());
        let unchecked_count = u64::from_be_bytes(take(8).try_into().unwrap());
        let account_count = u64::from_be_bytes(take(8).try_into().unwrap());
        let bandwidth_cap = u64::from_be_bytes(take(8).try_into().unwrap());
        let peer_count = u32::from_be_bytes(take(4).try_into().unwrap());
        let protocol_version = take(1)[0];
        let uptime_ms = u64::from_be_bytes(take(8).try_into().unwrap());
        let genesis_hash = Hash(take(32).try_into().unwrap());
        let major_version = take(1)[0];
        let minor_version = take(1)[0];
        let patch_version = take(1)[0];
        let pre_release_version = take(1)[0];
        let maker = take(1)[0];
        let timestamp = u64::from_be_bytes(take(8).try_into().unwrap());
        let active_difficulty = u64::from_be_bytes(take(8).try_into().unwrap());
        Some(Self {
            signature,
            node_id,
            block_count,
            cemented_count,
            unchecked_count,
            account_count,
            bandwidth_cap,
            peer_count,
            protocol_version,
            uptime_ms,
            genesis_hash,
            major_version,
            minor_version,
            patch_version,
            pre_release_version,
            maker,
            timestamp,
            active_difficulty,
        })
    }

    /// The portion of the wire payload covered by `signature` (everything past it).
    pub fn signed_region(&self) -> [u8; TELEMETRY_SIZE - 64] {
        let full = self.to_bytes();
        full[64..].try_into().unwrap()
    }
}

/// Fixed values for this implementation's software version and maker id.
const MAKER_ID: u8 = 0;
const MAJOR: u8 = 0;
const MINOR: u8 = 1;
const PATCH: u8 = 0;
const PRE_RELEASE: u8 = 0;

fn now_unix_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Build and sign a telemetry snapshot of this node's current state.
pub fn build_snapshot(
    identity: &Keypair,
    ledger: &dyn LedgerFacade,
    unchecked: &UncheckedPool,
    peers_manager: &PeersManager,
    genesis_hash: Hash,
    protocol_version: u8,
    uptime_ms: u64,
    account_count: u64,
) -> TelemetryData {
    let block_count = ledger.get_block_count().unwrap_or(0);
    let mut data = TelemetryData {
        signature: Signature([0u8; 64]),
        node_id: identity.public_key(),
        block_count,
        cemented_count: block_count,
        unchecked_count: unchecked.count() as u64,
        account_count,
        bandwidth_cap: 0,
        peer_count: peers_manager.live_count() as u32,
        protocol_version,
        uptime_ms,
        genesis_hash,
        major_version: MAJOR,
        minor_version: MINOR,
        patch_version: PATCH,
        pre_release_version: PRE_RELEASE,
        maker: MAKER_ID,
        timestamp: now_unix_secs(),
        active_difficulty: 0,
    };
    data.signature = identity.sign(&data.signed_region());
    data
}

/// Parse an inbound `telemetry_ack` body. Contents are logged then
/// discarded; this core tracks no per-peer telemetry history.
pub fn handle_telemetry_ack(peer_addr: &str, body: &[u8]) {
    match TelemetryData::from_bytes(body) {
        Some(data) => debug!(peer = peer_addr, node_id = %data.node_id, "received telemetry_ack"),
        None => debug!(peer = peer_addr, "received malformed telemetry_ack, discarding"),
    }
}

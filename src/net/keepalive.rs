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

//! Keepalive: 8 peer endpoints (16-byte IP + 2-byte little-endian port) per
//! packet. Non-default endpoints are persisted through the ledger facade;
//! the same payload is echoed back to the sender.

use std::net::Ipv6Addr;

use tracing::warn;

use crate::ledger::LedgerFacade;

/// A single gossiped endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// 16-byte address (IPv4-mapped IPv6 form for v4 peers).
    pub ip: [u8; 16],
    /// Port, host byte order.
    pub port: u16,
}

const ENDPOINT_COUNT: usize = 8;
const ENDPOINT_WIDTH: usize = 18;
/// Fixed wire size of a keepalive body.
pub const KEEPALIVE_SIZE: usize = ENDPOINT_COUNT * ENDPOINT_WIDTH;

impl Endpoint {
    /// The unspecified (all-zero) address, the "default mask" an endpoint
    /// with nothing to report carries.
    pub fn is_default(&self) -> bool {
        self.ip == [0u8; 16]
    }

    /// Render as `ip:port`, the form the ledger's peer table keys on.
    pub fn to_key(&self) -> String {
        format!("{}:{}", Ipv6Addr::from(self.ip), self.port)
    }
}

/// Parse a 144-byte keepalive body into its 8 endpoints.
pub fn parse_keepalive(body: &[u8]) -> Option<[Endpoint; ENDPOINT_COUNT]> {
    if body.len() != KEEPALIVE_SIZE {
        return None;
    }
    let mut endpoints = [Endpoint { ip: [0u8; 16], port: 0 }; ENDPOINT_COUNT];
    for (i, slot) in endpoints.iter_mut().enumerate() {
        let off = i * ENDPOINT_WIDTH;
        let mut ip = [0u8; 16];
        ip.copy_from_slice(&body[off..off + 16]);
        let port = u16::from_le_bytes([body[off + 16], body[off + 17]]);
        *slot = Endpoint { ip, port };
    }
    Some(endpoints)
}

/// Encode 8 endpoints back to a 144-byte keepalive body.
pub fn encode_keepalive(endpoints: &[Endpoint; ENDPOINT_COUNT]) -> [u8; KEEPALIVE_SIZE] {
    let mut out = [0u8; KEEPALIVE_SIZE];
    for (i, ep) in endpoints.iter().enumerate() {
        let off = i * ENDPOINT_WIDTH;
        out[off..off + 16].copy_from_slice(&ep.ip);
        out[off + 16..off + 18].copy_from_slice(&ep.port.to_le_bytes());
    }
    out
}

/// Persist every non-default endpoint through the ledger facade.
pub fn persist_endpoints(ledger: &dyn LedgerFacade, endpoints: &[Endpoint; ENDPOINT_COUNT], now_unix_secs: u64) {
    let keys: Vec<String> = endpoints.iter().filter(|e| !e.is_default()).map(Endpoint::to_key).collect();
    if keys.is_empty() {
        return;
    }
    if let Err(e) = ledger.add_node_ips(&keys, now_unix_secs) {
        warn!(err = %e, "failed to persist gossiped peer endpoints");
    }
}

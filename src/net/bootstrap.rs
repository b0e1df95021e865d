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

//! `BootstrapPuller`: a dedicated bootstrap connection that drives
//! `bulk_pull` requests, genesis first, then driven by the cementation
//! pipeline's missing-bodies set.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::core::crypto::Keypair;
use crate::core::types::Hash;
use crate::ledger::cementation::CementationPipeline;
use crate::ledger::unchecked::UncheckedPool;
use crate::ledger::LedgerFacade;
use crate::monitoring::metrics::Metrics;
use crate::net::peer::{PeerKind, PeerNode};
use crate::net::peers_manager::PeersManager;
use crate::net::session::{perform_handshake, NetworkParams, SessionError};
use crate::wire::header::{Header, HeaderExtension};
use crate::wire::message::{BlockTypeTag, MessageType, NOT_A_BLOCK};

const BOOTSTRAP_THROTTLE: Duration = Duration::from_millis(250);

/// The literal genesis address used as the first `bulk_pull` target,
/// per `original_source/p2p/bootstrap.go::StartBootstrapingFromGenesis`.
pub const GENESIS_ADDRESS_HEX: &str = "45C6FF9D1706D61F0821327752671BDA9F9ED2DA40326B01935AB566FB9E08ED";

async fn send_bulk_pull(peer: &PeerNode, net: NetworkParams, start: Hash, end: Hash) -> std::io::Result<()> {
    let header = Header {
        network_id: net.network_id,
        protocol_version: net.protocol_version,
        message_type: MessageType::BulkPull,
        extension: HeaderExtension::from_bytes([0, 0]),
    };
    let mut frame = header.to_bytes().to_vec();
    frame.extend_from_slice(&start.0);
    frame.extend_from_slice(&end.0);
    peer.send(&frame).await
}

/// Read a `bulk_pull` response stream: a sequence of (block_type_byte, body)
/// pairs terminated by `NOT_A_BLOCK`, staging every parsed block.
pub async fn receive_bulk_pull_response(
    read_half: &mut OwnedReadHalf,
    unchecked: &UncheckedPool,
    metrics: &Metrics,
) -> Result<usize, SessionError> {
    let mut count = 0usize;
    loop {
        let mut type_byte = [0u8; 1];
        read_half.read_exact(&mut type_byte).await?;
        if type_byte[0] == NOT_A_BLOCK {
            return Ok(count);
        }

        let tag = BlockTypeTag::from_u8(type_byte[0]);
        let size = tag.size();
        if size == 0 {
            return Err(SessionError::WireFormat);
        }

        let mut body = vec![0u8; size];
        read_half.read_exact(&mut body).await?;

        let Some(parsed) = crate::wire::block::parse_block(type_byte[0], &body) else {
            return Err(SessionError::WireFormat);
        };
        let block = parsed.map_err(|_| SessionError::WireFormat)?;
        unchecked.add(block).await;
        metrics.bootstrap_blocks_pulled_total.inc();
        count += 1;
    }
}

/// Drives one bootstrap connection end-to-end until it errors out.
pub struct BootstrapPuller;

impl BootstrapPuller {
    /// Handshake, then genesis-first `bulk_pull`, then drain the
    /// cementation pipeline's missing-bodies set on a 250 ms throttle.
    pub fn spawn(
        mut stream: TcpStream,
        remote_addr: String,
        net: NetworkParams,
        identity: Arc<Keypair>,
        unchecked: UncheckedPool,
        ledger: Arc<dyn LedgerFacade>,
        cementation: CementationPipeline,
        peers_manager: Arc<PeersManager>,
        metrics: Arc<Metrics>,
    ) {
        tokio::spawn(async move {
            if let Err(e) = perform_handshake(&mut stream, net, &identity).await {
                warn!(peer = %remote_addr, err = %e, "bootstrap handshake failed");
                return;
            }

            let (mut read_half, write_half) = stream.into_split();
            let peer = PeerNode::new(remote_addr.clone(), PeerKind::Bootstrap, write_half);
            peers_manager.register(peer.clone(), PeerKind::Bootstrap).await;

            let genesis_hash: Hash = match GENESIS_ADDRESS_HEX.parse() {
                Ok(h) => h,
                Err(_) => {
                    warn!("invalid compiled-in genesis address constant");
                    peers_manager.unregister(&remote_addr, PeerKind::Bootstrap).await;
                    return;
                }
            };

            if let Err(e) = send_bulk_pull(&peer, net, genesis_hash, Hash::ZERO).await {
                warn!(peer = %remote_addr, err = %e, "failed to send genesis bulk_pull");
                peers_manager.unregister(&remote_addr, PeerKind::Bootstrap).await;
                return;
            }
            match receive_bulk_pull_response(&mut read_half, &unchecked, &metrics).await {
                Ok(n) => info!(peer = %remote_addr, blocks = n, "genesis bulk_pull complete"),
                Err(e) => {
                    warn!(peer = %remote_addr, err = %e, "genesis bulk_pull failed");
                    peers_manager.unregister(&remote_addr, PeerKind::Bootstrap).await;
                    return;
                }
            }

            loop {
                tokio::time::sleep(BOOTSTRAP_THROTTLE).await;

                let target = cementation
                    .missing_bodies()
                    .into_iter()
                    .next()
                    .or_else(|| ledger.get_random_account_address().ok().flatten().map(|a| Hash(a.0)));

                let Some(target) = target else {
                    continue;
                };

                if let Err(e) = send_bulk_pull(&peer, net, target, Hash::ZERO).await {
                    warn!(peer = %remote_addr, err = %e, "bulk_pull send failed, closing bootstrap connection");
                    break;
                }
                if let Err(e) = receive_bulk_pull_response(&mut read_half, &unchecked, &metrics).await {
                    warn!(peer = %remote_addr, err = %e, "bulk_pull response failed, closing bootstrap connection");
                    break;
                }
            }

            peers_manager.unregister(&remote_addr, PeerKind::Bootstrap).await;
        });
    }
}

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

//! Per-connection session: node-id handshake, then a read-dispatch loop.
//! Each accepted or dialed `TcpStream` is driven by its own `tokio::task`,
//! matching the one-task-per-connection shape the teacher's swarm loop used
//! for each libp2p connection (`networking/p2p.rs`), here without a swarm.

use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::core::crypto::{self, Keypair};
use crate::core::types::{Address, HashPair, Signature};
use crate::net::peer::{PeerKind, PeerNode};
use crate::net::{confirm_ack, keepalive, telemetry, NodeHandles};
use crate::wire::block::parse_block;
use crate::wire::header::{Header, HeaderExtension};
use crate::wire::message::{BlockTypeTag, MessageType};

/// Session-fatal errors. Any of these terminate the connection; the peer is
/// deregistered from every worker on the way out.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport-level failure (EOF, reset, or another I/O error).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    /// The remote side's network id did not match ours.
    #[error("network id mismatch")]
    NetworkIdMismatch,
    /// The remote sent something other than a node_id_handshake at handshake time.
    #[error("unexpected message type during handshake")]
    UnexpectedMessage,
    /// The remote's signature over our cookie did not verify.
    #[error("bad handshake signature")]
    BadSignature,
    /// The remote's handshake message was missing a required field.
    #[error("malformed handshake payload")]
    MalformedHandshake,
    /// A header or body failed to parse.
    #[error("wire format error")]
    WireFormat,
}

/// Fixed network configuration every session checks the peer against.
#[derive(Clone, Copy)]
pub struct NetworkParams {
    /// Must match the peer's network id byte pair exactly.
    pub network_id: [u8; 2],
    /// (max, using, min) advertised in our own headers.
    pub protocol_version: (u8, u8, u8),
}

fn random_cookie() -> [u8; 32] {
    let mut cookie = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut cookie);
    cookie
}

async fn write_frame(
    stream: &mut TcpStream,
    net: NetworkParams,
    message_type: MessageType,
    extension: HeaderExtension,
    body: &[u8],
) -> std::io::Result<()> {
    let header = Header {
        network_id: net.network_id,
        protocol_version: net.protocol_version,
        message_type,
        extension,
    };
    stream.write_all(&header.to_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await
}

async fn read_header(stream: &mut TcpStream) -> Result<Header, SessionError> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf).await?;
    Header::from_bytes(&buf).ok_or(SessionError::WireFormat)
}

/// Perform the node-id handshake. Identical for both the dialing and the
/// accepting side — the protocol is symmetric per connection, not per role:
///
/// 1. Send our random cookie with `query=1`.
/// 2. Read the peer's reply: their own cookie (`query=1`) plus their
///    account and a signature over *our* cookie (`response=1`), combined
///    in one 128-byte body. Verify that signature.
/// 3. Sign the peer's cookie and send it back with `response=1` only.
///
/// Grounded in `original_source/p2p/handshake.go::makeHandshake`, which is
/// called identically regardless of connection direction.
pub async fn perform_handshake(
    stream: &mut TcpStream,
    net: NetworkParams,
    identity: &Keypair,
) -> Result<Address, SessionError> {
    let our_cookie = random_cookie();
    let query_ext = HeaderExtension::from_bytes([0x01, 0x00]);
    write_frame(stream, net, MessageType::NodeIdHandshake, query_ext, &our_cookie).await?;

    let header = read_header(stream).await?;
    if header.network_id != net.network_id {
        return Err(SessionError::NetworkIdMismatch);
    }
    if header.message_type != MessageType::NodeIdHandshake {
        return Err(SessionError::UnexpectedMessage);
    }

    let mut body = vec![0u8; header.body_size()];
    stream.read_exact(&mut body).await?;
    if body.len() != 32 + 32 + 64 {
        return Err(SessionError::MalformedHandshake);
    }
    let peer_cookie = &body[0..32];
    let peer_account = Address(body[32..64].try_into().unwrap());
    let peer_signature = Signature(body[64..128].try_into().unwrap());

    crypto::verify(&peer_account, &our_cookie, &peer_signature)
        .map_err(|_| SessionError::BadSignature)?;

    let signed_cookie = identity.sign(peer_cookie);
    let response_ext = HeaderExtension::from_bytes([0x02, 0x00]);
    let mut response_body = Vec::with_capacity(32 + 64);
    response_body.extend_from_slice(&identity.public_key().0);
    response_body.extend_from_slice(&signed_cookie.0);
    write_frame(stream, net, MessageType::NodeIdHandshake, response_ext, &response_body).await?;

    Ok(peer_account)
}

/// Drive a connection end-to-end: handshake, register with the peers
/// manager and the confirm_req worker, then loop reading frames until EOF
/// or a fatal error.
pub async fn run_session(mut stream: TcpStream, remote_addr: String, kind: PeerKind, handles: Arc<NodeHandles>) {
    let peer_account = match perform_handshake(&mut stream, handles.net, &handles.identity).await {
        Ok(account) => account,
        Err(e) => {
            warn!(peer = %remote_addr, err = %e, "handshake failed");
            return;
        }
    };

    info!(peer = %remote_addr, node_id = %peer_account, "peer ready");

    let (read_half, write_half) = stream.into_split();
    let peer = PeerNode::new(remote_addr.clone(), kind, write_half);
    handles.peers_manager.register(peer.clone(), kind).await;
    handles.confirm_req.register_peer(remote_addr.clone());

    let mut read_half = read_half;
    loop {
        let mut header_buf = [0u8; 8];
        match read_half.read_exact(&mut header_buf).await {
            Ok(_) => {}
            Err(e) => {
                debug!(peer = %remote_addr, err = %e, "connection closed");
                break;
            }
        }

        let Some(header) = Header::from_bytes(&header_buf) else {
            warn!(peer = %remote_addr, "received unparseable header, closing");
            break;
        };

        let mut body = vec![0u8; header.body_size()];
        if let Err(e) = read_half.read_exact(&mut body).await {
            debug!(peer = %remote_addr, err = %e, "connection closed mid-body");
            break;
        }

        debug!(peer = %remote_addr, msg_type = ?header.message_type, "dispatching inbound message");
        dispatch_message(&handles, &peer, &remote_addr, &header, &body).await;
    }

    handles.peers_manager.unregister(&remote_addr, kind).await;
    handles.confirm_req.unregister_peer(&remote_addr);
}

async fn dispatch_message(handles: &Arc<NodeHandles>, peer: &PeerNode, remote_addr: &str, header: &Header, body: &[u8]) {
    match header.message_type {
        MessageType::Keepalive => {
            let Some(endpoints) = keepalive::parse_keepalive(body) else {
                warn!(peer = remote_addr, "malformed keepalive body");
                return;
            };
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            keepalive::persist_endpoints(&*handles.ledger, &endpoints, now);

            let mut frame = header.to_bytes().to_vec();
            frame.extend_from_slice(body);
            if let Err(e) = peer.send(&frame).await {
                warn!(peer = remote_addr, err = %e, "failed to echo keepalive");
            }
        }
        MessageType::Publish => {
            let Some(nibble) = block_type_nibble(header.extension.block_type()) else {
                debug!(peer = remote_addr, "publish with unrecognized block type, ignoring");
                return;
            };
            match parse_block(nibble, body) {
                Some(Ok(block)) => handles.unchecked.add(block).await,
                Some(Err(e)) => warn!(peer = remote_addr, err = %e, "failed to parse published block"),
                None => warn!(peer = remote_addr, "publish body did not match declared block type"),
            }
        }
        MessageType::ConfirmReq => {
            if header.extension.block_type() != BlockTypeTag::NotABlock {
                debug!(peer = remote_addr, "confirm_req by block body, not handled by this core");
                return;
            }
            let count = header.extension.count() as usize;
            for i in 0..count {
                let Some(pair) = HashPair::from_bytes(&body[i * 64..(i + 1) * 64]) else {
                    continue;
                };
                handles.confirm_req.submit_incoming(remote_addr, pair).await;
            }
        }
        MessageType::ConfirmAck => {
            confirm_ack::handle_confirm_ack(
                body,
                header.extension,
                &handles.trusted_prs,
                &handles.cementation,
                &handles.metrics,
            )
            .await;
        }
        MessageType::TelemetryReq => {
            let snapshot = telemetry::build_snapshot(
                &handles.identity,
                &*handles.ledger,
                &handles.unchecked,
                &handles.peers_manager,
                handles.genesis_hash,
                handles.protocol_version_byte,
                handles.uptime_ms(),
                handles.ledger.get_account_count().unwrap_or(0),
            );
            let ack_bytes = snapshot.to_bytes();
            let ack_header = Header {
                network_id: handles.net.network_id,
                protocol_version: handles.net.protocol_version,
                message_type: MessageType::TelemetryAck,
                extension: HeaderExtension::from_bytes((ack_bytes.len() as u16).to_le_bytes()),
            };
            let mut frame = ack_header.to_bytes().to_vec();
            frame.extend_from_slice(&ack_bytes);
            if let Err(e) = peer.send(&frame).await {
                warn!(peer = remote_addr, err = %e, "failed to send telemetry_ack");
            }
        }
        MessageType::TelemetryAck => telemetry::handle_telemetry_ack(remote_addr, body),
        MessageType::BulkPull | MessageType::BulkPush | MessageType::FrontierReq | MessageType::BulkPullAccount => {
            debug!(peer = remote_addr, msg_type = ?header.message_type, "bootstrap-server message type not served by this core");
        }
        MessageType::NodeIdHandshake => {
            debug!(peer = remote_addr, "unexpected node_id_handshake after handshake completed, ignoring");
        }
    }
}

fn block_type_nibble(tag: BlockTypeTag) -> Option<u8> {
    match tag {
        BlockTypeTag::Send => Some(0x02),
        BlockTypeTag::Receive => Some(0x03),
        BlockTypeTag::Open => Some(0x04),
        BlockTypeTag::Change => Some(0x05),
        BlockTypeTag::State => Some(0x06),
        BlockTypeTag::NotABlock | BlockTypeTag::Unknown(_) => None,
    }
}

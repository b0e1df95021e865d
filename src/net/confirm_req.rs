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

//! `ConfirmReqWorker`: tracks hashes this node wants votes on and
//! periodically solicits them from a subset of live peers, plus the
//! per-peer inbound queues draining `confirm_req` packets received from
//! other peers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, warn};

use crate::core::types::{Hash, HashPair};
use crate::ledger::cementation::CementationPipeline;
use crate::ledger::unchecked::UncheckedPool;
use crate::ledger::LedgerFacade;
use crate::net::peers_manager::PeersManager;
use crate::net::session::NetworkParams;
use crate::wire::header::{Header, HeaderExtension};
use crate::wire::message::MessageType;

const PEER_QUEUE_CAPACITY: usize = 65_536;
const DRAIN_TASKS: usize = 16;
const IDLE_SLEEP: Duration = Duration::from_millis(50);
const SOLICIT_BATCH: usize = 12;
const SOLICIT_INTERVAL: Duration = Duration::from_millis(50);

struct PeerInbox {
    sender: mpsc::Sender<HashPair>,
    receiver: AsyncMutex<mpsc::Receiver<HashPair>>,
}

/// Owns the "need votes" set and the per-peer inbound hash-pair queues.
pub struct ConfirmReqWorker {
    peer_inboxes: RwLock<HashMap<String, Arc<PeerInbox>>>,
    pending: RwLock<HashMap<Hash, Hash>>,
}

impl ConfirmReqWorker {
    /// Construct the worker and spawn its solicitation loop and drain pool.
    pub fn spawn(
        unchecked: UncheckedPool,
        ledger: Arc<dyn LedgerFacade>,
        peers_manager: Arc<PeersManager>,
        net: NetworkParams,
        cementation: CementationPipeline,
    ) -> Arc<Self> {
        let worker = Arc::new(Self {
            peer_inboxes: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
        });

        let solicit_worker = worker.clone();
        let solicit_unchecked = unchecked.clone();
        let solicit_peers = peers_manager;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SOLICIT_INTERVAL);
            loop {
                interval.tick().await;
                for (hash, root) in solicit_unchecked.hashes_needing_votes() {
                    solicit_worker.pending.write().unwrap().insert(hash, root);
                }
                let batch: Vec<HashPair> = solicit_worker
                    .pending
                    .read()
                    .unwrap()
                    .iter()
                    .take(SOLICIT_BATCH)
                    .map(|(hash, root)| HashPair { hash: *hash, root: *root })
                    .collect();
                if batch.is_empty() {
                    continue;
                }
                send_confirm_req_to_peers(&solicit_peers, net, &batch).await;
            }
        });

        for _ in 0..DRAIN_TASKS {
            let inboxes = worker.clone();
            let drain_unchecked = unchecked.clone();
            let drain_ledger = ledger.clone();
            let drain_cementation = cementation.clone();
            tokio::spawn(async move {
                loop {
                    let snapshot: Vec<Arc<PeerInbox>> =
                        inboxes.peer_inboxes.read().unwrap().values().cloned().collect();
                    let mut did_work = false;
                    for inbox in snapshot {
                        let Ok(mut rx) = inbox.receiver.try_lock() else {
                            continue;
                        };
                        if let Ok(pair) = rx.try_recv() {
                            did_work = true;
                            inboxes
                                .handle_incoming_pair(&drain_unchecked, &*drain_ledger, &drain_cementation, pair)
                                .await;
                        }
                    }
                    if !did_work {
                        tokio::time::sleep(IDLE_SLEEP).await;
                    }
                }
            });
        }

        worker
    }

    /// Register a peer's inbound queue on session start.
    pub fn register_peer(&self, remote_addr: String) {
        let (sender, receiver) = mpsc::channel(PEER_QUEUE_CAPACITY);
        self.peer_inboxes.write().unwrap().insert(
            remote_addr,
            Arc::new(PeerInbox {
                sender,
                receiver: AsyncMutex::new(receiver),
            }),
        );
    }

    /// Drop a peer's inbound queue on session exit.
    pub fn unregister_peer(&self, remote_addr: &str) {
        self.peer_inboxes.write().unwrap().remove(remote_addr);
    }

    /// Feed a `confirm_req` hash pair received from a peer into its queue.
    pub async fn submit_incoming(&self, remote_addr: &str, pair: HashPair) {
        let inbox = self.peer_inboxes.read().unwrap().get(remote_addr).cloned();
        let Some(inbox) = inbox else {
            return;
        };
        if inbox.sender.send(pair).await.is_err() {
            warn!(peer = remote_addr, "confirm_req inbound queue closed");
        }
    }

    /// Remove a hash from the solicitation set (called once it cements).
    pub fn mark_confirmed(&self, hash: &Hash) {
        self.pending.write().unwrap().remove(hash);
    }

    /// Number of hashes currently awaiting a confirming vote.
    pub fn pending_count(&self) -> usize {
        self.pending.read().unwrap().len()
    }

    /// Whether `hash` is tracked in the solicitation set.
    pub fn has_pending(&self, hash: &Hash) -> bool {
        self.pending.read().unwrap().contains_key(hash)
    }

    /// A peer asked us to vote on `pair.hash`. If we don't have the block,
    /// record it in the solicitation set *and* hand it to the cementation
    /// pipeline so it lands in `missing_bodies` and the bootstrap puller
    /// picks it up as a pull target, per the dual record-and-fetch behavior
    /// this path requires.
    async fn handle_incoming_pair(
        &self,
        unchecked: &UncheckedPool,
        ledger: &dyn LedgerFacade,
        cementation: &CementationPipeline,
        pair: HashPair,
    ) {
        if unchecked.get(&pair.hash).is_some() {
            return;
        }
        match ledger.get_block(&pair.hash) {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.pending.write().unwrap().insert(pair.hash, pair.root);
                cementation.enqueue(pair.hash).await;
            }
            Err(e) => debug!(err = %e, hash = %pair.hash, "ledger lookup failed for inbound confirm_req"),
        }
    }
}

async fn send_confirm_req_to_peers(peers_manager: &PeersManager, net: NetworkParams, pairs: &[HashPair]) {
    let count = pairs.len().min(15) as u16;
    let ext_u16: u16 = (count << 12) | (0x1u16 << 8); // block type NOT_A_BLOCK
    let header = Header {
        network_id: net.network_id,
        protocol_version: net.protocol_version,
        message_type: MessageType::ConfirmReq,
        extension: HeaderExtension::from_bytes(ext_u16.to_le_bytes()),
    };

    let mut frame = header.to_bytes().to_vec();
    for pair in pairs.iter().take(count as usize) {
        frame.extend_from_slice(&pair.to_bytes());
    }

    for peer in peers_manager.subset_of_live_peers() {
        if let Err(e) = peer.send(&frame).await {
            warn!(peer = %peer.remote_addr, err = %e, "failed to send confirm_req");
        }
    }
}

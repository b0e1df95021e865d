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

//! The unchecked-block staging area: validated-signature, not-yet-cemented
//! blocks, plus the batch-vote-request table the re-request loop drains.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::crypto::{self, CryptoError};
use crate::core::types::{Block, Hash};
use crate::ledger::LedgerFacade;

/// A block accepted into the pool, paired with the channel-ingest validation
/// it already passed.
#[derive(Clone)]
pub struct UncheckedPool {
    blocks: Arc<RwLock<HashMap<Hash, Block>>>,
    /// hash -> root, for blocks we still want votes on.
    need_votes: Arc<RwLock<HashMap<Hash, Hash>>>,
    ingest_tx: mpsc::Sender<Block>,
}

const INGEST_CHANNEL_CAPACITY: usize = 1024;

impl UncheckedPool {
    /// Construct the pool and spawn its single ingest task, which validates
    /// signatures (honoring the epoch-marker bypass) before inserting.
    pub fn spawn(ledger: Arc<dyn LedgerFacade>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Block>(INGEST_CHANNEL_CAPACITY);
        let blocks = Arc::new(RwLock::new(HashMap::new()));
        let need_votes = Arc::new(RwLock::new(HashMap::new()));

        let pool = Self {
            blocks: blocks.clone(),
            need_votes: need_votes.clone(),
            ingest_tx: tx,
        };

        tokio::spawn(async move {
            while let Some(block) = rx.recv().await {
                if let Err(e) = validate_signature(&block) {
                    debug!(hash = %block.hash, err = %e, "dropping unchecked block with invalid signature");
                    continue;
                }

                if blocks.read().unwrap().contains_key(&block.hash) {
                    continue;
                }
                match ledger.get_block(&block.hash) {
                    Ok(Some(_)) => continue,
                    Ok(None) => {}
                    Err(e) => {
                        warn!(err = %e, "ledger lookup failed while ingesting unchecked block");
                        continue;
                    }
                }

                let root = block.root();
                blocks.write().unwrap().insert(block.hash, block.clone());
                need_votes.write().unwrap().insert(block.hash, root);
            }
        });

        pool
    }

    /// Submit a block for signature validation and insertion. Never blocks
    /// indefinitely: backpressure from a full channel is passed to the caller.
    pub async fn add(&self, block: Block) {
        if self.ingest_tx.send(block).await.is_err() {
            warn!("unchecked pool ingest channel closed");
        }
    }

    /// Look up a staged block.
    pub fn get(&self, hash: &Hash) -> Option<Block> {
        self.blocks.read().unwrap().get(hash).cloned()
    }

    /// Remove a staged block (called once it has been cemented).
    pub fn remove(&self, hash: &Hash) -> Option<Block> {
        self.need_votes.write().unwrap().remove(hash);
        self.blocks.write().unwrap().remove(hash)
    }

    /// Number of staged blocks.
    pub fn count(&self) -> usize {
        self.blocks.read().unwrap().len()
    }

    /// An arbitrary staged block, for vote re-solicitation. Not true
    /// randomness: first iteration-order element, matching the reference
    /// implementation (`spec.md` §9 Open Question, resolved as acceptable).
    pub fn get_random(&self) -> Option<Block> {
        self.blocks.read().unwrap().values().next().cloned()
    }

    /// The hash/root pairs still awaiting a confirming vote.
    pub fn hashes_needing_votes(&self) -> Vec<(Hash, Hash)> {
        self.need_votes
            .read()
            .unwrap()
            .iter()
            .map(|(h, r)| (*h, *r))
            .collect()
    }

    /// Stop tracking a hash as needing votes (called once it cements).
    pub fn mark_confirmed(&self, hash: &Hash) {
        self.need_votes.write().unwrap().remove(hash);
    }
}

fn validate_signature(block: &Block) -> Result<(), CryptoError> {
    if block.epoch_marker().is_some() {
        return Ok(());
    }
    let preimage = block.hash.0;
    crypto::verify(&block.account, &preimage, &block.signature)
}

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

//! The cementation state machine: for a hash requested to cement, walk the
//! account chain back to a cemented frontier (or an Open block), detect
//! gaps, and on a gapless chain write blocks to the ledger in ascending
//! height order.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::core::types::{Amount, Block, Hash};
use crate::ledger::unchecked::UncheckedPool;
use crate::ledger::LedgerFacade;
use crate::monitoring::metrics::Metrics;

/// How the cementation pipeline decides a hash is ready to write, independent
/// of the chain-walk/gap-detection machinery below. Only `TrustedPrShortcut`
/// is wired active; `WeightThreshold` exists so both modes can coexist
/// behind one policy object, per the commented weight-accumulation design in
/// the reference implementation.
pub enum CementationPolicy {
    /// A single final vote from a configured Trusted PR is sufficient.
    TrustedPrShortcut,
    /// Cement once accumulated voting weight for a hash reaches the threshold.
    WeightThreshold {
        /// Minimum accumulated weight required, e.g. 42,000,000 × 10^30 raw.
        min_weight: Amount,
    },
}

impl CementationPolicy {
    /// Whether a hash is ready to cement given the caller's vote bookkeeping.
    pub fn should_cement(&self, is_trusted_pr_vote: bool, accumulated_weight: Amount) -> bool {
        match self {
            CementationPolicy::TrustedPrShortcut => is_trusted_pr_vote,
            CementationPolicy::WeightThreshold { min_weight } => {
                accumulated_weight.0 >= min_weight.0
            }
        }
    }
}

const CEMENT_CHANNEL_CAPACITY: usize = 512 * 1024;

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Drives the cementation pipeline: one serial worker task reading cement
/// requests, plus a 1 Hz retry loop for hashes still waiting on a body.
#[derive(Clone)]
pub struct CementationPipeline {
    cement_tx: mpsc::Sender<Hash>,
    /// Hashes whose chains are blocked on a missing block body, surfaced to
    /// the bootstrap subsystem so it can prioritize fetching them.
    missing_bodies: Arc<RwLock<HashSet<Hash>>>,
}

impl CementationPipeline {
    /// Construct the pipeline and spawn its worker task and retry loop.
    pub fn spawn(ledger: Arc<dyn LedgerFacade>, unchecked: UncheckedPool, metrics: Arc<Metrics>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Hash>(CEMENT_CHANNEL_CAPACITY);
        let missing_bodies = Arc::new(RwLock::new(HashSet::new()));

        let pipeline = Self {
            cement_tx: tx.clone(),
            missing_bodies: missing_bodies.clone(),
        };

        let worker_ledger = ledger.clone();
        let worker_unchecked = unchecked.clone();
        let worker_missing = missing_bodies.clone();
        let worker_metrics = metrics.clone();
        tokio::spawn(async move {
            while let Some(hash) = rx.recv().await {
                if let Err(fatal) =
                    cement_hash(&*worker_ledger, &worker_unchecked, &worker_missing, hash, &worker_metrics)
                {
                    worker_metrics.cementation_fatal_total.inc();
                    error!(hash = %hash, err = %fatal, "cementation halted: ledger consistency error");
                    break;
                }
            }
        });

        let retry_tx = tx;
        let retry_missing = missing_bodies.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let pending: Vec<Hash> = retry_missing.read().unwrap().iter().copied().collect();
                for hash in pending {
                    if retry_tx.send(hash).await.is_err() {
                        return;
                    }
                }
            }
        });

        pipeline
    }

    /// Enqueue a hash for cementation (called from the confirm_ack worker on
    /// a final vote the active policy accepts).
    pub async fn enqueue(&self, hash: Hash) {
        if self.cement_tx.send(hash).await.is_err() {
            warn!(hash = %hash, "cementation channel closed");
        }
    }

    /// Hashes currently blocked on a missing body, for the bootstrap puller.
    pub fn missing_bodies(&self) -> Vec<Hash> {
        self.missing_bodies.read().unwrap().iter().copied().collect()
    }
}

/// Fatal ledger-consistency failure; halts the cementation worker.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CementationFatal(String);

fn cement_hash(
    ledger: &dyn LedgerFacade,
    unchecked: &UncheckedPool,
    missing_bodies: &RwLock<HashSet<Hash>>,
    hash: Hash,
    metrics: &Metrics,
) -> Result<(), CementationFatal> {
    let Some(_) = unchecked.get(&hash) else {
        missing_bodies.write().unwrap().insert(hash);
        info!(hash = %hash, "waiting for block body before cementing");
        return Ok(());
    };

    let chain = match walk_chain(ledger, unchecked, hash) {
        ChainWalk::Ready(chain) => chain,
        ChainWalk::Gap(missing) => {
            missing_bodies.write().unwrap().insert(missing);
            info!(hash = %hash, gap = %missing, "gap detected in account chain, notifying bootstrap");
            return Ok(());
        }
    };

    for block in &chain {
        if block.is_open() {
            match ledger.get_account(&block.account) {
                Ok(Some(_)) => {
                    return Err(CementationFatal(format!(
                        "duplicate account root for open block {}",
                        block.hash
                    )));
                }
                Ok(None) => {}
                Err(e) => return Err(CementationFatal(e.to_string())),
            }
        }

        if let Err(e) = ledger.put_block(block, now_unix_secs()) {
            return Err(CementationFatal(e.to_string()));
        }

        unchecked.remove(&block.hash);
        unchecked.mark_confirmed(&block.hash);
        missing_bodies.write().unwrap().remove(&block.hash);
        metrics.cemented_total.inc();
    }

    Ok(())
}

enum ChainWalk {
    Ready(Vec<Block>),
    Gap(Hash),
}

/// Walk backwards from `start` along `previous` until a cemented frontier or
/// an Open block is reached, or a hash is found in neither the ledger nor
/// the unchecked pool (a gap). Returns the uncemented portion of the chain
/// in ascending-height (oldest-first) order.
fn walk_chain(ledger: &dyn LedgerFacade, unchecked: &UncheckedPool, start: Hash) -> ChainWalk {
    let mut chain = Vec::new();
    let mut cursor = start;

    loop {
        match ledger.get_block(&cursor) {
            Ok(Some(_)) => break,
            Ok(None) => {}
            Err(_) => return ChainWalk::Gap(cursor),
        }

        let Some(block) = unchecked.get(&cursor) else {
            return ChainWalk::Gap(cursor);
        };

        let is_open = block.is_open();
        let previous = block.previous;
        chain.push(block);

        if is_open {
            break;
        }
        cursor = previous;
    }

    chain.reverse();
    ChainWalk::Ready(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, BlockKind, Signature, Work};
    use crate::ledger::json::JsonLedger;

    fn block(kind: BlockKind, hash: Hash, previous: Hash, account: Address) -> Block {
        Block {
            kind,
            hash,
            previous,
            account,
            representative: Address::ZERO,
            balance: Amount::ZERO,
            link: [0u8; 32],
            signature: Signature([0u8; 64]),
            work: Work([0u8; 8]),
        }
    }

    #[tokio::test]
    async fn cements_open_block_via_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonLedger::initialize(dir.path()).unwrap();
        let unchecked = UncheckedPool::spawn(ledger.clone());

        let address = Address([1u8; 32]);
        let open_hash = Hash([2u8; 32]);
        let open = block(BlockKind::Open, open_hash, Hash::ZERO, address);
        unchecked.add(open.clone()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let metrics = Arc::new(Metrics::new().unwrap());
        let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics.clone());
        pipeline.enqueue(open_hash).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let account = ledger.get_account(&address).unwrap().unwrap();
        assert_eq!(account.sideband.height, 1);
        assert_eq!(account.frontier, open_hash);
        assert!(unchecked.get(&open_hash).is_none());
        assert_eq!(metrics.cemented_total.get(), 1);
    }

    #[tokio::test]
    async fn gap_blocks_cementation_and_is_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonLedger::initialize(dir.path()).unwrap();
        let unchecked = UncheckedPool::spawn(ledger.clone());

        let address = Address([3u8; 32]);
        let missing_hash = Hash([4u8; 32]);
        let b3_hash = Hash([5u8; 32]);
        let b3 = block(BlockKind::Change, b3_hash, missing_hash, address);
        unchecked.add(b3.clone()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let metrics = Arc::new(Metrics::new().unwrap());
        let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics.clone());
        pipeline.enqueue(b3_hash).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(ledger.get_block_count().unwrap(), 0);
        assert!(pipeline.missing_bodies().contains(&missing_hash));
        assert_eq!(metrics.cemented_total.get(), 0);
    }
}

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

//! End-to-end cementation scenarios driven through the real vote path
//! (`confirm_ack::handle_confirm_ack`), rather than direct
//! `CementationPipeline::enqueue` calls.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use amaranth_node::core::crypto::Keypair;
use amaranth_node::core::types::{Address, Amount, Block, BlockKind, Hash, Work};
use amaranth_node::ledger::cementation::CementationPipeline;
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::unchecked::UncheckedPool;
use amaranth_node::ledger::LedgerFacade;
use amaranth_node::monitoring::metrics::Metrics;
use amaranth_node::net::confirm_ack::{handle_confirm_ack, vote_hash, FINAL_VOTE_TVD};
use amaranth_node::wire::header::HeaderExtension;

fn ext_for_hash_list(count: u16) -> HeaderExtension {
    let ext_u16: u16 = (count << 12) | (0x1u16 << 8);
    HeaderExtension::from_bytes(ext_u16.to_le_bytes())
}

fn final_vote_body(pr: &Keypair, hashes: &[Hash]) -> Vec<u8> {
    let sig = pr.sign(&vote_hash(hashes, &FINAL_VOTE_TVD));
    let mut body = Vec::new();
    body.extend_from_slice(&pr.public_key().0);
    body.extend_from_slice(&sig.0);
    body.extend_from_slice(&FINAL_VOTE_TVD);
    for h in hashes {
        body.extend_from_slice(&h.0);
    }
    body
}

fn signed_block(kind: BlockKind, kp: &Keypair, hash: Hash, previous: Hash, account: Address) -> Block {
    let signature = kp.sign(&hash.0);
    Block {
        kind,
        hash,
        previous,
        account,
        representative: Address::ZERO,
        balance: Amount::ZERO,
        link: [0u8; 32],
        signature,
        work: Work([0u8; 8]),
    }
}

/// S2: a single final vote from a configured Trusted PR cements an Open
/// block whose body is already staged in the unchecked pool.
#[tokio::test]
async fn trusted_pr_final_vote_cements_staged_open_block() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let metrics = Arc::new(Metrics::new().unwrap());
    let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics.clone());

    let owner = Keypair::from_seed([41u8; 32]);
    let address = owner.public_key();
    let open_hash = Hash([51u8; 32]);
    let open = signed_block(BlockKind::Open, &owner, open_hash, Hash::ZERO, address);
    unchecked.add(open).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let pr = Keypair::from_seed([42u8; 32]);
    let mut trusted = HashSet::new();
    trusted.insert(pr.public_key());

    let body = final_vote_body(&pr, &[open_hash]);
    handle_confirm_ack(&body, ext_for_hash_list(1), &trusted, &pipeline, &metrics).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let account = ledger.get_account(&address).unwrap().unwrap();
    assert_eq!(account.sideband.height, 1);
    assert_eq!(account.frontier, open_hash);
    assert!(unchecked.get(&open_hash).is_none());
    assert!(!pipeline.missing_bodies().contains(&open_hash));
}

/// Invariant 4: account-chain height increases by exactly one at each
/// cementation step, never skipping or regressing, across a three-block
/// Open -> Change -> Change chain.
#[tokio::test]
async fn account_chain_height_increases_monotonically() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let metrics = Arc::new(Metrics::new().unwrap());
    let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics);

    let owner = Keypair::from_seed([43u8; 32]);
    let address = owner.public_key();
    let h1 = Hash([61u8; 32]);
    let h2 = Hash([62u8; 32]);
    let h3 = Hash([63u8; 32]);

    let b1 = signed_block(BlockKind::Open, &owner, h1, Hash::ZERO, address);
    let b2 = signed_block(BlockKind::Change, &owner, h2, h1, address);
    let b3 = signed_block(BlockKind::Change, &owner, h3, h2, address);
    unchecked.add(b1).await;
    unchecked.add(b2).await;
    unchecked.add(b3).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    pipeline.enqueue(h1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ledger.get_account(&address).unwrap().unwrap().sideband.height, 1);

    pipeline.enqueue(h2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ledger.get_account(&address).unwrap().unwrap().sideband.height, 2);

    pipeline.enqueue(h3).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let account = ledger.get_account(&address).unwrap().unwrap();
    assert_eq!(account.sideband.height, 3);
    assert_eq!(account.frontier, h3);
}

/// Invariant 7: re-requesting cementation of an already-cemented hash does
/// not alter ledger state (no double write, no fatal error).
#[tokio::test]
async fn recementing_an_already_cemented_hash_is_a_ledger_noop() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let metrics = Arc::new(Metrics::new().unwrap());
    let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics);

    let owner = Keypair::from_seed([44u8; 32]);
    let address = owner.public_key();
    let open_hash = Hash([71u8; 32]);
    let open = signed_block(BlockKind::Open, &owner, open_hash, Hash::ZERO, address);
    unchecked.add(open).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    pipeline.enqueue(open_hash).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let before = ledger.get_account(&address).unwrap().unwrap();
    let block_count_before = ledger.get_block_count().unwrap();

    pipeline.enqueue(open_hash).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let after = ledger.get_account(&address).unwrap().unwrap();
    assert_eq!(before.sideband.height, after.sideband.height);
    assert_eq!(before.frontier, after.frontier);
    assert_eq!(block_count_before, ledger.get_block_count().unwrap());
}

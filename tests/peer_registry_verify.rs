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

//! Peer-sourced data verification scenarios: a multi-block `bulk_pull`
//! response stream, a gap left by a missing intermediate block, and a
//! forged vote signature arriving over the wire.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use amaranth_node::core::crypto::Keypair;
use amaranth_node::core::types::{Address, Amount, Block, BlockKind, Hash, Signature, Work};
use amaranth_node::ledger::cementation::CementationPipeline;
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::unchecked::UncheckedPool;
use amaranth_node::ledger::LedgerFacade;
use amaranth_node::monitoring::metrics::Metrics;
use amaranth_node::net::bootstrap::receive_bulk_pull_response;
use amaranth_node::net::confirm_ack::{handle_confirm_ack, vote_hash, FINAL_VOTE_TVD};
use amaranth_node::wire::block::{parse_open_block, parse_state_block};
use amaranth_node::wire::header::HeaderExtension;
use amaranth_node::wire::message::NOT_A_BLOCK;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn ext_for_hash_list(count: u16) -> HeaderExtension {
    let ext_u16: u16 = (count << 12) | (0x1u16 << 8);
    HeaderExtension::from_bytes(ext_u16.to_le_bytes())
}

fn encode_open_block_signed(kp: &Keypair) -> (Vec<u8>, Hash) {
    let mut body = vec![0u8; 168];
    body[64..96].copy_from_slice(&kp.public_key().0);
    let hash = parse_open_block(&body).unwrap().hash;
    let sig = kp.sign(&hash.0);
    body[96..160].copy_from_slice(&sig.0);
    (body, hash)
}

fn encode_state_block_signed(kp: &Keypair, previous: Hash) -> (Vec<u8>, Hash) {
    let mut body = vec![0u8; 216];
    body[0..32].copy_from_slice(&kp.public_key().0);
    body[32..64].copy_from_slice(&previous.0);
    let hash = parse_state_block(&body).unwrap().hash;
    let sig = kp.sign(&hash.0);
    body[144..208].copy_from_slice(&sig.0);
    (body, hash)
}

/// S4 extended: a `bulk_pull` response carrying two sequential blocks
/// (Open followed by State) stages both, each under its own hash.
#[tokio::test]
async fn bulk_pull_response_stages_two_sequential_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger);

    let kp = Keypair::from_seed([51u8; 32]);
    let (open_body, open_hash) = encode_open_block_signed(&kp);
    let (state_body, state_hash) = encode_state_block_signed(&kp, open_hash);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&[0x04]).await.unwrap();
        stream.write_all(&open_body).await.unwrap();
        stream.write_all(&[0x06]).await.unwrap();
        stream.write_all(&state_body).await.unwrap();
        stream.write_all(&[NOT_A_BLOCK]).await.unwrap();
    });

    let client = TcpStream::connect(addr).await.unwrap();
    let (mut read_half, _write_half) = client.into_split();
    let metrics = Metrics::new().unwrap();
    let count = receive_bulk_pull_response(&mut read_half, &unchecked, &metrics).await.unwrap();
    server.await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(count, 2);
    assert_eq!(unchecked.count(), 2);
    assert!(unchecked.get(&open_hash).is_some());
    assert!(unchecked.get(&state_hash).is_some());
}

/// S3: a State block whose `previous` is missing from both the ledger and
/// the unchecked pool blocks cementation and surfaces the missing hash.
#[tokio::test]
async fn gap_in_account_chain_is_surfaced_via_confirm_ack_path() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let metrics = Arc::new(Metrics::new().unwrap());
    let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics.clone());

    let owner = Keypair::from_seed([52u8; 32]);
    let address = owner.public_key();
    let missing_hash = Hash([81u8; 32]);
    let b3_hash = Hash([82u8; 32]);
    let b3 = Block {
        kind: BlockKind::Change,
        hash: b3_hash,
        previous: missing_hash,
        account: address,
        representative: Address::ZERO,
        balance: Amount::ZERO,
        link: [0u8; 32],
        signature: owner.sign(&b3_hash.0),
        work: Work([0u8; 8]),
    };
    unchecked.add(b3).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let pr = Keypair::from_seed([53u8; 32]);
    let mut trusted = HashSet::new();
    trusted.insert(pr.public_key());

    let sig = pr.sign(&vote_hash(&[b3_hash], &FINAL_VOTE_TVD));
    let mut body = Vec::new();
    body.extend_from_slice(&pr.public_key().0);
    body.extend_from_slice(&sig.0);
    body.extend_from_slice(&FINAL_VOTE_TVD);
    body.extend_from_slice(&b3_hash.0);

    handle_confirm_ack(&body, ext_for_hash_list(1), &trusted, &pipeline, &metrics).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(ledger.get_block_count().unwrap(), 0);
    assert!(pipeline.missing_bodies().contains(&missing_hash));
}

/// S6: a vote arriving with a forged signature is dropped without being
/// enqueued for cementation, and the pipeline and ledger stay untouched.
#[tokio::test]
async fn forged_vote_signature_is_dropped_without_cementation() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let metrics = Arc::new(Metrics::new().unwrap());
    let pipeline = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics.clone());

    let claimed_voter = Keypair::from_seed([54u8; 32]).public_key();
    let voted_hash = Hash([91u8; 32]);

    let mut trusted = HashSet::new();
    trusted.insert(claimed_voter);

    let mut body = Vec::new();
    body.extend_from_slice(&claimed_voter.0);
    body.extend_from_slice(&Signature([0u8; 64]).0);
    body.extend_from_slice(&FINAL_VOTE_TVD);
    body.extend_from_slice(&voted_hash.0);

    handle_confirm_ack(&body, ext_for_hash_list(1), &trusted, &pipeline, &metrics).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!pipeline.missing_bodies().contains(&voted_hash));
    assert_eq!(ledger.get_block_count().unwrap(), 0);
}

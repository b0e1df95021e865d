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

//! `ConfirmAckWorker`: vote-hash validation per the `"vote "`-prefixed
//! BLAKE2b-256 law, final-vote recognition, and the Trusted-PR cementation
//! shortcut. Invalid signatures drop the packet; the session stays open.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::crypto::{self, blake2b_256};
use crate::core::types::{Address, Hash, Signature};
use crate::ledger::cementation::CementationPipeline;
use crate::monitoring::metrics::Metrics;
use crate::wire::header::HeaderExtension;
use crate::wire::message::BlockTypeTag;

/// The timestamp-and-vote-duration value denoting a final vote.
pub const FINAL_VOTE_TVD: [u8; 8] = [0xff; 8];

/// Errors in an inbound `confirm_ack` body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfirmAckError {
    /// The body was too short or its length didn't match the declared shape.
    #[error("malformed confirm_ack body")]
    Malformed,
    /// The vote signature did not verify against the claimed voter.
    #[error("bad vote signature")]
    BadSignature,
}

/// A validated vote: voter, the hashes it covers, and whether it's final.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    /// The voting account.
    pub voter: Address,
    /// Hashes covered by this vote, in wire order.
    pub hashes: Vec<Hash>,
    /// True iff the embedded TVD is all-ones.
    pub is_final: bool,
}

/// Parse and validate a `confirm_ack_hashes` body: 32-byte voter account,
/// 64-byte signature, 8-byte TVD, then a hash list. Callers must filter out
/// `confirm_ack_by_block` packets (any extension block type other than
/// `NotABlock`) before calling this; see `handle_confirm_ack`.
pub fn parse_and_validate(body: &[u8], extension: HeaderExtension) -> Result<Vote, ConfirmAckError> {
    if body.len() < 104 {
        return Err(ConfirmAckError::Malformed);
    }
    if extension.block_type() != BlockTypeTag::NotABlock {
        return Err(ConfirmAckError::Malformed);
    }
    let voter = Address(body[0..32].try_into().unwrap());
    let signature = Signature(body[32..96].try_into().unwrap());
    let tvd: [u8; 8] = body[96..104].try_into().unwrap();

    let count = extension.count() as usize;
    if body.len() != 104 + count * 32 {
        return Err(ConfirmAckError::Malformed);
    }
    let hashes = (0..count)
        .map(|i| Hash(body[104 + i * 32..104 + (i + 1) * 32].try_into().unwrap()))
        .collect::<Vec<_>>();

    let vote_hash = vote_hash(&hashes, &tvd);
    crypto::verify(&voter, &vote_hash, &signature).map_err(|_| ConfirmAckError::BadSignature)?;

    Ok(Vote {
        voter,
        hashes,
        is_final: tvd == FINAL_VOTE_TVD,
    })
}

/// `BLAKE2b-256("vote " ‖ h1 ‖ ... ‖ hn ‖ tvd)`.
pub fn vote_hash(hashes: &[Hash], tvd: &[u8; 8]) -> [u8; 32] {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(hashes.len() + 2);
    parts.push(b"vote ");
    for h in hashes {
        parts.push(&h.0);
    }
    parts.push(tvd);
    blake2b_256(&parts)
}

/// Process a (already length-checked) `confirm_ack` body: validate, and on a
/// final vote from a Trusted PR, enqueue every voted hash for cementation.
/// Invalid signatures are logged and dropped, never propagated as a
/// session-fatal error. `confirm_ack_by_block` packets (voter-vouches-for-a-
/// single-attached-block, rather than a hash list) are read off the wire by
/// the session loop's framing but never reach the vote/cementation pipeline
/// here, matching `confirm_ack.go::handleConfirmAckBlock`'s discard.
pub async fn handle_confirm_ack(
    body: &[u8],
    extension: HeaderExtension,
    trusted_prs: &HashSet<Address>,
    cementation: &CementationPipeline,
    metrics: &Metrics,
) {
    if extension.block_type() != BlockTypeTag::NotABlock {
        debug!("discarding confirm_ack_by_block packet, by-block votes are not relayed into cementation");
        return;
    }

    let vote = match parse_and_validate(body, extension) {
        Ok(v) => v,
        Err(e) => {
            metrics.votes_invalid_total.inc();
            debug!(err = %e, "dropping invalid confirm_ack");
            return;
        }
    };
    metrics.votes_valid_total.inc();

    if !vote.is_final {
        return;
    }

    if !trusted_prs.contains(&vote.voter) {
        return;
    }

    metrics.votes_final_trusted_total.inc();
    for hash in &vote.hashes {
        cementation.enqueue(*hash).await;
    }
    if vote.hashes.is_empty() {
        warn!(voter = %vote.voter, "final vote from trusted PR carried no hashes");
    }
}

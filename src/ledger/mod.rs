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

//! The persistent storage contract (`LedgerFacade`) and its backends, plus
//! the unchecked-block staging area and the cementation pipeline that sits
//! in front of it.

/// Block/account cementation: gap detection, ascending-height ledger writes.
pub mod cementation;
/// JSON file-backed `LedgerFacade` implementation.
pub mod json;
/// `sled`-backed `LedgerFacade` implementation.
pub mod sled_backend;
/// Staging area for validated-signature, not-yet-cemented blocks.
pub mod unchecked;

use std::collections::HashMap;
use thiserror::Error;

use crate::core::types::{Account, Address, Amount, Block, Hash};

/// Errors a `LedgerFacade` backend can raise.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The underlying storage medium failed (disk I/O, serialization, etc).
    #[error("ledger backend error: {0}")]
    Backend(String),
    /// `put_block` received a non-open block for an account with no prior entry.
    #[error("put_block: unknown account for non-open block")]
    UnknownAccount,
    /// `put_block`'s block does not chain from the account's current frontier.
    #[error("put_block: previous does not match account frontier")]
    PreviousMismatch,
}

/// Backend-agnostic contract to the durable ledger, per `spec.md` §6.
///
/// Implementations must make `put_block` atomic with its sideband update:
/// a crash between writing the block and updating the account record must
/// not be observable by callers.
pub trait LedgerFacade: Send + Sync {
    /// Look up a block by hash.
    fn get_block(&self, hash: &Hash) -> Result<Option<Block>, LedgerError>;

    /// Write a block and atomically update its account's sideband.
    ///
    /// For an Open block with no existing account entry: initializes
    /// `height = 1`, `timestamp = now`. Otherwise requires
    /// `block.previous == account.frontier`, increments height by 1, and
    /// preserves the account's original open timestamp.
    fn put_block(&self, block: &Block, now_unix_secs: u64) -> Result<(), LedgerError>;

    /// Total number of blocks ever written.
    fn get_block_count(&self) -> Result<u64, LedgerError>;

    /// Total number of accounts opened.
    fn get_account_count(&self) -> Result<u64, LedgerError>;

    /// Look up an account's cemented frontier and sideband.
    fn get_account(&self, address: &Address) -> Result<Option<Account>, LedgerError>;

    /// Overwrite an account's stored record.
    fn store_account(&self, account: &Account) -> Result<(), LedgerError>;

    /// The account's chain, frontier-first, down to (and including) its open block.
    fn get_account_chain(&self, address: &Address) -> Result<Vec<Hash>, LedgerError>;

    /// An address to bootstrap against, or `None` if the ledger is empty.
    fn get_random_account_address(&self) -> Result<Option<Address>, LedgerError>;

    /// An account's voting weight, as loaded from the initial weights table.
    fn get_voting_weight(&self, address: &Address) -> Result<Amount, LedgerError>;

    /// Persist newly observed peer IP:port strings with the current timestamp.
    fn add_node_ips(&self, ips: &[String], now_unix_secs: u64) -> Result<(), LedgerError>;

    /// All persisted peer endpoints, keyed by `ip:port`, with last-seen timestamp.
    fn get_node_ips(&self) -> Result<HashMap<String, u64>, LedgerError>;

    /// Flush any pending state; called on shutdown.
    fn cleanup(&self) -> Result<(), LedgerError>;
}

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

//! `sled`-backed `LedgerFacade`, the pluggable second backend. Adapted from
//! the teacher's `core/state/persistent_state.rs` sled usage; the
//! Merkle-root/proof machinery there had no counterpart here and was
//! dropped in favor of four plain trees keyed by the natural identity of
//! each entity.

use std::collections::HashMap;
use std::path::Path;

use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use tracing::info;

use crate::core::types::{Account, Address, Amount, Block, BlockKind, Hash, Sideband};
use crate::ledger::{LedgerError, LedgerFacade};

/// A `sled`-backed ledger. One tree each for blocks, accounts, peer IPs, and
/// the one-time voting-weight table.
pub struct SledLedger {
    db: sled::Db,
    blocks: sled::Tree,
    accounts: sled::Tree,
    nodes: sled::Tree,
    voting_weight: sled::Tree,
}

fn to_backend_err<E: std::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Backend(e.to_string())
}

impl SledLedger {
    /// Open (or create) a sled database at `<data_dir>/sled`.
    pub fn open(data_dir: &Path) -> Result<Self, LedgerError> {
        let db = sled::open(data_dir.join("sled")).map_err(to_backend_err)?;
        let blocks = db.open_tree("blocks").map_err(to_backend_err)?;
        let accounts = db.open_tree("accounts").map_err(to_backend_err)?;
        let nodes = db.open_tree("nodes").map_err(to_backend_err)?;
        let voting_weight = db.open_tree("voting_weight").map_err(to_backend_err)?;

        let ledger = Self {
            db,
            blocks,
            accounts,
            nodes,
            voting_weight,
        };
        ledger.load_weights_file_once(Path::new("weights.json"))?;
        Ok(ledger)
    }

    fn load_weights_file_once(&self, path: &Path) -> Result<(), LedgerError> {
        if !self.voting_weight.is_empty() {
            return Ok(());
        }
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Ok(());
        };
        let Ok(parsed) = serde_json::from_str::<HashMap<String, String>>(&raw) else {
            return Ok(());
        };
        for (addr_hex, amount_str) in parsed {
            let (Ok(address), Ok(amount)) =
                (addr_hex.parse::<Address>(), amount_str.parse::<u128>())
            else {
                continue;
            };
            self.voting_weight
                .insert(address.0, bincode::serialize(&Amount(amount)).map_err(to_backend_err)?)
                .map_err(to_backend_err)?;
        }
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredAccount {
    frontier: Hash,
    sideband: Sideband,
}

impl LedgerFacade for SledLedger {
    fn get_block(&self, hash: &Hash) -> Result<Option<Block>, LedgerError> {
        let Some(raw) = self.blocks.get(hash.0).map_err(to_backend_err)? else {
            return Ok(None);
        };
        bincode::deserialize(&raw).map(Some).map_err(to_backend_err)
    }

    fn put_block(&self, block: &Block, now_unix_secs: u64) -> Result<(), LedgerError> {
        let existing: Option<StoredAccount> = self
            .accounts
            .get(block.account.0)
            .map_err(to_backend_err)?
            .map(|raw| bincode::deserialize(&raw))
            .transpose()
            .map_err(to_backend_err)?;

        let sideband = match (block.kind, existing) {
            (BlockKind::Open, None) => Sideband {
                height: 1,
                timestamp: now_unix_secs,
            },
            (BlockKind::Open, Some(_)) => return Err(LedgerError::UnknownAccount),
            (_, None) => return Err(LedgerError::UnknownAccount),
            (_, Some(account)) => {
                if block.previous != account.frontier {
                    return Err(LedgerError::PreviousMismatch);
                }
                Sideband {
                    height: account.sideband.height + 1,
                    timestamp: account.sideband.timestamp,
                }
            }
        };

        let stored = StoredAccount {
            frontier: block.hash,
            sideband,
        };

        let block_bytes = bincode::serialize(block).map_err(to_backend_err)?;
        let account_bytes = bincode::serialize(&stored).map_err(to_backend_err)?;

        (&self.blocks, &self.accounts)
            .transaction(|(blocks_tx, accounts_tx)| {
                blocks_tx.insert(&block.hash.0, block_bytes.clone())?;
                accounts_tx.insert(&block.account.0, account_bytes.clone())?;
                Ok::<(), ConflictableTransactionError<LedgerError>>(())
            })
            .map_err(to_backend_err)?;

        Ok(())
    }

    fn get_block_count(&self) -> Result<u64, LedgerError> {
        Ok(self.blocks.len() as u64)
    }

    fn get_account_count(&self) -> Result<u64, LedgerError> {
        Ok(self.accounts.len() as u64)
    }

    fn get_account(&self, address: &Address) -> Result<Option<Account>, LedgerError> {
        let Some(raw) = self.accounts.get(address.0).map_err(to_backend_err)? else {
            return Ok(None);
        };
        let stored: StoredAccount = bincode::deserialize(&raw).map_err(to_backend_err)?;
        Ok(Some(Account {
            address: *address,
            frontier: stored.frontier,
            sideband: stored.sideband,
        }))
    }

    fn store_account(&self, account: &Account) -> Result<(), LedgerError> {
        let stored = StoredAccount {
            frontier: account.frontier,
            sideband: account.sideband,
        };
        self.accounts
            .insert(account.address.0, bincode::serialize(&stored).map_err(to_backend_err)?)
            .map_err(to_backend_err)?;
        Ok(())
    }

    fn get_account_chain(&self, address: &Address) -> Result<Vec<Hash>, LedgerError> {
        let Some(account) = self.get_account(address)? else {
            return Ok(Vec::new());
        };

        let mut chain = Vec::new();
        let mut cursor = account.frontier;
        loop {
            chain.push(cursor);
            let Some(block) = self.get_block(&cursor)? else {
                break;
            };
            if block.is_open() {
                break;
            }
            cursor = block.previous;
        }
        Ok(chain)
    }

    fn get_random_account_address(&self) -> Result<Option<Address>, LedgerError> {
        // Not true randomness: takes sled's own (stable but unspecified)
        // first-key iteration order, matching the reference implementation.
        let Some(first) = self.accounts.iter().keys().next() else {
            return Ok(None);
        };
        let key = first.map_err(to_backend_err)?;
        if key.len() != 32 {
            return Err(LedgerError::Backend("corrupt account key".into()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&key);
        Ok(Some(Address(bytes)))
    }

    fn get_voting_weight(&self, address: &Address) -> Result<Amount, LedgerError> {
        let Some(raw) = self.voting_weight.get(address.0).map_err(to_backend_err)? else {
            return Ok(Amount::ZERO);
        };
        bincode::deserialize(&raw).map_err(to_backend_err)
    }

    fn add_node_ips(&self, ips: &[String], now_unix_secs: u64) -> Result<(), LedgerError> {
        for ip in ips {
            if self.nodes.get(ip.as_bytes()).map_err(to_backend_err)?.is_none() {
                self.nodes
                    .insert(ip.as_bytes(), &now_unix_secs.to_le_bytes())
                    .map_err(to_backend_err)?;
            }
        }
        Ok(())
    }

    fn get_node_ips(&self) -> Result<HashMap<String, u64>, LedgerError> {
        let mut out = HashMap::new();
        for item in self.nodes.iter() {
            let (k, v) = item.map_err(to_backend_err)?;
            let ip = String::from_utf8_lossy(&k).into_owned();
            let mut ts_bytes = [0u8; 8];
            ts_bytes.copy_from_slice(&v);
            out.insert(ip, u64::from_le_bytes(ts_bytes));
        }
        Ok(out)
    }

    fn cleanup(&self) -> Result<(), LedgerError> {
        info!("flushing sled ledger before shutdown");
        self.db.flush().map_err(to_backend_err)?;
        Ok(())
    }
}

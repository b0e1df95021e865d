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

//! JSON file-backed `LedgerFacade`, the default backend. One file holds the
//! whole dataset (`<data_dir>/JSON/database.json`); a background task
//! periodically flushes it to disk, mirroring
//! `original_source/database/json/json_backend.go`'s `PeriodicSaves` loop.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::types::{Account, Address, Amount, Block, Hash, Sideband};
use crate::ledger::{LedgerError, LedgerFacade};

#[derive(Clone, Serialize, Deserialize)]
struct DbAccount {
    frontier: Hash,
    sideband: Sideband,
}

#[derive(Default, Serialize, Deserialize)]
struct DbSchema {
    #[serde(default)]
    blocks: HashMap<String, Block>,
    #[serde(default)]
    accounts: HashMap<String, DbAccount>,
    /// ip:port => last-seen unix timestamp.
    #[serde(default)]
    nodes: HashMap<String, u64>,
    /// address hex => raw amount, loaded once from `weights.json` at startup.
    #[serde(default, skip_serializing)]
    voting_weight: HashMap<String, Amount>,
}

/// JSON file-backed ledger. Cheap to construct, safe to share behind an `Arc`.
pub struct JsonLedger {
    file_path: PathBuf,
    data: RwLock<DbSchema>,
}

impl JsonLedger {
    /// Load (or create) the database file at `<data_dir>/JSON/database.json`,
    /// and the one-time `weights.json` voting-weight table from the current
    /// working directory, then spawn the periodic-save task.
    pub fn initialize(data_dir: &Path) -> Result<std::sync::Arc<Self>, LedgerError> {
        let dir = data_dir.join("JSON");
        std::fs::create_dir_all(&dir).map_err(|e| LedgerError::Backend(e.to_string()))?;
        let file_path = dir.join("database.json");

        let mut data = if file_path.exists() {
            let raw = std::fs::read_to_string(&file_path)
                .map_err(|e| LedgerError::Backend(e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| LedgerError::Backend(e.to_string()))?
        } else {
            std::fs::write(&file_path, b"{}").map_err(|e| LedgerError::Backend(e.to_string()))?;
            DbSchema::default()
        };

        data.voting_weight = load_weights_file(Path::new("weights.json"));

        let ledger = std::sync::Arc::new(Self {
            file_path,
            data: RwLock::new(data),
        });

        let bg = ledger.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5));
            loop {
                interval.tick().await;
                if let Err(e) = bg.save() {
                    error!(err = %e, "failed to persist JSON ledger");
                }
            }
        });

        Ok(ledger)
    }

    fn save(&self) -> Result<(), LedgerError> {
        let snapshot = self.data.read().unwrap();
        let serialized =
            serde_json::to_vec(&*snapshot).map_err(|e| LedgerError::Backend(e.to_string()))?;
        drop(snapshot);
        std::fs::write(&self.file_path, serialized).map_err(|e| LedgerError::Backend(e.to_string()))
    }
}

fn load_weights_file(path: &Path) -> HashMap<String, Amount> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    let Ok(parsed) = serde_json::from_str::<HashMap<String, String>>(&raw) else {
        return HashMap::new();
    };
    parsed
        .into_iter()
        .filter_map(|(addr, amount_str)| amount_str.parse::<u128>().ok().map(|a| (addr, Amount(a))))
        .collect()
}

impl LedgerFacade for JsonLedger {
    fn get_block(&self, hash: &Hash) -> Result<Option<Block>, LedgerError> {
        let data = self.data.read().unwrap();
        Ok(data.blocks.get(&hash.to_string()).cloned())
    }

    fn put_block(&self, block: &Block, now_unix_secs: u64) -> Result<(), LedgerError> {
        use crate::core::types::BlockKind;

        let mut data = self.data.write().unwrap();
        let addr_hex = block.account.to_string();
        let existing = data.accounts.get(&addr_hex).cloned();

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

        data.blocks.insert(block.hash.to_string(), block.clone());
        data.accounts.insert(
            addr_hex,
            DbAccount {
                frontier: block.hash,
                sideband,
            },
        );
        Ok(())
    }

    fn get_block_count(&self) -> Result<u64, LedgerError> {
        Ok(self.data.read().unwrap().blocks.len() as u64)
    }

    fn get_account_count(&self) -> Result<u64, LedgerError> {
        Ok(self.data.read().unwrap().accounts.len() as u64)
    }

    fn get_account(&self, address: &Address) -> Result<Option<Account>, LedgerError> {
        let data = self.data.read().unwrap();
        let Some(db_account) = data.accounts.get(&address.to_string()) else {
            return Ok(None);
        };
        Ok(Some(Account {
            address: *address,
            frontier: db_account.frontier,
            sideband: db_account.sideband,
        }))
    }

    fn store_account(&self, account: &Account) -> Result<(), LedgerError> {
        let mut data = self.data.write().unwrap();
        data.accounts.insert(
            account.address.to_string(),
            DbAccount {
                frontier: account.frontier,
                sideband: account.sideband,
            },
        );
        Ok(())
    }

    fn get_account_chain(&self, address: &Address) -> Result<Vec<Hash>, LedgerError> {
        let data = self.data.read().unwrap();
        let Some(account) = data.accounts.get(&address.to_string()) else {
            return Ok(Vec::new());
        };

        let mut chain = Vec::new();
        let mut cursor = account.frontier;
        loop {
            chain.push(cursor);
            let Some(block) = data.blocks.get(&cursor.to_string()) else {
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
        let data = self.data.read().unwrap();
        // Not true randomness: takes the first iteration-order key of the
        // accounts map, matching the reference implementation's behavior.
        let Some(hex_addr) = data.accounts.keys().next() else {
            return Ok(None);
        };
        hex_addr
            .parse::<Address>()
            .map(Some)
            .map_err(|_| LedgerError::Backend("corrupt account key".into()))
    }

    fn get_voting_weight(&self, address: &Address) -> Result<Amount, LedgerError> {
        let data = self.data.read().unwrap();
        Ok(data
            .voting_weight
            .get(&address.to_string())
            .copied()
            .unwrap_or(Amount::ZERO))
    }

    fn add_node_ips(&self, ips: &[String], now_unix_secs: u64) -> Result<(), LedgerError> {
        let mut data = self.data.write().unwrap();
        for ip in ips {
            data.nodes.entry(ip.clone()).or_insert(now_unix_secs);
        }
        Ok(())
    }

    fn get_node_ips(&self) -> Result<HashMap<String, u64>, LedgerError> {
        Ok(self.data.read().unwrap().nodes.clone())
    }

    fn cleanup(&self) -> Result<(), LedgerError> {
        info!("flushing JSON ledger before shutdown");
        self.save()
    }
}

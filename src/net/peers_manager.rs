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

//! `PeersManager`: the live/bootstrap peer registries, outbound dialing, and
//! square-root-fan-out subset selection for gossip.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::ledger::LedgerFacade;
use crate::monitoring::metrics::Metrics;
use crate::net::peer::{PeerKind, PeerNode};

const DIAL_TIMEOUT: Duration = Duration::from_secs(3);
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(3);

/// Caps and seed endpoints the maintenance loop dials against.
pub struct PeersManagerConfig {
    /// Maximum number of concurrently tracked live peers.
    pub max_live_peers: usize,
    /// Maximum number of concurrently tracked bootstrap peers.
    pub max_bootstrap_peers: usize,
    /// Dialed unconditionally on first start.
    pub static_nodes: Vec<String>,
    /// Consulted before falling back to saved peer IPs from the ledger.
    pub trusted_nodes: Vec<String>,
}

/// Owns the two peer registries and the background dialing loop.
pub struct PeersManager {
    live: RwLock<HashMap<String, Arc<PeerNode>>>,
    bootstrap: RwLock<HashMap<String, Arc<PeerNode>>>,
    ledger: Arc<dyn LedgerFacade>,
    config: PeersManagerConfig,
}

impl PeersManager {
    /// Construct the manager. Call [`PeersManager::spawn_maintenance`]
    /// separately once it's wrapped in an `Arc`.
    pub fn new(ledger: Arc<dyn LedgerFacade>, config: PeersManagerConfig) -> Arc<Self> {
        Arc::new(Self {
            live: RwLock::new(HashMap::new()),
            bootstrap: RwLock::new(HashMap::new()),
            ledger,
            config,
        })
    }

    /// Register a session under its remote address in the appropriate map,
    /// up to that registry's configured cap (`max_live_peers` /
    /// `max_bootstrap_peers`). A session arriving over cap is dropped from
    /// the registry rather than refused at the transport level: it keeps
    /// running, it's simply not counted or selectable via
    /// `subset_of_live_peers`/`is_already_peered`.
    pub async fn register(&self, peer: Arc<PeerNode>, kind: PeerKind) {
        let (map, cap) = match kind {
            PeerKind::Live => (&self.live, self.config.max_live_peers),
            PeerKind::Bootstrap => (&self.bootstrap, self.config.max_bootstrap_peers),
        };
        if map.read().unwrap().len() >= cap {
            warn!(peer = %peer.remote_addr, ?kind, cap, "peer registry at capacity, not tracking session");
            return;
        }
        map.write().unwrap().insert(peer.remote_addr.clone(), peer);
    }

    /// Remove a session on exit; a no-op if it was already removed.
    pub async fn unregister(&self, remote_addr: &str, kind: PeerKind) {
        let map = match kind {
            PeerKind::Live => &self.live,
            PeerKind::Bootstrap => &self.bootstrap,
        };
        map.write().unwrap().remove(remote_addr);
    }

    /// Current live peer count.
    pub fn live_count(&self) -> usize {
        self.live.read().unwrap().len()
    }

    /// Current bootstrap peer count.
    pub fn bootstrap_count(&self) -> usize {
        self.bootstrap.read().unwrap().len()
    }

    /// ⌊√N⌋ live peers, chosen by map iteration order (unspecified but
    /// stable; `spec.md` §4.3 allows randomizing to reduce bias, not
    /// required here).
    pub fn subset_of_live_peers(&self) -> Vec<Arc<PeerNode>> {
        let live = self.live.read().unwrap();
        let subset_size = (live.len() as f64).sqrt() as usize;
        live.values().take(subset_size).cloned().collect()
    }

    /// Whether `remote_addr` is already tracked in either registry.
    pub fn is_already_peered(&self, remote_addr: &str) -> bool {
        self.live.read().unwrap().contains_key(remote_addr)
            || self.bootstrap.read().unwrap().contains_key(remote_addr)
    }

    /// Dial `remote_addr` with the fixed connect timeout, unless it's
    /// already peered. The caller is responsible for spawning the resulting
    /// session once connected.
    pub async fn dial(&self, remote_addr: &str) -> Option<TcpStream> {
        if self.is_already_peered(remote_addr) {
            return None;
        }
        match tokio::time::timeout(DIAL_TIMEOUT, TcpStream::connect(remote_addr)).await {
            Ok(Ok(stream)) => Some(stream),
            Ok(Err(e)) => {
                warn!(peer = remote_addr, err = %e, "dial failed");
                None
            }
            Err(_) => {
                warn!(peer = remote_addr, "dial timed out");
                None
            }
        }
    }

    /// Spawn the 3 s maintenance loop: logs counts, and fills vacancies by
    /// dialing trusted/static seeds first, then saved peer IPs from the
    /// ledger, up to the configured caps.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        dial_callback: Arc<dyn Fn(TcpStream, String) + Send + Sync>,
        metrics: Arc<Metrics>,
    ) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut seeded = false;
            let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
            loop {
                interval.tick().await;
                metrics.peers_live.set(manager.live_count() as i64);
                metrics.peers_bootstrap.set(manager.bootstrap_count() as i64);
                info!(
                    live = manager.live_count(),
                    bootstrap = manager.bootstrap_count(),
                    "peer maintenance tick"
                );

                if !seeded {
                    seeded = true;
                    let mut seeds = manager.config.trusted_nodes.clone();
                    seeds.extend(manager.config.static_nodes.clone());
                    for addr in seeds {
                        if let Some(stream) = manager.dial(&addr).await {
                            dial_callback(stream, addr);
                        }
                    }
                    continue;
                }

                if manager.live_count() >= manager.config.max_live_peers {
                    continue;
                }

                let known_ips = match manager.ledger.get_node_ips() {
                    Ok(ips) => ips,
                    Err(e) => {
                        warn!(err = %e, "failed to load saved peer IPs");
                        continue;
                    }
                };

                for addr in known_ips.keys() {
                    if manager.live_count() >= manager.config.max_live_peers {
                        break;
                    }
                    if let Some(stream) = manager.dial(addr).await {
                        dial_callback(stream, addr.clone());
                    }
                }
            }
        });
    }
}

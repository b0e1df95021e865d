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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use prometheus::{IntCounter, IntGauge, Registry};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or constructing a Prometheus collector failed.
    #[error("prometheus")]
    Prom,
}

/// Metrics container, constructed once at startup and shared behind an `Arc`.
#[derive(Clone)]
pub struct Metrics {
    /// Registry every collector below is registered against.
    pub registry: Registry,

    /// Currently connected live peers.
    pub peers_live: IntGauge,
    /// Currently connected bootstrap peers.
    pub peers_bootstrap: IntGauge,

    /// Blocks cemented (written to the ledger) total.
    pub cemented_total: IntCounter,
    /// Fatal cementation errors (duplicate Open, ledger write failure).
    pub cementation_fatal_total: IntCounter,
    /// Blocks currently staged in the unchecked pool.
    pub unchecked_pool_size: IntGauge,

    /// confirm_ack bodies that failed to parse or verify.
    pub votes_invalid_total: IntCounter,
    /// confirm_ack bodies that parsed and verified.
    pub votes_valid_total: IntCounter,
    /// Final votes from a Trusted PR, each enqueuing cementation.
    pub votes_final_trusted_total: IntCounter,

    /// Blocks received via `bulk_pull_response` during bootstrap.
    pub bootstrap_blocks_pulled_total: IntCounter,
}

impl Metrics {
    /// Create and register every collector.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let peers_live = IntGauge::new("amaranth_peers_live", "Connected live peers")
            .map_err(|_| MetricsError::Prom)?;
        let peers_bootstrap =
            IntGauge::new("amaranth_peers_bootstrap", "Connected bootstrap peers")
                .map_err(|_| MetricsError::Prom)?;

        let cemented_total = IntCounter::new("amaranth_cemented_total", "Blocks cemented")
            .map_err(|_| MetricsError::Prom)?;
        let cementation_fatal_total = IntCounter::new(
            "amaranth_cementation_fatal_total",
            "Fatal cementation errors",
        )
        .map_err(|_| MetricsError::Prom)?;
        let unchecked_pool_size =
            IntGauge::new("amaranth_unchecked_pool_size", "Blocks staged unchecked")
                .map_err(|_| MetricsError::Prom)?;

        let votes_invalid_total =
            IntCounter::new("amaranth_votes_invalid_total", "Invalid confirm_ack bodies")
                .map_err(|_| MetricsError::Prom)?;
        let votes_valid_total =
            IntCounter::new("amaranth_votes_valid_total", "Valid confirm_ack bodies")
                .map_err(|_| MetricsError::Prom)?;
        let votes_final_trusted_total = IntCounter::new(
            "amaranth_votes_final_trusted_total",
            "Final votes from a Trusted PR",
        )
        .map_err(|_| MetricsError::Prom)?;

        let bootstrap_blocks_pulled_total = IntCounter::new(
            "amaranth_bootstrap_blocks_pulled_total",
            "Blocks received via bulk_pull_response",
        )
        .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(peers_live.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(peers_bootstrap.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(cemented_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(cementation_fatal_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(unchecked_pool_size.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(votes_invalid_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(votes_valid_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(votes_final_trusted_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(bootstrap_blocks_pulled_total.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            peers_live,
            peers_bootstrap,
            cemented_total,
            cementation_fatal_total,
            unchecked_pool_size,
            votes_invalid_total,
            votes_valid_total,
            votes_final_trusted_total,
            bootstrap_blocks_pulled_total,
        })
    }
}

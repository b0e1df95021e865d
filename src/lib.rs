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

//! Amaranth node — the networking, consensus, and ledger-ingestion core
//! of a Nano-style delegated-proof-of-stake node.
//!
//! This crate provides:
//! - a custom binary wire codec (header, block, message framing)
//! - peer sessions over a symmetric cookie-based node-id handshake
//! - a peers manager (live/bootstrap registries, outbound dialing)
//! - a bootstrap puller driving `bulk_pull`
//! - the `confirm_req`/`confirm_ack` vote pipeline and the unchecked-block
//!   staging area
//! - the cementation pipeline and a pluggable `LedgerFacade` (JSON or sled)
//! - Prometheus metrics and a minimal HTTP introspection surface

/// Node configuration: TOML parse layer.
pub mod config;
/// Core protocol primitives: fixed-width types, ed25519-blake2b crypto, node identity.
pub mod core;
/// Durable storage: `LedgerFacade` and its backends, unchecked pool, cementation.
pub mod ledger;
/// Observability: Prometheus metrics.
pub mod monitoring;
/// Peer sessions, the peers manager, the bootstrap puller, and vote workers.
pub mod net;
/// Minimal HTTP introspection surface.
pub mod rpc;
/// Wire codec: header, message types, block parsing.
pub mod wire;

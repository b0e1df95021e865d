#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Amaranth node entrypoint (systemd-friendly): loads config, opens the
//! ledger, starts every worker, and serves peer connections and the HTTP
//! introspection endpoint until the process is killed.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use amaranth_node::config::{DatabaseBackend, NodeConfig};
use amaranth_node::core::identity::NodeIdentity;
use amaranth_node::core::types::Hash;
use amaranth_node::ledger::cementation::CementationPipeline;
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::sled_backend::SledLedger;
use amaranth_node::ledger::unchecked::UncheckedPool;
use amaranth_node::ledger::LedgerFacade;
use amaranth_node::monitoring::metrics::Metrics;
use amaranth_node::net::confirm_req::ConfirmReqWorker;
use amaranth_node::net::peer::PeerKind;
use amaranth_node::net::peers_manager::{PeersManager, PeersManagerConfig};
use amaranth_node::net::session::{self, NetworkParams};
use amaranth_node::net::{bootstrap::BootstrapPuller, NodeHandles};
use amaranth_node::rpc;

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();

    let config_path = env("AMARANTH_CONFIG", "./node.toml");
    let config = NodeConfig::load(Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;

    std::fs::create_dir_all(&config.node.data_dir).context("creating data directory")?;
    let data_dir = Path::new(&config.node.data_dir);

    let identity = NodeIdentity::load_or_create(data_dir, config.node.identity_passphrase.as_deref())
        .context("loading node identity")?;
    let identity = Arc::new(identity.keypair().clone());
    info!(node_id = %identity.public_key(), "node identity loaded");

    let ledger: Arc<dyn LedgerFacade> = match config.database.backend {
        DatabaseBackend::Json => JsonLedger::initialize(data_dir).context("opening JSON ledger")?,
        DatabaseBackend::Sled => Arc::new(SledLedger::open(data_dir).context("opening sled ledger")?),
    };

    let genesis_hash: Hash = config
        .consensus
        .genesis_block_hex
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid consensus.genesis_block_hex"))?;

    let trusted_prs: HashSet<_> = config
        .consensus
        .trusted_prs
        .keys()
        .filter_map(|hex| hex.parse().ok())
        .collect();

    let net = NetworkParams {
        network_id: config.p2p.network_id,
        protocol_version: config.p2p.protocol_version,
    };

    let metrics = Arc::new(Metrics::new().context("registering prometheus collectors")?);

    let unchecked = UncheckedPool::spawn(ledger.clone());
    let cementation = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics.clone());

    let peers_manager = PeersManager::new(
        ledger.clone(),
        PeersManagerConfig {
            max_live_peers: config.p2p.max_live_peers,
            max_bootstrap_peers: config.p2p.max_bootstrap_peers,
            static_nodes: config.p2p.static_nodes.clone(),
            trusted_nodes: config.p2p.trusted_nodes.clone(),
        },
    );

    let confirm_req = ConfirmReqWorker::spawn(
        unchecked.clone(),
        ledger.clone(),
        peers_manager.clone(),
        net,
        cementation.clone(),
    );

    let handles = Arc::new(NodeHandles {
        net,
        identity,
        ledger,
        unchecked,
        peers_manager: peers_manager.clone(),
        confirm_req,
        cementation,
        trusted_prs,
        genesis_hash,
        protocol_version_byte: config.p2p.protocol_version.1,
        started_at: Instant::now(),
        metrics: metrics.clone(),
    });

    {
        let handles = handles.clone();
        peers_manager.spawn_maintenance(
            Arc::new(move |stream, remote_addr| {
                let handles = handles.clone();
                tokio::spawn(session::run_session(stream, remote_addr, PeerKind::Live, handles));
            }),
            metrics.clone(),
        );
    }

    if let Some(seed) = config.p2p.trusted_nodes.first().or_else(|| config.p2p.static_nodes.first()) {
        if let Some(stream) = peers_manager.dial(seed).await {
            BootstrapPuller::spawn(
                stream,
                seed.clone(),
                handles.net,
                handles.identity.clone(),
                handles.unchecked.clone(),
                handles.ledger.clone(),
                handles.cementation.clone(),
                handles.peers_manager.clone(),
                handles.metrics.clone(),
            );
        } else {
            warn!(peer = %seed, "failed to dial bootstrap seed");
        }
    }

    let listener = TcpListener::bind(&config.p2p.listen_addr)
        .await
        .with_context(|| format!("binding p2p listener on {}", config.p2p.listen_addr))?;
    info!(addr = %config.p2p.listen_addr, "p2p listener bound");

    let accept_handles = handles.clone();
    let accept_task = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let handles = accept_handles.clone();
                    let remote_addr = addr.to_string();
                    tokio::spawn(async move {
                        session::run_session(stream, remote_addr, PeerKind::Live, handles).await;
                    });
                }
                Err(e) => {
                    warn!(err = %e, "accept failed");
                }
            }
        }
    });

    let rpc_router = rpc::router(handles.clone());
    let rpc_listener = TcpListener::bind(&config.http.listen_addr)
        .await
        .with_context(|| format!("binding http listener on {}", config.http.listen_addr))?;
    info!(addr = %config.http.listen_addr, "http introspection endpoint bound");
    let rpc_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(rpc_listener, rpc_router).await {
            warn!(err = %e, "http server exited");
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
        _ = accept_task => {
            warn!("p2p accept loop exited unexpectedly");
        }
        _ = rpc_task => {
            warn!("http server exited unexpectedly");
        }
    }

    if let Err(e) = handles.ledger.cleanup() {
        warn!(err = %e, "ledger cleanup on shutdown failed");
    }
    Ok(())
}

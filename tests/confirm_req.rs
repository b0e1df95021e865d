use amaranth_node::core::crypto::Keypair;
use amaranth_node::core::types::{Address, Amount, Block, BlockKind, Hash, HashPair, Signature, Work};
use amaranth_node::ledger::cementation::CementationPipeline;
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::unchecked::UncheckedPool;
use amaranth_node::monitoring::metrics::Metrics;
use amaranth_node::net::confirm_req::ConfirmReqWorker;
use amaranth_node::net::peer::{PeerKind, PeerNode};
use amaranth_node::net::peers_manager::{PeersManager, PeersManagerConfig};
use amaranth_node::net::session::NetworkParams;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

fn signed_open_block(kp: &Keypair) -> Block {
    let hash = Hash([9u8; 32]);
    let signature = kp.sign(&hash.0);
    Block {
        kind: BlockKind::Open,
        hash,
        previous: Hash::ZERO,
        account: kp.public_key(),
        representative: Address::ZERO,
        balance: Amount::ZERO,
        link: [0u8; 32],
        signature,
        work: Work([0u8; 8]),
    }
}

#[tokio::test]
async fn unknown_incoming_pair_is_tracked_pending() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let peers_manager = PeersManager::new(
        ledger.clone(),
        PeersManagerConfig {
            max_live_peers: 8,
            max_bootstrap_peers: 8,
            static_nodes: vec![],
            trusted_nodes: vec![],
        },
    );
    let net = NetworkParams {
        network_id: *b"CC",
        protocol_version: (20, 18, 18),
    };
    let metrics = Arc::new(Metrics::new().unwrap());
    let cementation = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics);
    let worker = ConfirmReqWorker::spawn(unchecked, ledger, peers_manager, net, cementation.clone());

    worker.register_peer("peer-a".into());
    let pair = HashPair { hash: Hash([9u8; 32]), root: Hash([8u8; 32]) };
    worker.submit_incoming("peer-a", pair).await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(worker.has_pending(&Hash([9u8; 32])));
    assert!(cementation.missing_bodies().contains(&Hash([9u8; 32])));
}

#[tokio::test]
async fn subset_fan_out_sends_to_four_of_sixteen_peers() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger.clone());
    let peers_manager = PeersManager::new(
        ledger.clone(),
        PeersManagerConfig {
            max_live_peers: 256,
            max_bootstrap_peers: 32,
            static_nodes: vec![],
            trusted_nodes: vec![],
        },
    );

    let mut server_tasks = Vec::new();
    for i in 0..16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        server_tasks.push(tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8];
            use tokio::io::AsyncReadExt;
            stream.read_exact(&mut buf).await.is_ok()
        }));
        let stream = TcpStream::connect(addr).await.unwrap();
        let (_, write_half) = stream.into_split();
        let peer = PeerNode::new(format!("peer-{i}"), PeerKind::Live, write_half);
        peers_manager.register(peer, PeerKind::Live).await;
    }

    let net = NetworkParams {
        network_id: *b"CC",
        protocol_version: (20, 18, 18),
    };
    let metrics = Arc::new(Metrics::new().unwrap());
    let cementation = CementationPipeline::spawn(ledger.clone(), unchecked.clone(), metrics);
    let worker = ConfirmReqWorker::spawn(unchecked.clone(), ledger, peers_manager, net, cementation);
    let kp = Keypair::from_seed([21u8; 32]);
    unchecked.add(signed_open_block(&kp)).await;

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(worker.pending_count() >= 1);

    let mut received = 0;
    for task in server_tasks {
        if tokio::time::timeout(Duration::from_millis(300), task).await.ok().and_then(|r| r.ok()).unwrap_or(false) {
            received += 1;
        }
    }
    assert_eq!(received, 4);
}

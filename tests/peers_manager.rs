use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::net::peer::{PeerKind, PeerNode};
use amaranth_node::net::peers_manager::{PeersManager, PeersManagerConfig};
use tokio::net::TcpStream;

#[tokio::test]
async fn subset_of_16_live_peers_is_4() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let manager = PeersManager::new(
        ledger,
        PeersManagerConfig {
            max_live_peers: 256,
            max_bootstrap_peers: 32,
            static_nodes: vec![],
            trusted_nodes: vec![],
        },
    );

    for i in 0..16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });
        let stream = TcpStream::connect(addr).await.unwrap();
        let (_, write_half) = stream.into_split();
        let peer = PeerNode::new(format!("peer-{i}"), PeerKind::Live, write_half);
        manager.register(peer, PeerKind::Live).await;
    }

    assert_eq!(manager.live_count(), 16);
    assert_eq!(manager.subset_of_live_peers().len(), 4);
}

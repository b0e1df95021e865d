use amaranth_node::config::{DatabaseBackend, NodeConfig};

#[test]
fn parses_minimal_config() {
    let toml_str = r#"
        [node]
        name = "test-node"
        data_dir = "./data"

        [http]
        listen_addr = "127.0.0.1:7076"

        [p2p]
        listen_addr = "0.0.0.0:7075"
        network_id = [67, 67]
        protocol_version = [20, 18, 18]

        [consensus]
        genesis_block_hex = "00"
    "#;
    let cfg: NodeConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.node.name, "test-node");
    assert_eq!(cfg.p2p.max_live_peers, 256);
    assert!(matches!(cfg.database.backend, DatabaseBackend::Json));
}

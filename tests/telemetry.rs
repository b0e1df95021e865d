use amaranth_node::core::crypto::Keypair;
use amaranth_node::core::types::{Hash, Signature};
use amaranth_node::net::telemetry::{handle_telemetry_ack, TelemetryData, TELEMETRY_SIZE};

#[test]
fn telemetry_round_trips_through_wire_bytes() {
    let identity = Keypair::from_seed([77u8; 32]);
    let mut data = TelemetryData {
        signature: Signature([0u8; 64]),
        node_id: identity.public_key(),
        block_count: 10,
        cemented_count: 10,
        unchecked_count: 2,
        account_count: 3,
        bandwidth_cap: 0,
        peer_count: 5,
        protocol_version: 18,
        uptime_ms: 12345,
        genesis_hash: Hash([1u8; 32]),
        major_version: 0,
        minor_version: 1,
        patch_version: 0,
        pre_release_version: 0,
        maker: 0,
        timestamp: 1_700_000_000,
        active_difficulty: 0,
    };
    data.signature = identity.sign(&data.signed_region());

    let bytes = data.to_bytes();
    assert_eq!(bytes.len(), TELEMETRY_SIZE);
    let back = TelemetryData::from_bytes(&bytes).unwrap();
    assert_eq!(data, back);
}

#[test]
fn malformed_telemetry_ack_does_not_panic() {
    handle_telemetry_ack("127.0.0.1:7075", &[0u8; 10]);
}

use amaranth_node::net::keepalive::{encode_keepalive, parse_keepalive, Endpoint, KEEPALIVE_SIZE};

#[test]
fn keepalive_round_trips() {
    let mut endpoints = [Endpoint { ip: [0u8; 16], port: 0 }; 8];
    endpoints[0] = Endpoint { ip: [1u8; 16], port: 7075 };
    let bytes = encode_keepalive(&endpoints);
    assert_eq!(bytes.len(), KEEPALIVE_SIZE);
    let back = parse_keepalive(&bytes).unwrap();
    assert_eq!(back[0], endpoints[0]);
    assert!(back[1].is_default());
}

#[test]
fn wrong_length_is_rejected() {
    assert!(parse_keepalive(&[0u8; 10]).is_none());
}

#[test]
fn default_endpoint_renders_and_is_skipped_by_caller() {
    let ep = Endpoint { ip: [0u8; 16], port: 0 };
    assert!(ep.is_default());
}

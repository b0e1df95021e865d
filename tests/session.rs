use amaranth_node::core::crypto::Keypair;
use amaranth_node::net::session::{perform_handshake, NetworkParams};
use tokio::net::{TcpListener, TcpStream};

#[tokio::test]
async fn handshake_round_trips_between_in_memory_peers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_identity = Keypair::from_seed([21u8; 32]);
    let client_identity = Keypair::from_seed([22u8; 32]);

    let net = NetworkParams {
        network_id: *b"CC",
        protocol_version: (20, 18, 18),
    };

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        perform_handshake(&mut stream, net, &server_identity).await
    });

    let mut client_stream = TcpStream::connect(addr).await.unwrap();
    let client_result = perform_handshake(&mut client_stream, net, &client_identity).await;

    let server_result = server.await.unwrap();

    assert!(server_result.is_ok());
    assert!(client_result.is_ok());
}

use amaranth_node::core::types::{Address, Hash};
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::unchecked::UncheckedPool;
use amaranth_node::monitoring::metrics::Metrics;
use amaranth_node::net::bootstrap::{receive_bulk_pull_response, GENESIS_ADDRESS_HEX};
use amaranth_node::wire::message::NOT_A_BLOCK;
use tokio::net::TcpStream;

fn encode_open_block(account: Address) -> Vec<u8> {
    let mut body = vec![0u8; 168];
    body[64..96].copy_from_slice(&account.0);
    body
}

#[tokio::test]
async fn bulk_pull_response_stages_blocks_until_terminator() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let unchecked = UncheckedPool::spawn(ledger);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        use tokio::io::AsyncWriteExt;
        let open_body = encode_open_block(Address([3u8; 32]));
        stream.write_all(&[0x04]).await.unwrap();
        stream.write_all(&open_body).await.unwrap();
        stream.write_all(&[NOT_A_BLOCK]).await.unwrap();
    });

    let client = TcpStream::connect(addr).await.unwrap();
    let (mut read_half, _write_half) = client.into_split();
    let metrics = Metrics::new().unwrap();
    let count = receive_bulk_pull_response(&mut read_half, &unchecked, &metrics).await.unwrap();
    server.await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(unchecked.count(), 1);
    assert_eq!(metrics.bootstrap_blocks_pulled_total.get(), 1);
}

#[test]
fn genesis_address_constant_parses() {
    let _: Hash = GENESIS_ADDRESS_HEX.parse().expect("genesis address must be valid hex");
}

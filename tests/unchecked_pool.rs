use amaranth_node::core::crypto::Keypair;
use amaranth_node::core::types::{Address, Amount, Block, BlockKind, Hash, Signature, Work};
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::unchecked::UncheckedPool;

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
async fn valid_signature_is_accepted_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let pool = UncheckedPool::spawn(ledger);

    let kp = Keypair::from_seed([11u8; 32]);
    let block = signed_open_block(&kp);

    pool.add(block.clone()).await;
    pool.add(block.clone()).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(pool.count(), 1);
    assert!(pool.get(&block.hash).is_some());
}

#[tokio::test]
async fn invalid_signature_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let pool = UncheckedPool::spawn(ledger);

    let kp = Keypair::from_seed([12u8; 32]);
    let mut block = signed_open_block(&kp);
    block.signature = Signature([0u8; 64]);

    pool.add(block.clone()).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(pool.count(), 0);
}

#[tokio::test]
async fn epoch_marker_bypasses_signature_check() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let pool = UncheckedPool::spawn(ledger);

    let mut block = signed_open_block(&Keypair::from_seed([13u8; 32]));
    block.signature = Signature([0u8; 64]);
    let mut link = [0u8; 32];
    link[..14].copy_from_slice(b"epoch v2 block");
    block.link = link;

    pool.add(block.clone()).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(pool.count(), 1);
}

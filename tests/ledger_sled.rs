use amaranth_node::core::types::{Address, Amount, Block, BlockKind, Hash, Signature, Work};
use amaranth_node::ledger::sled_backend::SledLedger;
use amaranth_node::ledger::LedgerFacade;
use tempfile::tempdir;

fn open_block(account: Address, hash: Hash) -> Block {
    Block {
        kind: BlockKind::Open,
        hash,
        previous: Hash::ZERO,
        account,
        representative: Address::ZERO,
        balance: Amount::ZERO,
        link: [0u8; 32],
        signature: Signature([0u8; 64]),
        work: Work([0u8; 8]),
    }
}

#[test]
fn put_and_get_block_round_trips() {
    let dir = tempdir().unwrap();
    let ledger = SledLedger::open(dir.path()).unwrap();
    let address = Address([1u8; 32]);
    let hash = Hash([2u8; 32]);
    ledger.put_block(&open_block(address, hash), 100).unwrap();

    let fetched = ledger.get_block(&hash).unwrap().unwrap();
    assert_eq!(fetched.hash, hash);

    let account = ledger.get_account(&address).unwrap().unwrap();
    assert_eq!(account.sideband.height, 1);
}

#[test]
fn account_chain_walks_back_to_open() {
    let dir = tempdir().unwrap();
    let ledger = SledLedger::open(dir.path()).unwrap();
    let address = Address([3u8; 32]);
    let open_hash = Hash([4u8; 32]);
    ledger.put_block(&open_block(address, open_hash), 1).unwrap();

    let mut second = open_block(address, Hash([5u8; 32]));
    second.kind = BlockKind::Change;
    second.previous = open_hash;
    ledger.put_block(&second, 2).unwrap();

    let chain = ledger.get_account_chain(&address).unwrap();
    assert_eq!(chain, vec![Hash([5u8; 32]), open_hash]);
}

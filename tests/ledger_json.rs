use amaranth_node::core::types::{Address, Amount, Block, BlockKind, Hash, Signature, Work};
use amaranth_node::ledger::json::JsonLedger;
use amaranth_node::ledger::{LedgerError, LedgerFacade};
use tempfile::tempdir;

fn open_block(account: Address) -> Block {
    Block {
        kind: BlockKind::Open,
        hash: Hash([1u8; 32]),
        previous: Hash::ZERO,
        account,
        representative: Address::ZERO,
        balance: Amount::ZERO,
        link: [0u8; 32],
        signature: Signature([0u8; 64]),
        work: Work([0u8; 8]),
    }
}

#[tokio::test]
async fn put_block_initializes_new_account_at_height_one() {
    let dir = tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let address = Address([5u8; 32]);
    ledger.put_block(&open_block(address), 1_000).unwrap();

    let account = ledger.get_account(&address).unwrap().unwrap();
    assert_eq!(account.sideband.height, 1);
    assert_eq!(account.frontier, Hash([1u8; 32]));
}

#[tokio::test]
async fn put_block_rejects_non_open_for_unknown_account() {
    let dir = tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let mut block = open_block(Address([6u8; 32]));
    block.kind = BlockKind::Change;
    assert!(matches!(
        ledger.put_block(&block, 1).unwrap_err(),
        LedgerError::UnknownAccount
    ));
}

#[tokio::test]
async fn put_block_rejects_previous_mismatch() {
    let dir = tempdir().unwrap();
    let ledger = JsonLedger::initialize(dir.path()).unwrap();
    let address = Address([7u8; 32]);
    ledger.put_block(&open_block(address), 1).unwrap();

    let mut second = open_block(address);
    second.kind = BlockKind::Change;
    second.hash = Hash([2u8; 32]);
    second.previous = Hash([99u8; 32]);
    assert!(matches!(
        ledger.put_block(&second, 2).unwrap_err(),
        LedgerError::PreviousMismatch
    ));
}

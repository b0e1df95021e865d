use amaranth_node::core::types::{Amount, Hash};
use amaranth_node::wire::block::{
    parse_block, parse_open_block, parse_send_block, parse_state_block, WireError,
};

#[test]
fn state_block_hash_is_deterministic() {
    let mut data = vec![0u8; 216];
    data[0] = 1;
    data[32] = 2;
    data[64] = 3;
    data[112] = 4;
    let a = parse_state_block(&data).unwrap();
    let b = parse_state_block(&data).unwrap();
    assert_eq!(a.hash, b.hash);
}

#[test]
fn state_block_reads_balance_from_correct_offset() {
    let mut data = vec![0u8; 216];
    data[96..112].copy_from_slice(&100u128.to_be_bytes());
    let block = parse_state_block(&data).unwrap();
    assert_eq!(block.balance, Amount(100));
}

#[test]
fn open_block_root_is_account() {
    let mut data = vec![0u8; 168];
    data[64..96].copy_from_slice(&[9u8; 32]);
    let block = parse_open_block(&data).unwrap();
    assert!(block.is_open());
    assert_eq!(block.root(), Hash([9u8; 32]));
    assert_eq!(block.previous, Hash::ZERO);
}

#[test]
fn send_and_state_blocks_hash_differently_for_same_bytes_prefix() {
    let mut send_data = vec![0u8; 152];
    send_data[0] = 1;
    let send = parse_send_block(&send_data).unwrap();

    let mut state_data = vec![0u8; 216];
    state_data[0] = 1;
    let state = parse_state_block(&state_data).unwrap();

    assert_ne!(send.hash, state.hash);
}

#[test]
fn wrong_length_is_rejected() {
    assert_eq!(
        parse_send_block(&[0u8; 10]),
        Err(WireError::WrongLength { expected: 152, got: 10 })
    );
}

#[test]
fn parse_block_dispatches_by_type_nibble() {
    assert!(parse_block(0x02, &[0u8; 152]).is_some());
    assert!(parse_block(0x06, &[0u8; 216]).is_some());
    assert!(parse_block(0x01, &[]).is_none());
}

use amaranth_node::core::types::{epoch_marker_from_link, Amount, EpochMarker, Hash, HashPair};

#[test]
fn hash_hex_round_trip() {
    let h = Hash([7u8; 32]);
    let s = h.to_string();
    let back: Hash = s.parse().unwrap();
    assert_eq!(h, back);
}

#[test]
fn amount_checked_add_overflows() {
    let max = Amount(u128::MAX);
    assert!(max.checked_add(Amount(1)).is_err());
    assert_eq!(Amount(1).checked_add(Amount(2)).unwrap(), Amount(3));
}

#[test]
fn epoch_marker_detection() {
    let mut link = [0u8; 32];
    link[..14].copy_from_slice(b"epoch v2 block");
    assert_eq!(epoch_marker_from_link(&link), Some(EpochMarker::V2));

    let mut link1 = [0u8; 32];
    link1[..14].copy_from_slice(b"epoch v1 block");
    assert_eq!(epoch_marker_from_link(&link1), Some(EpochMarker::V1));

    assert_eq!(epoch_marker_from_link(&[1u8; 32]), None);
}

#[test]
fn hash_pair_round_trip() {
    let pair = HashPair {
        hash: Hash([1u8; 32]),
        root: Hash([2u8; 32]),
    };
    let bytes = pair.to_bytes();
    let back = HashPair::from_bytes(&bytes).unwrap();
    assert_eq!(pair, back);
}

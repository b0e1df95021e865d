use amaranth_node::core::crypto::{blake2b_256, verify, Keypair};

#[test]
fn sign_then_verify_round_trips() {
    let kp = Keypair::from_seed([3u8; 32]);
    let msg = b"hello ledger";
    let sig = kp.sign(msg);
    verify(&kp.public_key(), msg, &sig).expect("signature must verify");
}

#[test]
fn verify_rejects_tampered_message() {
    let kp = Keypair::from_seed([9u8; 32]);
    let sig = kp.sign(b"original");
    assert!(verify(&kp.public_key(), b"tampered", &sig).is_err());
}

#[test]
fn verify_rejects_wrong_key() {
    let kp = Keypair::from_seed([1u8; 32]);
    let other = Keypair::from_seed([2u8; 32]);
    let sig = kp.sign(b"message");
    assert!(verify(&other.public_key(), b"message", &sig).is_err());
}

#[test]
fn blake2b_256_is_deterministic() {
    let a = blake2b_256(&[b"foo", b"bar"]);
    let b = blake2b_256(&[b"foo", b"bar"]);
    assert_eq!(a, b);
    let c = blake2b_256(&[b"foobar"]);
    assert_ne!(a, c);
}

#[test]
fn deterministic_across_runs_from_same_seed() {
    let kp1 = Keypair::from_seed([42u8; 32]);
    let kp2 = Keypair::from_seed([42u8; 32]);
    assert_eq!(kp1.public_key(), kp2.public_key());
    assert_eq!(kp1.sign(b"x").0, kp2.sign(b"x").0);
}

use amaranth_node::core::identity::NodeIdentity;
use tempfile::tempdir;

#[test]
fn creates_then_reloads_identity_unencrypted() {
    let dir = tempdir().unwrap();
    let first = NodeIdentity::load_or_create(dir.path(), None).unwrap();
    let second = NodeIdentity::load_or_create(dir.path(), None).unwrap();
    assert_eq!(first.keypair().public_key(), second.keypair().public_key());
}

#[test]
fn creates_then_reloads_identity_encrypted() {
    let dir = tempdir().unwrap();
    let first = NodeIdentity::load_or_create(dir.path(), Some("hunter2")).unwrap();
    let second = NodeIdentity::load_or_create(dir.path(), Some("hunter2")).unwrap();
    assert_eq!(first.keypair().public_key(), second.keypair().public_key());
}

#[test]
fn wrong_passphrase_fails_to_decrypt() {
    let dir = tempdir().unwrap();
    let _ = NodeIdentity::load_or_create(dir.path(), Some("correct")).unwrap();
    let result = NodeIdentity::load_or_create(dir.path(), Some("incorrect"));
    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn identity_file_has_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempdir().unwrap();
    let _ = NodeIdentity::load_or_create(dir.path(), None).unwrap();
    let meta = std::fs::metadata(dir.path().join("node_id.dat")).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o600);
}

// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Node identity: the ed25519-blake2b keypair a node uses for the node-id
//! handshake. Persisted at `<data_dir>/node_id.dat`, created on first run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ring::aead::{self, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroize;

use crate::core::crypto::Keypair;

const SEED_LEN: usize = 32;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const PBKDF2_ITERATIONS: u32 = 200_000;

/// Errors while loading or creating a node identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Underlying filesystem error.
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),
    /// Stored identity file was truncated or had an unrecognized layout.
    #[error("corrupt identity file")]
    Corrupt,
    /// Decryption failed (wrong passphrase or tampered file).
    #[error("failed to decrypt identity file")]
    DecryptionFailed,
}

/// A node's persistent ed25519-blake2b identity.
pub struct NodeIdentity {
    keypair: Keypair,
}

impl NodeIdentity {
    /// Access the underlying keypair.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Load the identity from `<data_dir>/node_id.dat`, creating one with a
    /// fresh random seed if absent. When `passphrase` is `Some`, the seed is
    /// encrypted at rest with AES-256-GCM under a PBKDF2-HMAC-SHA256 key.
    pub fn load_or_create(data_dir: &Path, passphrase: Option<&str>) -> Result<Self, IdentityError> {
        let path = data_dir.join("node_id.dat");
        if path.exists() {
            Self::load(&path, passphrase)
        } else {
            fs::create_dir_all(data_dir)?;
            let kp = Keypair::generate();
            write_atomic(&path, kp.seed(), passphrase)?;
            Ok(Self { keypair: kp })
        }
    }

    fn load(path: &Path, passphrase: Option<&str>) -> Result<Self, IdentityError> {
        let raw = fs::read(path)?;
        let seed = match passphrase {
            None => {
                if raw.len() != SEED_LEN {
                    return Err(IdentityError::Corrupt);
                }
                let mut seed = [0u8; SEED_LEN];
                seed.copy_from_slice(&raw);
                seed
            }
            Some(pass) => decrypt_seed(&raw, pass)?,
        };
        Ok(Self {
            keypair: Keypair::from_seed(seed),
        })
    }
}

fn write_atomic(path: &Path, seed: &[u8; SEED_LEN], passphrase: Option<&str>) -> Result<(), IdentityError> {
    let contents = match passphrase {
        None => seed.to_vec(),
        Some(pass) => encrypt_seed(seed, pass)?,
    };

    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, &contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

struct SingleNonce(Option<Nonce>);

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.0.take().ok_or(ring::error::Unspecified)
    }
}

fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("nonzero"),
        salt,
        passphrase.as_bytes(),
        &mut key,
    );
    key
}

fn encrypt_seed(seed: &[u8; SEED_LEN], passphrase: &str) -> Result<Vec<u8>, IdentityError> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| IdentityError::Corrupt)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes).map_err(|_| IdentityError::Corrupt)?;

    let mut key_bytes = derive_key(passphrase, &salt);
    let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| IdentityError::Corrupt)?;
    key_bytes.zeroize();

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);
    let mut sealing_key = aead::SealingKey::new(unbound, SingleNonce(Some(nonce)));

    let mut in_out = seed.to_vec();
    sealing_key
        .seal_in_place_append_tag(aead::Aad::empty(), &mut in_out)
        .map_err(|_| IdentityError::Corrupt)?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + in_out.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&in_out);
    Ok(out)
}

fn decrypt_seed(raw: &[u8], passphrase: &str) -> Result<[u8; SEED_LEN], IdentityError> {
    if raw.len() < SALT_LEN + NONCE_LEN {
        return Err(IdentityError::Corrupt);
    }
    let salt: [u8; SALT_LEN] = raw[0..SALT_LEN].try_into().unwrap();
    let nonce_bytes: [u8; NONCE_LEN] = raw[SALT_LEN..SALT_LEN + NONCE_LEN].try_into().unwrap();
    let ciphertext = &raw[SALT_LEN + NONCE_LEN..];

    let mut key_bytes = derive_key(passphrase, &salt);
    let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| IdentityError::Corrupt)?;
    key_bytes.zeroize();

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);
    let mut opening_key = aead::OpeningKey::new(unbound, SingleNonce(Some(nonce)));

    let mut in_out = ciphertext.to_vec();
    let plaintext = opening_key
        .open_in_place(aead::Aad::empty(), &mut in_out)
        .map_err(|_| IdentityError::DecryptionFailed)?;

    if plaintext.len() != SEED_LEN {
        return Err(IdentityError::Corrupt);
    }
    let mut seed = [0u8; SEED_LEN];
    seed.copy_from_slice(plaintext);
    Ok(seed)
}

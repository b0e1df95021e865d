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

//! ed25519-blake2b: the network's non-standard ed25519 variant, which uses
//! BLAKE2b-512 in place of SHA-512 for both key expansion and the challenge
//! hash. No published crate implements this exact variant, so it is built
//! directly on curve25519-dalek's Edwards arithmetic plus the `blake2` crate.
//!
//! This is deliberately a from-scratch, textbook implementation of the
//! signature scheme (RFC 8032 shape, BLAKE2b in place of SHA-512) rather than
//! a wrapper: [`ed25519_dalek`] assumes SHA-512 and cannot be retargeted.

use blake2::digest::consts::U64;
use blake2::{Blake2b, Digest};
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::core::types::{Address, Signature};

type Blake2b512 = Blake2b<U64>;

/// A 32-byte BLAKE2b-256 digest, used throughout the ledger for block and
/// vote hashing.
pub fn blake2b_256(parts: &[&[u8]]) -> [u8; 32] {
    use blake2::digest::consts::U32;
    let mut hasher = Blake2b::<U32>::new();
    for p in parts {
        hasher.update(p);
    }
    let out = hasher.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(&out);
    b
}

fn blake2b_512(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    for p in parts {
        hasher.update(p);
    }
    let out = hasher.finalize();
    let mut b = [0u8; 64];
    b.copy_from_slice(&out);
    b
}

/// An expanded ed25519-blake2b keypair: a clamped scalar plus its public point.
#[derive(Clone)]
pub struct Keypair {
    seed: [u8; 32],
    scalar: Scalar,
    prefix: [u8; 32],
    public: [u8; 32],
}

/// Raised when key material or a signature has the wrong shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// A compressed point did not decompress to a valid curve point.
    #[error("invalid public key encoding")]
    InvalidPublicKey,
    /// Signature verification failed.
    #[error("signature verification failed")]
    BadSignature,
}

impl Keypair {
    /// Expand a 32-byte seed into a keypair, per RFC 8032 §5.1.5 with
    /// BLAKE2b-512 substituted for SHA-512.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let h = blake2b_512(&[&seed]);
        let mut scalar_bytes = [0u8; 32];
        scalar_bytes.copy_from_slice(&h[0..32]);
        scalar_bytes[0] &= 248;
        scalar_bytes[31] &= 127;
        scalar_bytes[31] |= 64;
        let scalar = Scalar::from_bytes_mod_order(scalar_bytes);

        let mut prefix = [0u8; 32];
        prefix.copy_from_slice(&h[32..64]);

        let public_point = &scalar * ED25519_BASEPOINT_TABLE;
        let public = public_point.compress().to_bytes();

        Self {
            seed,
            scalar,
            prefix,
            public,
        }
    }

    /// Generate a new keypair from an OS-backed random seed.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// The 32-byte seed this keypair was expanded from.
    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    /// The public key / account address.
    pub fn public_key(&self) -> Address {
        Address(self.public)
    }

    /// Sign a message, producing a 64-byte (R || S) signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let r_scalar_bytes = blake2b_512(&[&self.prefix, message]);
        let r_scalar = Scalar::from_bytes_mod_order_wide(&r_scalar_bytes);
        let r_point = &r_scalar * ED25519_BASEPOINT_TABLE;
        let r_compressed = r_point.compress();

        let k_bytes = blake2b_512(&[&r_compressed.to_bytes(), &self.public, message]);
        let k = Scalar::from_bytes_mod_order_wide(&k_bytes);

        let s = r_scalar + k * self.scalar;

        let mut sig = [0u8; 64];
        sig[0..32].copy_from_slice(r_compressed.as_bytes());
        sig[32..64].copy_from_slice(s.as_bytes());
        Signature(sig)
    }
}

/// Verify an ed25519-blake2b signature against a raw 32-byte public key.
pub fn verify(public_key: &Address, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    let compressed_public = CompressedEdwardsY(public_key.0);
    let public_point = compressed_public
        .decompress()
        .ok_or(CryptoError::InvalidPublicKey)?;

    let r_bytes: [u8; 32] = signature.0[0..32]
        .try_into()
        .expect("signature is exactly 64 bytes");
    let s_bytes: [u8; 32] = signature.0[32..64]
        .try_into()
        .expect("signature is exactly 64 bytes");

    let r_compressed = CompressedEdwardsY(r_bytes);
    let r_point = r_compressed.decompress().ok_or(CryptoError::BadSignature)?;

    // Reject non-canonical S per RFC 8032; `Scalar::from_canonical_bytes` enforces this.
    let s: Option<Scalar> = Scalar::from_canonical_bytes(s_bytes).into();
    let s = s.ok_or(CryptoError::BadSignature)?;

    let k_bytes = blake2b_512(&[&r_bytes, &public_key.0, message]);
    let k = Scalar::from_bytes_mod_order_wide(&k_bytes);

    // Check: S*B == R + k*A
    let lhs = &s * ED25519_BASEPOINT_TABLE;
    let rhs: EdwardsPoint = r_point + k * public_point;

    if lhs.compress().as_bytes().ct_eq(rhs.compress().as_bytes()).into() {
        Ok(())
    } else {
        Err(CryptoError::BadSignature)
    }
}

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

//! Core ledger types: hashes, addresses, amounts, blocks, accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing a fixed-size hex field fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexFieldError {
    /// Input was not valid hex.
    #[error("invalid hex")]
    InvalidHex,
    /// Decoded bytes did not match the expected length.
    #[error("wrong length: expected {expected}, got {got}")]
    WrongLength {
        /// Expected byte length.
        expected: usize,
        /// Actual decoded byte length.
        got: usize,
    },
}

macro_rules! fixed_bytes_type {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Zero-filled value.
            pub const ZERO: $name = $name([0u8; $len]);

            /// Construct from raw bytes.
            pub fn from_bytes(b: [u8; $len]) -> Self {
                Self(b)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// True if every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode_upper(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = HexFieldError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s.trim()).map_err(|_| HexFieldError::InvalidHex)?;
                if bytes.len() != $len {
                    return Err(HexFieldError::WrongLength {
                        expected: $len,
                        got: bytes.len(),
                    });
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(&bytes);
                Ok(Self(out))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

fixed_bytes_type!(Hash, 32, "A 32-byte BLAKE2b hash; hex render is canonical.");
fixed_bytes_type!(Address, 32, "A 32-byte ed25519-blake2b public key / account address.");
fixed_bytes_type!(Signature, 64, "A 64-byte ed25519-blake2b signature.");
fixed_bytes_type!(Work, 8, "An 8-byte proof-of-work nonce.");

/// A public key is positionally identical to an [`Address`].
pub type PublicKey = Address;

/// Unsigned 128-bit ledger amount. Addition is checked, never wraps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(pub u128);

/// Raised when an amount operation would overflow.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("amount overflow")]
pub struct AmountOverflow;

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Checked addition; never wraps.
    pub fn checked_add(self, other: Amount) -> Result<Amount, AmountOverflow> {
        self.0.checked_add(other.0).map(Amount).ok_or(AmountOverflow)
    }

    /// True if this amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

/// Block type tag, shared by the wire codec and the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Legacy send block.
    Send,
    /// Legacy receive block.
    Receive,
    /// Legacy open block (first block of an account chain).
    Open,
    /// Legacy change-representative block.
    Change,
    /// Universal state block.
    State,
}

/// A parsed block, uniform across the five legacy/state variants.
///
/// Fields not meaningful for a given variant are left at their type's
/// default (zero hash/address/amount) by the wire codec.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    /// Which wire variant this was parsed from.
    pub kind: BlockKind,
    /// This block's own hash (computed at parse time, not trusted from the wire).
    pub hash: Hash,
    /// Previous block hash on this account chain; zero for Open blocks.
    pub previous: Hash,
    /// Owning account. Known directly for Open/State blocks; the legacy
    /// Send/Receive/Change wire formats never carry an account field at all
    /// (matching `original_source/p2p/packets/blocks.go`'s parsers, whose
    /// `Account` stays nil for these three), so this is left zero and is
    /// never populated downstream.
    pub account: Address,
    /// Representative address (Open/Change/State only; zero otherwise).
    pub representative: Address,
    /// Account balance after this block (Send/State only; zero otherwise).
    pub balance: Amount,
    /// Link field: destination (Send), source (Receive/Open), or generic
    /// 32-byte link (State) which may itself be an epoch-marker sentinel.
    pub link: [u8; 32],
    /// ed25519-blake2b signature over this block's type-specific preimage.
    pub signature: Signature,
    /// Proof-of-work nonce, validated separately from the block hash.
    pub work: Work,
}

impl Block {
    /// The election root: `previous` for non-open blocks, `account` for Open blocks.
    pub fn root(&self) -> Hash {
        if self.kind == BlockKind::Open {
            Hash(self.account.0)
        } else {
            self.previous
        }
    }

    /// True if this is an Open block (root is `account`, not `previous`).
    pub fn is_open(&self) -> bool {
        self.kind == BlockKind::Open
    }

    /// `link` reinterpreted as an epoch-marker prefix, if the leading bytes
    /// match one of the recognized epoch sentinels.
    pub fn epoch_marker(&self) -> Option<EpochMarker> {
        epoch_marker_from_link(&self.link)
    }
}

/// The two recognized epoch-marker generations. Blocks carrying one of these
/// in `link` bypass per-account signature verification in the unchecked pool
/// (they are signed by the network genesis key, not by the owning account).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpochMarker {
    /// `epoch v1 block` prefix.
    V1,
    /// `epoch v2 block` prefix.
    V2,
}

const EPOCH_V1_PREFIX: &[u8] = b"epoch v1 block";
const EPOCH_V2_PREFIX: &[u8] = b"epoch v2 block";

/// Check a raw 32-byte link field for an epoch-marker prefix.
pub fn epoch_marker_from_link(link: &[u8; 32]) -> Option<EpochMarker> {
    if link.starts_with(EPOCH_V2_PREFIX) {
        Some(EpochMarker::V2)
    } else if link.starts_with(EPOCH_V1_PREFIX) {
        Some(EpochMarker::V1)
    } else {
        None
    }
}

/// Per-account metadata not committed to the block hash.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Sideband {
    /// 1-based height of the frontier block on this account's chain.
    pub height: u64,
    /// Unix timestamp (seconds) the account was opened.
    pub timestamp: u64,
}

/// A ledger account: its cemented frontier block plus sideband metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    /// Address this account belongs to.
    pub address: Address,
    /// Most recently cemented block on this account's chain.
    pub frontier: Hash,
    /// Height/timestamp sideband.
    pub sideband: Sideband,
}

/// A (hash, root) pair as exchanged in `confirm_req`/`confirm_ack` payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashPair {
    /// The block hash being voted on / requested.
    pub hash: Hash,
    /// The election root (see [`Block::root`]).
    pub root: Hash,
}

impl HashPair {
    /// Decode a 64-byte wire pair (32 hash || 32 root).
    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        if b.len() != 64 {
            return None;
        }
        let mut hash = [0u8; 32];
        let mut root = [0u8; 32];
        hash.copy_from_slice(&b[0..32]);
        root.copy_from_slice(&b[32..64]);
        Some(Self {
            hash: Hash(hash),
            root: Hash(root),
        })
    }

    /// Encode as a 64-byte wire pair.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[0..32].copy_from_slice(&self.hash.0);
        out[32..64].copy_from_slice(&self.root.0);
        out
    }
}

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

//! The five legacy/state block wire formats and their BLAKE2b-256 hash
//! preimages.
//!
//! Byte offsets below are ported from
//! `original_source/p2p/packets/blocks.go`, with one deliberate correction:
//! that file's `ParseStateBlock` reads `balance` from `data[64:112]` instead
//! of `data[96:112]`, an off-by-32 bug in the reference implementation. The
//! layout here uses the correct offsets.

use thiserror::Error;

use crate::core::crypto::blake2b_256;
use crate::core::types::{Address, Amount, Block, BlockKind, Hash, Signature, Work};

/// Errors while parsing a block body off the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The body length did not match the block type's fixed size.
    #[error("block body has wrong length: expected {expected}, got {got}")]
    WrongLength {
        /// Expected byte length for this block type.
        expected: usize,
        /// Actual length received.
        got: usize,
    },
}

fn amount_from_be16(b: &[u8]) -> Amount {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(b);
    Amount(u128::from_be_bytes(buf))
}

fn amount_to_be16(a: Amount) -> [u8; 16] {
    a.0.to_be_bytes()
}

fn array32(b: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(b);
    out
}

fn array64(b: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(b);
    out
}

fn array8(b: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(b);
    out
}

/// Parse a `send` block body (152 bytes: previous, destination, balance, signature, work).
pub fn parse_send_block(data: &[u8]) -> Result<Block, WireError> {
    const LEN: usize = 32 + 32 + 16 + 64 + 8;
    if data.len() != LEN {
        return Err(WireError::WrongLength { expected: LEN, got: data.len() });
    }
    let previous = Hash(array32(&data[0..32]));
    let destination = array32(&data[32..64]);
    let balance = amount_from_be16(&data[64..80]);
    let signature = Signature(array64(&data[80..144]));
    let work = Work(array8(&data[144..152]));

    let hash = Hash(blake2b_256(&[&previous.0, &destination, &amount_to_be16(balance)]));

    Ok(Block {
        kind: BlockKind::Send,
        hash,
        previous,
        account: Address::ZERO,
        representative: Address::ZERO,
        balance,
        link: destination,
        signature,
        work,
    })
}

/// Parse a `receive` block body (136 bytes: previous, source, signature, work).
pub fn parse_receive_block(data: &[u8]) -> Result<Block, WireError> {
    const LEN: usize = 32 + 32 + 64 + 8;
    if data.len() != LEN {
        return Err(WireError::WrongLength { expected: LEN, got: data.len() });
    }
    let previous = Hash(array32(&data[0..32]));
    let source = array32(&data[32..64]);
    let signature = Signature(array64(&data[64..128]));
    let work = Work(array8(&data[128..136]));

    let hash = Hash(blake2b_256(&[&previous.0, &source]));

    Ok(Block {
        kind: BlockKind::Receive,
        hash,
        previous,
        account: Address::ZERO,
        representative: Address::ZERO,
        balance: Amount::ZERO,
        link: source,
        signature,
        work,
    })
}

/// Parse an `open` block body (168 bytes: source, representative, account, signature, work).
///
/// `previous` is always the zero hash: an open block is by definition the
/// first block on its account chain.
pub fn parse_open_block(data: &[u8]) -> Result<Block, WireError> {
    const LEN: usize = 32 + 32 + 32 + 64 + 8;
    if data.len() != LEN {
        return Err(WireError::WrongLength { expected: LEN, got: data.len() });
    }
    let source = array32(&data[0..32]);
    let representative = Address(array32(&data[32..64]));
    let account = Address(array32(&data[64..96]));
    let signature = Signature(array64(&data[96..160]));
    let work = Work(array8(&data[160..168]));

    let hash = Hash(blake2b_256(&[&source, &representative.0, &account.0]));

    Ok(Block {
        kind: BlockKind::Open,
        hash,
        previous: Hash::ZERO,
        account,
        representative,
        balance: Amount::ZERO,
        link: source,
        signature,
        work,
    })
}

/// Parse a `change` block body (136 bytes: previous, representative, signature, work).
pub fn parse_change_block(data: &[u8]) -> Result<Block, WireError> {
    const LEN: usize = 32 + 32 + 64 + 8;
    if data.len() != LEN {
        return Err(WireError::WrongLength { expected: LEN, got: data.len() });
    }
    let previous = Hash(array32(&data[0..32]));
    let representative = Address(array32(&data[32..64]));
    let signature = Signature(array64(&data[64..128]));
    let work = Work(array8(&data[128..136]));

    let hash = Hash(blake2b_256(&[&previous.0, &representative.0]));

    Ok(Block {
        kind: BlockKind::Change,
        hash,
        previous,
        account: Address::ZERO,
        representative,
        balance: Amount::ZERO,
        link: [0u8; 32],
        signature,
        work,
    })
}

/// Parse a `state` block body (216 bytes: account, previous, representative,
/// balance, link, signature, work).
pub fn parse_state_block(data: &[u8]) -> Result<Block, WireError> {
    const LEN: usize = 32 + 32 + 32 + 16 + 32 + 64 + 8;
    if data.len() != LEN {
        return Err(WireError::WrongLength { expected: LEN, got: data.len() });
    }
    let account = Address(array32(&data[0..32]));
    let previous = Hash(array32(&data[32..64]));
    let representative = Address(array32(&data[64..96]));
    let balance = amount_from_be16(&data[96..112]);
    let link = array32(&data[112..144]);
    let signature = Signature(array64(&data[144..208]));
    let work = Work(array8(&data[208..216]));

    // State blocks hash a 32-byte preamble (31 zero bytes ++ the 0x06 state
    // block-type tag) ahead of the field data, distinguishing them from the
    // legacy variants which hash their fields directly.
    const STATE_PREAMBLE: [u8; 32] = {
        let mut p = [0u8; 32];
        p[31] = 0x06;
        p
    };
    let hash = Hash(blake2b_256(&[
        &STATE_PREAMBLE,
        &account.0,
        &previous.0,
        &representative.0,
        &amount_to_be16(balance),
        &link,
    ]));

    Ok(Block {
        kind: BlockKind::State,
        hash,
        previous,
        account,
        representative,
        balance,
        link,
        signature,
        work,
    })
}

/// Dispatch to the right parser for a block-type nibble (2..=6, matching
/// `BlockTypeTag::{Send,Receive,Open,Change,State}`).
pub fn parse_block(block_type: u8, data: &[u8]) -> Option<Result<Block, WireError>> {
    match block_type {
        0x02 => Some(parse_send_block(data)),
        0x03 => Some(parse_receive_block(data)),
        0x04 => Some(parse_open_block(data)),
        0x05 => Some(parse_change_block(data)),
        0x06 => Some(parse_state_block(data)),
        _ => None,
    }
}

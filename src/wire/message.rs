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

//! Message type tags and the block-type nibble carried in header extensions.

/// The one-byte message type tag, sixth byte of every frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Peer endpoint gossip.
    Keepalive = 0x02,
    /// Block broadcast.
    Publish = 0x03,
    /// Request a vote / block for a hash.
    ConfirmReq = 0x04,
    /// A vote, either by block or by hash list.
    ConfirmAck = 0x05,
    /// Bulk block pull request (bootstrap).
    BulkPull = 0x06,
    /// Bulk block push (bootstrap).
    BulkPush = 0x07,
    /// Account frontier request (bootstrap, not originated by this core).
    FrontierReq = 0x08,
    /// Cookie-based mutual identity handshake.
    NodeIdHandshake = 0x0a,
    /// Pending-block pull for a single account.
    BulkPullAccount = 0x0b,
    /// Telemetry request.
    TelemetryReq = 0x0c,
    /// Telemetry response.
    TelemetryAck = 0x0d,
}

impl MessageType {
    /// Map a wire byte to a message type, or `None` if unrecognized.
    pub fn from_u8(b: u8) -> Option<Self> {
        use MessageType::*;
        Some(match b {
            0x02 => Keepalive,
            0x03 => Publish,
            0x04 => ConfirmReq,
            0x05 => ConfirmAck,
            0x06 => BulkPull,
            0x07 => BulkPush,
            0x08 => FrontierReq,
            0x0a => NodeIdHandshake,
            0x0b => BulkPullAccount,
            0x0c => TelemetryReq,
            0x0d => TelemetryAck,
            _ => return None,
        })
    }
}

/// The sentinel block-type value meaning "hashes only, no block body", used
/// as a stream terminator in `bulk_pull` responses and to select the
/// hash-list encoding of `confirm_req`/`confirm_ack`.
pub const NOT_A_BLOCK: u8 = 0x01;

/// The block-type nibble carried in a header's extension field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTypeTag {
    /// Sentinel: no block body follows, only bare hashes.
    NotABlock,
    /// Legacy send block.
    Send,
    /// Legacy receive block.
    Receive,
    /// Legacy open block.
    Open,
    /// Legacy change-representative block.
    Change,
    /// Universal state block.
    State,
    /// Unrecognized tag; `size()` returns 0 and callers must close the connection.
    Unknown(u8),
}

impl BlockTypeTag {
    /// Map the 4-bit extension nibble to a block type tag.
    pub fn from_u8(b: u8) -> Self {
        match b {
            0x01 => BlockTypeTag::NotABlock,
            0x02 => BlockTypeTag::Send,
            0x03 => BlockTypeTag::Receive,
            0x04 => BlockTypeTag::Open,
            0x05 => BlockTypeTag::Change,
            0x06 => BlockTypeTag::State,
            other => BlockTypeTag::Unknown(other),
        }
    }

    /// Fixed wire size of a block body of this type, in bytes.
    pub fn size(&self) -> usize {
        match self {
            BlockTypeTag::NotABlock => 0,
            BlockTypeTag::Send => 152,
            BlockTypeTag::Receive => 136,
            BlockTypeTag::Open => 168,
            BlockTypeTag::Change => 136,
            BlockTypeTag::State => 216,
            BlockTypeTag::Unknown(_) => 0,
        }
    }
}

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

//! The 8-byte frame header every wire message is prefixed with.

use super::message::{BlockTypeTag, MessageType};

/// Little-endian 2-byte extension bitfield carried after the message type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct HeaderExtension(pub [u8; 2]);

impl HeaderExtension {
    /// Build an extension field from its raw little-endian bytes.
    pub fn from_bytes(b: [u8; 2]) -> Self {
        Self(b)
    }

    /// The extension field interpreted as a little-endian u16.
    pub fn as_u16(&self) -> u16 {
        u16::from_le_bytes(self.0)
    }

    /// High nibble: item count (confirm_req/confirm_ack NOT_A_BLOCK payloads).
    pub fn count(&self) -> u16 {
        (self.as_u16() & 0xf000) >> 12
    }

    /// Second-highest nibble: the block type tag carried by this message.
    pub fn block_type(&self) -> BlockTypeTag {
        BlockTypeTag::from_u8(((self.as_u16() & 0x0f00) >> 8) as u8)
    }

    /// Low 10 bits: telemetry_ack body size.
    pub fn telemetry_size(&self) -> u16 {
        self.as_u16() & 0x3ff
    }

    /// Bit 0: this is a handshake query (carries our cookie).
    pub fn is_query(&self) -> bool {
        self.as_u16() & 0x1 != 0
    }

    /// Bit 1: this is a handshake response (carries our signed cookie).
    pub fn is_response(&self) -> bool {
        self.as_u16() & 0x2 != 0
    }
}

/// The 8-byte frame header preceding every message body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Network identifier byte pair (e.g. `b"CC"` for a live network).
    pub network_id: [u8; 2],
    /// (max, using, min) protocol version triple.
    pub protocol_version: (u8, u8, u8),
    /// Message type tag.
    pub message_type: MessageType,
    /// Per-message-type extension bitfield.
    pub extension: HeaderExtension,
}

impl Header {
    /// Parse an 8-byte header. Returns `None` on an unrecognized message type
    /// byte; callers should drop the connection on an unrecognized header.
    pub fn from_bytes(b: &[u8; 8]) -> Option<Self> {
        let message_type = MessageType::from_u8(b[5])?;
        Some(Self {
            network_id: [b[0], b[1]],
            protocol_version: (b[2], b[3], b[4]),
            message_type,
            extension: HeaderExtension::from_bytes([b[6], b[7]]),
        })
    }

    /// Encode this header back to its 8-byte wire form.
    pub fn to_bytes(&self) -> [u8; 8] {
        [
            self.network_id[0],
            self.network_id[1],
            self.protocol_version.0,
            self.protocol_version.1,
            self.protocol_version.2,
            self.message_type as u8,
            self.extension.0[0],
            self.extension.0[1],
        ]
    }

    /// The byte length of the body that follows this header, per
    /// `original_source/p2p/packets/header.go::PacketSize`.
    pub fn body_size(&self) -> usize {
        use MessageType::*;
        match self.message_type {
            BulkPush | TelemetryReq => 0,
            BulkPull => 32 + 32,
            FrontierReq => 32 + 4 + 4,
            BulkPullAccount => 32 + 16 + 1,
            Keepalive => 8 * (16 + 2),
            NodeIdHandshake => {
                let mut size = 0usize;
                if self.extension.is_query() {
                    size += 32;
                }
                if self.extension.is_response() {
                    size += 32 + 64;
                }
                size
            }
            ConfirmAck => {
                let mut size = 104usize;
                if self.extension.block_type() == BlockTypeTag::NotABlock {
                    size += self.extension.count() as usize * 32;
                } else {
                    size += self.extension.block_type().size();
                }
                size
            }
            ConfirmReq => {
                if self.extension.block_type() == BlockTypeTag::NotABlock {
                    64 * self.extension.count() as usize
                } else {
                    self.extension.block_type().size()
                }
            }
            Publish => self.extension.block_type().size(),
            TelemetryAck => self.extension.telemetry_size() as usize,
        }
    }
}

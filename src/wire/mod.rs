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

//! Binary wire codec: frame header, message type sizing, block parsing.

/// The five legacy/state block parsers and their BLAKE2b hash preimages.
pub mod block;
/// 8-byte frame header and its extension bitfield.
pub mod header;
/// Message type tags and packet-size inference.
pub mod message;

pub use block::WireError;
pub use header::{Header, HeaderExtension};
pub use message::MessageType;

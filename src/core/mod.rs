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

//! Core protocol primitives: ledger types, cryptography, node identity.

/// ed25519-blake2b signing/verification and generic BLAKE2b-256 hashing.
pub mod crypto;
/// Node identity: persistent keypair load-or-create.
pub mod identity;
/// Hashes, addresses, amounts, blocks, accounts.
pub mod types;

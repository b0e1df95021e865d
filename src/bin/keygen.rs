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

#![forbid(unsafe_code)]

//! Offline node identity generator: writes `<out_dir>/node_id.dat` and
//! prints the resulting account address, without starting a node.

use anyhow::Result;
use std::path::PathBuf;

use amaranth_node::core::identity::NodeIdentity;

fn main() -> Result<()> {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let passphrase = std::env::args().nth(2);
    let data_dir = PathBuf::from(out_dir);
    std::fs::create_dir_all(&data_dir)?;

    let identity = NodeIdentity::load_or_create(&data_dir, passphrase.as_deref())?;
    println!("{}", identity.keypair().public_key());
    Ok(())
}

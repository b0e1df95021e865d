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

#![no_main]
#![forbid(unsafe_code)]

use amaranth_node::net::confirm_ack::parse_and_validate;
use amaranth_node::wire::header::HeaderExtension;
use libfuzzer_sys::fuzz_target;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
struct Input {
    body: Vec<u8>,
    extension: [u8; 2],
}

fuzz_target!(|inp: Input| {
    let ext = HeaderExtension::from_bytes(inp.extension);
    let _ = parse_and_validate(&inp.body, ext);
});

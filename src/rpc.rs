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

//! Minimal HTTP introspection surface: a single JSON POST endpoint at `/`
//! dispatching on a `method` field, per `original_source/rpc/http.go`. Not a
//! full RPC surface — three methods only, matching `spec.md` §6.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::net::NodeHandles;

#[derive(Deserialize)]
struct RpcRequest {
    method: String,
    #[serde(default)]
    params: HashMap<String, bool>,
}

#[derive(Serialize)]
struct RpcError {
    success: bool,
    error: String,
}

/// Build the router. `handles` is shared with every peer session task.
pub fn router(handles: Arc<NodeHandles>) -> Router {
    Router::new().route("/", post(handle)).with_state(handles)
}

async fn handle(State(handles): State<Arc<NodeHandles>>, body: axum::body::Bytes) -> impl IntoResponse {
    let req: RpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return Json(RpcError { success: true, error: e.to_string() }).into_response(),
    };

    match req.method.as_str() {
        "cemented_block_count" => match handles.ledger.get_block_count() {
            Ok(count) => count.to_string().into_response(),
            Err(e) => {
                warn!(err = %e, "cemented_block_count failed");
                Json(RpcError { success: true, error: e.to_string() }).into_response()
            }
        },
        "gnano_memoryViewer" => Json(handle_memory_viewer(&handles, &req.params)).into_response(),
        "gnano_peersInfo" => Json(handle_peers_info(&handles)).into_response(),
        other => {
            Json(RpcError { success: true, error: format!("method {other} is not supported") }).into_response()
        }
    }
}

fn handle_memory_viewer(handles: &NodeHandles, params: &HashMap<String, bool>) -> HashMap<String, Value> {
    let mut response = HashMap::new();

    if params.get("ConfirmedButWaitingForBlockBody").copied().unwrap_or(false) {
        response.insert(
            "ConfirmedButWaitingForBlockBody".to_string(),
            Value::from(handles.peers_manager.live_count()),
        );
    }

    if params.get("UncheckedBlocksManager").copied().unwrap_or(false) {
        response.insert(
            "UncheckedBlocksManager".to_string(),
            serde_json::json!({ "Count": handles.unchecked.count() }),
        );
    }

    response
}

fn handle_peers_info(handles: &NodeHandles) -> HashMap<String, Value> {
    let mut response = HashMap::new();
    response.insert("LivePeersCount".to_string(), Value::from(handles.peers_manager.live_count()));
    response.insert(
        "BootstrapPeersCount".to_string(),
        Value::from(handles.peers_manager.bootstrap_count()),
    );
    response
}

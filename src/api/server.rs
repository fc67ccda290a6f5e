//! API Server Module
//!
//! This module implements a JSON-RPC server for relaying signed plans into
//! the engine and answering read-only queries about its state.
//! Engine rejections are returned as regular results carrying a
//! machine-readable error code, so indexers never parse messages.

use crate::{
    Batch, EngineError, ExecutionReceipt, IntentEngine, Plan, Submission,
    config::Config,
    host::InMemoryHost,
};
use axum::{Json, Router, extract::State, routing::post};
use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Shared application state that is accessible across all request handlers
///
/// - `engine`: the authorization-and-execution engine
/// - `host`: execution environment; the async mutex queues concurrent
///   submissions instead of letting the engine reject them as re-entrant
/// - `relayer`: identity this node submits under
#[derive(Clone)]
pub struct AppState {
    engine: Arc<IntentEngine>,
    host: Arc<Mutex<InMemoryHost>>,
    relayer: Address,
}

impl AppState {
    /// Wraps the engine and host for sharing across handlers
    ///
    /// # Arguments
    /// * `engine` - The engine every request is served from
    /// * `host` - Execution environment; moved behind an async mutex
    /// * `relayer` - Submitter identity used for every `executeBatch`
    pub fn new(engine: Arc<IntentEngine>, host: InMemoryHost, relayer: Address) -> Self {
        Self {
            engine,
            host: Arc::new(Mutex::new(host)),
            relayer,
        }
    }
}

/// The main API server struct
///
/// Encapsulates the server configuration and application state.
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Loaded configuration; `api` gives the bind address and
    ///   `relayer` the identity submissions are made under
    /// * `engine` - A bootstrapped engine (see `Config::build_engine`)
    /// * `host` - Execution environment for dispatched operations
    ///
    /// # Returns
    /// A `Server` ready to `start`
    pub fn new(config: Config, engine: Arc<IntentEngine>, host: InMemoryHost) -> Self {
        let state = AppState::new(engine, host, config.relayer.address);
        Self { config, state }
    }

    /// Starts the API server and begins listening for incoming requests
    ///
    /// This method:
    /// 1. Builds the router with the single JSON-RPC endpoint
    /// 2. Binds to the configured host and port
    /// 3. Serves requests until the process shuts down
    ///
    /// # Returns
    /// `Ok(())` when serving ends, or an error if binding fails
    pub async fn start(self) -> anyhow::Result<()> {
        let app = router(self.state);

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Router with the single JSON-RPC endpoint at "/"
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .with_state(state)
}

/// JSON-RPC 2.0 request structure
///
/// - `jsonrpc`: Protocol version (should be "2.0")
/// - `method`: The RPC method to call (e.g., "executeBatch")
/// - `params`: Method parameters (arbitrary JSON value)
/// - `id`: Request identifier for matching responses
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Value,
}

/// JSON-RPC 2.0 response structure
///
/// Either `result` or `error` is populated, never both.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

/// JSON-RPC error object
///
/// Only protocol failures end up here; engine rejections are results.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// Outcome of an `executeBatch` call
///
/// Engine rejections are a successful RPC call whose status says why the
/// batch was not executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub plan_id: H256,
    #[serde(flatten)]
    pub status: SubmissionStatus,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionStatus {
    Committed {
        receipt: ExecutionReceipt,
    },
    /// `error` is the camelCase error kind, `reason` its message. `index`
    /// names the offending operation and `cause` carries a revert payload.
    Rejected {
        error: String,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<Bytes>,
    },
}

impl From<&EngineError> for SubmissionStatus {
    fn from(err: &EngineError) -> Self {
        let cause = match err {
            EngineError::OperationReverted { cause, .. } => Some(cause.clone()),
            _ => None,
        };
        SubmissionStatus::Rejected {
            error: err.code().to_string(),
            reason: err.to_string(),
            index: err.operation_index(),
            cause,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteBatchParams {
    user: Address,
    plan: Plan,
    batch: Batch,
    signature: Bytes,
}

#[derive(Debug, Deserialize)]
struct AddressParams {
    address: Address,
}

#[derive(Debug, Deserialize)]
struct PlanParams {
    plan: Plan,
}

#[derive(Debug, Default, Deserialize)]
struct CursorParams {
    #[serde(default)]
    cursor: usize,
}

/// Main RPC request handler
///
/// This function is called for every POST request to the "/" endpoint.
/// It routes the request to the handler for its method name.
///
/// # Arguments
/// * `state` - Shared application state (injected by Axum)
/// * `request` - The JSON-RPC request
///
/// # Returns
/// A JSON-RPC response (either result or error)
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    info!("Received RPC request: {}", request.method);

    let id = request.id.clone();
    let outcome = match request.method.as_str() {
        "executeBatch" => handle_execute_batch(&state, request.params).await,
        "currentNonce" => parse::<AddressParams>(request.params)
            .map(|p| json!(state.engine.current_nonce(&p.address))),
        "isPaused" => Ok(json!(state.engine.is_paused())),
        "isTargetAllowed" => parse::<AddressParams>(request.params)
            .map(|p| json!(state.engine.is_target_allowed(&p.address))),
        "isRelayerAllowed" => parse::<AddressParams>(request.params)
            .map(|p| json!(state.engine.is_relayer_allowed(&p.address))),
        "owner" => Ok(json!(state.engine.owner())),
        "buildDigest" => parse::<PlanParams>(request.params)
            .map(|p| json!(state.engine.digest_for(&p.plan))),
        "getEvents" => handle_get_events(&state, request.params),
        // Unsupported methods
        _ => Err(JsonRpcError {
            code: METHOD_NOT_FOUND,
            message: "Method not found".to_string(),
        }),
    };

    Json(match outcome {
        Ok(result) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        },
        Err(error) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        },
    })
}

/// Handles the "executeBatch" RPC method
///
/// This function:
/// 1. Deserializes the signed plan and its batch
/// 2. Waits for the host, so the engine sees submissions one at a time
/// 3. Submits as this node's relayer
/// 4. Wraps the receipt or the structured rejection in a response
///
/// # Arguments
/// * `state` - Shared application state
/// * `params` - `{ user, plan, batch, signature }`
///
/// # Returns
/// A `SubmissionResponse` value, or an invalid-params error
async fn handle_execute_batch(state: &AppState, params: Value) -> Result<Value, JsonRpcError> {
    // Step 1: Deserialize the submission
    let params: ExecuteBatchParams = parse(params)?;
    info!(
        "Relaying plan {:?} for {:?} ({} operations)",
        params.plan.plan_id,
        params.user,
        params.batch.targets.len()
    );

    // Steps 2 and 3: the host lock is released as soon as the engine returns
    let result = {
        let mut host = state.host.lock().await;
        state.engine.execute_batch(
            &mut *host,
            Submission {
                submitter: state.relayer,
                user: params.user,
                plan: &params.plan,
                batch: &params.batch,
                signature: &params.signature,
            },
        )
    };

    // Step 4: Build the response
    let status = match result {
        Ok(receipt) => SubmissionStatus::Committed { receipt },
        Err(e) => {
            warn!("Plan {:?} rejected: {}", params.plan.plan_id, e);
            SubmissionStatus::from(&e)
        }
    };

    to_value(SubmissionResponse {
        plan_id: params.plan.plan_id,
        status,
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Handles the "getEvents" RPC method
///
/// # Arguments
/// * `state` - Shared application state
/// * `params` - `{ cursor }`, or null to read from the beginning
///
/// # Returns
/// `{ events, next }` where `next` is the cursor to resume from
fn handle_get_events(state: &AppState, params: Value) -> Result<Value, JsonRpcError> {
    let params: CursorParams = if params.is_null() {
        CursorParams::default()
    } else {
        parse(params)?
    };
    let events = state.engine.events_since(params.cursor);
    let next = params.cursor + events.len();
    Ok(json!({ "events": events, "next": next }))
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params).map_err(|e| {
        error!("Failed to deserialize params: {}", e);
        JsonRpcError {
            code: INVALID_PARAMS,
            message: format!("Invalid params: {}", e),
        }
    })
}

fn to_value<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError {
        code: INTERNAL_ERROR,
        message: format!("Failed to encode result: {}", e),
    })
}

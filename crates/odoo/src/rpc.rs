//! JSON-RPC transport for the remote backend.
//!
//! Every business call goes through [`RpcClient::call`], which wraps the
//! arguments in the `{"jsonrpc": "2.0", "method": "call", ...}` envelope,
//! POSTs it to `/jsonrpc` using [`reqwest`], and unwraps `result` or turns
//! `error` into [`RpcError::Remote`].

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use serviparts_core::types::RecordId;

use crate::session::Credentials;

/// Path of the RPC endpoint relative to the server URL.
pub const RPC_PATH: &str = "/jsonrpc";

/// HTTP client for one backend database.
///
/// Cloning is cheap: the underlying [`reqwest::Client`] is shared.
#[derive(Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    base_url: String,
    db: String,
}

/// Errors from the RPC transport layer.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status code.
    #[error("Backend HTTP error ({status}): {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The server rejected the call; `message` is the remote text, if any.
    #[error("Remote error: {}", message.as_deref().unwrap_or("no message"))]
    Remote { message: Option<String> },

    /// The body was not a JSON-RPC response envelope.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Error object of a response envelope.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<RemoteErrorData>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorData {
    #[serde(default)]
    message: Option<String>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// `Some(Value::Null)` for `"result": null`, `None` when the key is absent.
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RemoteErrorBody>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl RemoteErrorBody {
    /// Prefer `data.message`, then `message`.
    fn into_message(self) -> Option<String> {
        self.data
            .and_then(|d| d.message)
            .filter(|m| !m.is_empty())
            .or(self.message.filter(|m| !m.is_empty()))
    }
}

/// Build a request envelope around `params` with a random request id.
pub fn envelope(params: Value) -> Value {
    let id: u32 = rand::rng().random_range(1..1_000_000_000);
    json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": params,
        "id": id,
    })
}

impl RpcClient {
    /// Create a client for `base_url` (trailing `/` is ignored) and `db`.
    pub fn new(base_url: &str, db: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, db))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str, db: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            db: db.to_string(),
        }
    }

    /// Server URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Database name passed with every call.
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Absolute URL for a server path such as `/jsonrpc`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Call `method` of `service` with positional `args`.
    pub async fn call(
        &self,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, RpcError> {
        let body = envelope(json!({
            "service": service,
            "method": method,
            "args": args,
        }));

        let response = self
            .client
            .post(self.url(RPC_PATH))
            .json(&body)
            .send()
            .await?;

        read_result(response).await
    }

    /// Run `method` on `model` as the authenticated user.
    ///
    /// The database name, user id and password travel with every call.
    pub async fn execute_kw(
        &self,
        creds: &Credentials,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Value,
    ) -> Result<Value, RpcError> {
        tracing::debug!(uid = creds.uid, model, method, "execute_kw");

        let uid: RecordId = creds.uid;
        self.call(
            "object",
            "execute_kw",
            vec![
                json!(self.db),
                json!(uid),
                json!(creds.password()),
                json!(model),
                json!(method),
                Value::Array(args),
                kwargs,
            ],
        )
        .await
        .inspect_err(|e| tracing::warn!(model, method, error = %e, "RPC call failed"))
    }
}

// ---- envelope decoding ----

/// Ensure a success status, then unwrap the envelope's `result`.
pub(crate) async fn read_result(response: reqwest::Response) -> Result<Value, RpcError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(RpcError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    decode_envelope(&bytes)
}

/// Decode a raw response body into its `result` value.
pub(crate) fn decode_envelope(bytes: &[u8]) -> Result<Value, RpcError> {
    let envelope: RpcResponse =
        serde_json::from_slice(bytes).map_err(|e| RpcError::Malformed(e.to_string()))?;

    if let Some(error) = envelope.error {
        return Err(RpcError::Remote {
            message: error.into_message(),
        });
    }

    envelope
        .result
        .ok_or_else(|| RpcError::Malformed("response has neither result nor error".to_string()))
}

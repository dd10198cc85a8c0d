//! In-process mock of the remote backend for integration tests.
//!
//! Serves `/web/session/authenticate`, `/jsonrpc` and the PDF report route
//! on `127.0.0.1:0`, and records every call so tests can assert on the
//! exact wire payloads.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use serviparts_odoo::rpc::RpcClient;

pub const TEST_DB: &str = "test-db";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4 mock report";

/// How the session endpoint answers.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Success with the token in a `Set-Cookie` header.
    CookieHeader { uid: i64, token: String },
    /// Success with the token only in `result.session_id`.
    BodyToken { uid: i64, token: String },
    /// Success without any token.
    NoToken { uid: i64 },
    /// Error envelope with the given message.
    Reject { message: String },
    /// A JSON body with neither `result` nor `error`.
    EmptyEnvelope,
}

/// Canned answer for one `(model, method)` pair.
#[derive(Debug, Clone)]
pub enum Reply {
    Result(Value),
    Error(String),
    Status(u16),
}

pub struct MockState {
    auth: Mutex<AuthMode>,
    auth_delay: Mutex<Duration>,
    delays: Mutex<HashMap<(String, String), Duration>>,
    replies: Mutex<HashMap<(String, String), Reply>>,
    rpc_calls: Mutex<Vec<Value>>,
    auth_calls: Mutex<Vec<Value>>,
    report_cookies: Mutex<Vec<Option<String>>>,
}

impl MockState {
    fn current_token(&self) -> Option<String> {
        match &*self.auth.lock().unwrap() {
            AuthMode::CookieHeader { token, .. } | AuthMode::BodyToken { token, .. } => {
                Some(token.clone())
            }
            _ => None,
        }
    }
}

pub struct MockBackend {
    pub url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            auth: Mutex::new(AuthMode::CookieHeader {
                uid: 2,
                token: "mock-session".into(),
            }),
            auth_delay: Mutex::new(Duration::ZERO),
            delays: Mutex::new(HashMap::new()),
            replies: Mutex::new(HashMap::new()),
            rpc_calls: Mutex::new(Vec::new()),
            auth_calls: Mutex::new(Vec::new()),
            report_cookies: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/web/session/authenticate", post(authenticate))
            .route("/jsonrpc", post(jsonrpc))
            .route("/report/pdf/{report}/{id}", get(report))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn rpc(&self) -> RpcClient {
        RpcClient::new(&self.url, TEST_DB, Duration::from_secs(5)).unwrap()
    }

    pub fn set_auth(&self, mode: AuthMode) {
        *self.state.auth.lock().unwrap() = mode;
    }

    /// Hold every session authentication response for `delay`.
    pub fn set_auth_delay(&self, delay: Duration) {
        *self.state.auth_delay.lock().unwrap() = delay;
    }

    /// Hold responses to `model`/`method` for `delay` before answering.
    pub fn set_delay(&self, model: &str, method: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert((model.to_string(), method.to_string()), delay);
    }

    pub fn reply(&self, model: &str, method: &str, reply: Reply) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert((model.to_string(), method.to_string()), reply);
    }

    /// `params.args` of every `/jsonrpc` call, in arrival order.
    pub fn rpc_calls(&self) -> Vec<Value> {
        self.state.rpc_calls.lock().unwrap().clone()
    }

    /// `args` of the `execute_kw` calls for `model`/`method`.
    pub fn calls_to(&self, model: &str, method: &str) -> Vec<Vec<Value>> {
        self.rpc_calls()
            .into_iter()
            .filter_map(|args| args.as_array().cloned())
            .filter(|args| {
                args.get(3) == Some(&json!(model)) && args.get(4) == Some(&json!(method))
            })
            .collect()
    }

    /// `params` of every session authentication request.
    pub fn auth_calls(&self) -> Vec<Value> {
        self.state.auth_calls.lock().unwrap().clone()
    }

    /// `Cookie` header of every report request.
    pub fn report_cookies(&self) -> Vec<Option<String>> {
        self.state.report_cookies.lock().unwrap().clone()
    }
}

async fn authenticate(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.auth_calls.lock().unwrap().push(body["params"].clone());
    let mode = state.auth.lock().unwrap().clone();
    let delay = *state.auth_delay.lock().unwrap();
    let id = body["id"].clone();
    tokio::time::sleep(delay).await;

    match mode {
        AuthMode::CookieHeader { uid, token } => {
            let mut response =
                Json(json!({"jsonrpc": "2.0", "id": id, "result": {"uid": uid}})).into_response();
            let cookie =
                format!("session_id={token}; Expires=Thu, 01 Jan 2099 00:00:00 GMT; HttpOnly; Path=/");
            response.headers_mut().append(
                SET_COOKIE,
                HeaderValue::from_static("frontend_lang=en_US; Path=/"),
            );
            response
                .headers_mut()
                .append(SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());
            response
        }
        AuthMode::BodyToken { uid, token } => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {"uid": uid, "session_id": token},
        }))
        .into_response(),
        AuthMode::NoToken { uid } => {
            Json(json!({"jsonrpc": "2.0", "id": id, "result": {"uid": uid}})).into_response()
        }
        AuthMode::Reject { message } => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "odoo.exceptions.AccessDenied", "message": message},
            },
        }))
        .into_response(),
        AuthMode::EmptyEnvelope => Json(json!({})).into_response(),
    }
}

async fn jsonrpc(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let args = body["params"]["args"].clone();
    state.rpc_calls.lock().unwrap().push(args.clone());

    let model = args[3].as_str().unwrap_or_default().to_string();
    let method = args[4].as_str().unwrap_or_default().to_string();
    let key = (model, method);
    let delay = state.delays.lock().unwrap().get(&key).copied();
    let reply = state
        .replies
        .lock()
        .unwrap()
        .get(&key)
        .cloned()
        .unwrap_or(Reply::Result(json!([])));
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let id = body["id"].clone();
    match reply {
        Reply::Result(result) => {
            Json(json!({"jsonrpc": "2.0", "id": id, "result": result})).into_response()
        }
        Reply::Error(message) => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": 200, "message": "Odoo Server Error", "data": {"message": message}},
        }))
        .into_response(),
        Reply::Status(code) => StatusCode::from_u16(code).unwrap().into_response(),
    }
}

async fn report(
    State(state): State<Arc<MockState>>,
    Path((_report, _id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    let cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.report_cookies.lock().unwrap().push(cookie.clone());

    let expected = state.current_token().map(|t| format!("session_id={t}"));
    if cookie.is_some() && cookie == expected {
        (StatusCode::OK, PDF_BYTES).into_response()
    } else {
        StatusCode::FORBIDDEN.into_response()
    }
}

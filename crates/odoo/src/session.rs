//! Cookie-session authentication.
//!
//! The RPC protocol re-authenticates every call with the user id and
//! password, but direct document downloads need a web session cookie.
//! [`SessionManager`] performs the credential exchange against the session
//! endpoint, keeps the resulting token, and issues cookie-authenticated
//! requests with it.
//!
//! The token is held until the process exits or a later successful
//! authentication replaces it. There is no logout.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{json, Value};

use serviparts_core::types::{is_persisted_id, RecordId};

use crate::rpc::{envelope, read_result, RpcClient, RpcError};

/// Session authentication endpoint.
pub const SESSION_AUTH_PATH: &str = "/web/session/authenticate";

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";

/// Message used when the backend accepts the call but returns no user.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Opaque session token captured from an authentication response.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token. Empty strings are not tokens.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        (!raw.is_empty()).then_some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Per-call RPC credentials of a logged-in user.
#[derive(Clone)]
pub struct Credentials {
    pub uid: RecordId,
    pub login: String,
    password: String,
}

impl Credentials {
    pub fn new(uid: RecordId, login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uid,
            login: login.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("uid", &self.uid)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated { uid: RecordId },
}

/// Errors from authentication and cookie-authenticated requests.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The backend rejected the login.
    #[error("Authentication rejected: {0}")]
    Credentials(String),

    /// No session token is held.
    #[error("No session token; authenticate first")]
    NoSession,

    /// The exchange failed below the protocol level.
    #[error(transparent)]
    Transport(#[from] RpcError),
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

struct SessionInner {
    state: SessionState,
    token: Option<SessionToken>,
}

/// Owner of the process-wide session token.
///
/// The lock is never held across an await.
pub struct SessionManager {
    rpc: RpcClient,
    inner: Mutex<SessionInner>,
}

/// Puts the state back if an authentication is abandoned mid-exchange.
struct PendingAuth<'a> {
    inner: &'a Mutex<SessionInner>,
    previous: SessionState,
    settled: bool,
}

impl PendingAuth<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingAuth<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.state == SessionState::Authenticating {
            inner.state = self.previous;
            tracing::debug!(state = ?self.previous, "Authentication abandoned");
        }
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionManager {
    pub fn new(rpc: RpcClient) -> Self {
        Self {
            rpc,
            inner: Mutex::new(SessionInner {
                state: SessionState::Unauthenticated,
                token: None,
            }),
        }
    }

    /// The transport this session authenticates against.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    pub fn token(&self) -> Option<SessionToken> {
        lock(&self.inner).token.clone()
    }

    /// Exchange `login`/`password` for a user id and a session token.
    ///
    /// On success the token (when the response carries one) replaces any
    /// previous token. On failure the state returns to `Unauthenticated`
    /// and a previously held token is left untouched. Dropping the future
    /// before it completes restores the state held before the call.
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Credentials, AuthError> {
        let pending = {
            let mut inner = lock(&self.inner);
            let previous = std::mem::replace(&mut inner.state, SessionState::Authenticating);
            PendingAuth {
                inner: &self.inner,
                previous,
                settled: false,
            }
        };

        let outcome = self.exchange(login, password).await;
        pending.settle();

        let mut inner = lock(&self.inner);
        match outcome {
            Ok((uid, token)) => {
                let has_token = token.is_some();
                if let Some(token) = token {
                    inner.token = Some(token);
                } else {
                    tracing::warn!(uid, "Authentication response carried no session token");
                }
                inner.state = SessionState::Authenticated { uid };
                tracing::info!(uid, login, has_token, "Authenticated");
                Ok(Credentials::new(uid, login, password))
            }
            Err(e) => {
                inner.state = SessionState::Unauthenticated;
                tracing::warn!(login, error = %e, "Authentication failed");
                Err(e)
            }
        }
    }

    /// Return the held token, authenticating with `creds` first if none is held.
    pub async fn ensure_session(&self, creds: &Credentials) -> Result<SessionToken, AuthError> {
        if let Some(token) = self.token() {
            return Ok(token);
        }

        tracing::info!(uid = creds.uid, "No session token held, re-authenticating");
        self.authenticate(&creds.login, creds.password()).await?;
        self.token().ok_or(AuthError::NoSession)
    }

    /// GET `url` with the session cookie.
    ///
    /// Fails with [`AuthError::NoSession`] without sending anything when no
    /// token is held. The response is returned as-is, whatever its status.
    pub async fn authenticated_fetch(&self, url: &str) -> Result<reqwest::Response, AuthError> {
        let token = self.token().ok_or(AuthError::NoSession)?;

        let response = self
            .rpc
            .http()
            .get(url)
            .header(COOKIE, token.cookie_header())
            .send()
            .await
            .map_err(RpcError::from)?;

        Ok(response)
    }

    // ---- private helpers ----

    async fn exchange(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(RecordId, Option<SessionToken>), AuthError> {
        let body = envelope(json!({
            "db": self.rpc.db(),
            "login": login,
            "password": password,
        }));

        let response = self
            .rpc
            .http()
            .post(self.rpc.url(SESSION_AUTH_PATH))
            .json(&body)
            .send()
            .await
            .map_err(RpcError::from)?;

        let header_token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| cookie_value(v, SESSION_COOKIE))
            .and_then(SessionToken::new);

        let result = match read_result(response).await {
            Ok(result) => result,
            Err(RpcError::Remote { message }) => {
                return Err(AuthError::Credentials(
                    message.unwrap_or_else(|| INVALID_CREDENTIALS.to_string()),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let uid = user_id(&result)
            .ok_or_else(|| AuthError::Credentials(INVALID_CREDENTIALS.to_string()))?;

        let token = header_token.or_else(|| body_token(&result));
        Ok((uid, token))
    }
}

/// Positive `uid` of an authentication result.
fn user_id(result: &Value) -> Option<RecordId> {
    result
        .get("uid")
        .and_then(Value::as_i64)
        .filter(|uid| is_persisted_id(*uid))
}

/// Token field of an authentication result body.
fn body_token(result: &Value) -> Option<SessionToken> {
    result
        .get(SESSION_COOKIE)
        .and_then(Value::as_str)
        .and_then(SessionToken::new)
}

/// Value of cookie `name` in a `Set-Cookie` header, if that is the cookie set.
fn cookie_value<'a>(set_cookie: &'a str, name: &str) -> Option<&'a str> {
    let pair = set_cookie.split(';').next()?;
    let (key, value) = pair.split_once('=')?;
    (key.trim() == name).then(|| value.trim())
}

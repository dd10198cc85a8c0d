use std::sync::Arc;

use serviparts_odoo::rpc::RpcClient;
use serviparts_odoo::session::SessionManager;

use crate::config::AppConfig;
use crate::error::AppResult;

/// Shared state handed to every screen controller.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppContext {
    /// Backend connection settings.
    pub config: Arc<AppConfig>,
    /// Process-wide session, also owning the RPC transport.
    pub session: Arc<SessionManager>,
}

impl AppContext {
    /// Build the transport and an unauthenticated session for `config`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let rpc = RpcClient::new(&config.odoo_url, &config.db, config.request_timeout())?;
        Ok(Self::with_rpc(config, rpc))
    }

    /// Use an existing transport.
    pub fn with_rpc(config: AppConfig, rpc: RpcClient) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(SessionManager::new(rpc)),
        }
    }

    pub fn rpc(&self) -> &RpcClient {
        self.session.rpc()
    }
}

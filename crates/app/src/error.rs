use serviparts_core::error::CoreError;
use serviparts_odoo::report::ReportError;
use serviparts_odoo::rpc::RpcError;
use serviparts_odoo::session::AuthError;

use crate::config::ConfigError;

/// Shown for transport failures: network, timeouts, bad statuses.
pub const MSG_CONNECTION_FAILED: &str =
    "Could not reach the server. Check your connection and try again.";

/// Appended to every rejected login.
pub const MSG_CHECK_CREDENTIALS: &str = "Check your credentials.";

/// Shown when the server rejects a write without saying why.
pub const MSG_SAVE_FAILED: &str = "The changes could not be saved.";

/// Shown when a cookie-authenticated download has no session to use.
pub const MSG_SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Application-level error type for screen controllers.
///
/// Wraps the lower layers' errors and maps each to the text a user sees
/// through [`AppError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience type alias for controller return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Human-readable text for a notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => msg.clone(),
                CoreError::NotFound { entity, id } => format!("{entity} {id} no longer exists."),
                CoreError::Malformed(msg) => {
                    tracing::error!(error = %msg, "Unexpected data from server");
                    MSG_CONNECTION_FAILED.to_string()
                }
            },

            AppError::Rpc(rpc) => rpc_message(rpc),

            AppError::Auth(auth) => auth_message(auth),

            AppError::Report(report) => match report {
                ReportError::Auth(auth) => auth_message(auth),
                ReportError::HttpStatus(status) => {
                    format!("The server did not return the PDF (code {status}).")
                }
                ReportError::Body(_) => MSG_CONNECTION_FAILED.to_string(),
                ReportError::Io(_) | ReportError::Missing(_) => {
                    "The report could not be saved on this device.".to_string()
                }
            },

            AppError::Config(config) => config.to_string(),
        }
    }
}

fn rpc_message(err: &RpcError) -> String {
    match err {
        RpcError::Remote { message } => message
            .clone()
            .unwrap_or_else(|| MSG_SAVE_FAILED.to_string()),
        RpcError::Request(_) | RpcError::HttpStatus { .. } | RpcError::Malformed(_) => {
            MSG_CONNECTION_FAILED.to_string()
        }
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::Credentials(msg) => format!("{msg}. {MSG_CHECK_CREDENTIALS}"),
        AuthError::NoSession => MSG_SESSION_EXPIRED.to_string(),
        AuthError::Transport(rpc) => rpc_message(rpc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_text_is_shown_as_is() {
        let err = AppError::from(CoreError::Validation("The title is required".into()));
        assert_eq!(err.user_message(), "The title is required");
    }

    #[test]
    fn remote_text_or_generic_save_failure() {
        let err = AppError::from(RpcError::Remote {
            message: Some("Execution end must follow start".into()),
        });
        assert_eq!(err.user_message(), "Execution end must follow start");

        let err = AppError::from(RpcError::Remote { message: None });
        assert_eq!(err.user_message(), MSG_SAVE_FAILED);
    }

    #[test]
    fn transport_failures_are_generic() {
        let err = AppError::from(RpcError::HttpStatus {
            status: 502,
            body: "<html>".into(),
        });
        assert_eq!(err.user_message(), MSG_CONNECTION_FAILED);

        let err = AppError::from(AuthError::Transport(RpcError::Malformed("x".into())));
        assert_eq!(err.user_message(), MSG_CONNECTION_FAILED);
    }

    #[test]
    fn credential_errors_ask_to_check_credentials() {
        let err = AppError::from(AuthError::Credentials("Access Denied".into()));
        assert_eq!(err.user_message(), "Access Denied. Check your credentials.");
    }

    #[test]
    fn report_errors() {
        let err = AppError::from(ReportError::HttpStatus(403));
        assert_eq!(err.user_message(), "The server did not return the PDF (code 403).");

        let err = AppError::from(ReportError::Auth(AuthError::NoSession));
        assert_eq!(err.user_message(), MSG_SESSION_EXPIRED);
    }

    #[test]
    fn config_errors_name_the_variable() {
        let err = AppError::from(ConfigError::Missing("ODOO_URL"));
        assert_eq!(err.user_message(), "ODOO_URL environment variable is required");
    }
}

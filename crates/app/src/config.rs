use std::path::PathBuf;
use std::time::Duration;

/// Report template rendered by the print action.
pub const DEFAULT_REPORT_NAME: &str = "serviparts_mantenimiento.report_jh_template";

/// Default HTTP timeout for backend calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Server URL without trailing slash.
    pub odoo_url: String,
    /// Database name sent with every call.
    pub db: String,
    /// Technical name of the maintenance report template.
    pub report_name: String,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory downloaded reports are written to.
    pub report_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                                       |
    /// |------------------------|-----------------------------------------------|
    /// | `ODOO_URL`             | required                                      |
    /// | `ODOO_DB`              | required                                      |
    /// | `ODOO_REPORT_NAME`     | `serviparts_mantenimiento.report_jh_template` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                          |
    /// | `REPORT_DIR`           | OS temp directory                             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let odoo_url = required(&lookup, "ODOO_URL")?
            .trim_end_matches('/')
            .to_string();
        let db = required(&lookup, "ODOO_DB")?;

        let report_name =
            optional(&lookup, "ODOO_REPORT_NAME").unwrap_or_else(|| DEFAULT_REPORT_NAME.into());

        let request_timeout_secs = match optional(&lookup, "REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let report_dir = optional(&lookup, "REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            odoo_url,
            db,
            report_name,
            request_timeout_secs,
            report_dir,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Login credentials the binary signs in with.
#[derive(Clone)]
pub struct LoginConfig {
    pub login: String,
    pub password: String,
}

impl LoginConfig {
    /// Read `ODOO_LOGIN` and `ODOO_PASSWORD`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            login: required(&lookup, "ODOO_LOGIN")?,
            password: required(&lookup, "ODOO_PASSWORD")?,
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, name).ok_or(ConfigError::Missing(name))
}

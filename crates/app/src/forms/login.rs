use serviparts_core::error::CoreError;
use serviparts_odoo::session::Credentials;

use crate::context::AppContext;
use crate::error::AppResult;

/// Login screen state.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Both fields must be filled in before anything is sent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.login.trim().is_empty() || self.password.is_empty() {
            return Err(CoreError::Validation(
                "Enter your username and password".to_string(),
            ));
        }
        Ok(())
    }

    /// Authenticate and return the credentials for later calls.
    pub async fn submit(&self, ctx: &AppContext) -> AppResult<Credentials> {
        self.validate()?;
        let creds = ctx
            .session
            .authenticate(self.login.trim(), &self.password)
            .await?;
        Ok(creds)
    }
}

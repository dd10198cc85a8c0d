use serviparts_core::maintenance::{validate_title, MaintenanceType};
use serviparts_core::types::RecordId;
use serviparts_odoo::models::NewMaintenanceRequest;
use serviparts_odoo::repositories::MaintenanceRequestRepo;
use serviparts_odoo::session::Credentials;

use crate::context::AppContext;
use crate::error::AppResult;

/// New maintenance request screen state.
#[derive(Debug, Clone, Default)]
pub struct CreateForm {
    pub title: String,
    pub maintenance_type: MaintenanceType,
    pub description: String,
}

impl CreateForm {
    /// Validated create input.
    pub fn to_input(&self) -> AppResult<NewMaintenanceRequest> {
        let name = validate_title(&self.title)?;
        Ok(NewMaintenanceRequest {
            name: name.to_string(),
            maintenance_type: self.maintenance_type,
            description: self.description.clone(),
        })
    }

    /// Create the request and return its id.
    pub async fn submit(&self, ctx: &AppContext, creds: &Credentials) -> AppResult<RecordId> {
        let input = self.to_input()?;
        let id = MaintenanceRequestRepo::create(ctx.rpc(), creds, &input).await?;
        tracing::info!(
            request_id = id,
            maintenance_type = input.maintenance_type.as_str(),
            "Maintenance request created",
        );
        Ok(id)
    }
}

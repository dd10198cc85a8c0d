//! Print action: download the service report PDF of a request.

use std::path::PathBuf;

use serviparts_core::types::RecordId;
use serviparts_odoo::report::{download_report, report_file_name, report_url};
use serviparts_odoo::session::Credentials;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::screen::ScreenLifetime;

/// Download the report of `request_id` and return the saved file.
///
/// A missing session token is recovered by authenticating again with
/// `creds`. The file lands in the configured report directory as
/// `report_<id>.pdf`, replacing an earlier download of the same request.
pub async fn print_report(
    ctx: &AppContext,
    creds: &Credentials,
    request_id: RecordId,
) -> AppResult<PathBuf> {
    ctx.session.ensure_session(creds).await?;

    let url = report_url(&ctx.config.odoo_url, &ctx.config.report_name, request_id);
    let dest = ctx.config.report_dir.join(report_file_name(request_id));

    let path = download_report(&ctx.session, &url, &dest).await?;
    Ok(path)
}

/// [`print_report`] for a screen; `Ok(None)` when the screen was torn down
/// before the download finished.
pub async fn print_from_screen(
    ctx: &AppContext,
    creds: &Credentials,
    request_id: RecordId,
    screen: &ScreenLifetime,
) -> AppResult<Option<PathBuf>> {
    screen
        .settle("report download", print_report(ctx, creds, request_id))
        .await
        .transpose()
}

//! Download of server-rendered PDF reports.
//!
//! Reports are plain HTTP resources behind the web session, so they are
//! fetched with [`SessionManager::authenticated_fetch`] rather than RPC.

use std::path::{Path, PathBuf};

use serviparts_core::types::RecordId;

use crate::session::{AuthError, SessionManager};

/// Path prefix of the PDF report route.
pub const REPORT_PATH_PREFIX: &str = "/report/pdf";

/// Errors from a report download.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The server did not return the document.
    #[error("Server did not return the PDF (HTTP {0})")]
    HttpStatus(u16),

    #[error("Failed to read report body: {0}")]
    Body(#[from] reqwest::Error),

    #[error("Failed to write report file: {0}")]
    Io(#[from] std::io::Error),

    /// The write reported success but the file is not there.
    #[error("Report file was not saved: {}", .0.display())]
    Missing(PathBuf),
}

/// URL of report `report_name` rendered for `record_id`.
pub fn report_url(base_url: &str, report_name: &str, record_id: RecordId) -> String {
    format!(
        "{}{REPORT_PATH_PREFIX}/{report_name}/{record_id}",
        base_url.trim_end_matches('/')
    )
}

/// File name used for a downloaded report.
pub fn report_file_name(record_id: RecordId) -> String {
    format!("report_{record_id}.pdf")
}

/// Download `url` with the session cookie into `dest`.
///
/// Only HTTP 200 counts as success. Returns the path of the written file.
pub async fn download_report(
    session: &SessionManager,
    url: &str,
    dest: &Path,
) -> Result<PathBuf, ReportError> {
    tracing::info!(url, dest = %dest.display(), "Downloading report");

    let response = session.authenticated_fetch(url).await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::warn!(url, status = status.as_u16(), "Report download refused");
        return Err(ReportError::HttpStatus(status.as_u16()));
    }

    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes).await?;

    if !tokio::fs::try_exists(dest).await? {
        return Err(ReportError::Missing(dest.to_path_buf()));
    }

    tracing::info!(dest = %dest.display(), size = bytes.len(), "Report saved");
    Ok(dest.to_path_buf())
}

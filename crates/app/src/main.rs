//! `serviparts` -- field-service client for the maintenance backend.
//!
//! Logs in with the configured technician account and runs one command:
//! list the maintenance requests, show one with its checklist, or
//! download its service report.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default | Description                           |
//! |------------------------|----------|---------|---------------------------------------|
//! | `ODOO_URL`             | yes      | --      | Server URL, e.g. `https://erp.example.com` |
//! | `ODOO_DB`              | yes      | --      | Database name                         |
//! | `ODOO_LOGIN`           | yes      | --      | Technician login                      |
//! | `ODOO_PASSWORD`        | yes      | --      | Technician password                   |
//! | `ODOO_REPORT_NAME`     | no       | `serviparts_mantenimiento.report_jh_template` | Report template |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`    | HTTP timeout                          |
//! | `REPORT_DIR`           | no       | temp dir | Where report PDFs are written        |

use serviparts_app::cli::Command;
use serviparts_app::config::{AppConfig, LoginConfig};
use serviparts_app::context::AppContext;
use serviparts_app::error::AppResult;
use serviparts_app::forms::{EditForm, LoginForm};
use serviparts_app::print::print_report;
use serviparts_app::screen::ScreenLifetime;
use serviparts_core::maintenance::{FIELD_IS_DONE, FIELD_NAME};
use serviparts_odoo::repositories::MaintenanceRequestRepo;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "serviparts_app=info,serviparts_odoo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = Command::parse(std::env::args().skip(1)).unwrap_or_else(|e| {
        tracing::error!("{e}");
        std::process::exit(1);
    });

    if let Err(e) = run(command).await {
        tracing::error!(error = %e, "{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(command: Command) -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let login = LoginConfig::from_env()?;

    tracing::info!(
        url = %config.odoo_url,
        db = %config.db,
        ?command,
        "Starting serviparts",
    );

    let ctx = AppContext::new(config)?;
    let creds = LoginForm::new(login.login, login.password)
        .submit(&ctx)
        .await?;

    match command {
        Command::List => {
            let requests = MaintenanceRequestRepo::list(ctx.rpc(), &creds).await?;
            for request in &requests {
                let customer = request
                    .partner_id
                    .as_ref()
                    .map(|p| p.label.as_str())
                    .unwrap_or("-");
                println!(
                    "{:>6}  {:<12}  {:<24}  {}",
                    request.id,
                    request.stage_label(),
                    customer,
                    request.display_title(),
                );
            }
            tracing::info!(count = requests.len(), "Listed maintenance requests");
        }

        Command::Show(id) => {
            let screen = ScreenLifetime::new();
            if let Some(form) = EditForm::load(&ctx, &creds, id, &screen).await? {
                println!("#{} {}", form.request_id(), form.title);
                println!("type: {}", form.maintenance_type.as_str());
                println!("pending: {}", form.has_pending.as_str());
                for item in form.checklist() {
                    let done = item
                        .field(FIELD_IS_DONE)
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    let name = item
                        .field(FIELD_NAME)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    println!("  [{}] {name}", if done { "x" } else { " " });
                }
                println!("photos: {}", form.photos().len());
            }
        }

        Command::Print(id) => {
            let path = print_report(&ctx, &creds, id).await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

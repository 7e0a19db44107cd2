use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use contact_intake::config::AppConfig;
use contact_intake::db::Database;
use contact_intake::logging::{init_logging, OperationTimer};
use contact_intake::report::ReportGenerator;
use contact_intake::repository::SqliteSubmissionRepository;
use contact_intake::service::ContactService;
use contact_intake::state::AppState;

#[derive(Parser)]
#[command(name = "contact-intake", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Render the PDF report of the most recent submissions to a file
    Export {
        /// Where to write the PDF
        #[arg(short, long, default_value = "contact_submissions.pdf")]
        output: PathBuf,
    },
    /// Print dashboard statistics as JSON
    Stats,
    /// Load and validate configuration, then print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard must outlive every log call
    let _guard = init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Export { output } => export(config, &output).await,
        Commands::Stats => stats(config).await,
        Commands::CheckConfig => check_config(&config),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!(environment = %config.server.environment, "Starting contact intake service");

    let state = AppState::from_config(config).context("Failed to initialize application state")?;
    contact_intake::server::serve(state).await
}

fn offline_service(config: &AppConfig) -> Result<ContactService> {
    let db = Database::from_config(&config.database).context("Failed to open database")?;
    let repository = SqliteSubmissionRepository::new(Arc::new(db));

    Ok(ContactService::new(
        Arc::new(repository),
        ReportGenerator::new(config.export.title.clone()),
        config.export.max_records,
    ))
}

/// Export the report straight from the database
async fn export(config: AppConfig, output: &Path) -> Result<()> {
    let timer = OperationTimer::new("export_cli");
    let service = offline_service(&config)?;

    let bytes = service.export_pdf(Utc::now()).await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(output, &bytes).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(path = %output.display(), bytes = bytes.len(), "Report written");
    timer.finish();
    Ok(())
}

async fn stats(config: AppConfig) -> Result<()> {
    let service = offline_service(&config)?;
    let stats = service.stats(Utc::now()).await?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(&stats)?)?;
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    info!("Configuration is valid");

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(&config.redacted())?)?;
    Ok(())
}

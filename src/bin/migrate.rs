//! Submit a SQL file to the database one statement at a time.
//!
//! Exit codes: 1 when `DATABASE_URL` is missing, `LOG_FORMAT` is invalid or
//! the connection fails, 2 when the file cannot be read, 0 otherwise (failed
//! statements included).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use unineeds::app::run_migration;
use unineeds::infra::{config, init_tracing, LogFormat};
use unineeds::storage::PgTableStore;

/// `migrate` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migrate",
    about = "Run a SQL script statement by statement, continuing past failures",
    version
)]
struct CliArgs {
    /// Path to the `.sql` file.
    #[arg(value_name = "file.sql")]
    file: PathBuf,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let log_format = match config::log_format() {
        Ok(format) => format,
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(1);
        }
    };
    init_tracing(log_format);

    let database_url = match args.database_url.map(Ok).unwrap_or_else(config::database_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, "Missing configuration");
            return ExitCode::from(1);
        }
    };

    let sql = match tokio::fs::read_to_string(&args.file).await {
        Ok(sql) => sql,
        Err(e) => {
            tracing::error!(file = %args.file.display(), error = %e, "Failed to read SQL file");
            return ExitCode::from(2);
        }
    };

    let store = match PgTableStore::connect(&database_url, 1).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to the database");
            return ExitCode::from(1);
        }
    };

    let report = run_migration(&store, &sql).await;
    tracing::info!(
        file = %args.file.display(),
        applied = report.applied,
        failed = report.failed.len(),
        "Done"
    );
    ExitCode::SUCCESS
}

use clap::Parser;
use hrdesk::core::db::{bootstrap_schema, hr_schema, open};
use hrdesk::repl;
use hrdesk::session::{CrudSession, Operation};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Create, read, update and delete Human Resources records, or run ad-hoc SQL.
#[derive(Parser, Debug)]
#[command(name = "hrdesk", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration)
    #[arg(short, long, env = "HRDESK_DATABASE")]
    database: Option<String>,

    /// Run one SQL statement, print the outcome and exit
    #[arg(short, long)]
    execute: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match hrdesk::config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    let level = match config.logging.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    info!("Starting hrdesk...");

    // Without a connection there is nothing to do
    let connection = match open(&config.database) {
        Ok(connection) => connection,
        Err(e) => {
            error!(error = %e, "database connection failed");
            eprintln!("Error connecting to database:\n{}", e);
            return ExitCode::FAILURE;
        }
    };
    if config.database.bootstrap_schema {
        if let Err(e) = bootstrap_schema(&connection, hr_schema()) {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    let mut session = CrudSession::new(hr_schema(), connection);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(sql) = cli.execute {
        return match session.execute_ad_hoc(&sql) {
            Ok(report) => match repl::print_report(&mut out, &session, &report) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("I/O error: {}", e);
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("{}", Operation::AdHoc.failure_message(&e));
                ExitCode::FAILURE
            }
        };
    }

    let stdin = io::stdin();
    if let Err(e) = repl::run_repl(&mut session, stdin.lock(), &mut out) {
        eprintln!("I/O error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

//! `turnstile-checkin`: serves the check-in API with stub handlers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use turnstile::config::ConfigLoader;
use turnstile::server::Server;
use turnstile::service::{build_dispatcher, server_config, SERVICE_NAME};
use turnstile::telemetry::{describe_metrics, init_logging};

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

enum Command {
    Run(Args),
    Help,
    Version,
}

fn parse_args() -> Result<Command, String> {
    let mut args = std::env::args().skip(1);
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Command::Run(Args { config }))
}

fn print_help() {
    println!(
        r"turnstile-checkin - QR-code check-in API

USAGE:
    turnstile-checkin [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Configuration file (TOML or JSON)
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES (also read from .env):
    TURNSTILE_SERVER_HTTP_ADDR              Listen address (default: 0.0.0.0:8080)
    TURNSTILE_SERVER_BASE_PATH              Prefix for every route
    TURNSTILE_SERVER_REQUEST_TIMEOUT_SECS   Request deadline, or `none` (default: 30)
    TURNSTILE_SERVER_SHUTDOWN_TIMEOUT_SECS  Drain timeout (default: 30)
    TURNSTILE_SERVER_MAX_BODY_BYTES         Body size limit, or `none`
    TURNSTILE_LOGGING_LEVEL                 Log filter (default: info)
    TURNSTILE_LOGGING_FORMAT                `json` or `pretty`
    TURNSTILE_CONTRACT_PATH                 Contract file replacing the built-in one
"
    );
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new().with_dotenv();
    if let Some(path) = &args.config {
        loader = loader
            .with_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    let config = loader.load().context("invalid configuration")?;

    init_logging(&config.logging.to_log_config()).context("failed to initialize logging")?;
    describe_metrics();

    info!(
        service = SERVICE_NAME,
        version = env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let dispatcher = build_dispatcher(&config)?;
    for route in dispatcher.routes() {
        info!(
            operation_id = route.operation_id(),
            http.method = %route.method(),
            http.path = %route.template(),
            "route registered"
        );
    }

    Server::new(server_config(&config.server), Arc::new(dispatcher))
        .run()
        .await
        .context("server failed")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("{SERVICE_NAME} {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Use --help for usage information");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging may not be initialized yet.
            error!(error = ?e, "fatal");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

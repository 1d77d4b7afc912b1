use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flexi_logger::Logger;
use log::error;

use ircd::config::{Config, ServerOptions};
use ircd::listener;

/// RFC 1459 style IRC server.
#[derive(Parser, Debug)]
#[command(name = "ircd")]
struct Cli {
    /// TCP port to listen on (1..65535)
    port: u16,
    /// Connection password shared by all clients
    password: String,
    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.log_to_stderr().start())
        .ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };
    if cli.port == 0 {
        error!("Error: Invalid port number");
        return ExitCode::from(1);
    }
    if cli.password.is_empty() {
        error!("Error: Password cannot be empty");
        return ExitCode::from(1);
    }
    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Error: cannot load {}: {e}", path.display());
                return ExitCode::from(1);
            }
        },
        None => Config::default(),
    };

    let options = ServerOptions {
        port: cli.port,
        password: cli.password,
        config,
    };
    match listener::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

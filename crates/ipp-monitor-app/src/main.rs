// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ipp-monitor: IPP printer status service with a PDF print endpoint.
//
// Entry point. Initialises logging, parses the command line, and either runs
// the service or performs a one-off queue discovery / printer setup.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use ipp_monitor_app::AppServices;
use ipp_monitor_app::http;
use ipp_monitor_app::services::data_dir;
use ipp_monitor_core::AppConfig;
use ipp_monitor_core::error::Result;
use ipp_monitor_core::human_errors::humanize_error;
use ipp_monitor_core::types::{ConnectionConfig, DEFAULT_IPP_PORT};
use ipp_monitor_print::discovery;
use ipp_monitor_print::ipp_client::IppClient;

/// IPP printer status service
#[derive(Parser, Debug)]
#[command(name = "ipp-monitor", version, about = "Polls IPP printers and prints uploaded PDFs.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the poller and HTTP API
    Serve {
        /// Config file (default: <data dir>/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured listen address
        #[arg(long)]
        listen: Option<String>,
    },
    /// List the print queues on a CUPS server
    Discover {
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Add a CUPS queue to the config
    AddPrinter {
        #[command(flatten)]
        server: ServerArgs,
        /// Queue to add (default: the first one the server lists)
        #[arg(long)]
        name: Option<String>,
        /// Record jobs without sending them to the printer
        #[arg(long)]
        simulation_mode: bool,
        /// Config file (default: <data dir>/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// Print server host name or address
    #[arg(long)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_IPP_PORT)]
    port: u16,
    /// Use ipps://
    #[arg(long)]
    tls: bool,
    /// Accept invalid TLS certificates
    #[arg(long)]
    no_verify_tls: bool,
    #[arg(long)]
    username: Option<String>,
    #[arg(long, requires = "username")]
    password: Option<String>,
}

impl ServerArgs {
    fn connection(&self) -> ConnectionConfig {
        let mut conn = ConnectionConfig::new(self.host.clone());
        conn.port = self.port;
        conn.tls = self.tls;
        conn.verify_tls = !self.no_verify_tls;
        conn.username = self.username.clone();
        conn.password = self.password.clone();
        conn
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let human = humanize_error(&e);
            error!(error = %e, "ipp-monitor failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Serve { config, listen } => serve(config, listen).await,
        Command::Discover { server } => {
            let queues = discovery::discover_queues(&IppClient::new(), &server.connection()).await?;
            for queue in queues {
                println!("{}\t{}", queue.name, queue.uri.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
        Command::AddPrinter {
            server,
            name,
            simulation_mode,
            config,
        } => add_printer(server, name, simulation_mode, config).await,
    }
}

async fn serve(config_path: Option<PathBuf>, listen: Option<String>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(data_dir::default_config_path);
    let config = AppConfig::load(&config_path)?;
    info!(
        path = %config_path.display(),
        printers = config.printers.len(),
        "ipp-monitor starting"
    );
    if config.printers.is_empty() {
        warn!("no printers configured; add one with `ipp-monitor add-printer`");
    }

    let addr = listen.unwrap_or_else(|| config.listen_addr.clone());
    let services = AppServices::start(config, Some(config_path), Arc::new(IppClient::new())).await?;

    let result = http::serve(services.clone(), &addr, shutdown_signal()).await;
    services.shutdown().await;
    result
}

async fn add_printer(
    server: ServerArgs,
    name: Option<String>,
    simulation_mode: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config_path = config_path.unwrap_or_else(data_dir::default_config_path);
    let mut config = AppConfig::load(&config_path)?;

    let connection = server.connection();
    let queues = discovery::discover_queues(&IppClient::new(), &connection).await?;
    let queue = discovery::select_queue(&queues, name.as_deref())?;

    let mut entry = discovery::entry_for_queue(&connection, &queue.name);
    entry.simulation_mode = simulation_mode;
    info!(queue = %entry.name, uri = %entry.connection.printer_uri(), "adding printer");
    let added = format!("added {} ({})", entry.name, entry.id);

    config.printers.push(entry);
    config.validate()?;
    config.persist(&config_path)?;
    println!("{added}");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

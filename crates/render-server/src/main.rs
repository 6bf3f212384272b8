//! Render server daemon
//!
//! Either listens for render streams (local socket or TCP) or dials out to a
//! remote peer and opens streams on its command. Each stream is handed to
//! the echo worker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use render_core::config::{self, ServerConfig, ServerMode};
use render_server::client::{self, Endpoint};
use render_server::{EchoWorker, MainExit, RenderServer};

#[derive(Parser)]
#[command(name = "render-server")]
#[command(about = "Render server - accepts render streams or dials out for them")]
#[command(version)]
struct Cli {
    /// Run in foreground with verbose output
    #[arg(short, long, global = true)]
    foreground: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Serve(ServeArgs),

    /// Ask a listening server to drain its sessions and exit
    Shutdown(ShutdownArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mode (listen, tcp-listen, tcp-reverse-client)
    #[arg(short, long)]
    mode: Option<ServerMode>,

    /// TCP bind address (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Local socket name (overrides config)
    #[arg(long)]
    name: Option<String>,

    /// Peer host to dial in reverse mode
    #[arg(short, long)]
    remote: Option<String>,

    /// Control port on the peer
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum number of concurrently running sessions
    #[arg(long)]
    max_sessions: Option<u32>,
}

#[derive(Args)]
struct ShutdownArgs {
    /// TCP address of the server
    #[arg(long, conflicts_with = "name")]
    tcp: Option<String>,

    /// Local socket name of the server
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the file (defaults to the standard config path)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.foreground { "debug" } else { &cli.log_level };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Shutdown(args) => shutdown(args).await,
        Commands::Init(args) => init(args),
    }
}

fn load_server_config(path: Option<&PathBuf>) -> Result<ServerConfig> {
    if let Some(config_path) = path {
        return config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(config::load_config(&default_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
            ServerConfig::default()
        }))
    } else {
        tracing::info!("Using default configuration");
        Ok(ServerConfig::default())
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    tracing::info!("Render server starting...");

    let mut config = load_server_config(args.config.as_ref())?;

    // Apply command-line overrides
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(name) = args.name {
        config.local_name = name;
    }
    if let Some(remote) = args.remote {
        config.remote_host = Some(remote);
    }
    if let Some(port) = args.port {
        config.remote_port = port;
    }
    if args.max_sessions.is_some() {
        config.max_sessions = args.max_sessions;
    }

    config.validate().context("Invalid configuration")?;

    let worker = Arc::new(EchoWorker::new());
    let server = if config.mode.is_listening() {
        let mode = config.mode;
        let (server, address) = RenderServer::listen(config, worker)
            .await
            .context("Failed to start listening")?;
        let endpoint = Endpoint::for_mode(mode, address)?;
        tracing::info!("Accepting render streams on {}", endpoint);
        println!("{}", endpoint);
        server
    } else {
        tracing::info!("Dialing out to {}", config.control_target());
        RenderServer::reverse(config, worker).context("Failed to create reverse client")?
    };

    match server.run().await? {
        MainExit::Drained { joined } => {
            tracing::info!("Render server exited after draining {} session(s)", joined);
        }
        MainExit::Stopped => {
            tracing::info!("Render server stopped by peer");
        }
    }

    Ok(())
}

async fn shutdown(args: ShutdownArgs) -> Result<()> {
    let endpoint = match (args.tcp, args.name) {
        (Some(addr), _) => Endpoint::Tcp(addr),
        (None, Some(name)) => Endpoint::Local(name),
        (None, None) => {
            let config = ServerConfig::default();
            Endpoint::Tcp(config.bind_address)
        }
    };

    client::request_shutdown(&endpoint)
        .await
        .with_context(|| format!("Failed to reach server at {}", endpoint))?;
    println!("Shutdown requested at {}", endpoint);
    Ok(())
}

fn init(args: InitArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(config::default_config_path);

    if path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {:?} (use --force to overwrite)",
            path
        );
    }

    config::save_config(&path, &ServerConfig::default())
        .with_context(|| format!("Failed to write config to {:?}", path))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

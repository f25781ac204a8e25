use callgate_core::CallgateConfig;
use callgate_server::{create_router, AppState};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "callgate", version, about = "Geolocation-based call gating for Webex Calling")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web service.
    Serve {
        /// Path to the configuration file.
        #[arg(long, default_value = "callgate.yaml")]
        config: PathBuf,
    },

    /// Write a starter configuration file.
    Init {
        /// Where to write the configuration.
        #[arg(long, default_value = "callgate.yaml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve { config } => run_serve(&config).await,
        Command::Init { path, force } => run_init(&path, force),
    }
}

async fn run_serve(config_path: &PathBuf) -> anyhow::Result<()> {
    let config = CallgateConfig::from_file(config_path)?;
    let addr = format!("0.0.0.0:{}", config.server.listen_port);

    let state = AppState::init(config).await?;
    let app = create_router(state.clone());

    tracing::info!("callgate listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // End the ingestion loop at its next wait point before exiting.
    state.stop_monitor().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

fn run_init(path: &PathBuf, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
    }

    let template = r#"# Callgate configuration
#
# Create a Webex integration (https://developer.webex.com/my-apps/new) with
# redirect URIs '<public_url>/admin/callback' and '<public_url>/user/callback'
# and fill in the client credentials below. Do not commit this file once
# populated.

server:
  listen_port: 8000
  public_url: http://127.0.0.1:8000

webex:
  client_id: ""
  client_secret: ""
  # Person id of the one account allowed to act as admin.
  admin_user_id: ""
  # Per-organization XSI endpoints.
  xsi_actions_url: ""
  xsi_events_url: ""

# Permitted region (inclusive bounds).
geofence:
  lat_min: 10.0
  lat_max: 20.0
  lon_min: 30.0
  lon_max: 100.0

monitor:
  # A location sample older than this no longer grants permission.
  staleness_timeout_secs: 30

storage:
  sqlite_path: callgate.db
"#;
    fs::write(path, template)?;
    println!("Wrote config: {}", path.display());
    println!("Fill in the webex section, then run: callgate serve --config {}", path.display());
    Ok(())
}

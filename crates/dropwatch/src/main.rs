//! dropwatch daemon binary.
//!
//! Reads `dropwatch.toml` (or the path given with `--config`), builds the
//! Steam, market, and push clients, and polls every tracked account on a
//! fixed interval until interrupted.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `control.password_hash`:
//!
//! ```text
//! dropwatch --hash-password
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use dropwatch::{
  Engine, Scheduler,
  backend::{DirectoryBackend, StoreBackend},
  config::{DaemonConfig, DirectorySource},
};
use dropwatch_api::{AuthConfig, ControlState, control_router};
use dropwatch_http::{
  ExpoPushClient, HttpConfig, SteamInventoryClient, SteamMarketClient,
  build_client,
};
use rand_core::OsRng;
use tokio::{net::TcpListener, signal, sync::watch, time::timeout};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Souvenir package drop watcher")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dropwatch.toml", env = "DROPWATCH_CONFIG")]
  config: PathBuf,

  /// Minutes between polls; overrides `interval_minutes`.
  #[arg(short, long)]
  interval: Option<u64>,

  /// Log at debug level.
  #[arg(short, long)]
  verbose: bool,

  /// Start paused and wait for a remote start.
  #[arg(long)]
  idle: bool,

  /// Run a single cycle and exit.
  #[arg(long)]
  once: bool,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let default_level =
    if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration; CLI flags win.
  let mut cfg = DaemonConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;
  if let Some(minutes) = cli.interval {
    cfg.interval_minutes = minutes;
  }
  if cli.idle {
    cfg.start_idle = true;
  }
  cfg.validate().context("invalid configuration")?;

  if cfg.directory.source == DirectorySource::Static
    && cfg.directory.accounts.is_empty()
  {
    tracing::warn!("static directory has no accounts; cycles will be empty");
  }

  // Collaborators.
  let client = build_client(&HttpConfig {
    timeout: cfg.request_timeout(),
    ..Default::default()
  })
  .context("failed to build HTTP client")?;

  let inventory =
    SteamInventoryClient::new(client.clone(), cfg.steam.community_url.clone());
  let prices = SteamMarketClient::new(
    client.clone(),
    cfg.steam.community_url.clone(),
    cfg.steam.currency,
  );
  let notifier = ExpoPushClient::new(
    client.clone(),
    cfg.push.url.clone(),
    cfg.push.access_token.clone(),
  );
  let store = StoreBackend::open(&cfg.state)
    .await
    .with_context(|| format!("failed to open state store at {:?}", cfg.state.path))?;
  let directory = DirectoryBackend::from_config(&cfg.directory, client)
    .context("failed to build account directory")?;

  let engine = Engine::new(inventory, prices, notifier, store, cfg.engine());
  let scheduler = Scheduler::new(directory, engine, cfg.scheduler());

  if cli.once {
    let report = scheduler
      .run_once()
      .await
      .context("cycle did not complete")?;
    tracing::info!(
      polled = report.accounts_polled,
      new_items = report.new_items,
      "single cycle complete"
    );
    return Ok(());
  }

  let (shutdown_tx, shutdown_rx) = watch::channel(false);

  // Optional remote-control surface.
  let server = if cfg.control.enabled {
    let state = ControlState {
      control: Arc::new(scheduler.handle()),
      auth:    Arc::new(AuthConfig {
        username:      cfg.control.username.clone().unwrap_or_default(),
        password_hash: cfg.control.password_hash.clone().unwrap_or_default(),
      }),
    };
    let address = format!("{}:{}", cfg.control.host, cfg.control.port);
    let listener = TcpListener::bind(&address)
      .await
      .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("control API listening on http://{address}");

    let mut stop = shutdown_rx.clone();
    Some(tokio::spawn(async move {
      let result = axum::serve(listener, control_router(state))
        .with_graceful_shutdown(async move {
          let _ = stop.wait_for(|stopping| *stopping).await;
        })
        .await;
      if let Err(e) = result {
        tracing::error!(error = %e, "control API failed");
      }
    }))
  } else {
    None
  };

  let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

  shutdown_signal().await;
  tracing::info!("shutdown requested; finishing the in-flight cycle");
  let _ = shutdown_tx.send(true);

  match timeout(cfg.shutdown_grace(), scheduler_task).await {
    Ok(Ok(())) => tracing::info!("shutdown complete"),
    Ok(Err(e)) => tracing::error!(error = %e, "scheduler task failed"),
    Err(_) => tracing::warn!(
      grace_secs = cfg.shutdown_grace_secs,
      "grace period elapsed; exiting with a cycle still in flight"
    ),
  }
  if let Some(server) = server {
    server.abort();
  }

  Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to install Ctrl+C handler");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut stream) => {
        stream.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

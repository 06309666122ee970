//! ISP platform trust gateway.
//!
//! Usage:
//!   ispgate --jwt-secret "$SECRET" --database /var/lib/ispgate/ispgate.db
//!   ispgate --dev-mode
//!   ispgate hash-password 'S3cure!pass'

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ispgate_crypto::{PasswordHasher, PasswordPolicy};
use ispgate_ratelimit::{MemoryCounterStore, RateLimiter, RedisCounterStore};
use ispgate_server::{build_router, AppState, GatewayConfig};
use ispgate_store::SqliteStore;
use ispgate_types::SystemClock;
use std::io::BufRead;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "ispgate")]
#[command(about = "Authentication, licensing and rate limiting gateway for the ISP platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    config: GatewayConfig,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway (default)
    Serve,
    /// Print an Argon2id digest for seeding an account; reads stdin if no
    /// password is given
    HashPassword { password: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Some(Command::HashPassword { password }) => hash_password(password),
        Some(Command::Serve) | None => serve(cli.config).await,
    }
}

fn hash_password(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if let Err(violation) = PasswordPolicy::default().validate(&password) {
        bail!("Password rejected: {}", violation);
    }
    let digest = PasswordHasher::default()
        .hash(&password)
        .context("Failed to hash password")?;
    println!("{}", digest);
    Ok(())
}

async fn serve(config: GatewayConfig) -> Result<()> {
    info!("ISP gateway starting...");

    let secret = config
        .signing_secret()
        .context("No signing secret: set JWT_SECRET, or pass --dev-mode for local use")?;
    if secret.is_development() {
        warn!("Using the built-in development signing secret; tokens are forgeable");
    }
    let settings = config.settings().context("Invalid configuration")?;

    let store = SqliteStore::open(&config.database, config.store_timeout())
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    info!("Credential store: {}", config.database.display());

    let mode = config.rate_limit_failure_mode;
    let limiter = match &config.redis_url {
        Some(url) => match RedisCounterStore::connect(url, config.cache_timeout()).await {
            Ok(counters) => RateLimiter::new(Arc::new(counters), mode),
            Err(e) if config.require_cache => {
                return Err(e).context("Failed to connect to rate-limit cache");
            }
            Err(e) => {
                warn!("Rate-limit cache unreachable, failing {}: {}", mode, e);
                RateLimiter::without_store(mode)
            }
        },
        None if config.require_cache => bail!("--require-cache set but no --redis-url given"),
        None => {
            info!("No shared cache configured, counting requests in process");
            let counters = MemoryCounterStore::new(Arc::new(SystemClock));
            RateLimiter::new(Arc::new(counters), mode)
        }
    };
    info!(
        "Rate limit: {} requests per {}s, failure mode {}",
        settings.rate_limit,
        settings.rate_window.as_secs(),
        mode
    );
    if settings.trusted_proxies.trusts_everyone() {
        warn!("No --trusted-proxy configured; X-Forwarded-For is trusted from any peer");
    }

    let state = AppState::new(
        Arc::new(store),
        limiter,
        &secret,
        Arc::new(SystemClock),
        settings,
    )
    .context("Failed to initialise password hasher")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("Listening on {}", config.listen);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    info!("ISP gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

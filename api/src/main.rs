use anyhow::Context;
use api::build_app;
use clap::Parser;
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use services::session_service::SessionService;
use std::{net::SocketAddr, sync::Arc};
use tracing_appender::rolling;
use util::{
    config,
    email::{Mailer, UnconfiguredMailer, smtp_mailer_from_config},
    state::AppState,
};

/// RFID classroom attendance server.
#[derive(Parser, Debug)]
#[command(name = "api", version, about)]
struct Cli {
    /// `host:port` or just `port`. Defaults to HOST and PORT.
    addrport: Option<String>,

    /// Keep existing sessions alive across this restart.
    #[arg(long)]
    no_session_sweep: bool,
}

/// Splits the optional `ADDRPORT` argument, falling back to configuration.
fn resolve_addr(addrport: Option<&str>) -> anyhow::Result<SocketAddr> {
    let (host, port) = match addrport {
        None => (config::host(), config::port()),
        Some(raw) => match raw.rsplit_once(':') {
            Some((host, port)) => (
                host.trim_matches(|c| c == '[' || c == ']').to_string(),
                port.parse().with_context(|| format!("invalid port in '{raw}'"))?,
            ),
            None => (
                config::host(),
                raw.parse().with_context(|| format!("invalid port '{raw}'"))?,
            ),
        },
    };

    let ip: std::net::IpAddr = if host == "localhost" {
        std::net::Ipv4Addr::LOCALHOST.into()
    } else {
        host.parse().with_context(|| format!("invalid host '{host}'"))?
    };
    Ok(SocketAddr::new(ip, port))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _log_guard = init_logging(&config::log_file(), &config::log_level());

    let addr = resolve_addr(cli.addrport.as_deref())?;

    let db = db::connect().await.context("failed to open database")?;
    Migrator::up(&db, None).await.context("failed to run migrations")?;

    let mailer: Arc<dyn Mailer> = match smtp_mailer_from_config() {
        Ok(m) => Arc::new(m),
        Err(e) => {
            tracing::warn!(error = %e, "SMTP is not configured; emails will be logged as FAILED");
            Arc::new(UnconfiguredMailer)
        }
    };

    // Must finish before the listener accepts requests.
    SessionService::run_startup_sweep_once(&db, !cli.no_session_sweep).await;

    let app = build_app(AppState::new(db, mailer));

    println!("Starting {} on http://{}", config::project_name(), addr);
    tracing::info!(%addr, env = %config::env(), "Server starting");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use windexs_server::server::config::ServerConfig;
use windexs_server::server::telegram_poller;
use windexs_server::version::VERSION;
use windexs_server::web::{AppState, create_axum_router};

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Point the Telegram bot webhook at a URL and print the webhook status
    SetupWebhook {
        /// Public URL of `/api/telegram/webhook`
        #[arg(long, env = "WEBHOOK_URL")]
        url: String,
    },
}

fn init_logging(log_dir: &str) -> WorkerGuard {
    // Log to a file: JSON format, daily rotation
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, "server.log"));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false) // No ANSI colors in file
        .json(); // Log as JSON

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,tower_http=info` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // The config decides where logs go, so it is loaded before logging starts.
    let server_config = Arc::new(ServerConfig::load(args.config.as_deref())?);
    let _log_guard = init_logging(&server_config.log_dir);
    rust_i18n::set_locale(&server_config.locale);
    info!("Starting server, version: {}", VERSION);

    for name in server_config.placeholder_secrets() {
        warn!(setting = name, "Using an insecure placeholder value. Set it in the environment.");
    }

    let app_state = Arc::new(AppState::from_config(server_config.clone())?);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(app_state).await,
        Command::SetupWebhook { url } => setup_webhook(app_state, &url).await,
    }
}

async fn serve(app_state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = app_state.config.clone();

    let poller_handle = config.telegram_polling.then(|| {
        telegram_poller::spawn(
            app_state.notification_service.clone(),
            Duration::from_secs(config.telegram_poll_interval_secs.max(1)),
        )
    });

    let http_router = create_axum_router(app_state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let socket = tokio::net::TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;

    info!(address = %addr, "HTTP server listening with TCP Keepalive");
    info!(bot_token = %format!("{}...", config.bot_token_prefix()), "Telegram bot configured.");
    info!(
        registered_chats = app_state.notification_service.registry().len(),
        "Telegram notifications ready."
    );

    axum::serve(listener, http_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = poller_handle {
        handle.abort();
    }
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
}

async fn setup_webhook(
    app_state: Arc<AppState>,
    url: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let api = app_state.notification_service.api();
    info!(
        bot_token = %format!("{}...", app_state.config.bot_token_prefix()),
        webhook_url = url,
        "Setting up Telegram webhook."
    );

    let reply = api.set_webhook(url).await?;
    if reply["ok"].as_bool() != Some(true) {
        let description = reply["description"].as_str().unwrap_or("unknown error");
        error!(description, "Telegram rejected the webhook.");
        return Err(format!("Telegram rejected the webhook: {description}").into());
    }
    info!(
        description = reply["description"].as_str().unwrap_or("N/A"),
        "Webhook configured."
    );

    let webhook_info = api.get_webhook_info().await?;
    info!(
        url = %webhook_info.url,
        pending_update_count = webhook_info.pending_update_count,
        last_error = webhook_info.last_error_message.as_deref().unwrap_or("none"),
        "Webhook info."
    );
    Ok(())
}

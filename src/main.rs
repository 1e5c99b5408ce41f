use clap::Parser; // for cli
use faq_relay::{
    build_router,
    config::Args,
    email::Mailer,
    rate_limit::{RateLimiter, sweeper},
    relay::CompletionClient,
    state::AppState,
    store::RestStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();

    if args.completion_api_key.is_none() {
        warn!("COMPLETION_API_KEY not set, /faq-chat will answer 500");
    }

    let client = reqwest::Client::new();

    let rate_limiter = Arc::new(RateLimiter::new(
        args.rate_limit,
        Duration::from_secs(args.rate_window),
    ));

    // creating shared state
    let state = Arc::new(AppState {
        rate_limiter: Arc::clone(&rate_limiter),
        store: Arc::new(RestStore::new(
            client.clone(),
            &args.store_url,
            args.store_service_key.clone(),
        )),
        completion: CompletionClient::new(
            client.clone(),
            args.completion_url.clone(),
            args.completion_model.clone(),
            args.completion_api_key.clone(),
        ),
        mailer: Mailer::new(
            client,
            args.email_url.clone(),
            args.email_api_key.clone(),
            args.email_from.clone(),
            args.email_to.clone(),
        ),
    });

    // spawn the background sweeper
    let sweep_every = Duration::from_secs(args.sweep_interval);
    tokio::spawn(async move {
        sweeper(rate_limiter, sweep_every).await;
    });

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!("Relay running on http://localhost:{}", args.port);
    info!("Forwarding chat to {} ({})", args.completion_url, args.completion_model);
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Err(e) = served {
        error!(error = %e, "server error");
    }

    info!("Relay shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

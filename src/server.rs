//! Process entry shared by both binaries
//!
//! Loads configuration, wires the upstream clients into the application state
//! and runs the selected transport until it ends or a shutdown signal arrives.

use std::{
    error::Error,
    io,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{Config, Transport};
use crate::upstream::{maps::HttpMapsClient, rag::HttpRagClient};
use crate::{build_app, stdio, AppState, ServerKind};

pub async fn run(kind: ServerKind) -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let state = build_state(kind, &config)?;

    info!(
        server = kind.app_name(),
        version = env!("CARGO_PKG_VERSION"),
        transport = ?config.transport,
        "server starting"
    );

    match config.transport {
        Transport::Stdio => stdio::serve_stdio(&state).await?,
        Transport::Http => serve_http(state, &config).await?,
    }

    Ok(())
}

pub fn build_state(kind: ServerKind, config: &Config) -> Result<AppState, Box<dyn Error>> {
    let state = match kind {
        ServerKind::CodeAssist => AppState::code_assist(Arc::new(HttpRagClient::new(
            &config.rag_endpoint,
            &config.source,
        )))?,
        ServerKind::MapsTools => {
            let api_key = config.require_api_key()?;
            AppState::maps_tools(Arc::new(HttpMapsClient::new(
                &config.maps_base_url,
                Some(api_key.to_string()),
            )))?
        }
    };
    Ok(state)
}

async fn serve_http(state: AppState, config: &Config) -> io::Result<()> {
    let listener = bind_with_fallback(config.bind_addr, config.bind_port).await?;
    let local_addr = listener.local_addr()?;
    info!(
        bind_addr = %local_addr.ip(),
        bind_port = local_addr.port(),
        "server listening"
    );

    let sessions = Arc::clone(&state.sessions);
    axum::serve(listener, build_app(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let closed = sessions.close_all().await;
    info!(closed, "sessions closed on shutdown");
    Ok(())
}

/// Binds the preferred port, falling back to an OS-chosen one when it is taken.
pub async fn bind_with_fallback(addr: IpAddr, port: u16) -> io::Result<TcpListener> {
    match TcpListener::bind(SocketAddr::new(addr, port)).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            warn!(port, "port already in use, binding an ephemeral port");
            TcpListener::bind(SocketAddr::new(addr, 0)).await
        }
        Err(err) => Err(err),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
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

    info!("shutdown signal received");
}

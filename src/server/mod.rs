//! Web Interface
//!
//! Upload form, conversion trigger and download endpoint, served with `hyper`
//! on a single-threaded `tokio` runtime. The converter runs synchronously
//! inside each request.

pub mod cleanup;
pub mod page;
pub mod routes;
pub mod upload;

use std::convert::Infallible;
use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use log::{info, warn};
use crate::config::Config;
use crate::error::{WavConvError, Result};

pub use upload::sanitize_filename;

#[derive(Debug, Clone)]
pub struct ServerState {
    pub config: Config,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Drop request output directories older than `output.retention_secs`.
    pub async fn sweep_outputs(&self) {
        let retention = self.config.output.retention_secs;
        if retention == 0 {
            return;
        }
        let max_age = Duration::from_secs(retention);
        if let Err(e) = cleanup::sweep_expired(&self.config.output.dir, max_age, SystemTime::now()).await {
            warn!("Cannot sweep expired outputs: {}", e);
        }
    }
}

/// Bind to the configured address and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .map_err(|e| WavConvError::server(format!("Cannot bind {}: {}", address, e)))?;
    run(listener, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` completes.
pub async fn run<F>(listener: TcpListener, config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;
    std::fs::create_dir_all(&config.output.dir)
        .map_err(|e| WavConvError::io(format!("Cannot create output directory: {}", e)))?;

    info!("Converted files go to {}", config.output.dir.display());
    let state = Arc::new(ServerState::new(config));
    state.sweep_outputs().await;

    let make_svc = make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(routes::handle(req, &state).await) }
            }))
        }
    });

    info!("WAV File Converter listening on http://{}", local_addr);
    Server::from_tcp(listener)?
        .serve(make_svc)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

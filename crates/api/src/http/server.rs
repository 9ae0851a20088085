//! Listener lifecycle for the HTTP surface

use std::net::SocketAddr;

use axum::Router;
use busysync_domain::{BusySyncError, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Serves a router on a background task until shut down.
pub struct HttpServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Bind and start serving. Port 0 picks an ephemeral port.
    pub async fn start(bind_addr: SocketAddr, app: Router) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|err| {
            BusySyncError::Config(format!("failed to bind HTTP server to {bind_addr}: {err}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| BusySyncError::Internal(format!("failed to determine address: {err}")))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "HTTP server error");
            }
        });

        info!(%local_addr, "HTTP server listening");
        Ok(Self { local_addr, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(BusySyncError::Internal(format!("HTTP server panicked: {err}")));
                }
            }
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

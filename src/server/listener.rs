//! HTTP server listener
//!
//! Binds the configured address and serves the router until shut down.
//! Every session is stopped, and its poller joined, before `run_until`
//! returns.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::Result;
use crate::feed::FeedSource;
use crate::registry::SessionRegistry;
use crate::server::config::ServerConfig;
use crate::server::routes;

/// HTTP front end over a session registry
pub struct HttpServer<F: FeedSource> {
    config: ServerConfig,
    registry: Arc<SessionRegistry<F>>,
}

impl<F: FeedSource> HttpServer<F> {
    /// Create a new server reading from `feed`
    pub fn new(config: ServerConfig, feed: F) -> Self {
        let registry = SessionRegistry::with_config(Arc::new(feed), config.registry.clone());
        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry<F>> {
        &self.registry
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<S>(&self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<S>(&self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "HTTP server listening");

        let app = routes::router(Arc::clone(&self.registry));
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        // Stop pollers whether or not serving ended cleanly
        self.registry.shutdown().await;

        result?;
        Ok(())
    }
}

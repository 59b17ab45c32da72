//! LocalRelay server
//!
//! Resolves configuration, starts every routed backend (loading models where
//! a model manager is involved) and serves relay requests until Ctrl-C.

mod listener;

use std::future::Future;
use std::io;
use std::sync::Arc;

use localrelay_core::logging::Logger;
use localrelay_core::{log_error, log_info};
use localrelay_core::{
    ActiveModelState, BackendRouter, ConfigResolver, ConsoleLogger, RelayRequestDispatcher,
};

use listener::RelayListener;

/// Resolves once the signal fires; never resolves if the signal cannot be
/// listened for
async fn shutdown_on<F>(signal: F, logger: Arc<dyn Logger>)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => log_info!(logger, "Shutting down"),
        Err(e) => {
            log_error!(logger, "Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new());

    let config = ConfigResolver::new()
        .with_workspace(std::env::current_dir()?)
        .resolve()?;
    log_info!(logger, "Connecting to {}", config.relay.display_name());

    let router = BackendRouter::builder(&config, ActiveModelState::new(), Arc::clone(&logger))
        .build()
        .await?;
    log_info!(logger, "Routing request types: {}", router.tags().join(", "));

    let dispatcher = Arc::new(RelayRequestDispatcher::new(
        Arc::new(router),
        Arc::clone(&logger),
    ));
    let listener =
        RelayListener::bind(&config.relay.bind_address, dispatcher, Arc::clone(&logger)).await?;

    listener
        .serve(shutdown_on(tokio::signal::ctrl_c(), Arc::clone(&logger)))
        .await?;
    Ok(())
}

//! Long-running background services sharing one shutdown signal.
//!
//! ```ignore
//! ServiceHost::new()
//!     .with_service(sweep)
//!     .with_service(consumer)
//!     .run_until_shutdown()
//!     .await;
//! ```

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A service owns its loop and returns once `shutdown` is cancelled.
#[async_trait]
pub trait Service: Send + 'static {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()>;
}

#[derive(Default)]
pub struct ServiceHost {
    services: Vec<Box<dyn Service>>,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: impl Service) -> Self {
        self.services.push(Box::new(service));
        self
    }

    /// Spawn every service on the current runtime.
    pub fn start(self, shutdown: CancellationToken) -> RunningServices {
        let handles = self
            .services
            .into_iter()
            .map(|service| {
                let name = service.name();
                let token = shutdown.clone();
                info!(service = name, "starting service");
                (name, tokio::spawn(service.run(token)))
            })
            .collect();

        RunningServices { shutdown, handles }
    }

    /// Run until Ctrl-C, then stop all services and wait for them.
    pub async fn run_until_shutdown(self) {
        let running = self.start(CancellationToken::new());
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
        }
        running.stop().await;
    }
}

/// Handles of started services
pub struct RunningServices {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<Result<()>>)>,
}

impl RunningServices {
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every service to return, logging failures.
    pub async fn join(self) {
        let (names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(Ok(())) => info!(service = name, "service stopped"),
                Ok(Err(e)) => error!(service = name, error = %e, "service failed"),
                Err(e) => error!(service = name, error = %e, "service panicked"),
            }
        }
    }

    /// Signal shutdown and wait.
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.join().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct WaitForShutdown {
        stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Service for WaitForShutdown {
        fn name(&self) -> &'static str {
            "wait-for-shutdown"
        }

        async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
            shutdown.cancelled().await;
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_cancels_and_joins() {
        let stopped = Arc::new(AtomicBool::new(false));
        let running = ServiceHost::new()
            .with_service(WaitForShutdown {
                stopped: stopped.clone(),
            })
            .start(CancellationToken::new());

        assert_eq!(running.len(), 1);
        running.stop().await;

        assert!(stopped.load(Ordering::SeqCst));
    }
}

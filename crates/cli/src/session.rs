use crate::app::App as CLI;
use async_trait::async_trait;
use cask_core::{CancelToken, CaskEnvironment, CaskManageError, LockMode};
use starbase::{AppResult, AppSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct CaskSession {
    pub cancel: CancelToken,
    pub cli: CLI,
    pub env: Arc<CaskEnvironment>,
}

impl CaskSession {
    pub fn new(cli: CLI, env: CaskEnvironment) -> Self {
        Self {
            cancel: CancelToken::new(),
            cli,
            env: Arc::new(env),
        }
    }

    pub fn lock_mode(&self, no_wait: bool) -> LockMode {
        if no_wait {
            LockMode::NoWait
        } else {
            LockMode::Wait(Duration::from_secs(self.env.config.lock.wait))
        }
    }

    /// Render a failed operation and convert it into the process exit code.
    pub fn report_failure(&self, error: CaskManageError) -> AppResult {
        let code = error.class().exit_code();

        debug!(code, class = ?error.class(), "Operation failed");

        eprintln!("{:?}", miette::Report::new(error));

        Ok(Some(code))
    }
}

#[async_trait]
impl AppSession for CaskSession {
    async fn startup(&mut self) -> AppResult {
        debug!(
            store = ?self.env.store.dir,
            app_dir = ?self.env.app_dir,
            host = %self.env.host_os,
            "Using cask environment",
        );

        Ok(None)
    }

    async fn analyze(&mut self) -> AppResult {
        let token = self.cancel.clone();

        // Stop downloads and swaps cleanly on ctrl+c
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received interrupt, cancelling");

                token.cancel();
            }
        });

        Ok(None)
    }
}

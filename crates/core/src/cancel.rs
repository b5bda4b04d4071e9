use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable signal used to abort an in-flight download or install.
/// All clones observe the same cancellation.
#[derive(Clone, Debug)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);

        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the token has been cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();

        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // Every clone holds the sender, so the channel stays open
            std::future::pending::<()>().await;
        }
    }
}

//! Bounded polling for conditions that live outside of the game.

use anyhow::Result;
use std::{future::Future, time::Duration};
use thiserror::Error;
use tokio::sync::watch;

/// Errors returned by [wait_for].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("wait cancelled")]
    Cancelled,
}

impl WaitError {
    /// Timeouts can be retried by the caller. Cancellation is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WaitError::Timeout(_))
    }
}

/// The sending half of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels every [CancelToken] created from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// The receiving half of a cancellation signal. A token whose handle was dropped never fires.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Creates a new cancellation pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Polls `poll` every `interval` until it returns `true`. Fails with [WaitError::Timeout] once
/// `timeout` has elapsed and with [WaitError::Cancelled] as soon as `cancel` fires. Poll errors are
/// logged and retried.
pub async fn wait_for<F, Fut>(
    timeout: Duration,
    interval: Duration,
    cancel: &CancelToken,
    mut poll: F,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut cancel = cancel.clone();
    let poll_loop = async {
        loop {
            match poll().await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(target: "wait", "Condition poll failed, retrying: {}", e);
                }
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WaitError::Cancelled),
        res = tokio::time::timeout(timeout, poll_loop) => res.map_err(|_| WaitError::Timeout(timeout)),
    }
}

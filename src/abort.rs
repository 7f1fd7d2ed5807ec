use crate::errors::{DashboardError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Owner side of a cancellation pair. Cloning shares the same signal.
#[derive(Clone)]
pub struct AbortController {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal nobody can fire.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires. Pends forever if the controller is
    /// dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// 在中止信号触发时放弃请求
///
/// Returns `DashboardError::Aborted` if the signal has fired before the call or
/// fires while `fut` is pending.
pub async fn with_abort<T, F>(signal: &AbortSignal, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if signal.is_aborted() {
        return Err(DashboardError::Aborted);
    }
    tokio::select! {
        biased;
        _ = signal.aborted() => Err(DashboardError::Aborted),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completes_without_abort() {
        let controller = AbortController::new();
        let result = with_abort(&controller.signal(), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_aborted_before_start() {
        let controller = AbortController::new();
        let signal = controller.signal();
        controller.abort();
        let ran = std::sync::atomic::AtomicBool::new(false);
        let result = with_abort(&signal, async {
            ran.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert!(result.unwrap_err().is_aborted());
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_aborted_while_pending() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let aborter = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            aborter.abort();
        });

        let result: Result<()> = with_abort(&signal, std::future::pending()).await;
        assert!(result.unwrap_err().is_aborted());
    }

    #[tokio::test]
    async fn test_never_signal() {
        let signal = AbortSignal::never();
        assert!(!signal.is_aborted());
        let result = with_abort(&signal, async { Ok("done") }).await;
        assert_eq!(result.unwrap(), "done");
    }
}

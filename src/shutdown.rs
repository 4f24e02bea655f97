use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Ctrl-C watcher. Whoever awaits [`Interrupt::wait`] alongside the crawl
/// drops the crawl and then closes the browser session itself.
#[derive(Clone, Default)]
pub struct Interrupt {
    fired: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Interrupt {
    /// Starts listening for Ctrl-C on a background task.
    pub fn listen() -> Self {
        let interrupt = Self::default();
        let listener = interrupt.clone();
        tokio::spawn(async move {
            match ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, stopping the run");
                    listener.fire();
                }
                Err(e) => warn!("Error setting up signal handler: {}", e),
            }
        });
        interrupt
    }

    pub fn is_interrupted(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        let notified = self.notify.notified();
        if self.is_interrupted() {
            return;
        }
        notified.await;
    }

    fn fire(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }
}

use tokio::sync::watch;

/// Cooperative cancellation for the long-running tasks. The binary holds the
/// handle and trips it on Ctrl-C; each task holds a clone of `Shutdown` and
/// selects on `notified()` at its suspension points.
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Resolves once shutdown has been triggered. Also resolves if the handle
    /// was dropped, so tasks never outlive the binary's run loop.
    pub async fn notified(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

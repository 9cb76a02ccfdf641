//! Fixed-interval playhead sampling on a background thread

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use aura_core::Transport;
use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, warn};

use crate::listeners::Listeners;

/// Playhead sampling period (about 60 Hz)
pub const TRACK_INTERVAL: Duration = Duration::from_millis(16);

/// Last sampled position in seconds, shared lock-free between threads
#[derive(Debug, Clone, Default)]
pub struct SharedPosition(Arc<AtomicU64>);

impl SharedPosition {
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, seconds: f64) {
        self.0.store(seconds.to_bits(), Ordering::Release);
    }
}

/// Running tracker thread. Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct PositionTracker {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl PositionTracker {
    pub fn start(
        transport: Arc<Mutex<Transport>>,
        position: SharedPosition,
        listeners: Arc<Listeners<f64>>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let handle = thread::Builder::new()
            .name("aura-position".into())
            .spawn(move || {
                debug!("Position tracking started");
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let seconds = match transport.lock() {
                                Ok(t) => t.seconds(),
                                Err(_) => break,
                            };
                            position.set(seconds);
                            listeners.notify(&seconds);
                        }
                    }
                }
                debug!("Position tracking stopped");
            })?;

        Ok(Self { stop_tx, handle: Some(handle) })
    }

    /// Signal the thread and wait for it; no callback fires after this returns
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Position tracker thread panicked");
            }
        }
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_tracker_notifies_while_running() {
        let transport = Arc::new(Mutex::new(Transport::new()));
        transport.lock().unwrap().start(Instant::now());
        let position = SharedPosition::default();
        let listeners = Arc::new(Listeners::<f64>::new());

        let count = Arc::new(AtomicU64::new(0));
        let counter = count.clone();
        listeners.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let tracker = PositionTracker::start(
            transport,
            position.clone(),
            listeners.clone(),
            Duration::from_millis(2),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(50));
        tracker.stop();

        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop > 0);
        assert!(position.get() > 0.0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }
}

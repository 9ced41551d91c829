use crate::rpc::RpcClient;
use crate::subscription::StateUpdate;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Periodic power status poller
///
/// Polls `system.getPowerStatus` immediately and then on a fixed
/// interval. At most one poll is in flight at a time. Any failure is
/// treated as power-off; an unreachable or rejecting TV is not
/// controllable either way.
pub(crate) struct PowerPoller {
    shared: Arc<PollState>,
    stop_tx: Option<broadcast::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

struct PollState {
    rpc: Arc<RpcClient>,
    power: Mutex<bool>,
    in_flight: AtomicBool,
    events: broadcast::Sender<StateUpdate>,
}

impl PollState {
    /// Issue one poll unless another is already in flight
    async fn poll_once(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return;
        }

        let power = match self
            .rpc
            .call("system", "getPowerStatus", "1.0", json!([]))
            .await
        {
            Ok(result) => {
                let status = result
                    .get(0)
                    .and_then(|entry| entry.get("status"))
                    .and_then(|status| status.as_str());
                status == Some("active")
            }
            Err(e) => {
                tracing::debug!("power poll failed: {}", e);
                false
            }
        };
        self.apply(power);

        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Record a power observation, notifying only on change
    fn apply(&self, power: bool) {
        let mut current = self.power.lock().unwrap();
        if *current != power {
            *current = power;
            tracing::debug!(power, "power state changed");
            let _ = self.events.send(StateUpdate::PowerChanged(power));
        }
    }
}

impl PowerPoller {
    /// Start the poll task
    pub fn start(rpc: Arc<RpcClient>, events: broadcast::Sender<StateUpdate>) -> Self {
        let shared = Arc::new(PollState {
            rpc,
            power: Mutex::new(false),
            in_flight: AtomicBool::new(false),
            events,
        });

        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        let task_shared = shared.clone();
        let handle = tokio::spawn(async move {
            // The first tick fires immediately
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = ticker.tick() => task_shared.poll_once().await,
                }
            }
        });

        Self {
            shared,
            stop_tx: Some(stop_tx),
            task_handle: Some(handle),
        }
    }

    /// Last observed power state; `false` until the first poll lands
    pub fn power(&self) -> bool {
        *self.shared.power.lock().unwrap()
    }

    /// Feed an out-of-band observation through the transition logic
    ///
    /// Used after a successful `setPowerStatus` so the new state is
    /// visible without waiting for the next tick.
    pub fn observe(&self, power: bool) {
        self.shared.apply(power);
    }

    /// Stop the poll task
    ///
    /// The task is torn down exactly once; later calls are no-ops.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            // Give it a moment to stop gracefully
            let _ = tokio::time::timeout(Duration::from_millis(500), handle).await;
        }
    }
}

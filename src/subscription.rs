use crate::error::{BraviaError, Result};
use tokio::sync::broadcast;

/// State change reported by a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpdate {
    /// The TV's power state flipped
    PowerChanged(bool),

    /// The session was gained or lost
    AuthChanged(bool),
}

/// Receiver for state updates
pub struct StateReceiver {
    rx: broadcast::Receiver<StateUpdate>,
}

impl StateReceiver {
    /// Create a new state receiver
    pub(crate) fn new(rx: broadcast::Receiver<StateUpdate>) -> Self {
        Self { rx }
    }

    /// Receive the next state update
    ///
    /// Fails with [`BraviaError::Closed`] once the controller has been
    /// destroyed.
    pub async fn recv(&mut self) -> Result<StateUpdate> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BraviaError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                BraviaError::ChannelError(format!("Lagged by {} messages", n))
            }
        })
    }

    /// Try to receive a state update without blocking
    ///
    /// Returns `None` if no update is pending.
    pub fn try_recv(&mut self) -> Result<Option<StateUpdate>> {
        match self.rx.try_recv() {
            Ok(update) => Ok(Some(update)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(BraviaError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                Err(BraviaError::ChannelError(format!("Lagged by {} messages", n)))
            }
        }
    }
}

//! Process lifecycle tracking

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Phase of a running process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Initializing,
    Serving,
    Draining,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Initializing => "initializing",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Forward-only state machine observable through a watch channel
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Initializing);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next`; moving backwards or standing still is ignored
    pub fn advance(&self, next: LifecycleState) -> bool {
        let advanced = self.tx.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if advanced {
            info!("Lifecycle: {}", next);
        }
        advanced
    }

    /// Wait until the state reaches at least `target`
    pub async fn reached(&self, target: LifecycleState) {
        let mut rx = self.subscribe();
        // The sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|state| *state >= target).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Initializing);

        assert!(lifecycle.advance(LifecycleState::Serving));
        assert!(!lifecycle.advance(LifecycleState::Initializing));
        assert!(!lifecycle.advance(LifecycleState::Serving));
        assert_eq!(lifecycle.state(), LifecycleState::Serving);

        assert!(lifecycle.advance(LifecycleState::Stopped));
        assert!(!lifecycle.advance(LifecycleState::Draining));
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_observers_see_transitions() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.reached(LifecycleState::Draining).await })
        };

        lifecycle.advance(LifecycleState::Serving);
        lifecycle.advance(LifecycleState::Draining);
        waiter.await.unwrap();
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&LifecycleState::Draining).unwrap();
        assert_eq!(json, "\"draining\"");
    }
}

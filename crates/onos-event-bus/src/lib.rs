//! In-process event bus carrying [`CharmEvent`] notifications from the
//! reconciler and the action dispatcher to interested listeners.
//!
//! Listeners run in registration order, one event at a time.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use onos_shared_types::CharmEvent;
use thiserror::Error;
use tokio::sync::RwLock;

pub type EventBusResult<T> = Result<T, EventBusError>;

/// Contract implemented by listeners interested in [`CharmEvent`] notifications.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &CharmEvent) -> anyhow::Result<()>;
}

#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Vec<(String, Arc<dyn EventListener>)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under a unique name
    pub async fn register_listener<L>(
        &self,
        name: impl Into<String>,
        listener: L,
    ) -> EventBusResult<()>
    where
        L: EventListener + 'static,
    {
        let name = name.into();
        let mut guard = self.listeners.write().await;
        if guard.iter().any(|(existing, _)| *existing == name) {
            return Err(EventBusError::ListenerExists(name));
        }

        guard.push((name, Arc::new(listener)));
        Ok(())
    }

    pub async fn unregister_listener(&self, name: &str) -> EventBusResult<()> {
        let mut guard = self.listeners.write().await;
        let before = guard.len();
        guard.retain(|(existing, _)| existing != name);
        if guard.len() == before {
            return Err(EventBusError::ListenerNotFound(name.to_string()));
        }
        Ok(())
    }

    pub async fn listener_names(&self) -> Vec<String> {
        self.listeners
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Deliver an event to every listener. A failing listener does not stop
    /// delivery to the others; all failures are reported together.
    pub async fn publish(&self, event: CharmEvent) -> EventBusResult<()> {
        let listeners = self.listeners.read().await.clone();
        debug!("publishing {:?} to {} listener(s)", event, listeners.len());

        let mut failures = Vec::new();
        for (name, listener) in listeners {
            if let Err(err) = listener.on_event(&event).await {
                warn!("event listener '{}' failed: {}", name, err);
                failures.push(format!("{}: {}", name, err));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EventBusError::ListenerFailures(failures))
        }
    }
}

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("listener '{0}' already registered")]
    ListenerExists(String),
    #[error("listener '{0}' not found")]
    ListenerNotFound(String),
    #[error("one or more listeners failed: {}", .0.join("; "))]
    ListenerFailures(Vec<String>),
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tandem_core::gateway::default_shape;
use tandem_core::gateway::DomainKey;
use tandem_core::gateway::GatewayError;
use tandem_core::gateway::StoreGateway;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

/// In-memory twin of the file store for tests and simulated runs. Keeps a
/// journal of saves and lets a test inject remote-update pushes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    data: Mutex<HashMap<DomainKey, Value>>,
    saves: Mutex<Vec<(DomainKey, Value)>>,
    subscribers: Mutex<Vec<UnboundedSender<DomainKey>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates another process writing a domain: replaces the stored value
    /// and pushes a remote-update notification.
    pub fn push_remote(&self, domain: DomainKey, value: Value) {
        self.inner
            .data
            .lock()
            .expect("data lock")
            .insert(domain, value);
        let mut subscribers = self.inner.subscribers.lock().expect("subscribers lock");
        subscribers.retain(|sender| sender.send(domain).is_ok());
    }

    pub fn stored(&self, domain: DomainKey) -> Option<Value> {
        self.inner.data.lock().expect("data lock").get(&domain).cloned()
    }

    pub fn save_count(&self, domain: DomainKey) -> usize {
        self.inner
            .saves
            .lock()
            .expect("saves lock")
            .iter()
            .filter(|(saved, _)| *saved == domain)
            .count()
    }

    pub fn saves(&self) -> Vec<(DomainKey, Value)> {
        self.inner.saves.lock().expect("saves lock").clone()
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn load(&self, domain: DomainKey) -> Result<Value, GatewayError> {
        Ok(self
            .inner
            .data
            .lock()
            .expect("data lock")
            .get(&domain)
            .cloned()
            .unwrap_or_else(|| default_shape(domain)))
    }

    async fn save(&self, domain: DomainKey, value: Value) -> Result<(), GatewayError> {
        self.inner
            .saves
            .lock()
            .expect("saves lock")
            .push((domain, value.clone()));
        self.inner
            .data
            .lock()
            .expect("data lock")
            .insert(domain, value);
        Ok(())
    }

    fn subscribe(&self) -> UnboundedReceiver<DomainKey> {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .expect("subscribers lock")
            .push(sender);
        receiver
    }
}

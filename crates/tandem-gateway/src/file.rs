use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;

use async_trait::async_trait;
use serde_json::Value;
use tandem_core::gateway::default_shape;
use tandem_core::gateway::DomainKey;
use tandem_core::gateway::GatewayError;
use tandem_core::gateway::StoreGateway;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One JSON file per domain under the data directory. Remote updates are
/// detected by polling file mtimes; the store's own writes are excluded so a
/// local save never comes back as a push.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<Inner>,
}

struct Inner {
    dir: PathBuf,
    subscribers: Mutex<Vec<UnboundedSender<DomainKey>>>,
    own_writes: Mutex<HashMap<DomainKey, SystemTime>>,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            inner: Arc::new(Inner {
                dir,
                subscribers: Mutex::new(Vec::new()),
                own_writes: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn domain_path(&self, domain: DomainKey) -> PathBuf {
        self.inner.domain_path(domain)
    }

    /// Spawns the mtime poller that feeds `subscribe` receivers. Files that
    /// already exist when the watcher starts are seeded as seen.
    pub fn spawn_watcher(&self, poll_interval: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seen: HashMap<DomainKey, SystemTime> = HashMap::new();
            for domain in DomainKey::ALL {
                if let Some(modified) = inner.modified(domain).await {
                    seen.insert(domain, modified);
                }
            }
            loop {
                interval.tick().await;
                for domain in DomainKey::ALL {
                    let Some(modified) = inner.modified(domain).await else {
                        continue;
                    };
                    if seen.insert(domain, modified) == Some(modified) {
                        continue;
                    }
                    if inner.is_own_write(domain, modified) {
                        continue;
                    }
                    tracing::debug!(%domain, "backing file changed externally");
                    inner.notify(domain);
                }
            }
        })
    }
}

impl Inner {
    fn domain_path(&self, domain: DomainKey) -> PathBuf {
        self.dir.join(format!("{}.json", domain.as_str()))
    }

    async fn modified(&self, domain: DomainKey) -> Option<SystemTime> {
        let metadata = tokio::fs::metadata(self.domain_path(domain)).await.ok()?;
        metadata.modified().ok()
    }

    fn is_own_write(&self, domain: DomainKey, modified: SystemTime) -> bool {
        self.own_writes.lock().expect("own_writes lock").get(&domain) == Some(&modified)
    }

    fn notify(&self, domain: DomainKey) {
        let mut subscribers = self.subscribers.lock().expect("subscribers lock");
        subscribers.retain(|sender| sender.send(domain).is_ok());
    }
}

#[async_trait]
impl StoreGateway for FileStore {
    async fn load(&self, domain: DomainKey) -> Result<Value, GatewayError> {
        let path = self.inner.domain_path(domain);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(default_shape(domain));
            }
            Err(error) => return Err(error.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, domain: DomainKey, value: Value) -> Result<(), GatewayError> {
        let path = self.inner.domain_path(domain);
        let bytes = serde_json::to_vec(&value)?;
        tokio::fs::write(&path, bytes).await?;
        if let Some(modified) = self.inner.modified(domain).await {
            self.inner
                .own_writes
                .lock()
                .expect("own_writes lock")
                .insert(domain, modified);
        }
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

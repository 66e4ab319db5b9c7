use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

/// One independently persisted slice of application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainKey {
    Schedules,
    Finance,
    Mental,
    Development,
    Work,
    Equipment,
    Widgets,
    UserProfile,
}

impl DomainKey {
    pub const ALL: [DomainKey; 8] = [
        DomainKey::Schedules,
        DomainKey::Finance,
        DomainKey::Mental,
        DomainKey::Development,
        DomainKey::Work,
        DomainKey::Equipment,
        DomainKey::Widgets,
        DomainKey::UserProfile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DomainKey::Schedules => "schedules",
            DomainKey::Finance => "finance",
            DomainKey::Mental => "mental",
            DomainKey::Development => "development",
            DomainKey::Work => "work",
            DomainKey::Equipment => "equipment",
            DomainKey::Widgets => "widgets",
            DomainKey::UserProfile => "user-profile",
        }
    }
}

impl std::fmt::Display for DomainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape `load` returns when nothing has been stored for a domain yet.
pub fn default_shape(domain: DomainKey) -> Value {
    match domain {
        DomainKey::Schedules
        | DomainKey::Development
        | DomainKey::Equipment
        | DomainKey::Widgets => json!([]),
        DomainKey::Mental => json!({"logs": [], "score": 0}),
        DomainKey::Finance => json!({"totalAsset": 0}),
        DomainKey::Work => json!({}),
        DomainKey::UserProfile => json!({"name": ""}),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("gateway closed")]
    Closed,
}

/// Asynchronous boundary to the local storage service.
///
/// `save` is fire-and-forget at the call site: a rejection is logged and the
/// in-memory mutation is never rolled back. `subscribe` yields a domain key
/// whenever another process changes that domain's backing data.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    async fn load(&self, domain: DomainKey) -> Result<Value, GatewayError>;
    async fn save(&self, domain: DomainKey, value: Value) -> Result<(), GatewayError>;
    fn subscribe(&self) -> UnboundedReceiver<DomainKey>;
}

/// Boundary to the external language-model service. The response is either
/// free text or a JSON-shaped command list; the interpreter decides which.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

pub(super) use super::dispatch_batch;
pub(super) use super::BatchOutcome;
pub(super) use super::Effect;
pub(super) use super::ViewTarget;
pub(super) use crate::category::CategoryPolicy;
pub(super) use crate::commands::Command;
pub(super) use crate::gateway::default_shape;
pub(super) use crate::gateway::DomainKey;
pub(super) use crate::gateway::GatewayError;
pub(super) use crate::gateway::StoreGateway;
pub(super) use crate::state::AppState;
pub(super) use crate::state::Book;
pub(super) use crate::state::Equipment;
pub(super) use crate::state::ScheduleEntry;
pub(super) use crate::state::StudyNode;
pub(super) use crate::state::Widget;

mod widgets;

/// Gateway stand-in: `save` journals the domain and becomes the next
/// authoritative `load` result, like the real store.
#[derive(Default)]
pub(super) struct StubStore {
    pub stored: Mutex<HashMap<DomainKey, Value>>,
    pub saves: Mutex<Vec<DomainKey>>,
    pub fail_loads: bool,
}

impl StubStore {
    pub(super) fn with_stored(domain: DomainKey, value: Value) -> Self {
        let store = Self::default();
        store.stored.lock().expect("lock").insert(domain, value);
        store
    }

    pub(super) fn save_count(&self, domain: DomainKey) -> usize {
        self.saves
            .lock()
            .expect("lock")
            .iter()
            .filter(|saved| **saved == domain)
            .count()
    }
}

#[async_trait]
impl StoreGateway for StubStore {
    async fn load(&self, domain: DomainKey) -> Result<Value, GatewayError> {
        if self.fail_loads {
            return Err(GatewayError::Closed);
        }
        Ok(self
            .stored
            .lock()
            .expect("lock")
            .get(&domain)
            .cloned()
            .unwrap_or_else(|| default_shape(domain)))
    }

    async fn save(&self, domain: DomainKey, value: Value) -> Result<(), GatewayError> {
        self.saves.lock().expect("lock").push(domain);
        self.stored.lock().expect("lock").insert(domain, value);
        Ok(())
    }

    fn subscribe(&self) -> UnboundedReceiver<DomainKey> {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        rx
    }
}

pub(super) fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2026-01-05 18:00:00", "%Y-%m-%d %H:%M:%S")
        .expect("valid datetime")
}

pub(super) async fn run(
    state: &mut AppState,
    store: &StubStore,
    commands: Vec<Command>,
) -> BatchOutcome {
    dispatch_batch(state, store, &CategoryPolicy::default(), now(), commands).await
}

pub(super) fn entry(id: &str, text: &str, date: &str, start_time: &str) -> ScheduleEntry {
    ScheduleEntry {
        id: id.to_string(),
        text: text.to_string(),
        date: date.to_string(),
        start_time: start_time.to_string(),
        end_time: None,
        done: false,
        memo: None,
        category: None,
    }
}

pub(super) fn add_todo(content: &str, date: &str, start_time: &str) -> Command {
    Command::AddTodo {
        date: date.to_string(),
        start_time: start_time.to_string(),
        end_time: None,
        content: content.to_string(),
        category: None,
    }
}

pub(super) fn widget(id: &str, kind: &str, title: &str) -> Widget {
    Widget {
        id: id.to_string(),
        kind: kind.to_string(),
        title: title.to_string(),
        content: None,
        url: None,
        target_time: None,
        color: "indigo".to_string(),
        data: None,
    }
}

pub(super) fn book(id: &str, title: &str, children: Vec<StudyNode>) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: None,
        cover: None,
        children,
    }
}

pub(super) fn leaf(id: &str, title: &str) -> StudyNode {
    StudyNode::leaf(id.to_string(), title.to_string())
}

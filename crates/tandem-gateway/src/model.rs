use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tandem_core::gateway::GatewayError;
use tandem_core::gateway::ModelClient;

/// Replays canned model responses in order; errors once the script runs dry.
/// Stands in for the hosted model service, which is deliberately out of this
/// repository's scope.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    pub fn new(responses: impl IntoIterator<Item = String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().expect("responses lock").len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> Result<String, GatewayError> {
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .ok_or(GatewayError::Closed)
    }
}

use std::sync::Mutex;

use tandem_core::alarm::Notifier;

/// Surfaces notifications through the structured log. The desktop shell owns
/// real toasts and click-to-foreground; this adapter is the headless stand-in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "notification");
    }
}

/// Test notifier that records every delivery.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    delivered: Mutex<Vec<(String, String)>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().expect("delivered lock").clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.delivered
            .lock()
            .expect("delivered lock")
            .push((title.to_string(), body.to_string()));
    }
}

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tandem_core::alarm::due_alerts;
use tandem_core::alarm::Notifier;
use tandem_core::category::CategoryPolicy;
use tandem_core::dispatcher::dispatch_batch;
use tandem_core::dispatcher::Effect;
use tandem_core::gateway::DomainKey;
use tandem_core::gateway::StoreGateway;
use tandem_core::interpreter::interpret;
use tandem_core::interpreter::Interpretation;
use tandem_core::state::AppState;
use tandem_core::state::Widget;
use tandem_core::sync::apply_inbound;
use tandem_core::sync::persist_outbound;
use tandem_core::sync::SyncFlags;

/// One user's live application state plus the glue that runs model responses
/// through the interpreter, the dispatcher, and the save decision.
pub struct Session<'a> {
    pub state: AppState,
    flags: SyncFlags,
    fired_alerts: HashSet<String>,
    gateway: &'a dyn StoreGateway,
    policy: CategoryPolicy,
    offsets_min: Vec<i64>,
}

impl<'a> Session<'a> {
    pub fn new(gateway: &'a dyn StoreGateway, policy: CategoryPolicy, offsets_min: Vec<i64>) -> Self {
        Self {
            state: AppState::default(),
            flags: SyncFlags::new(),
            fired_alerts: HashSet::new(),
            gateway,
            policy,
            offsets_min,
        }
    }

    /// Loads every domain once at startup. Hydration loads are inbound, so
    /// none of them echo a save back to the store.
    pub async fn hydrate(&mut self) {
        for domain in DomainKey::ALL {
            if let Err(error) =
                apply_inbound(&mut self.state, &mut self.flags, self.gateway, domain).await
            {
                tracing::warn!(%domain, %error, "hydration failed, starting from empty state");
                self.flags.consume(domain);
            }
        }
    }

    /// Runs one raw model response through interpret → dispatch → persist and
    /// returns the text to show the user.
    pub async fn user_turn(&mut self, raw_response: &str, now: NaiveDateTime) -> String {
        let batch = match interpret(raw_response) {
            Err(error) => {
                tracing::warn!(%error, "model response was not a readable command");
                return "Sorry, I couldn't read that as a command, so nothing was changed."
                    .to_string();
            }
            Ok(Interpretation::Chat(text)) => return text,
            Ok(Interpretation::RawData(value)) => {
                let items = value.as_array().map(Vec::len).unwrap_or(0);
                return format!("(received a data payload with {items} items)");
            }
            Ok(Interpretation::Commands(batch)) => batch,
        };

        let outcome =
            dispatch_batch(&mut self.state, self.gateway, &self.policy, now, batch).await;

        let mut lines = Vec::new();
        if let Some(text) = outcome.reply_text() {
            lines.push(text);
        }
        for effect in outcome.effects {
            match effect {
                Effect::SaveDomain(domain) => {
                    persist_outbound(&self.state, &mut self.flags, self.gateway, domain).await;
                }
                Effect::FocusView(view) => {
                    lines.push(format!("(opening the {} view)", view.label()));
                }
                Effect::ShowWidgets(widgets) => lines.push(render_widgets(&widgets)),
            }
        }
        if lines.is_empty() {
            "Done.".to_string()
        } else {
            lines.join("\n")
        }
    }

    /// Reloads a domain another process changed. The inbound flag suppresses
    /// exactly one echo save.
    pub async fn remote_update(&mut self, domain: DomainKey) {
        if let Err(error) =
            apply_inbound(&mut self.state, &mut self.flags, self.gateway, domain).await
        {
            tracing::warn!(%domain, %error, "remote update reload failed");
            self.flags.consume(domain);
        }
    }

    /// One scheduler tick: raises deduplicated alerts through the notifier.
    pub fn scan_alerts(&mut self, now: NaiveDateTime, notifier: &dyn Notifier) -> usize {
        let due = due_alerts(&self.state, now, &self.offsets_min, &mut self.fired_alerts);
        for alert in &due {
            notifier.notify(&alert.title, &alert.body);
        }
        due.len()
    }
}

fn render_widgets(widgets: &[Widget]) -> String {
    if widgets.is_empty() {
        return "(no widgets yet)".to_string();
    }
    let mut lines = vec!["Widgets:".to_string()];
    for widget in widgets {
        let mut line = format!("- {} ({})", widget.title, widget.kind);
        if let Some(url) = widget.url.as_deref() {
            line.push_str(&format!(" {url}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

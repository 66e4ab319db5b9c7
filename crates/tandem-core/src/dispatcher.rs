use chrono::NaiveDateTime;
use serde_json::Value;

use crate::category::CategoryPolicy;
use crate::commands::Command;
use crate::commands::CurriculumNode;
use crate::gateway::DomainKey;
use crate::gateway::StoreGateway;
use crate::state::new_entry_id;
use crate::state::AppState;
use crate::state::Book;
use crate::state::EquipmentLog;
use crate::state::MentalLog;
use crate::state::ScheduleEntry;
use crate::state::ScheduleSet;
use crate::state::StudyNode;
use crate::state::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    Schedule,
    Finance,
    Mental,
    Development,
}

impl ViewTarget {
    pub fn label(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Finance => "finance",
            Self::Mental => "mental",
            Self::Development => "development",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The named domain was mutated and must go through the save decision.
    SaveDomain(DomainKey),
    /// Bring a detail view to the front (rendered out of core).
    FocusView(ViewTarget),
    /// Widget-list display payload; replaces the textual reply channel.
    ShowWidgets(Vec<Widget>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOutcome {
    pub replies: Vec<String>,
    pub effects: Vec<Effect>,
}

impl BatchOutcome {
    pub fn reply_text(&self) -> Option<String> {
        if self.replies.is_empty() {
            None
        } else {
            Some(self.replies.join("\n"))
        }
    }
}

/// Applies a command batch strictly in array order. Each command resolves
/// independently: a lookup failure replies and the rest of the batch still
/// runs. At most one status line per command.
pub async fn dispatch_batch(
    state: &mut AppState,
    gateway: &dyn StoreGateway,
    policy: &CategoryPolicy,
    now: NaiveDateTime,
    commands: Vec<Command>,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for command in commands {
        dispatch_one(state, gateway, policy, now, command, &mut outcome).await;
    }
    outcome
}

async fn dispatch_one(
    state: &mut AppState,
    gateway: &dyn StoreGateway,
    policy: &CategoryPolicy,
    now: NaiveDateTime,
    command: Command,
    outcome: &mut BatchOutcome,
) {
    match command {
        Command::AddTodo {
            date,
            start_time,
            end_time,
            content,
            category,
        } => {
            add_todo(
                state, gateway, policy, now, date, start_time, end_time, content, category,
                outcome,
            )
            .await;
        }
        Command::ModifyTodo {
            id,
            date,
            start_time,
            end_time,
            content,
        } => match state.schedules.find_mut(&id) {
            Some(entry) => {
                // Partial update: absent fields keep their current values.
                if let Some(date) = date {
                    entry.date = date;
                }
                if let Some(start_time) = start_time {
                    entry.start_time = start_time;
                }
                if let Some(end_time) = end_time {
                    entry.end_time = Some(end_time);
                }
                if let Some(content) = content {
                    entry.text = content;
                }
                outcome.replies.push(format!("Updated \"{}\".", entry.text));
                outcome.effects.push(Effect::SaveDomain(DomainKey::Schedules));
            }
            None => outcome.replies.push(format!("No schedule with id {id}.")),
        },
        Command::DeleteTodo { id } => match state.schedules.remove(&id) {
            Some(entry) => {
                outcome.replies.push(format!("Deleted \"{}\".", entry.text));
                outcome.effects.push(Effect::SaveDomain(DomainKey::Schedules));
            }
            None => outcome.replies.push(format!("No schedule with id {id}.")),
        },
        Command::RecordStudy {
            topic,
            note,
            mark_done,
        } => match state.library.find_node_mut(&topic) {
            Some(node) => {
                if let Some(note) = note {
                    node.note = Some(match node.note.take() {
                        Some(existing) => format!("{existing}\n\n{note}"),
                        None => note,
                    });
                }
                if mark_done == Some(true) {
                    node.done = true;
                }
                outcome
                    .replies
                    .push(format!("Logged progress on \"{}\".", node.title));
                outcome
                    .effects
                    .push(Effect::SaveDomain(DomainKey::Development));
            }
            None => outcome
                .replies
                .push(format!("No study topic matching \"{topic}\".")),
        },
        Command::DeleteBook { id } => match state.library.remove_book(&id) {
            Some(book) => {
                outcome
                    .replies
                    .push(format!("Removed \"{}\" from the library.", book.title));
                outcome
                    .effects
                    .push(Effect::SaveDomain(DomainKey::Development));
            }
            None => outcome.replies.push(format!("No book with id {id}.")),
        },
        Command::SearchBooks { results } => {
            outcome
                .replies
                .push(format!("Catalog search returned {} results.", results.len()));
        }
        Command::GenerateCurriculum { title, children } => {
            let base = new_entry_id(now);
            let mut ordinal = 0usize;
            let children = build_curriculum(&base, &mut ordinal, children);
            let topics = count_nodes(&children);
            state.library.books.push(Book {
                id: base,
                title: title.clone(),
                author: None,
                cover: None,
                children,
            });
            outcome.replies.push(format!(
                "Created curriculum \"{title}\" with {topics} topics."
            ));
            outcome
                .effects
                .push(Effect::SaveDomain(DomainKey::Development));
        }
        Command::StartQuiz { topic } => match state.library.find_node_mut(&topic) {
            Some(node) => outcome
                .replies
                .push(format!("Starting a quiz on \"{}\".", node.title)),
            None => outcome
                .replies
                .push(format!("No study topic matching \"{topic}\".")),
        },
        Command::AnalyzeMental {
            summary,
            mood,
            score,
            advice,
            daily_advice,
            tags,
        } => {
            let today = now.format("%Y-%m-%d").to_string();
            state.mental.logs.push(MentalLog {
                id: new_entry_id(now),
                date: today.clone(),
                time: now.format("%H:%M").to_string(),
                summary,
                mood: mood.clone(),
                score: score.min(100),
                advice: advice.clone(),
                daily_advice: Some(daily_advice),
                tags,
            });
            state.mental.recompute(&today);
            outcome.replies.push(format!(
                "Mood logged: {mood} ({} points). {advice}",
                score.min(100)
            ));
            outcome.effects.push(Effect::SaveDomain(DomainKey::Mental));
        }
        Command::AddEquipmentLog {
            equip_id,
            content,
            date,
        } => add_equipment_log(state, now, equip_id, content, date, outcome),
        Command::CreateDashboardWidget {
            widget_type,
            title,
            content,
            url,
            target_time,
            color,
            data,
        } => create_widget(
            state,
            now,
            widget_type,
            title,
            content,
            url,
            target_time,
            color,
            data,
            outcome,
        ),
        Command::DeleteDashboardWidget { title } => delete_widget(state, &title, outcome),
        Command::ShowDashboardWidgets { widget_type } => {
            let filter = normalize(&widget_type);
            let listed: Vec<Widget> = state
                .widgets
                .widgets
                .iter()
                .filter(|widget| filter == "all" || normalize(&widget.kind) == filter)
                .cloned()
                .collect();
            // Widget-list payload only; the textual reply stays suppressed.
            outcome.effects.push(Effect::ShowWidgets(listed));
        }
        Command::ShowSchedule => {
            outcome.replies.push("Here are your schedules.".to_string());
            outcome.effects.push(Effect::FocusView(ViewTarget::Schedule));
        }
        Command::ShowFinance => {
            outcome.replies.push("Here is your asset overview.".to_string());
            outcome.effects.push(Effect::FocusView(ViewTarget::Finance));
        }
        Command::ShowMental => {
            outcome.replies.push("Here is your mood overview.".to_string());
            outcome.effects.push(Effect::FocusView(ViewTarget::Mental));
        }
        Command::ShowDevelopment => {
            outcome.replies.push("Here is your library.".to_string());
            outcome
                .effects
                .push(Effect::FocusView(ViewTarget::Development));
        }
        Command::Chat { message } => outcome.replies.push(message),
        Command::Unknown { action } => {
            tracing::warn!(%action, "unrecognized command action dropped");
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn add_todo(
    state: &mut AppState,
    gateway: &dyn StoreGateway,
    policy: &CategoryPolicy,
    now: NaiveDateTime,
    date: String,
    start_time: String,
    end_time: Option<String>,
    content: String,
    category: Option<String>,
    outcome: &mut BatchOutcome,
) {
    let category = match category.as_deref() {
        Some(given) if !given.is_empty() && given != "default" => given.to_string(),
        _ => policy.infer(&content).to_string(),
    };

    // The duplicate check runs against the authoritative store, not the
    // in-memory cache, so a concurrent external writer is still honored.
    let authoritative = match gateway.load(DomainKey::Schedules).await {
        Ok(value) => decode_schedules(value).unwrap_or_else(|| state.schedules.clone()),
        Err(error) => {
            tracing::warn!(%error, "authoritative reload failed, checking in-memory set");
            state.schedules.clone()
        }
    };
    // Unsaved entries from earlier commands in the same batch only exist in
    // memory, so both sets are consulted.
    let duplicate = authoritative
        .entries
        .iter()
        .chain(state.schedules.entries.iter())
        .any(|entry| {
            entry.date == date && entry.start_time == start_time && entry.text == content
        });
    if duplicate {
        outcome.replies.push(format!(
            "\"{content}\" is already scheduled for {date} {start_time}."
        ));
        return;
    }

    state.schedules.entries.push(ScheduleEntry {
        id: new_entry_id(now),
        text: content.clone(),
        date: date.clone(),
        start_time: start_time.clone(),
        end_time,
        done: false,
        memo: None,
        category: Some(category.clone()),
    });
    outcome.replies.push(format!(
        "Added \"{content}\" on {date} at {start_time} ({category})."
    ));
    outcome.effects.push(Effect::SaveDomain(DomainKey::Schedules));
}

fn decode_schedules(value: Value) -> Option<ScheduleSet> {
    match serde_json::from_value(value) {
        Ok(set) => Some(set),
        Err(error) => {
            tracing::warn!(%error, "stored schedule shape unreadable, checking in-memory set");
            None
        }
    }
}

fn add_equipment_log(
    state: &mut AppState,
    now: NaiveDateTime,
    equip_id: Option<String>,
    content: String,
    date: Option<String>,
    outcome: &mut BatchOutcome,
) {
    if state.equipment.assets.is_empty() {
        outcome
            .replies
            .push("No equipment is registered, so the log was not saved.".to_string());
        return;
    }
    let log = EquipmentLog {
        id: new_entry_id(now),
        date: date.unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        content: content.clone(),
        kind: Some("maintenance".to_string()),
    };
    let asset = match equip_id {
        Some(id) => match state.equipment.find_mut(&id) {
            Some(asset) => asset,
            None => {
                outcome.replies.push(format!("No equipment with id {id}."));
                return;
            }
        },
        // Absent id falls back to the first registered asset.
        None => &mut state.equipment.assets[0],
    };
    asset.logs.push(log);
    outcome
        .replies
        .push(format!("Logged for {}: {content}", asset.name));
    outcome.effects.push(Effect::SaveDomain(DomainKey::Equipment));
}

struct WidgetOverride {
    title: &'static str,
    url_fragment: &'static str,
    url: &'static str,
    color: &'static str,
}

/// Fixed substitutions for well-known sites, keyed by exact title or url
/// substring. Extending coverage is data-only.
const WIDGET_OVERRIDES: [WidgetOverride; 3] = [
    WidgetOverride {
        title: "Google",
        url_fragment: "google.com",
        url: "https://www.google.com",
        color: "blue",
    },
    WidgetOverride {
        title: "Naver",
        url_fragment: "naver.com",
        url: "https://www.naver.com",
        color: "emerald",
    },
    WidgetOverride {
        title: "YouTube",
        url_fragment: "youtube.com",
        url: "https://www.youtube.com",
        color: "rose",
    },
];

fn widget_override(title: &str, url: Option<&str>) -> Option<&'static WidgetOverride> {
    WIDGET_OVERRIDES.iter().find(|candidate| {
        title.eq_ignore_ascii_case(candidate.title)
            || url.is_some_and(|url| url.contains(candidate.url_fragment))
    })
}

#[allow(clippy::too_many_arguments)]
fn create_widget(
    state: &mut AppState,
    now: NaiveDateTime,
    widget_type: String,
    title: String,
    content: Option<String>,
    url: Option<String>,
    target_time: Option<String>,
    color: Option<String>,
    data: Option<Value>,
    outcome: &mut BatchOutcome,
) {
    let override_hit = widget_override(&title, url.as_deref());
    let (kind, url) = match override_hit {
        Some(entry) => ("link".to_string(), Some(entry.url.to_string())),
        None => (widget_type, url),
    };
    let color = color
        .filter(|given| !given.is_empty())
        .or_else(|| override_hit.map(|entry| entry.color.to_string()))
        .unwrap_or_else(|| "indigo".to_string());

    state.widgets.widgets.push(Widget {
        id: new_entry_id(now),
        kind,
        title: title.clone(),
        content,
        url,
        target_time,
        color,
        data,
    });
    outcome.replies.push(format!("Added widget \"{title}\"."));
    outcome.effects.push(Effect::SaveDomain(DomainKey::Widgets));
}

fn delete_widget(state: &mut AppState, title: &str, outcome: &mut BatchOutcome) {
    let position = state
        .widgets
        .widgets
        .iter()
        .position(|widget| fuzzy_match(&widget.title, title));
    match position {
        Some(index) => {
            let removed = state.widgets.widgets.remove(index);
            outcome
                .replies
                .push(format!("Removed widget \"{}\".", removed.title));
            outcome.effects.push(Effect::SaveDomain(DomainKey::Widgets));
        }
        None => {
            let titles: Vec<&str> = state
                .widgets
                .widgets
                .iter()
                .map(|widget| widget.title.as_str())
                .collect();
            let listing = if titles.is_empty() {
                "(none)".to_string()
            } else {
                titles.join(", ")
            };
            outcome.replies.push(format!(
                "No widget matching \"{title}\". Current widgets: {listing}"
            ));
        }
    }
}

/// Case-insensitive, whitespace-stripped substring containment in either
/// direction. Empty sides never match.
fn fuzzy_match(left: &str, right: &str) -> bool {
    let left = normalize(left);
    let right = normalize(right);
    if left.is_empty() || right.is_empty() {
        return false;
    }
    left.contains(&right) || right.contains(&left)
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn build_curriculum(
    base: &str,
    ordinal: &mut usize,
    nodes: Vec<CurriculumNode>,
) -> Vec<StudyNode> {
    nodes
        .into_iter()
        .map(|node| {
            *ordinal += 1;
            let mut built = StudyNode::leaf(format!("{base}-{ordinal}"), node.title);
            built.children = build_curriculum(base, ordinal, node.children);
            built
        })
        .collect()
}

fn count_nodes(nodes: &[StudyNode]) -> usize {
    nodes
        .iter()
        .map(|node| 1 + count_nodes(&node.children))
        .sum()
}

#[cfg(test)]
mod tests;

use chrono::NaiveDateTime;
use rand::Rng;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::gateway::DomainKey;

/// Tolerates numeric ids left behind by older store files: numbers are
/// rendered to their decimal text, strings are trimmed.
pub fn flexible_id(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn de_flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flexible_id(&value))
}

/// Creation-timestamp id with a random tie-breaker so two entries created in
/// the same millisecond never collide.
pub fn new_entry_id(now: NaiveDateTime) -> String {
    let tie_breaker: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{}{:03}", now.and_utc().timestamp_millis(), tie_breaker)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    pub text: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleSet {
    pub entries: Vec<ScheduleEntry>,
}

impl ScheduleSet {
    pub fn find(&self, id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.id.trim() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut ScheduleEntry> {
        self.entries.iter_mut().find(|entry| entry.id.trim() == id)
    }

    /// Removes by string-normalized id equality. Returns the removed entry.
    pub fn remove(&mut self, id: &str) -> Option<ScheduleEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id.trim() == id)?;
        Some(self.entries.remove(index))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentalLog {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    pub date: String,
    pub time: String,
    pub summary: String,
    pub mood: String,
    pub score: u8,
    pub advice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_advice: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentalState {
    #[serde(default)]
    pub logs: Vec<MentalLog>,
    #[serde(default)]
    pub current_mood: Option<String>,
    /// Integer-rounded mean over today's logs.
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub today_advice: Option<String>,
}

impl MentalState {
    /// Rederives `current_mood` (most-recent-wins), `score` (rounded mean of
    /// logs dated `today`) and `today_advice` from the log list.
    pub fn recompute(&mut self, today: &str) {
        self.current_mood = self.logs.last().map(|log| log.mood.clone());
        let today_scores: Vec<u32> = self
            .logs
            .iter()
            .filter(|log| log.date == today)
            .map(|log| u32::from(log.score))
            .collect();
        self.score = if today_scores.is_empty() {
            0
        } else {
            let sum: u32 = today_scores.iter().sum();
            (f64::from(sum) / today_scores.len() as f64).round() as u8
        };
        self.today_advice = self
            .logs
            .iter()
            .rev()
            .find(|log| log.date == today)
            .and_then(|log| log.daily_advice.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyNode {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub children: Vec<StudyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quiz_history: Vec<u32>,
}

impl StudyNode {
    pub fn leaf(id: String, title: String) -> Self {
        Self {
            id,
            title,
            done: false,
            note: None,
            children: Vec::new(),
            mastery_level: None,
            quiz_history: Vec::new(),
        }
    }

    /// Derived completion percentage. Leaves are 0 or 100 by `done`; parents
    /// average their children and never store the value.
    pub fn progress(&self) -> u8 {
        if self.children.is_empty() {
            return if self.done { 100 } else { 0 };
        }
        let total: u32 = self
            .children
            .iter()
            .map(|child| u32::from(child.progress()))
            .sum();
        (f64::from(total) / self.children.len() as f64).round() as u8
    }

    /// Appends a quiz score and rederives the mastery band from the average.
    pub fn record_quiz_score(&mut self, score: u32) {
        self.quiz_history.push(score);
        let sum: u32 = self.quiz_history.iter().sum();
        let average = (f64::from(sum) / self.quiz_history.len() as f64).round() as u32;
        self.mastery_level = Some(mastery_band(average).to_string());
    }
}

pub fn mastery_band(average_score: u32) -> &'static str {
    match average_score {
        0..=39 => "Lv.1 🥚",
        40..=59 => "Lv.2 🐣",
        60..=74 => "Lv.3 🐤",
        75..=89 => "Lv.4 🐥",
        _ => "Lv.5 🦅",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default)]
    pub children: Vec<StudyNode>,
}

impl Book {
    pub fn progress(&self) -> u8 {
        if self.children.is_empty() {
            return 0;
        }
        let total: u32 = self
            .children
            .iter()
            .map(|child| u32::from(child.progress()))
            .sum();
        (f64::from(total) / self.children.len() as f64).round() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    pub books: Vec<Book>,
}

impl Library {
    /// Pre-order search across all books for the first node whose title
    /// matches `topic` as a case-insensitive substring in either direction.
    pub fn find_node_mut(&mut self, topic: &str) -> Option<&mut StudyNode> {
        for book in &mut self.books {
            if let Some(node) = find_in_nodes(&mut book.children, topic) {
                return Some(node);
            }
        }
        None
    }

    pub fn remove_book(&mut self, id: &str) -> Option<Book> {
        let index = self.books.iter().position(|book| book.id.trim() == id)?;
        Some(self.books.remove(index))
    }
}

fn find_in_nodes<'a>(nodes: &'a mut [StudyNode], topic: &str) -> Option<&'a mut StudyNode> {
    let needle = topic.trim().to_lowercase();
    let index = nodes.iter().position(|node| {
        let title = node.title.to_lowercase();
        title.contains(&needle) || needle.contains(&title)
    });
    if let Some(index) = index {
        return Some(&mut nodes[index]);
    }
    for node in nodes {
        if let Some(found) = find_in_nodes(&mut node.children, topic) {
            return Some(found);
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentLog {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    pub date: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logs: Vec<EquipmentLog>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentList {
    pub assets: Vec<Equipment>,
}

impl EquipmentList {
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Equipment> {
        self.assets.iter_mut().find(|asset| asset.id.trim() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    #[serde(deserialize_with = "de_flexible_id")]
    pub id: String,
    #[serde(rename = "widgetType")]
    pub kind: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetSet {
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub shift_group: Option<String>,
}

/// The application's owned domain state. Created empty at process start,
/// hydrated once per domain through the gateway, then mutated only by the
/// dispatcher and inbound reloads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub schedules: ScheduleSet,
    pub mental: MentalState,
    pub library: Library,
    pub equipment: EquipmentList,
    pub widgets: WidgetSet,
    /// Owned by the finance detail view; the core round-trips it verbatim.
    pub finance: Value,
    /// Owned by the work detail view; the core round-trips it verbatim.
    pub work: Value,
    pub profile: UserProfile,
}

impl AppState {
    pub fn apply_loaded(
        &mut self,
        domain: DomainKey,
        value: Value,
    ) -> Result<(), serde_json::Error> {
        match domain {
            DomainKey::Schedules => self.schedules = serde_json::from_value(value)?,
            DomainKey::Mental => self.mental = serde_json::from_value(value)?,
            DomainKey::Development => self.library = serde_json::from_value(value)?,
            DomainKey::Equipment => self.equipment = serde_json::from_value(value)?,
            DomainKey::Widgets => self.widgets = serde_json::from_value(value)?,
            DomainKey::UserProfile => self.profile = serde_json::from_value(value)?,
            DomainKey::Finance => self.finance = value,
            DomainKey::Work => self.work = value,
        }
        Ok(())
    }

    pub fn snapshot(&self, domain: DomainKey) -> Result<Value, serde_json::Error> {
        match domain {
            DomainKey::Schedules => serde_json::to_value(&self.schedules),
            DomainKey::Mental => serde_json::to_value(&self.mental),
            DomainKey::Development => serde_json::to_value(&self.library),
            DomainKey::Equipment => serde_json::to_value(&self.equipment),
            DomainKey::Widgets => serde_json::to_value(&self.widgets),
            DomainKey::UserProfile => serde_json::to_value(&self.profile),
            DomainKey::Finance => Ok(self.finance.clone()),
            DomainKey::Work => Ok(self.work.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn node(id: &str, title: &str, done: bool) -> StudyNode {
        StudyNode {
            done,
            ..StudyNode::leaf(id.to_string(), title.to_string())
        }
    }

    #[test]
    fn parent_progress_averages_derived_child_progress() {
        let mut chapter = node("c1", "Ownership", false);
        chapter.children = vec![
            node("c1-1", "Borrowing", true),
            node("c1-2", "Lifetimes", false),
        ];
        let book = Book {
            id: "b1".to_string(),
            title: "The Rust Book".to_string(),
            author: None,
            cover: None,
            children: vec![chapter, node("c2", "Traits", true)],
        };
        assert_eq!(book.children[0].progress(), 50);
        assert_eq!(book.progress(), 75);
    }

    #[test]
    fn mental_recompute_uses_todays_rounded_mean_and_newest_mood() {
        let mut mental = MentalState::default();
        for (id, date, mood, score) in [
            ("1", "2026-01-05", "calm", 80),
            ("2", "2026-01-05", "tired", 60),
            ("3", "2026-01-04", "great", 100),
        ] {
            mental.logs.push(MentalLog {
                id: id.to_string(),
                date: date.to_string(),
                time: "09:00".to_string(),
                summary: String::new(),
                mood: mood.to_string(),
                score,
                advice: String::new(),
                daily_advice: None,
                tags: Vec::new(),
            });
        }
        mental.recompute("2026-01-05");
        assert_eq!(mental.score, 70);
        assert_eq!(mental.current_mood.as_deref(), Some("great"));
    }

    #[test]
    fn mastery_band_moves_with_quiz_average() {
        let mut target = node("n1", "Sorting", false);
        target.record_quiz_score(30);
        assert_eq!(target.mastery_level.as_deref(), Some("Lv.1 🥚"));
        target.record_quiz_score(90);
        // average 60
        assert_eq!(target.mastery_level.as_deref(), Some("Lv.3 🐤"));
    }

    #[test]
    fn schedule_entries_accept_numeric_ids_from_old_store_files() {
        let set: ScheduleSet = serde_json::from_value(json!([
            {"id": 1736100000000u64, "text": "PT", "date": "2026-01-05", "startTime": "19:00"}
        ]))
        .expect("numeric id should decode");
        assert_eq!(set.entries[0].id, "1736100000000");
        assert!(set.find("1736100000000").is_some());
    }

    #[test]
    fn study_tree_round_trips_through_json() {
        let mut root = node("r", "Async Rust", false);
        root.note = Some("pin before poll".to_string());
        root.children = vec![node("r-1", "Futures", true)];
        let library = Library {
            books: vec![Book {
                id: "b1".to_string(),
                title: "Async in Depth".to_string(),
                author: Some("T. Okio".to_string()),
                cover: None,
                children: vec![root],
            }],
        };
        let value = serde_json::to_value(&library).expect("serialize");
        let reloaded: Library = serde_json::from_value(value).expect("deserialize");
        assert_eq!(reloaded, library);
    }

    #[test]
    fn pre_order_first_match_wins_for_topic_search() {
        let mut library = Library {
            books: vec![Book {
                id: "b1".to_string(),
                title: "Networks".to_string(),
                author: None,
                cover: None,
                children: vec![
                    node("n1", "TCP Basics", false),
                    node("n2", "TCP Deep Dive", false),
                ],
            }],
        };
        let found = library.find_node_mut("tcp").expect("match");
        assert_eq!(found.id, "n1");
    }
}

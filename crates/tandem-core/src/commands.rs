use serde::Deserialize;
use serde::Deserializer;
use serde_json::Value;

use crate::state::flexible_id;

/// One structured mutation/query request derived from a model response.
/// Commands are transient: produced by the interpreter, dispatched once in
/// array order, never persisted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    AddTodo {
        date: String,
        #[serde(rename = "startTime")]
        start_time: String,
        #[serde(rename = "endTime", default)]
        end_time: Option<String>,
        content: String,
        #[serde(default)]
        category: Option<String>,
    },
    ModifyTodo {
        #[serde(deserialize_with = "de_id")]
        id: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(rename = "startTime", default)]
        start_time: Option<String>,
        #[serde(rename = "endTime", default)]
        end_time: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
    DeleteTodo {
        #[serde(deserialize_with = "de_id")]
        id: String,
    },
    RecordStudy {
        topic: String,
        #[serde(default)]
        note: Option<String>,
        #[serde(default)]
        mark_done: Option<bool>,
    },
    DeleteBook {
        #[serde(deserialize_with = "de_id")]
        id: String,
    },
    SearchBooks {
        #[serde(default)]
        results: Vec<Value>,
    },
    GenerateCurriculum {
        title: String,
        #[serde(default)]
        children: Vec<CurriculumNode>,
    },
    StartQuiz {
        topic: String,
    },
    AnalyzeMental {
        summary: String,
        mood: String,
        score: u8,
        advice: String,
        daily_advice: String,
        #[serde(default)]
        tags: Vec<String>,
    },
    AddEquipmentLog {
        #[serde(rename = "equipId", default, deserialize_with = "de_opt_id")]
        equip_id: Option<String>,
        content: String,
        #[serde(default)]
        date: Option<String>,
    },
    CreateDashboardWidget {
        #[serde(rename = "widgetType")]
        widget_type: String,
        title: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(rename = "targetTime", default)]
        target_time: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    DeleteDashboardWidget {
        title: String,
    },
    ShowDashboardWidgets {
        #[serde(rename = "widgetType", default = "all_widgets")]
        widget_type: String,
    },
    ShowSchedule,
    ShowFinance,
    ShowMental,
    ShowDevelopment,
    Chat {
        message: String,
    },
    /// Action name the dispatcher does not recognize. Logged, never mutated.
    #[serde(skip)]
    Unknown { action: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurriculumNode {
    pub title: String,
    #[serde(default)]
    pub children: Vec<CurriculumNode>,
}

fn all_widgets() -> String {
    "all".to_string()
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flexible_id(&value))
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(other) => Some(flexible_id(&other)),
    })
}

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

use crate::shift::shift_for_date;
use crate::state::AppState;

/// Assembles the system instruction sent with every user utterance: the
/// standing rules plus a context block rebuilt from current domain state so
/// the model never has to trust conversation memory.
pub fn build_system_instruction(state: &AppState, now: NaiveDateTime) -> String {
    let today = now.date();
    let mut prompt = String::new();

    prompt.push_str("You are Tandem, the user's personal dashboard partner.\n");
    prompt.push_str("Rules:\n");
    prompt.push_str("- The schedule list below is the only source of truth; ignore conversation memory.\n");
    prompt.push_str("- Never check for duplicates yourself; always emit the command and let the app decide.\n");
    prompt.push_str("- Reply with JSON commands only; use a JSON array when multiple actions are needed.\n");
    prompt.push_str(
        "- Known actions: add_todo, modify_todo, delete_todo, record_study, delete_book, \
         search_books, generate_curriculum, start_quiz, analyze_mental, add_equipment_log, \
         create_dashboard_widget, delete_dashboard_widget, show_dashboard_widgets, \
         show_schedule, show_finance, show_mental, show_development, chat.\n",
    );
    prompt.push_str(
        "- Schedule categories: health, work, shift, development, finance, default.\n\n",
    );

    prompt.push_str(&format!(
        "Current time: {}\n",
        now.format("%Y-%m-%d %H:%M (%A)")
    ));
    let shift_line = state
        .profile
        .shift_group
        .as_deref()
        .and_then(|group| shift_for_date(group, today))
        .map(|shift| match shift.hours() {
            Some((start, end)) => format!("{} ({start}-{end})", shift.label()),
            None => shift.label().to_string(),
        })
        .unwrap_or_else(|| "unknown".to_string());
    prompt.push_str(&format!("Today's shift: {shift_line}\n"));

    prompt.push_str("\nExisting schedules:\n");
    if state.schedules.entries.is_empty() {
        prompt.push_str("  (none)\n");
    }
    for entry in &state.schedules.entries {
        prompt.push_str(&format!(
            "  [{}] {} {} {} ({})\n",
            entry.id,
            entry.date,
            entry.start_time,
            entry.text,
            entry.category.as_deref().unwrap_or("default")
        ));
    }

    let horizon = today + Duration::days(7);
    let upcoming: Vec<String> = state
        .schedules
        .entries
        .iter()
        .filter(|entry| {
            parse_date(&entry.date)
                .map(|date| date > today && date <= horizon)
                .unwrap_or(false)
        })
        .map(|entry| format!("  {} {} {}\n", entry.date, entry.start_time, entry.text))
        .collect();
    if !upcoming.is_empty() {
        prompt.push_str("\nUpcoming week:\n");
        for line in upcoming {
            prompt.push_str(&line);
        }
    }

    let since = today - Duration::days(13);
    let history: Vec<String> = state
        .mental
        .logs
        .iter()
        .filter(|log| {
            parse_date(&log.date)
                .map(|date| date >= since && date <= today)
                .unwrap_or(false)
        })
        .map(|log| format!("  {} {} ({}): {}\n", log.date, log.mood, log.score, log.summary))
        .collect();
    if !history.is_empty() {
        prompt.push_str("\nMental history (last 2 weeks):\n");
        for line in history {
            prompt.push_str(&line);
        }
    }

    if !state.library.books.is_empty() {
        prompt.push_str("\nLibrary:\n");
        for book in &state.library.books {
            prompt.push_str(&format!(
                "  [{}] {} ({}% complete)\n",
                book.id,
                book.title,
                book.progress()
            ));
        }
    }

    prompt
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

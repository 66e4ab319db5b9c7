use std::collections::HashSet;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

use crate::state::AppState;

/// Lead times, in whole minutes, at which an entity fires a notification.
pub const DEFAULT_ALERT_OFFSETS_MIN: [i64; 3] = [30, 15, 10];

/// OS-level notification boundary. Click-to-foreground is the host shell's
/// affair and carries no structured payload beyond title and body.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub entity_id: String,
    pub title: String,
    pub body: String,
    pub minutes_left: i64,
}

/// Scans every time-bearing entity and returns the alerts due at `now`.
///
/// "Minutes until" is floored integer division, so a 30-second tick observes
/// each whole-minute offset at least once regardless of timer drift. A fired
/// `(entity, offset)` pair is recorded in `fired` before delivery and never
/// fires again for the process lifetime.
pub fn due_alerts(
    state: &AppState,
    now: NaiveDateTime,
    offsets_min: &[i64],
    fired: &mut HashSet<String>,
) -> Vec<Alert> {
    let mut due = Vec::new();

    for entry in &state.schedules.entries {
        if entry.done {
            continue;
        }
        let Some(target) = parse_date_time(&entry.date, &entry.start_time) else {
            continue;
        };
        push_if_due(
            &mut due,
            fired,
            offsets_min,
            now,
            target,
            &entry.id,
            &entry.text,
            &entry.start_time,
        );
    }

    for widget in &state.widgets.widgets {
        let Some(time) = widget.target_time.as_deref() else {
            continue;
        };
        // A widget's target time is read as "today".
        let Some(target) = parse_time_today(now.date(), time) else {
            continue;
        };
        push_if_due(
            &mut due, fired, offsets_min, now, target, &widget.id, &widget.title, time,
        );
    }

    due
}

#[allow(clippy::too_many_arguments)]
fn push_if_due(
    due: &mut Vec<Alert>,
    fired: &mut HashSet<String>,
    offsets_min: &[i64],
    now: NaiveDateTime,
    target: NaiveDateTime,
    entity_id: &str,
    label: &str,
    starts_at: &str,
) {
    let minutes_left = (target - now).num_seconds().div_euclid(60);
    if !offsets_min.contains(&minutes_left) {
        return;
    }
    let key = format!("{entity_id}-{minutes_left}");
    if !fired.insert(key) {
        return;
    }
    due.push(Alert {
        entity_id: entity_id.to_string(),
        title: format!("Upcoming: {label}"),
        body: format!("Starts at {starts_at} (in {minutes_left} minutes)"),
        minutes_left,
    });
}

fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(date.and_time(time))
}

fn parse_time_today(today: NaiveDate, time: &str) -> Option<NaiveDateTime> {
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(today.and_time(time))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::state::ScheduleEntry;
    use crate::state::Widget;

    fn entry(id: &str, text: &str, date: &str, start_time: &str) -> ScheduleEntry {
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

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").expect("valid datetime")
    }

    #[test]
    fn fires_at_each_offset_exactly_once() {
        let mut state = AppState::default();
        state
            .schedules
            .entries
            .push(entry("s1", "PT", "2026-01-05", "19:00"));
        let mut fired = HashSet::new();

        let first = due_alerts(
            &state,
            at("2026-01-05 18:44:30"),
            &DEFAULT_ALERT_OFFSETS_MIN,
            &mut fired,
        );
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].minutes_left, 15);

        // The next tick still floors to 15; the dedup key must hold it back.
        let second = due_alerts(
            &state,
            at("2026-01-05 18:45:00"),
            &DEFAULT_ALERT_OFFSETS_MIN,
            &mut fired,
        );
        assert_eq!(second, Vec::new());
    }

    #[test]
    fn floored_minutes_cover_intra_minute_ticks() {
        let mut state = AppState::default();
        state
            .schedules
            .entries
            .push(entry("s1", "Standup", "2026-01-05", "10:00"));
        let mut fired = HashSet::new();

        // 10 minutes and 40 seconds before start floors to 10.
        let due = due_alerts(
            &state,
            at("2026-01-05 09:49:20"),
            &DEFAULT_ALERT_OFFSETS_MIN,
            &mut fired,
        );
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].minutes_left, 10);
    }

    #[test]
    fn separate_offsets_fire_separately() {
        let mut state = AppState::default();
        state
            .schedules
            .entries
            .push(entry("s1", "PT", "2026-01-05", "19:00"));
        let mut fired = HashSet::new();

        assert_eq!(
            due_alerts(
                &state,
                at("2026-01-05 18:30:00"),
                &DEFAULT_ALERT_OFFSETS_MIN,
                &mut fired
            )
            .len(),
            1
        );
        assert_eq!(
            due_alerts(
                &state,
                at("2026-01-05 18:45:00"),
                &DEFAULT_ALERT_OFFSETS_MIN,
                &mut fired
            )
            .len(),
            1
        );
        assert_eq!(fired.len(), 2);
    }

    #[test]
    fn widget_target_time_is_read_as_today() {
        let mut state = AppState::default();
        state.widgets.widgets.push(Widget {
            id: "w1".to_string(),
            kind: "clock".to_string(),
            title: "Medication".to_string(),
            content: None,
            url: None,
            target_time: Some("21:00".to_string()),
            color: "rose".to_string(),
            data: None,
        });
        let mut fired = HashSet::new();

        let due = due_alerts(
            &state,
            at("2026-01-05 20:30:00"),
            &DEFAULT_ALERT_OFFSETS_MIN,
            &mut fired,
        );
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].entity_id, "w1");
        assert_eq!(due[0].minutes_left, 30);
    }

    #[test]
    fn done_entries_and_unparsable_times_are_skipped() {
        let mut state = AppState::default();
        let mut finished = entry("s1", "PT", "2026-01-05", "19:00");
        finished.done = true;
        state.schedules.entries.push(finished);
        state
            .schedules
            .entries
            .push(entry("s2", "???", "someday", "soon"));
        let mut fired = HashSet::new();

        let due = due_alerts(
            &state,
            at("2026-01-05 18:45:00"),
            &DEFAULT_ALERT_OFFSETS_MIN,
            &mut fired,
        );
        assert_eq!(due, Vec::new());
    }
}

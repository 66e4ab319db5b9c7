use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Day,
    Night,
    Off,
}

impl Shift {
    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "day shift",
            Self::Night => "night shift",
            Self::Off => "off",
        }
    }

    /// Working hours as (start, end); overnight for the night shift.
    pub fn hours(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Day => Some(("07:30", "19:30")),
            Self::Night => Some(("19:30", "07:30")),
            Self::Off => None,
        }
    }
}

use Shift::Day;
use Shift::Night;
use Shift::Off;

/// The 28-day rotation every operations group cycles through, offset by the
/// group's anchor date.
pub const SHIFT_PATTERN: [Shift; 28] = [
    Day, Day, Off, Off, Off, //
    Night, Night, Off, Off, //
    Day, Day, Day, Off, Off, //
    Night, Night, Off, Off, Off, //
    Day, Day, Off, Off, //
    Night, Night, Night, Off, Off,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftGroup {
    pub name: &'static str,
    pub anchor: (i32, u32, u32),
}

pub const SHIFT_GROUPS: [ShiftGroup; 4] = [
    ShiftGroup {
        name: "ops-1",
        anchor: (2025, 3, 5),
    },
    ShiftGroup {
        name: "ops-2",
        anchor: (2025, 3, 26),
    },
    ShiftGroup {
        name: "ops-3",
        anchor: (2025, 3, 12),
    },
    ShiftGroup {
        name: "ops-4",
        anchor: (2025, 3, 19),
    },
];

/// Shift worked by `group` on `date`, or `None` for an unknown group.
pub fn shift_for_date(group: &str, date: NaiveDate) -> Option<Shift> {
    let group = SHIFT_GROUPS
        .iter()
        .find(|candidate| candidate.name == group.trim())?;
    let (year, month, day) = group.anchor;
    let anchor = NaiveDate::from_ymd_opt(year, month, day)?;
    let offset = (date - anchor).num_days().rem_euclid(SHIFT_PATTERN.len() as i64);
    Some(SHIFT_PATTERN[offset as usize])
}

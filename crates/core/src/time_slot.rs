//! Time slot identifiers and the bookable slot window.
//!
//! Venue bookings reserve hourly slots (`slot_2025-04-28_14`); package
//! bookings reserve a whole day (`day_2025-04-30`).

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::CoreError;

/// First bookable hour of the day (08:00).
pub const FIRST_HOUR: u8 = 8;

/// Bookable hours end at 18:00; the last slot starts at 17:00.
pub const END_HOUR: u8 = 18;

/// Number of days covered by a slot window.
pub const WINDOW_DAYS: i64 = 7;

const HOUR_PREFIX: &str = "slot_";
const DAY_PREFIX: &str = "day_";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed slot id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRef {
    Hour { date: NaiveDate, hour: u8 },
    Day { date: NaiveDate },
}

impl SlotRef {
    pub fn date(&self) -> NaiveDate {
        match self {
            SlotRef::Hour { date, .. } | SlotRef::Day { date } => *date,
        }
    }

    pub fn is_whole_day(&self) -> bool {
        matches!(self, SlotRef::Day { .. })
    }

    /// Two slots clash when they cover the same hour, or when either one is a
    /// whole day and both fall on the same date.
    pub fn clashes_with(&self, other: &SlotRef) -> bool {
        match (self, other) {
            (SlotRef::Hour { date: d1, hour: h1 }, SlotRef::Hour { date: d2, hour: h2 }) => {
                d1 == d2 && h1 == h2
            }
            _ => self.date() == other.date(),
        }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRef::Hour { date, hour } => {
                write!(f, "{HOUR_PREFIX}{}_{hour}", date.format(DATE_FORMAT))
            }
            SlotRef::Day { date } => write!(f, "{DAY_PREFIX}{}", date.format(DATE_FORMAT)),
        }
    }
}

impl FromStr for SlotRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid time slot '{s}'"));

        if let Some(rest) = s.strip_prefix(DAY_PREFIX) {
            let date = NaiveDate::parse_from_str(rest, DATE_FORMAT).map_err(|_| invalid())?;
            return Ok(SlotRef::Day { date });
        }

        let rest = s.strip_prefix(HOUR_PREFIX).ok_or_else(invalid)?;
        let (date_str, hour_str) = rest.rsplit_once('_').ok_or_else(invalid)?;
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| invalid())?;
        let hour: u8 = hour_str.parse().map_err(|_| invalid())?;
        if !(FIRST_HOUR..END_HOUR).contains(&hour) {
            return Err(CoreError::Validation(format!(
                "Time slot '{s}' is outside bookable hours ({FIRST_HOUR}:00-{END_HOUR}:00)"
            )));
        }
        Ok(SlotRef::Hour { date, hour })
    }
}

/// True if any slot in `a` clashes with any slot in `b`.
pub fn any_clash(a: &[SlotRef], b: &[SlotRef]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.clashes_with(y)))
}

/// A bookable hourly slot as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// Generate the hourly slot window starting at `start`.
///
/// A slot is unavailable when it clashes with any slot in `held`. Fails with
/// `Validation` when the window runs past the last representable date.
pub fn slot_window(start: NaiveDate, held: &[SlotRef]) -> Result<Vec<TimeSlot>, CoreError> {
    let mut slots = Vec::with_capacity((WINDOW_DAYS as usize) * usize::from(END_HOUR - FIRST_HOUR));
    for day in 0..WINDOW_DAYS {
        let date = start.checked_add_days(Days::new(day as u64)).ok_or_else(|| {
            CoreError::Validation(format!("Slot window starting {start} is out of range"))
        })?;
        for hour in FIRST_HOUR..END_HOUR {
            let slot = SlotRef::Hour { date, hour };
            slots.push(TimeSlot {
                id: slot.to_string(),
                date,
                start_time: format!("{hour}:00"),
                end_time: format!("{}:00", hour + 1),
                is_available: !held.iter().any(|h| h.clashes_with(&slot)),
            });
        }
    }
    Ok(slots)
}

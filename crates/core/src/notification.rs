//! Notification kinds and the messages generated for booking events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(NotificationKind::Info),
            "warning" => Ok(NotificationKind::Warning),
            "success" => Ok(NotificationKind::Success),
            "error" => Ok(NotificationKind::Error),
            other => Err(CoreError::Validation(format!(
                "Unknown notification kind '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, CoreError> {
        value.parse()
    }
}

/// Title, body, and kind of a notification about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Notice sent to admins when a booking request arrives.
pub fn booking_submitted(venue_name: &str, purpose: &str, high_priority: bool) -> NotificationDraft {
    if high_priority {
        NotificationDraft {
            kind: NotificationKind::Warning,
            title: "High-priority booking request".to_string(),
            message: format!(
                "A faculty-recommended request for {venue_name} ({purpose}) needs your approval"
            ),
        }
    } else {
        NotificationDraft {
            kind: NotificationKind::Info,
            title: "New booking request".to_string(),
            message: format!("A request for {venue_name} ({purpose}) needs your approval"),
        }
    }
}

/// Notice sent to the booking owner once an admin approves it.
pub fn booking_approved(venue_name: &str, comment: &str) -> NotificationDraft {
    NotificationDraft {
        kind: NotificationKind::Success,
        title: "Booking Approved".to_string(),
        message: format!("Your {venue_name} booking has been approved: {comment}"),
    }
}

/// Notice sent to the booking owner once an admin rejects it.
pub fn booking_rejected(venue_name: &str, comment: &str) -> NotificationDraft {
    NotificationDraft {
        kind: NotificationKind::Error,
        title: "Booking Rejected".to_string(),
        message: format!("Your request for {venue_name} has been declined: {comment}"),
    }
}

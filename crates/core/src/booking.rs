//! Booking lifecycle: statuses, categories, submission rules, and the
//! admin decision state machine.
//!
//! ```text
//! submit ──┬─ recommendation ──> high-priority ──┐
//!          └─ none ────────────> pending ────────┴─ approve ─> approved
//!                                                └─ reject ──> rejected
//! ```
//!
//! `pending` and `high-priority` are open; `approved` and `rejected` are
//! terminal. Every transition takes the acting [`Role`] so role-gating is part
//! of the contract rather than a presentation concern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{EventPackage, Venue};
use crate::error::CoreError;
use crate::roles::Role;
use crate::time_slot::SlotRef;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_HIGH_PRIORITY: &str = "high-priority";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    HighPriority,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::HighPriority,
        BookingStatus::Approved,
        BookingStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => STATUS_PENDING,
            BookingStatus::HighPriority => STATUS_HIGH_PRIORITY,
            BookingStatus::Approved => STATUS_APPROVED,
            BookingStatus::Rejected => STATUS_REJECTED,
        }
    }

    /// Open bookings still await an admin decision.
    pub fn is_open(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::HighPriority)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown booking status '{s}'")))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Status a new booking starts in.
///
/// A non-blank faculty recommendation fast-tracks the request.
pub fn initial_status(faculty_recommendation: Option<&str>) -> BookingStatus {
    match faculty_recommendation {
        Some(text) if !text.trim().is_empty() => BookingStatus::HighPriority,
        _ => BookingStatus::Pending,
    }
}

// ---------------------------------------------------------------------------
// Category and target
// ---------------------------------------------------------------------------

/// Coarse partition used by the admin review queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingCategory {
    /// Lecture theatres and classrooms.
    Lecture,
    /// Labs, the multi-purpose hall, and every event package.
    Event,
}

impl BookingCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingCategory::Lecture => "lecture",
            BookingCategory::Event => "event",
        }
    }
}

impl FromStr for BookingCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lecture" => Ok(BookingCategory::Lecture),
            "event" => Ok(BookingCategory::Event),
            other => Err(CoreError::Validation(format!(
                "Unknown booking category '{other}'. Must be one of: lecture, event"
            ))),
        }
    }
}

impl TryFrom<String> for BookingCategory {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether a booking was made against a single venue or an event package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Venue,
    Package,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Venue => "venue",
            TargetKind::Package => "package",
        }
    }
}

impl FromStr for TargetKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venue" => Ok(TargetKind::Venue),
            "package" => Ok(TargetKind::Package),
            other => Err(CoreError::Validation(format!("Unknown target kind '{other}'"))),
        }
    }
}

impl TryFrom<String> for TargetKind {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The bookable thing a submission points at, resolved from the catalog.
#[derive(Debug, Clone, Copy)]
pub enum BookingTarget {
    Venue(&'static Venue),
    Package(&'static EventPackage),
}

impl BookingTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            BookingTarget::Venue(_) => TargetKind::Venue,
            BookingTarget::Package(_) => TargetKind::Package,
        }
    }

    /// Id copied into the booking's `venue_id` column.
    pub fn id(&self) -> DbId {
        match self {
            BookingTarget::Venue(v) => v.id,
            BookingTarget::Package(p) => p.id,
        }
    }

    /// Name copied into the booking's `venue_name` column.
    pub fn name(&self) -> &'static str {
        match self {
            BookingTarget::Venue(v) => v.name,
            BookingTarget::Package(p) => p.name,
        }
    }

    pub fn category(&self) -> BookingCategory {
        match self {
            BookingTarget::Venue(v) => v.venue_type.category(),
            BookingTarget::Package(_) => BookingCategory::Event,
        }
    }
}

// ---------------------------------------------------------------------------
// Embedded records
// ---------------------------------------------------------------------------

/// Faculty endorsement attached at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRecommendation {
    /// Set when a faculty member submits a recommendation naming themselves.
    pub faculty_id: Option<DbId>,
    pub faculty_name: String,
    pub comment: String,
}

impl FacultyRecommendation {
    /// Build a recommendation from free text naming the recommending faculty.
    ///
    /// `submitter` is the faculty member making the request, if any; their id
    /// is recorded only when the text names them (case-insensitive). Returns
    /// `None` for blank text.
    pub fn from_text(text: Option<&str>, submitter: Option<(DbId, &str)>) -> Option<Self> {
        let name = text.map(str::trim).filter(|t| !t.is_empty())?;
        let faculty_id = submitter
            .filter(|(_, own_name)| own_name.trim().eq_ignore_ascii_case(name))
            .map(|(id, _)| id);
        Some(Self {
            faculty_id,
            faculty_name: name.to_string(),
            comment: format!("Recommended by {name}"),
        })
    }
}

/// Admin decision record. Written once, never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFeedback {
    pub admin_id: DbId,
    pub comment: String,
    pub date: Timestamp,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// Reject actors that may not create bookings.
pub fn ensure_can_submit(actor: Role) -> Result<(), CoreError> {
    if actor.can_submit_bookings() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{actor}' cannot submit bookings"
        )))
    }
}

/// Fields of a submission that are checked before anything is written.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionCheck<'a> {
    pub target: BookingTarget,
    pub purpose: &'a str,
    pub description: &'a str,
    pub target_audience: &'a str,
    pub attendees: i32,
    pub time_slots: &'a [String],
}

/// Validate a submission and return the parsed slot references.
///
/// Capacity is a hard rule: a venue booking may not exceed the venue's
/// capacity and a package booking must fall within the package bounds.
pub fn validate_submission(check: &SubmissionCheck<'_>) -> Result<Vec<SlotRef>, CoreError> {
    require_non_blank("purpose", check.purpose)?;
    require_non_blank("description", check.description)?;
    require_non_blank("target_audience", check.target_audience)?;

    if check.attendees < 1 {
        return Err(CoreError::Validation(
            "attendees must be at least 1".to_string(),
        ));
    }

    match check.target {
        BookingTarget::Venue(venue) => {
            if check.attendees > venue.capacity {
                return Err(CoreError::Validation(format!(
                    "{} attendees exceeds the capacity of {} ({})",
                    check.attendees, venue.name, venue.capacity
                )));
            }
        }
        BookingTarget::Package(package) => {
            if check.attendees < package.min_attendees || check.attendees > package.max_attendees
            {
                return Err(CoreError::Validation(format!(
                    "{} requires between {} and {} attendees, got {}",
                    package.name, package.min_attendees, package.max_attendees, check.attendees
                )));
            }
        }
    }

    if check.time_slots.is_empty() {
        return Err(CoreError::Validation(
            "at least one time slot is required".to_string(),
        ));
    }

    let slots = check
        .time_slots
        .iter()
        .map(|id| id.parse::<SlotRef>())
        .collect::<Result<Vec<_>, _>>()?;

    match check.target.kind() {
        TargetKind::Venue => {
            if slots.iter().any(|s| s.is_whole_day()) {
                return Err(CoreError::Validation(
                    "venue bookings take hourly slots only".to_string(),
                ));
            }
        }
        TargetKind::Package => {
            if slots.len() != 1 || !slots[0].is_whole_day() {
                return Err(CoreError::Validation(
                    "package bookings take exactly one whole-day slot".to_string(),
                ));
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    if !slots.iter().all(|s| seen.insert(*s)) {
        return Err(CoreError::Validation("duplicate time slot".to_string()));
    }

    Ok(slots)
}

fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Approve / reject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> BookingStatus {
        match self {
            Decision::Approve => BookingStatus::Approved,
            Decision::Reject => BookingStatus::Rejected,
        }
    }
}

/// Apply an admin decision to a booking in status `current`.
///
/// Checks, in order: the actor is an admin, the comment is non-blank, and the
/// booking is still open. Returns the new status.
pub fn decide(
    actor: Role,
    current: BookingStatus,
    decision: Decision,
    comment: &str,
) -> Result<BookingStatus, CoreError> {
    if !actor.can_adjudicate() {
        return Err(CoreError::Forbidden(
            "Admin role required to approve or reject bookings".to_string(),
        ));
    }
    require_non_blank("comment", comment)?;

    let next = decision.target_status();
    if current.is_terminal() {
        return Err(CoreError::InvalidTransition {
            from: current.to_string(),
            to: next.to_string(),
        });
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::catalog;

    fn slots(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn venue_check<'a>(venue_id: DbId, attendees: i32, time_slots: &'a [String]) -> SubmissionCheck<'a> {
        SubmissionCheck {
            target: BookingTarget::Venue(catalog::find_venue(venue_id).unwrap()),
            purpose: "Club Meeting",
            description: "Weekly meeting of the Robotics Club",
            target_audience: "2nd Year",
            attendees,
            time_slots,
        }
    }

    // -----------------------------------------------------------------------
    // Initial status
    // -----------------------------------------------------------------------

    #[test]
    fn recommendation_makes_booking_high_priority() {
        assert_eq!(initial_status(Some("Dr. Rao")), BookingStatus::HighPriority);
    }

    #[test]
    fn missing_or_blank_recommendation_is_pending() {
        assert_eq!(initial_status(None), BookingStatus::Pending);
        assert_eq!(initial_status(Some("")), BookingStatus::Pending);
        assert_eq!(initial_status(Some("   ")), BookingStatus::Pending);
    }

    #[test]
    fn recommendation_from_text_trims_and_formats_comment() {
        let rec = FacultyRecommendation::from_text(Some("  Dr. Rao "), None).unwrap();
        assert_eq!(rec.faculty_name, "Dr. Rao");
        assert_eq!(rec.comment, "Recommended by Dr. Rao");
        assert!(FacultyRecommendation::from_text(Some(" "), None).is_none());
    }

    #[test]
    fn recommendation_records_the_submitter_only_when_it_names_them() {
        let own = FacultyRecommendation::from_text(Some("dr. rao"), Some((4, "Dr. Rao "))).unwrap();
        assert_eq!(own.faculty_id, Some(4));

        let other = FacultyRecommendation::from_text(Some("Dr. Iyer"), Some((4, "Dr. Rao"))).unwrap();
        assert_eq!(other.faculty_id, None);
        assert_eq!(other.faculty_name, "Dr. Iyer");
    }

    // -----------------------------------------------------------------------
    // Status parsing
    // -----------------------------------------------------------------------

    #[test]
    fn status_wire_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::HighPriority).unwrap(),
            "\"high-priority\""
        );
        assert_eq!(
            "high-priority".parse::<BookingStatus>().unwrap(),
            BookingStatus::HighPriority
        );
        assert!("high_priority".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn open_and_terminal_sets_are_disjoint() {
        for status in BookingStatus::ALL {
            assert_ne!(status.is_open(), status.is_terminal());
        }
        assert!(BookingStatus::Pending.is_open());
        assert!(BookingStatus::HighPriority.is_open());
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    #[test]
    fn lecture_theatres_and_classrooms_are_lecture_category() {
        for venue in catalog::venues() {
            let expected = if venue.name.contains("LT") || venue.name.contains("CR") {
                BookingCategory::Lecture
            } else {
                BookingCategory::Event
            };
            assert_eq!(BookingTarget::Venue(venue).category(), expected, "{}", venue.name);
        }
    }

    #[test]
    fn packages_are_event_category() {
        for package in catalog::packages() {
            assert_eq!(BookingTarget::Package(package).category(), BookingCategory::Event);
        }
    }

    // -----------------------------------------------------------------------
    // Submission validation
    // -----------------------------------------------------------------------

    #[test]
    fn valid_venue_submission_passes() {
        let ts = slots(&["slot_2025-04-28_14"]);
        let parsed = validate_submission(&venue_check(1, 45, &ts)).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn blank_purpose_is_rejected() {
        let ts = slots(&["slot_2025-04-28_14"]);
        let mut check = venue_check(1, 45, &ts);
        check.purpose = "  ";
        let err = validate_submission(&check).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("purpose"));
    }

    #[test]
    fn attendees_over_capacity_is_rejected() {
        let ts = slots(&["slot_2025-04-28_14"]);
        // CL1 seats 40.
        let err = validate_submission(&venue_check(4, 41, &ts)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("capacity"));
    }

    #[test]
    fn attendees_at_capacity_passes() {
        let ts = slots(&["slot_2025-04-28_14"]);
        assert!(validate_submission(&venue_check(4, 40, &ts)).is_ok());
    }

    #[test]
    fn zero_attendees_is_rejected() {
        let ts = slots(&["slot_2025-04-28_14"]);
        assert_matches!(
            validate_submission(&venue_check(1, 0, &ts)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_slot_list_is_rejected() {
        assert_matches!(
            validate_submission(&venue_check(1, 10, &[])),
            Err(CoreError::Validation(msg)) if msg.contains("time slot")
        );
    }

    #[test]
    fn venue_rejects_whole_day_slot() {
        let ts = slots(&["day_2025-04-28"]);
        assert_matches!(
            validate_submission(&venue_check(1, 10, &ts)),
            Err(CoreError::Validation(msg)) if msg.contains("hourly")
        );
    }

    #[test]
    fn duplicate_slots_are_rejected() {
        let ts = slots(&["slot_2025-04-28_14", "slot_2025-04-28_14"]);
        assert_matches!(
            validate_submission(&venue_check(1, 10, &ts)),
            Err(CoreError::Validation(msg)) if msg.contains("duplicate")
        );
    }

    #[test]
    fn package_bounds_are_enforced() {
        let package = catalog::find_package(1).unwrap();
        let ts = slots(&["day_2025-04-30"]);
        let mut check = SubmissionCheck {
            target: BookingTarget::Package(package),
            purpose: "Tech Fest",
            description: "Annual technical festival",
            target_audience: "All College Students",
            attendees: 29,
            time_slots: &ts,
        };
        assert_matches!(validate_submission(&check), Err(CoreError::Validation(_)));

        check.attendees = 151;
        assert_matches!(validate_submission(&check), Err(CoreError::Validation(_)));

        check.attendees = 30;
        assert!(validate_submission(&check).is_ok());
    }

    #[test]
    fn package_requires_exactly_one_day_slot() {
        let package = catalog::find_package(2).unwrap();
        let ts = slots(&["slot_2025-04-30_9"]);
        let check = SubmissionCheck {
            target: BookingTarget::Package(package),
            purpose: "Conference",
            description: "Department conference",
            target_audience: "CS",
            attendees: 200,
            time_slots: &ts,
        };
        assert_matches!(
            validate_submission(&check),
            Err(CoreError::Validation(msg)) if msg.contains("whole-day")
        );
    }

    #[test]
    fn admins_cannot_submit() {
        assert_matches!(ensure_can_submit(Role::Admin), Err(CoreError::Forbidden(_)));
        assert!(ensure_can_submit(Role::Student).is_ok());
        assert!(ensure_can_submit(Role::Faculty).is_ok());
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    #[test]
    fn admin_can_approve_and_reject_open_bookings() {
        for open in [BookingStatus::Pending, BookingStatus::HighPriority] {
            assert_eq!(
                decide(Role::Admin, open, Decision::Approve, "ok").unwrap(),
                BookingStatus::Approved
            );
            assert_eq!(
                decide(Role::Admin, open, Decision::Reject, "Room conflict").unwrap(),
                BookingStatus::Rejected
            );
        }
    }

    #[test]
    fn terminal_bookings_cannot_be_decided_again() {
        for terminal in [BookingStatus::Approved, BookingStatus::Rejected] {
            for decision in [Decision::Approve, Decision::Reject] {
                assert_matches!(
                    decide(Role::Admin, terminal, decision, "again"),
                    Err(CoreError::InvalidTransition { .. })
                );
            }
        }
    }

    #[test]
    fn non_admins_cannot_decide() {
        for role in [Role::Student, Role::Faculty] {
            assert_matches!(
                decide(role, BookingStatus::Pending, Decision::Approve, "ok"),
                Err(CoreError::Forbidden(_))
            );
        }
    }

    #[test]
    fn blank_comment_is_rejected() {
        assert_matches!(
            decide(Role::Admin, BookingStatus::Pending, Decision::Reject, " "),
            Err(CoreError::Validation(msg)) if msg.contains("comment")
        );
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = decide(Role::Admin, BookingStatus::Rejected, Decision::Approve, "x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition: rejected -> approved");
    }
}

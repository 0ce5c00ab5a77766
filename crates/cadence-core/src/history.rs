//! Per-ticket audit log entries.
//!
//! The history log is append-only: undoing a status change appends a new
//! entry recording the reversal rather than deleting the original. The one
//! operation that shrinks the log is unassignment, which truncates entries
//! dated after the unassignment timestamp (see
//! [`crate::model::ticket::Ticket::truncate_history_after`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ticket::Status;

/// The recorded action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "ASSIGNED")]
    Assigned,
    #[serde(rename = "DE-ASSIGNED")]
    DeAssigned,
    #[serde(rename = "STATUS_CHANGED")]
    StatusChanged,
    #[serde(rename = "ADDED_TO_MILESTONE")]
    AddedToMilestone,
}

/// One audit log entry.
///
/// Field order matches the rendered history view: milestone and the from/to
/// pair are only present for the action kinds that carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Status>,
    pub by: String,
    pub timestamp: NaiveDate,
    pub action: ActionKind,
}

impl TicketAction {
    /// An assignment to a developer.
    #[must_use]
    pub fn assigned(developer: impl Into<String>, timestamp: NaiveDate) -> Self {
        Self {
            milestone: None,
            from: None,
            to: None,
            by: developer.into(),
            timestamp,
            action: ActionKind::Assigned,
        }
    }

    /// An unassignment.
    #[must_use]
    pub fn de_assigned(developer: impl Into<String>, timestamp: NaiveDate) -> Self {
        Self {
            milestone: None,
            from: None,
            to: None,
            by: developer.into(),
            timestamp,
            action: ActionKind::DeAssigned,
        }
    }

    /// A status transition, recording both endpoints.
    #[must_use]
    pub fn status_changed(
        from: Status,
        to: Status,
        by: impl Into<String>,
        timestamp: NaiveDate,
    ) -> Self {
        Self {
            milestone: None,
            from: Some(from),
            to: Some(to),
            by: by.into(),
            timestamp,
            action: ActionKind::StatusChanged,
        }
    }

    /// Membership in a newly created milestone.
    #[must_use]
    pub fn added_to_milestone(
        milestone: impl Into<String>,
        manager: impl Into<String>,
        timestamp: NaiveDate,
    ) -> Self {
        Self {
            milestone: Some(milestone.into()),
            from: None,
            to: None,
            by: manager.into(),
            timestamp,
            action: ActionKind::AddedToMilestone,
        }
    }

    /// Whether this entry records a status transition.
    #[must_use]
    pub const fn is_status_change(&self) -> bool {
        matches!(self.action, ActionKind::StatusChanged)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionKind, TicketAction};
    use crate::model::ticket::Status;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).expect("valid date")
    }

    #[test]
    fn constructors_fill_the_right_fields() {
        let assigned = TicketAction::assigned("dana", day(3));
        assert_eq!(assigned.action, ActionKind::Assigned);
        assert_eq!(assigned.by, "dana");
        assert!(assigned.from.is_none() && assigned.to.is_none());

        let change = TicketAction::status_changed(Status::Open, Status::InProgress, "dana", day(3));
        assert!(change.is_status_change());
        assert_eq!(change.from, Some(Status::Open));
        assert_eq!(change.to, Some(Status::InProgress));

        let added = TicketAction::added_to_milestone("launch", "mira", day(4));
        assert_eq!(added.milestone.as_deref(), Some("launch"));
        assert_eq!(added.action, ActionKind::AddedToMilestone);
    }

    #[test]
    fn wire_names_include_the_dashed_variant() {
        let entry = TicketAction::de_assigned("dana", day(3));
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["action"], "DE-ASSIGNED");
        assert_eq!(json["timestamp"], "2024-05-03");
        // Absent optional fields are omitted, not null.
        assert!(json.get("from").is_none());
        assert!(json.get("milestone").is_none());
    }
}

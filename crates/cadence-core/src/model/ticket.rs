use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::history::TicketAction;
use crate::model::user::ExpertiseArea;

/// Ticket identifiers are sequential integers handed out by the engine.
pub type TicketId = u32;

/// The three kinds of ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    Bug,
    FeatureRequest,
    UiFeedback,
}

impl TicketType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "BUG",
            Self::FeatureRequest => "FEATURE_REQUEST",
            Self::UiFeedback => "UI_FEEDBACK",
        }
    }
}

/// Business priority scale. Totally ordered; escalation only ever moves
/// forward (undo is the one exception, and it goes through the history log).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// One escalation step. Saturates at CRITICAL.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }
}

/// Ticket lifecycle states. Totally ordered; `next()` saturates at CLOSED so
/// advancing a closed ticket is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }

    /// The next lifecycle step. Saturates at CLOSED.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Open => Self::InProgress,
            Self::InProgress => Self::Resolved,
            Self::Resolved | Self::Closed => Self::Closed,
        }
    }

    /// Terminal states: neither forced escalation nor due-date escalation
    /// touches tickets that are already resolved or closed.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

/// A single comment. The owning ticket keeps comments most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub content: String,
    pub author: String,
    pub created_at: NaiveDate,
}

/// Creation payload for a ticket, before the engine assigns an id and a
/// creation date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub kind: TicketType,
    pub title: String,
    pub priority: Priority,
    pub expertise_area: ExpertiseArea,
    pub description: String,
    /// `None` marks an anonymous report.
    pub reported_by: Option<String>,
}

/// A tracked ticket and all of its bookkeeping.
///
/// Tickets live in the engine's central store and are referenced by id from
/// the reporter's collection, the assignee's collection, and any milestone
/// that contains them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub kind: TicketType,
    pub title: String,
    pub priority: Priority,
    pub status: Status,
    pub expertise_area: ExpertiseArea,
    pub description: String,
    pub reported_by: Option<String>,
    pub created_at: NaiveDate,
    pub assigned_at: Option<NaiveDate>,
    pub solved_at: Option<NaiveDate>,
    pub assigned_to: Option<String>,
    /// Stamped on the first transition into RESOLVED, never overwritten.
    pub first_solved_at: Option<NaiveDate>,
    /// Inclusive day count from assignment to resolution; 0 until computed.
    pub days_to_resolve: i64,
    /// Most-recent-first.
    pub comments: Vec<Comment>,
    /// Append-only audit log.
    pub history: Vec<TicketAction>,
}

impl Ticket {
    /// Materialize a draft into a stored ticket.
    #[must_use]
    pub fn from_draft(id: TicketId, draft: TicketDraft, created_at: NaiveDate) -> Self {
        Self {
            id,
            kind: draft.kind,
            title: draft.title,
            priority: draft.priority,
            status: Status::Open,
            expertise_area: draft.expertise_area,
            description: draft.description,
            reported_by: draft.reported_by,
            created_at,
            assigned_at: None,
            solved_at: None,
            assigned_to: None,
            first_solved_at: None,
            days_to_resolve: 0,
            comments: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Whether the ticket currently has an assignee.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.assigned_to.is_some()
    }

    /// Apply a status value and its resolution bookkeeping.
    ///
    /// This is the field-level half of a status change; the engine layers the
    /// unblock cascade on top when a ticket closes. Entering RESOLVED stamps
    /// `solved_at` every time but `first_solved_at` only once. Entering
    /// RESOLVED or CLOSED with both endpoint dates present computes
    /// `days_to_resolve` as the inclusive day count, floored at zero.
    pub fn record_status(&mut self, new: Status, today: NaiveDate) {
        self.status = new;

        if new == Status::Resolved {
            self.solved_at = Some(today);
            if self.first_solved_at.is_none() {
                self.first_solved_at = Some(today);
            }
        }

        if matches!(new, Status::Resolved | Status::Closed) {
            if let (Some(assigned), Some(solved)) = (self.assigned_at, self.solved_at) {
                let days = (solved - assigned).num_days().abs() + 1;
                self.days_to_resolve = days.max(0);
            }
        }
    }

    /// Insert a comment at the front (most recent).
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }

    /// Remove and return the most recent comment.
    pub fn remove_last_comment(&mut self) -> Option<Comment> {
        if self.comments.is_empty() {
            None
        } else {
            Some(self.comments.remove(0))
        }
    }

    /// Append an action to the audit log.
    pub fn push_action(&mut self, action: TicketAction) {
        self.history.push(action);
    }

    /// Most recent STATUS_CHANGED entry, scanning backward.
    #[must_use]
    pub fn last_status_change(&self) -> Option<&TicketAction> {
        self.history.iter().rev().find(|a| a.is_status_change())
    }

    /// Drop every history entry dated strictly after `cutoff`.
    ///
    /// Truncation compares dates, not log positions, so entries stamped on
    /// the cutoff day itself always survive.
    pub fn truncate_history_after(&mut self, cutoff: NaiveDate) {
        self.history.retain(|action| action.timestamp <= cutoff);
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BUG" => Ok(Self::Bug),
            "FEATURE_REQUEST" => Ok(Self::FeatureRequest),
            "UI_FEEDBACK" => Ok(Self::UiFeedback),
            _ => Err(ParseEnumError {
                expected: "ticket type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "RESOLVED" => Ok(Self::Resolved),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

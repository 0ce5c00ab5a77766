use thiserror::Error;

use crate::model::ticket::TicketId;
use crate::model::user::Role;

/// A recoverable validation failure.
///
/// Rejections are descriptive, user-facing reasons attached to a command's
/// result. They are never fatal and they guarantee that no entity state was
/// mutated by the rejected operation. Operations on entities that simply do
/// not exist are not rejections — those are silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Only OPEN tickets can be assigned.")]
    TicketNotOpen,

    #[error(
        "Developer {developer} cannot assign ticket {ticket} due to expertise area. \
         Required: {required}; Current: {current}."
    )]
    ExpertiseMismatch {
        developer: String,
        ticket: TicketId,
        /// Sorted, comma-separated acceptable developer areas.
        required: String,
        current: String,
    },

    #[error(
        "Developer {developer} cannot assign ticket {ticket} due to seniority level. \
         Required: {required}; Current: {current}."
    )]
    SeniorityMismatch {
        developer: String,
        ticket: TicketId,
        /// Sorted, comma-separated acceptable seniority levels.
        required: String,
        current: String,
    },

    #[error("Cannot assign ticket {ticket} from blocked milestone {milestone}.")]
    MilestoneBlocked { ticket: TicketId, milestone: String },

    #[error("Developer {developer} is not assigned to milestone {milestone}.")]
    NotOnMilestoneRoster { developer: String, milestone: String },

    #[error("Ticket {ticket} is not assigned.")]
    TicketNotAssigned { ticket: TicketId },

    #[error("Ticket {ticket} is not assigned to developer {developer}.")]
    ForeignTicket { ticket: TicketId, developer: String },

    #[error("Ticket {ticket} is not assigned to the developer {developer}.")]
    ForeignTicketComment { ticket: TicketId, developer: String },

    #[error("Comments are not allowed on anonymous tickets.")]
    AnonymousTicketComment,

    #[error("Comment must be at least {min} characters long.")]
    CommentTooShort { min: usize },

    #[error("Reporter {reporter} cannot comment on ticket {ticket}.")]
    ForeignReporterComment { reporter: String, ticket: TicketId },

    #[error("Reporters cannot comment on CLOSED tickets.")]
    ReporterCommentOnClosed,

    #[error("Anonymous reports are only allowed for tickets of type BUG.")]
    AnonymousNonBugReport,

    #[error("Tickets can only be reported during testing phases.")]
    ReportOutsideTestingPhase,

    #[error("The user {username} does not exist.")]
    UnknownUser { username: String },

    #[error(
        "The user does not have permission to execute this command: \
         required role MANAGER; user role {role}."
    )]
    RequiresManager { role: Role },

    #[error("Tickets {ticket} already assigned to milestone {milestone}.")]
    TicketAlreadyInMilestone { ticket: TicketId, milestone: String },
}

//! Assignment eligibility: the expertise and seniority compatibility rules
//! gating which developer may take which ticket.
//!
//! The milestone half of the check (blocked milestone, roster membership)
//! needs registry access and lives in [`crate::engine`]; this module holds
//! the pure matrices plus the acceptable-value lists used to build rejection
//! messages.

use crate::model::ticket::{Priority, Ticket, TicketType};
use crate::model::user::{ExpertiseArea, Seniority};

/// Whether a developer's expertise area covers a ticket's required area.
///
/// | developer | acceptable ticket areas |
/// |---|---|
/// | FRONTEND  | FRONTEND, DESIGN |
/// | BACKEND   | BACKEND, DB |
/// | FULLSTACK | FRONTEND, BACKEND, DEVOPS, DESIGN, DB |
/// | DEVOPS    | DEVOPS |
/// | DESIGN    | DESIGN, FRONTEND |
/// | DB        | DB |
/// | MOBILE    | — |
#[must_use]
pub const fn expertise_compatible(developer: ExpertiseArea, ticket: ExpertiseArea) -> bool {
    match developer {
        ExpertiseArea::Frontend => {
            matches!(ticket, ExpertiseArea::Frontend | ExpertiseArea::Design)
        }
        ExpertiseArea::Backend => matches!(ticket, ExpertiseArea::Backend | ExpertiseArea::Db),
        ExpertiseArea::Fullstack => matches!(
            ticket,
            ExpertiseArea::Frontend
                | ExpertiseArea::Backend
                | ExpertiseArea::Devops
                | ExpertiseArea::Design
                | ExpertiseArea::Db
        ),
        ExpertiseArea::Devops => matches!(ticket, ExpertiseArea::Devops),
        ExpertiseArea::Design => {
            matches!(ticket, ExpertiseArea::Design | ExpertiseArea::Frontend)
        }
        ExpertiseArea::Db => matches!(ticket, ExpertiseArea::Db),
        ExpertiseArea::Mobile => false,
    }
}

/// Developer areas that could take a ticket with the given required area,
/// for rejection messages. Order follows the matrix; callers sort.
#[must_use]
pub fn acceptable_developer_areas(ticket: ExpertiseArea) -> Vec<&'static str> {
    match ticket {
        ExpertiseArea::Frontend => vec!["FRONTEND", "FULLSTACK", "DESIGN"],
        ExpertiseArea::Backend => vec!["BACKEND", "FULLSTACK"],
        ExpertiseArea::Devops => vec!["DEVOPS", "FULLSTACK"],
        ExpertiseArea::Design => vec!["DESIGN", "FRONTEND", "FULLSTACK"],
        ExpertiseArea::Db => vec!["DB", "BACKEND", "FULLSTACK"],
        ExpertiseArea::Mobile => vec!["MOBILE"],
        ExpertiseArea::Fullstack => vec!["FULLSTACK"],
    }
}

/// Whether a developer's seniority may take the given ticket.
///
/// JUNIOR handles BUG/UI_FEEDBACK at LOW or MEDIUM; MID additionally handles
/// FEATURE_REQUEST and anything up to HIGH; SENIOR handles everything.
#[must_use]
pub const fn seniority_compatible(seniority: Seniority, ticket: &Ticket) -> bool {
    match seniority {
        Seniority::Junior => {
            if matches!(ticket.priority, Priority::High | Priority::Critical) {
                return false;
            }
            matches!(ticket.kind, TicketType::Bug | TicketType::UiFeedback)
        }
        Seniority::Mid => !matches!(ticket.priority, Priority::Critical),
        Seniority::Senior => true,
    }
}

/// Seniority levels that could take the given ticket, for rejection
/// messages. Order is junior-first; callers sort.
#[must_use]
pub fn acceptable_seniority_levels(ticket: &Ticket) -> Vec<&'static str> {
    let mut levels = Vec::new();
    let simple_kind = matches!(ticket.kind, TicketType::Bug | TicketType::UiFeedback);

    if matches!(ticket.priority, Priority::Low | Priority::Medium) && simple_kind {
        levels.push("JUNIOR");
    }
    if !matches!(ticket.priority, Priority::Critical) {
        levels.push("MID");
    }
    if matches!(ticket.priority, Priority::Critical)
        || matches!(ticket.kind, TicketType::FeatureRequest)
    {
        levels.push("SENIOR");
    }

    levels
}

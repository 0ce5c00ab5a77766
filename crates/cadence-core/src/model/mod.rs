//! Entity model: tickets, users, and milestones.
//!
//! Tickets live in a central id-keyed store owned by the engine; users and
//! milestones reference them by id. This keeps ownership simple while the
//! reporter, the assignee, and the milestone all need to see the same ticket.

pub mod milestone;
pub mod ticket;
pub mod user;

use std::collections::BTreeMap;

use milestone::Milestone;
use ticket::{Ticket, TicketId};
use user::User;

/// Central ticket store, keyed by id.
pub type TicketStore = BTreeMap<TicketId, Ticket>;

/// User registry, keyed by username.
pub type UserStore = BTreeMap<String, User>;

/// Milestone registry. Creation order matters for blocking-edge resolution,
/// so this stays a plain vector; lookups go by name.
pub type MilestoneRegistry = Vec<Milestone>;

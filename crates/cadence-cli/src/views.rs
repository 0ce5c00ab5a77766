//! Read-only JSON view builders over the engine's entity graph.
//!
//! Every view is wrapped in the same envelope — command, username, timestamp,
//! then the view body. Visibility is role-scoped: managers see everything
//! they own or created, developers see their milestones' work, reporters see
//! their own tickets. Views never mutate the graph, with the single
//! exception of the notifications view, which drains the user's inbox.

use cadence_core::Engine;
use cadence_core::history::TicketAction;
use cadence_core::model::milestone::MilestoneStatus;
use cadence_core::model::ticket::{Priority, Status, Ticket, TicketId, TicketType};
use cadence_core::model::user::Role;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;

use crate::wire::WireCommand;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRow {
    content: String,
    author: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketRow {
    id: TicketId,
    #[serde(rename = "type")]
    kind: TicketType,
    title: String,
    business_priority: Priority,
    status: Status,
    created_at: String,
    assigned_at: String,
    solved_at: String,
    assigned_to: String,
    reported_by: String,
    comments: Vec<CommentRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignedTicketRow {
    id: TicketId,
    #[serde(rename = "type")]
    kind: TicketType,
    title: String,
    business_priority: Priority,
    status: Status,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_at: Option<String>,
    reported_by: String,
    comments: Vec<CommentRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepartitionRow {
    developer: String,
    assigned_tickets: Vec<TicketId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MilestoneRow {
    name: String,
    blocking_for: Vec<String>,
    due_date: String,
    created_at: String,
    tickets: Vec<TicketId>,
    assigned_devs: Vec<String>,
    created_by: String,
    status: MilestoneStatus,
    is_blocked: bool,
    days_until_due: i64,
    overdue_by: i64,
    open_tickets: Vec<TicketId>,
    closed_tickets: Vec<TicketId>,
    completion_percentage: f64,
    repartition: Vec<RepartitionRow>,
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    id: TicketId,
    title: String,
    status: Status,
    actions: Vec<TicketAction>,
    comments: Vec<CommentRow>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date_or_empty(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

fn or_empty(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn comment_rows(ticket: &Ticket) -> Vec<CommentRow> {
    ticket
        .comments
        .iter()
        .map(|comment| CommentRow {
            content: comment.content.clone(),
            author: comment.author.clone(),
            created_at: comment.created_at.to_string(),
        })
        .collect()
}

fn envelope(command: &WireCommand, key: &str, body: Value) -> Value {
    json!({
        "command": command.command,
        "username": command.username,
        "timestamp": command.timestamp,
        key: body,
    })
}

/// The error envelope attached to rejected commands.
pub fn error_view(command: &WireCommand, error: &str) -> Value {
    envelope(command, "error", Value::String(error.to_string()))
}

/// Ticket ids reachable by a developer through milestone rosters.
fn milestone_ticket_ids_for(engine: &Engine, developer: &str) -> BTreeSet<TicketId> {
    engine
        .milestones()
        .iter()
        .filter(|milestone| milestone.has_assigned_dev(developer))
        .flat_map(|milestone| milestone.ticket_ids.iter().copied())
        .collect()
}

fn by_creation_then_id(a: &&Ticket, b: &&Ticket) -> std::cmp::Ordering {
    a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// `viewTickets`: role-scoped listing of tickets, oldest first.
///
/// Managers see every ticket; developers see OPEN tickets from milestones
/// they are rostered on; reporters see what they reported. This listing
/// renders an empty comments array by design — comments appear in the
/// assigned-tickets and history views.
pub fn tickets_view(engine: &Engine, command: &WireCommand) -> Value {
    let mut visible: Vec<&Ticket> = match engine.user(&command.username) {
        None => Vec::new(),
        Some(user) => match user.role {
            Role::Manager => engine.tickets().values().collect(),
            Role::Developer => {
                let reachable = milestone_ticket_ids_for(engine, &command.username);
                engine
                    .tickets()
                    .values()
                    .filter(|ticket| {
                        ticket.status == Status::Open && reachable.contains(&ticket.id)
                    })
                    .collect()
            }
            Role::Reporter => engine
                .tickets()
                .values()
                .filter(|ticket| ticket.reported_by.as_deref() == Some(command.username.as_str()))
                .collect(),
        },
    };
    visible.sort_by(by_creation_then_id);

    let rows: Vec<TicketRow> = visible
        .into_iter()
        .map(|ticket| TicketRow {
            id: ticket.id,
            kind: ticket.kind,
            title: ticket.title.clone(),
            business_priority: ticket.priority,
            status: ticket.status,
            created_at: ticket.created_at.to_string(),
            assigned_at: date_or_empty(ticket.assigned_at),
            solved_at: date_or_empty(ticket.solved_at),
            assigned_to: or_empty(ticket.assigned_to.as_deref()),
            reported_by: or_empty(ticket.reported_by.as_deref()),
            comments: Vec::new(),
        })
        .collect();

    envelope(command, "tickets", json!(rows))
}

/// `viewAssignedTickets`: the caller's assigned tickets, highest priority
/// first, with full comment threads.
pub fn assigned_tickets_view(engine: &Engine, command: &WireCommand) -> Value {
    let mut assigned: Vec<&Ticket> = engine
        .user(&command.username)
        .map(|user| {
            user.assigned
                .iter()
                .filter_map(|id| engine.ticket(*id))
                .collect()
        })
        .unwrap_or_default();
    assigned.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));

    let rows: Vec<AssignedTicketRow> = assigned
        .into_iter()
        .map(|ticket| AssignedTicketRow {
            id: ticket.id,
            kind: ticket.kind,
            title: ticket.title.clone(),
            business_priority: ticket.priority,
            status: ticket.status,
            created_at: ticket.created_at.to_string(),
            assigned_at: ticket.assigned_at.map(|d| d.to_string()),
            reported_by: or_empty(ticket.reported_by.as_deref()),
            comments: comment_rows(ticket),
        })
        .collect();

    envelope(command, "assignedTickets", json!(rows))
}

/// `viewMilestones`: milestones visible to the caller, ordered by due date
/// then name, with the per-developer workload repartition.
pub fn milestones_view(engine: &Engine, command: &WireCommand) -> Value {
    let mut visible: Vec<_> = match engine.user(&command.username) {
        None => Vec::new(),
        Some(user) => engine
            .milestones()
            .iter()
            .filter(|milestone| match user.role {
                Role::Manager => milestone.created_by == command.username,
                Role::Developer => milestone.has_assigned_dev(&command.username),
                Role::Reporter => false,
            })
            .collect(),
    };
    visible.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.name.cmp(&b.name)));

    let rows: Vec<MilestoneRow> = visible
        .into_iter()
        .map(|milestone| {
            // Developers sorted by how loaded they are, lightest first.
            let mut repartition: Vec<RepartitionRow> = milestone
                .assigned_devs
                .iter()
                .map(|dev| RepartitionRow {
                    developer: dev.clone(),
                    assigned_tickets: milestone
                        .ticket_ids
                        .iter()
                        .copied()
                        .filter(|id| {
                            engine.ticket(*id).is_some_and(|ticket| {
                                ticket.assigned_to.as_deref() == Some(dev.as_str())
                            })
                        })
                        .collect(),
                })
                .collect();
            repartition.sort_by(|a, b| {
                a.assigned_tickets
                    .len()
                    .cmp(&b.assigned_tickets.len())
                    .then_with(|| a.developer.cmp(&b.developer))
            });

            MilestoneRow {
                name: milestone.name.clone(),
                blocking_for: milestone.blocking_for.clone(),
                due_date: milestone.due_date.to_string(),
                created_at: milestone.created_at.to_string(),
                tickets: milestone.ticket_ids.clone(),
                assigned_devs: milestone.assigned_devs.clone(),
                created_by: milestone.created_by.clone(),
                status: milestone.status,
                is_blocked: milestone.is_blocked,
                days_until_due: milestone.days_until_due,
                overdue_by: milestone.overdue_by,
                open_tickets: milestone.open_tickets.clone(),
                closed_tickets: milestone.closed_tickets.clone(),
                completion_percentage: milestone.completion_percentage,
                repartition,
            }
        })
        .collect();

    envelope(command, "milestones", json!(rows))
}

/// `viewTicketHistory`: audit trails for tickets the caller has touched
/// (developers) or owns through milestones (managers).
pub fn ticket_history_view(engine: &Engine, command: &WireCommand) -> Value {
    let visible: Vec<&Ticket> = match engine.user(&command.username) {
        None => Vec::new(),
        Some(user) => match user.role {
            Role::Developer => engine
                .tickets()
                .values()
                .filter(|ticket| {
                    ticket
                        .history
                        .iter()
                        .any(|action| action.by == command.username)
                })
                .collect(),
            Role::Manager => engine
                .milestones()
                .iter()
                .filter(|milestone| milestone.created_by == command.username)
                .flat_map(|milestone| milestone.ticket_ids.iter())
                .filter_map(|id| engine.ticket(*id))
                .collect(),
            Role::Reporter => Vec::new(),
        },
    };

    let mut seen = BTreeSet::new();
    let mut unique: Vec<&Ticket> = visible
        .into_iter()
        .filter(|ticket| seen.insert(ticket.id))
        .collect();
    unique.sort_by(by_creation_then_id);

    let rows: Vec<HistoryRow> = unique
        .into_iter()
        .map(|ticket| HistoryRow {
            id: ticket.id,
            title: ticket.title.clone(),
            status: ticket.status,
            actions: ticket.history.clone(),
            comments: comment_rows(ticket),
        })
        .collect();

    envelope(command, "ticketHistory", json!(rows))
}

/// `viewNotifications`: drain and render the caller's inbox. Unknown users
/// produce no output at all.
pub fn notifications_view(engine: &mut Engine, command: &WireCommand) -> Option<Value> {
    engine.user(&command.username)?;
    let notifications = engine.drain_notifications(&command.username);
    Some(envelope(command, "notifications", json!(notifications)))
}

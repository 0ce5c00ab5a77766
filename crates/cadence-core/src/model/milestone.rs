//! Milestone state and the daily update that drives escalation.
//!
//! A milestone groups tickets under a shared due date. Its temporal behavior
//! is concentrated in [`Milestone::update_daily_state`], which the simulation
//! clock invokes once per elapsed day, in date order:
//!
//! 1. the one-time "due tomorrow" warning (forces open tickets to CRITICAL),
//! 2. the periodic escalation cadence (suppressed while blocked),
//! 3. the derived-state recompute (open/closed lists, completion, day counts).
//!
//! Several booleans are one-way latches: `notified_one_day_before`,
//! `was_blocked_before_due_date`, and `was_completed` are checked-then-set and
//! never reset. Completion freezes the due/overdue day counts at the values
//! they had the instant the last ticket closed; later days keep reporting the
//! frozen snapshot.
//!
//! Blocking edges (`blocking_for`) are stored as milestone *names* and
//! resolved against the registry at use time; the unblock cascade itself
//! lives in [`crate::engine`] because it mutates sibling milestones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::ticket::{Priority, Status, TicketId};
use crate::model::{TicketStore, UserStore};

/// Milestone lifecycle. COMPLETED is sticky: once every ticket has closed the
/// milestone stays completed even if a ticket is later reopened through undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    Active,
    Completed,
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        })
    }
}

/// Creation payload for a milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneDraft {
    pub name: String,
    pub due_date: NaiveDate,
    /// Names of milestones this one blocks.
    pub blocking_for: Vec<String>,
    pub ticket_ids: Vec<TicketId>,
    pub assigned_devs: Vec<String>,
}

/// A milestone and its temporal bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub name: String,
    pub due_date: NaiveDate,
    pub created_at: NaiveDate,
    pub created_by: String,
    pub status: MilestoneStatus,
    /// Outgoing blocking edges, by milestone name.
    pub blocking_for: Vec<String>,
    pub ticket_ids: Vec<TicketId>,
    pub assigned_devs: Vec<String>,
    pub is_blocked: bool,
    /// Marker for the escalation cadence; reset on escalation and on unblock.
    pub last_priority_increase_date: NaiveDate,
    /// Latch: the "due tomorrow" warning fires at most once.
    pub notified_one_day_before: bool,
    /// Latch: set whenever the milestone is blocked on or before its due date.
    pub was_blocked_before_due_date: bool,
    /// Latch: gates the frozen due/overdue snapshot.
    pub was_completed: bool,
    /// Days until the due date, inclusive of today; frozen at completion.
    pub days_until_due: i64,
    /// Days past the due date; frozen at completion.
    pub overdue_by: i64,
    /// Ids of member tickets not yet closed, refreshed daily.
    pub open_tickets: Vec<TicketId>,
    /// Ids of closed member tickets, refreshed daily.
    pub closed_tickets: Vec<TicketId>,
    /// Closed / total, rounded to two decimals.
    pub completion_percentage: f64,
    frozen_days_until_due: i64,
    frozen_overdue_by: i64,
}

impl Milestone {
    /// Materialize a draft. The escalation marker starts at the creation
    /// date, so the first cadence interval is measured from creation.
    #[must_use]
    pub fn from_draft(draft: MilestoneDraft, created_by: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            name: draft.name,
            due_date: draft.due_date,
            created_at: today,
            created_by: created_by.into(),
            status: MilestoneStatus::Active,
            blocking_for: draft.blocking_for,
            ticket_ids: draft.ticket_ids,
            assigned_devs: draft.assigned_devs,
            is_blocked: false,
            last_priority_increase_date: today,
            notified_one_day_before: false,
            was_blocked_before_due_date: false,
            was_completed: false,
            days_until_due: 0,
            overdue_by: 0,
            open_tickets: Vec::new(),
            closed_tickets: Vec::new(),
            completion_percentage: 0.0,
            frozen_days_until_due: 0,
            frozen_overdue_by: 0,
        }
    }

    /// Whether the given ticket belongs to this milestone.
    #[must_use]
    pub fn contains_ticket(&self, id: TicketId) -> bool {
        self.ticket_ids.contains(&id)
    }

    /// Whether the given developer is on the milestone roster.
    #[must_use]
    pub fn has_assigned_dev(&self, username: &str) -> bool {
        self.assigned_devs.iter().any(|dev| dev == username)
    }

    /// Whether every resolvable member ticket is CLOSED.
    #[must_use]
    pub fn all_tickets_closed(&self, tickets: &TicketStore) -> bool {
        self.ticket_ids
            .iter()
            .filter_map(|id| tickets.get(id))
            .all(|ticket| ticket.status == Status::Closed)
    }

    /// Mark this milestone blocked, latching `was_blocked_before_due_date`
    /// when the block lands on or before the due date.
    pub fn mark_blocked(&mut self, today: NaiveDate) {
        self.is_blocked = true;
        if today <= self.due_date {
            self.was_blocked_before_due_date = true;
        }
    }

    /// Run the full daily update for `day`.
    pub fn update_daily_state(
        &mut self,
        day: NaiveDate,
        config: &EngineConfig,
        tickets: &mut TicketStore,
        users: &mut UserStore,
    ) {
        self.check_one_day_before_due(day, config, tickets, users);

        if !self.is_blocked {
            let since_last_increase = (day - self.last_priority_increase_date).num_days();
            if since_last_increase >= config.escalation_interval_days {
                debug!(milestone = %self.name, %day, "escalating ticket priorities");
                self.escalate_ticket_priorities(tickets);
                self.last_priority_increase_date = day;
            }
        }

        self.refresh_derived_state(day, tickets);
    }

    /// The one-day-before-due warning, plus the blocked-before-due latch.
    fn check_one_day_before_due(
        &mut self,
        day: NaiveDate,
        config: &EngineConfig,
        tickets: &mut TicketStore,
        users: &mut UserStore,
    ) {
        let days_left = (self.due_date - day).num_days();

        if days_left == config.due_soon_window_days
            && !self.notified_one_day_before
            && !self.is_blocked
        {
            for id in &self.ticket_ids {
                if let Some(ticket) = tickets.get_mut(id) {
                    if !ticket.status.is_settled() {
                        ticket.priority = Priority::Critical;
                    }
                }
            }
            self.notify_assigned_devs(
                users,
                &format!(
                    "Milestone {} is due tomorrow. All unresolved tickets are now CRITICAL.",
                    self.name
                ),
            );
            self.notified_one_day_before = true;
        }

        if self.is_blocked && day <= self.due_date {
            self.was_blocked_before_due_date = true;
        }
    }

    /// Bump every non-closed member ticket one priority step.
    fn escalate_ticket_priorities(&self, tickets: &mut TicketStore) {
        for id in &self.ticket_ids {
            if let Some(ticket) = tickets.get_mut(id) {
                if ticket.status != Status::Closed {
                    ticket.priority = ticket.priority.next();
                }
            }
        }
    }

    /// Recompute the open/closed lists, completion state, and day counts.
    ///
    /// Completion requires at least one resolvable ticket; the first
    /// completion freezes the day counts. Note the asymmetry carried from the
    /// production system: the frozen overdue count is the plain day
    /// difference, while the live overdue count adds one.
    fn refresh_derived_state(&mut self, day: NaiveDate, tickets: &TicketStore) {
        self.open_tickets.clear();
        self.closed_tickets.clear();

        for id in &self.ticket_ids {
            let Some(ticket) = tickets.get(id) else {
                continue;
            };
            if ticket.status == Status::Closed {
                self.closed_tickets.push(*id);
            } else {
                self.open_tickets.push(*id);
            }
        }

        let resolvable = self.open_tickets.len() + self.closed_tickets.len();
        let completed = self.open_tickets.is_empty() && resolvable > 0;

        if completed && !self.was_completed {
            self.was_completed = true;
            let diff = (self.due_date - day).num_days();
            if diff >= 0 {
                self.frozen_days_until_due = diff + 1;
                self.frozen_overdue_by = 0;
            } else {
                self.frozen_days_until_due = 0;
                self.frozen_overdue_by = diff.abs();
            }
        }

        self.status = if completed || self.was_completed {
            MilestoneStatus::Completed
        } else {
            MilestoneStatus::Active
        };

        if self.was_completed {
            self.days_until_due = self.frozen_days_until_due;
            self.overdue_by = self.frozen_overdue_by;
        } else {
            let diff = (self.due_date - day).num_days();
            if diff >= 0 {
                self.days_until_due = diff + 1;
                self.overdue_by = 0;
            } else {
                self.days_until_due = 0;
                self.overdue_by = diff.abs() + 1;
            }
        }

        let total = self.ticket_ids.len();
        #[allow(clippy::cast_precision_loss)]
        let raw = if total > 0 {
            self.closed_tickets.len() as f64 / total as f64
        } else {
            0.0
        };
        self.completion_percentage = (raw * 100.0).round() / 100.0;
    }

    /// Push a message to every rostered developer's inbox.
    pub(crate) fn notify_assigned_devs(&self, users: &mut UserStore, message: &str) {
        for dev in &self.assigned_devs {
            if let Some(user) = users.get_mut(dev) {
                user.notify(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Milestone, MilestoneDraft, MilestoneStatus};
    use crate::config::EngineConfig;
    use crate::model::ticket::{Priority, Status, Ticket, TicketDraft, TicketType};
    use crate::model::user::ExpertiseArea;
    use crate::model::TicketStore;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    fn ticket(id: u32) -> Ticket {
        Ticket::from_draft(
            id,
            TicketDraft {
                kind: TicketType::Bug,
                title: format!("bug {id}"),
                priority: Priority::Low,
                expertise_area: ExpertiseArea::Backend,
                description: "broken".into(),
                reported_by: Some("alice".into()),
            },
            day(1),
        )
    }

    fn milestone(ids: &[u32], due: NaiveDate) -> Milestone {
        Milestone::from_draft(
            MilestoneDraft {
                name: "launch".into(),
                due_date: due,
                blocking_for: Vec::new(),
                ticket_ids: ids.to_vec(),
                assigned_devs: Vec::new(),
            },
            "mira",
            day(1),
        )
    }

    fn store(ids: &[u32]) -> TicketStore {
        ids.iter().map(|&id| (id, ticket(id))).collect()
    }

    #[test]
    fn completion_freezes_day_counts() {
        let mut tickets = store(&[1, 2]);
        let mut m = milestone(&[1, 2], day(20));

        m.refresh_derived_state(day(5), &tickets);
        assert_eq!(m.status, MilestoneStatus::Active);
        assert_eq!(m.days_until_due, 16);

        for t in tickets.values_mut() {
            t.record_status(Status::Closed, day(8));
        }
        m.refresh_derived_state(day(8), &tickets);
        assert_eq!(m.status, MilestoneStatus::Completed);
        assert!(m.was_completed);
        assert_eq!(m.days_until_due, 13);
        assert_eq!(m.overdue_by, 0);
        assert_eq!(m.completion_percentage, 1.0);

        // Later days keep reporting the snapshot.
        m.refresh_derived_state(day(25), &tickets);
        assert_eq!(m.days_until_due, 13);
        assert_eq!(m.overdue_by, 0);
    }

    #[test]
    fn completed_status_is_sticky_after_reopen() {
        let mut tickets = store(&[1]);
        let mut m = milestone(&[1], day(10));

        tickets.get_mut(&1).expect("ticket").record_status(Status::Closed, day(4));
        m.refresh_derived_state(day(4), &tickets);
        assert_eq!(m.status, MilestoneStatus::Completed);

        // A reopened ticket shows up in the open list but cannot revert the
        // milestone status or the frozen day counts.
        tickets.get_mut(&1).expect("ticket").record_status(Status::InProgress, day(5));
        m.refresh_derived_state(day(5), &tickets);
        assert_eq!(m.status, MilestoneStatus::Completed);
        assert_eq!(m.open_tickets, vec![1]);
        assert_eq!(m.days_until_due, 7);
    }

    #[test]
    fn overdue_counts_differ_live_and_frozen() {
        let mut tickets = store(&[1]);
        let mut m = milestone(&[1], day(5));

        // Live overdue adds one.
        m.refresh_derived_state(day(8), &tickets);
        assert_eq!(m.overdue_by, 4);
        assert_eq!(m.days_until_due, 0);

        // Frozen overdue is the plain difference.
        tickets.get_mut(&1).expect("ticket").record_status(Status::Closed, day(8));
        let mut late = milestone(&[1], day(5));
        late.refresh_derived_state(day(8), &tickets);
        assert_eq!(late.overdue_by, 3);
    }

    #[test]
    fn due_tomorrow_warning_fires_once_and_skips_settled_tickets() {
        let config = EngineConfig::default();
        let mut tickets = store(&[1, 2, 3]);
        tickets.get_mut(&2).expect("ticket").record_status(Status::Resolved, day(3));
        tickets.get_mut(&3).expect("ticket").record_status(Status::Closed, day(3));

        let mut users = crate::model::UserStore::new();
        users.insert(
            "dana".into(),
            crate::model::user::User::new(
                "dana",
                "dana@example.com",
                crate::model::user::Role::Developer,
            ),
        );

        let mut m = milestone(&[1, 2, 3], day(10));
        m.assigned_devs = vec!["dana".into()];

        m.update_daily_state(day(9), &config, &mut tickets, &mut users);
        // The warning forces only unsettled tickets to CRITICAL; the resolved
        // ticket is merely swept up by the regular cadence on the same day,
        // and the closed one is untouched.
        assert_eq!(tickets[&1].priority, Priority::Critical);
        assert_eq!(tickets[&2].priority, Priority::Medium);
        assert_eq!(tickets[&3].priority, Priority::Low);
        assert!(m.notified_one_day_before);
        assert_eq!(users["dana"].notifications.len(), 1);

        // No repeat on later days.
        m.update_daily_state(day(10), &config, &mut tickets, &mut users);
        m.update_daily_state(day(11), &config, &mut tickets, &mut users);
        let repeats = users["dana"]
            .notifications
            .iter()
            .filter(|n| n.contains("due tomorrow"))
            .count();
        assert_eq!(repeats, 1);
    }

    #[test]
    fn escalation_is_suppressed_while_blocked() {
        let config = EngineConfig::default();
        let mut tickets = store(&[1]);
        let mut users = crate::model::UserStore::new();
        let mut m = milestone(&[1], day(25));

        m.mark_blocked(day(1));
        for d in 2..=8 {
            m.update_daily_state(day(d), &config, &mut tickets, &mut users);
        }
        assert_eq!(tickets[&1].priority, Priority::Low);

        m.is_blocked = false;
        m.last_priority_increase_date = day(8);
        for d in 9..=11 {
            m.update_daily_state(day(d), &config, &mut tickets, &mut users);
        }
        assert_eq!(tickets[&1].priority, Priority::Medium);
    }

    #[test]
    fn blocked_before_due_latch_never_resets() {
        let mut m = milestone(&[], day(10));
        m.mark_blocked(day(5));
        assert!(m.was_blocked_before_due_date);

        m.is_blocked = false;
        m.mark_blocked(day(15));
        // Blocked after the due date: the earlier latch still holds.
        assert!(m.was_blocked_before_due_date);

        let mut late = milestone(&[], day(10));
        late.mark_blocked(day(15));
        assert!(!late.was_blocked_before_due_date);
    }

    #[test]
    fn completion_percentage_rounds_to_two_decimals() {
        let mut tickets = store(&[1, 2, 3]);
        tickets.get_mut(&1).expect("ticket").record_status(Status::Closed, day(2));
        let mut m = milestone(&[1, 2, 3], day(10));
        m.refresh_derived_state(day(2), &tickets);
        assert_eq!(m.completion_percentage, 0.33);
    }
}

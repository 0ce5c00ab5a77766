//! The engine: one context object owning the clock, the user registry, the
//! ticket store, and the milestone registry.
//!
//! Every operation is synchronous and strictly sequential. A command's
//! timestamp must be stamped onto the clock (replaying any skipped days
//! through the milestone engine) *before* the command's effects are applied;
//! [`Engine::stamp`] does exactly that. Operations return
//! `Result<_, Rejection>`: a rejection carries the descriptive reason string
//! and guarantees no entity was mutated. Operations on entities that do not
//! exist return `Ok` without touching anything.

use chrono::NaiveDate;
use tracing::debug;

use crate::clock::{Phase, SimClock};
use crate::config::EngineConfig;
use crate::eligibility;
use crate::error::Rejection;
use crate::history::TicketAction;
use crate::model::milestone::{Milestone, MilestoneDraft};
use crate::model::ticket::{Comment, Priority, Status, Ticket, TicketDraft, TicketId, TicketType};
use crate::model::user::{Role, User};
use crate::model::{MilestoneRegistry, TicketStore, UserStore};

/// The shared entity graph and simulation clock.
#[derive(Debug, Clone)]
pub struct Engine {
    clock: SimClock,
    config: EngineConfig,
    users: UserStore,
    tickets: TicketStore,
    milestones: MilestoneRegistry,
    next_ticket_id: TicketId,
}

impl Engine {
    /// Create an engine over the given user registry.
    #[must_use]
    pub fn new(config: EngineConfig, users: impl IntoIterator<Item = User>) -> Self {
        Self {
            clock: SimClock::new(),
            config,
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
            tickets: TicketStore::new(),
            milestones: MilestoneRegistry::new(),
            next_ticket_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Advance the clock to a command's timestamp, replaying the milestone
    /// daily update for every skipped day in date order.
    pub fn stamp(&mut self, date: NaiveDate) {
        let days = self.clock.stamp(date, self.config.phase_length_days);
        for day in days {
            for milestone in &mut self.milestones {
                milestone.update_daily_state(day, &self.config, &mut self.tickets, &mut self.users);
            }
        }
    }

    /// The clock's current date, if any command has stamped it yet.
    #[must_use]
    pub const fn current_date(&self) -> Option<NaiveDate> {
        self.clock.current()
    }

    /// The current organization phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.clock.phase()
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// Report a new ticket on behalf of `username`.
    ///
    /// The ticket id is consumed even when the report is rejected, matching
    /// the upstream allocator which hands out ids at parse time. Anonymous
    /// drafts are forced to LOW priority and are only legal for bugs;
    /// reporting is only open during the TESTING phase.
    pub fn report_ticket(
        &mut self,
        username: &str,
        mut draft: TicketDraft,
    ) -> Result<TicketId, Rejection> {
        let id = self.next_ticket_id;
        self.next_ticket_id += 1;

        if draft.reported_by.is_none() {
            draft.priority = Priority::Low;
            if draft.kind != TicketType::Bug {
                return Err(Rejection::AnonymousNonBugReport);
            }
        }

        if self.clock.phase() != Phase::Testing {
            return Err(Rejection::ReportOutsideTestingPhase);
        }

        let Some(today) = self.clock.current() else {
            return Err(Rejection::ReportOutsideTestingPhase);
        };

        let Some(user) = self.users.get_mut(username) else {
            return Err(Rejection::UnknownUser {
                username: username.to_string(),
            });
        };

        let ticket = Ticket::from_draft(id, draft, today);
        debug!(id, reporter = username, "ticket reported");
        user.reported.push(id);
        self.tickets.insert(id, ticket);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Milestones
    // -----------------------------------------------------------------------

    /// Create a milestone.
    ///
    /// Only managers may create milestones, and a ticket may belong to at
    /// most one milestone. On success: member tickets get an
    /// ADDED_TO_MILESTONE history entry, rostered developers are notified,
    /// every *existing* milestone named in `blocking_for` is marked blocked
    /// (a name that does not exist yet is not retroactively linked), and the
    /// new milestone immediately runs one daily update for today.
    pub fn create_milestone(
        &mut self,
        username: &str,
        draft: MilestoneDraft,
    ) -> Result<(), Rejection> {
        let Some(today) = self.clock.current() else {
            return Ok(());
        };
        let Some(user) = self.users.get(username) else {
            return Ok(());
        };
        if user.role != Role::Manager {
            return Err(Rejection::RequiresManager { role: user.role });
        }

        for existing in &self.milestones {
            for &ticket_id in &draft.ticket_ids {
                if existing.contains_ticket(ticket_id) {
                    return Err(Rejection::TicketAlreadyInMilestone {
                        ticket: ticket_id,
                        milestone: existing.name.clone(),
                    });
                }
            }
        }

        let milestone = Milestone::from_draft(draft, username, today);
        debug!(name = %milestone.name, due = %milestone.due_date, "milestone created");

        milestone.notify_assigned_devs(
            &mut self.users,
            &format!(
                "New milestone {} has been created with due date {}.",
                milestone.name, milestone.due_date
            ),
        );

        for blocked_name in &milestone.blocking_for {
            if let Some(target) = self
                .milestones
                .iter_mut()
                .find(|candidate| candidate.name == *blocked_name)
            {
                debug!(blocker = %milestone.name, blocked = %target.name, "blocking edge");
                target.mark_blocked(today);
            }
        }

        for &ticket_id in &milestone.ticket_ids {
            if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
                ticket.push_action(TicketAction::added_to_milestone(
                    milestone.name.clone(),
                    username,
                    today,
                ));
            }
        }

        self.milestones.push(milestone);
        let index = self.milestones.len() - 1;
        self.milestones[index].update_daily_state(
            today,
            &self.config,
            &mut self.tickets,
            &mut self.users,
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assignment
    // -----------------------------------------------------------------------

    /// Assign a ticket to `username`, enforcing the full eligibility matrix.
    pub fn assign(&mut self, username: &str, ticket_id: TicketId) -> Result<(), Rejection> {
        let Some(today) = self.clock.current() else {
            return Ok(());
        };
        let Some(user) = self.users.get(username) else {
            return Ok(());
        };
        if user.assigned.contains(&ticket_id) {
            return Ok(());
        }
        let (Some(area), Some(seniority)) = (user.expertise_area, user.seniority) else {
            return Ok(());
        };
        let Some(ticket) = self.tickets.get(&ticket_id) else {
            return Ok(());
        };

        if ticket.status != Status::Open {
            return Err(Rejection::TicketNotOpen);
        }

        if !eligibility::expertise_compatible(area, ticket.expertise_area) {
            let mut required = eligibility::acceptable_developer_areas(ticket.expertise_area);
            required.sort_unstable();
            return Err(Rejection::ExpertiseMismatch {
                developer: username.to_string(),
                ticket: ticket_id,
                required: required.join(", "),
                current: area.to_string(),
            });
        }

        if !eligibility::seniority_compatible(seniority, ticket) {
            let mut required = eligibility::acceptable_seniority_levels(ticket);
            required.sort_unstable();
            return Err(Rejection::SeniorityMismatch {
                developer: username.to_string(),
                ticket: ticket_id,
                required: required.join(", "),
                current: seniority.to_string(),
            });
        }

        // Milestone rule: a ticket with no milestone is freely assignable.
        if let Some(milestone) = self
            .milestones
            .iter()
            .find(|candidate| candidate.contains_ticket(ticket_id))
        {
            if milestone.is_blocked {
                return Err(Rejection::MilestoneBlocked {
                    ticket: ticket_id,
                    milestone: milestone.name.clone(),
                });
            }
            if !milestone.has_assigned_dev(username) {
                return Err(Rejection::NotOnMilestoneRoster {
                    developer: username.to_string(),
                    milestone: milestone.name.clone(),
                });
            }
        }

        debug!(ticket = ticket_id, developer = username, "ticket assigned");
        let old_status = {
            let Some(ticket) = self.tickets.get_mut(&ticket_id) else {
                return Ok(());
            };
            let old_status = ticket.status;
            ticket.record_status(Status::InProgress, today);
            ticket.assigned_at = Some(today);
            ticket.assigned_to = Some(username.to_string());
            ticket.push_action(TicketAction::assigned(username, today));
            ticket.push_action(TicketAction::status_changed(
                old_status,
                Status::InProgress,
                username,
                today,
            ));
            old_status
        };
        debug_assert_eq!(old_status, Status::Open);

        if let Some(user) = self.users.get_mut(username) {
            user.assigned.push(ticket_id);
        }
        Ok(())
    }

    /// Unassign a ticket from `username`.
    ///
    /// Only legal while the ticket is IN_PROGRESS and actually assigned to
    /// this user; anything else is a silent no-op. Reverts the ticket to
    /// OPEN, clears the assignment fields, appends a DE-ASSIGNED entry, then
    /// truncates every history entry dated strictly after today.
    pub fn unassign(&mut self, username: &str, ticket_id: TicketId) {
        let Some(today) = self.clock.current() else {
            return;
        };
        let Some(position) = self
            .users
            .get(username)
            .and_then(|user| user.assigned.iter().position(|&id| id == ticket_id))
        else {
            return;
        };

        {
            let Some(ticket) = self.tickets.get_mut(&ticket_id) else {
                return;
            };
            if ticket.status != Status::InProgress {
                return;
            }
            debug!(ticket = ticket_id, developer = username, "ticket unassigned");
            ticket.record_status(Status::Open, today);
            ticket.assigned_at = None;
            ticket.assigned_to = None;
            ticket.solved_at = None;
            ticket.push_action(TicketAction::de_assigned(username, today));
            ticket.truncate_history_after(today);
        }

        if let Some(user) = self.users.get_mut(username) {
            user.assigned.remove(position);
        }
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Advance a ticket's status one step.
    ///
    /// Silent no-op on unknown user/ticket, unassigned ticket, or an already
    /// CLOSED ticket. A developer may only advance their own tickets.
    pub fn change_status(&mut self, username: &str, ticket_id: TicketId) -> Result<(), Rejection> {
        let Some(today) = self.clock.current() else {
            return Ok(());
        };
        let Some(user) = self.users.get(username) else {
            return Ok(());
        };
        let Some(ticket) = self.tickets.get(&ticket_id) else {
            return Ok(());
        };
        if !ticket.is_assigned() || ticket.status == Status::Closed {
            return Ok(());
        }
        if user.role == Role::Developer && ticket.assigned_to.as_deref() != Some(username) {
            return Err(Rejection::ForeignTicket {
                ticket: ticket_id,
                developer: username.to_string(),
            });
        }

        let old_status = ticket.status;
        let new_status = old_status.next();
        self.apply_status(ticket_id, new_status, today);

        if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
            if new_status.is_settled() && ticket.solved_at.is_none() {
                ticket.solved_at = Some(today);
            }
            ticket.push_action(TicketAction::status_changed(
                old_status, new_status, username, today,
            ));
        }
        Ok(())
    }

    /// Undo the most recent status change.
    ///
    /// The recorded `from` value is re-applied through the full status path
    /// and the reversal itself is appended as a new STATUS_CHANGED entry —
    /// the log only ever grows here.
    pub fn undo_change_status(
        &mut self,
        username: &str,
        ticket_id: TicketId,
    ) -> Result<(), Rejection> {
        let Some(today) = self.clock.current() else {
            return Ok(());
        };
        let Some(user) = self.users.get(username) else {
            return Ok(());
        };
        let Some(ticket) = self.tickets.get(&ticket_id) else {
            return Ok(());
        };
        if !ticket.is_assigned() {
            return Err(Rejection::TicketNotAssigned { ticket: ticket_id });
        }
        if user.role == Role::Developer && ticket.assigned_to.as_deref() != Some(username) {
            return Err(Rejection::ForeignTicket {
                ticket: ticket_id,
                developer: username.to_string(),
            });
        }

        let Some(previous) = ticket.last_status_change().and_then(|action| action.from) else {
            return Ok(());
        };
        let current = ticket.status;

        self.apply_status(ticket_id, previous, today);
        if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
            ticket.push_action(TicketAction::status_changed(
                current, previous, username, today,
            ));
        }
        Ok(())
    }

    /// Apply a status value with full bookkeeping, then run the unblock
    /// cascade when the ticket just closed.
    fn apply_status(&mut self, ticket_id: TicketId, new_status: Status, today: NaiveDate) {
        let Some(ticket) = self.tickets.get_mut(&ticket_id) else {
            return;
        };
        let old_status = ticket.status;
        ticket.record_status(new_status, today);

        if new_status == Status::Closed && old_status != Status::Closed {
            if let Some(owner) = self
                .milestones
                .iter()
                .position(|milestone| milestone.contains_ticket(ticket_id))
            {
                self.check_and_unblock(owner, ticket_id, today);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Unblock cascade
    // -----------------------------------------------------------------------

    /// If every ticket of the owning milestone is now CLOSED, unblock each
    /// currently-blocked milestone it names in `blocking_for`.
    ///
    /// Unblocking resets the target's escalation marker so the cadence
    /// restarts fresh. A target past its due date that had been blocked
    /// on/before that date additionally gets all of its active tickets forced
    /// to CRITICAL. The cascade is transitive only through repeated
    /// triggering: a chain unblocks one link per fully-closed ticket set.
    fn check_and_unblock(&mut self, owner: usize, closed_ticket: TicketId, today: NaiveDate) {
        if !self.milestones[owner].all_tickets_closed(&self.tickets) {
            return;
        }

        let blocking_for = self.milestones[owner].blocking_for.clone();
        for blocked_name in &blocking_for {
            let Some(index) = self
                .milestones
                .iter()
                .position(|candidate| candidate.name == *blocked_name && candidate.is_blocked)
            else {
                continue;
            };

            self.milestones[index].is_blocked = false;
            self.milestones[index].last_priority_increase_date = today;
            debug!(milestone = %blocked_name, "unblocked");

            let unblocked_late = today > self.milestones[index].due_date
                && self.milestones[index].was_blocked_before_due_date;

            let message = if unblocked_late {
                let member_ids = self.milestones[index].ticket_ids.clone();
                for member_id in member_ids {
                    if let Some(ticket) = self.tickets.get_mut(&member_id) {
                        if !ticket.status.is_settled() {
                            ticket.priority = Priority::Critical;
                        }
                    }
                }
                format!(
                    "Milestone {blocked_name} was unblocked after due date. \
                     All active tickets are now CRITICAL."
                )
            } else {
                format!(
                    "Milestone {blocked_name} is now unblocked as ticket {closed_ticket} \
                     has been CLOSED."
                )
            };

            let roster = self.milestones[index].assigned_devs.clone();
            for dev in roster {
                if let Some(user) = self.users.get_mut(&dev) {
                    user.notify(&message);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Add a comment to a ticket.
    pub fn add_comment(
        &mut self,
        username: &str,
        ticket_id: TicketId,
        content: &str,
    ) -> Result<(), Rejection> {
        let Some(today) = self.clock.current() else {
            return Ok(());
        };
        let Some(user) = self.users.get(username) else {
            return Ok(());
        };
        let Some(ticket) = self.tickets.get(&ticket_id) else {
            return Ok(());
        };

        if ticket.reported_by.is_none() {
            return Err(Rejection::AnonymousTicketComment);
        }
        if content.len() < self.config.min_comment_len {
            return Err(Rejection::CommentTooShort {
                min: self.config.min_comment_len,
            });
        }
        if user.role == Role::Developer
            && ticket.is_assigned()
            && ticket.assigned_to.as_deref() != Some(username)
        {
            return Err(Rejection::ForeignTicketComment {
                ticket: ticket_id,
                developer: username.to_string(),
            });
        }
        if user.role == Role::Reporter {
            if ticket.reported_by.as_deref() != Some(username) {
                return Err(Rejection::ForeignReporterComment {
                    reporter: username.to_string(),
                    ticket: ticket_id,
                });
            }
            if ticket.status == Status::Closed {
                return Err(Rejection::ReporterCommentOnClosed);
            }
        }

        if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
            ticket.add_comment(Comment {
                content: content.to_string(),
                author: username.to_string(),
                created_at: today,
            });
        }
        Ok(())
    }

    /// Remove the most recent comment from a ticket.
    pub fn undo_comment(&mut self, ticket_id: TicketId) -> Result<(), Rejection> {
        let Some(ticket) = self.tickets.get_mut(&ticket_id) else {
            return Ok(());
        };
        if ticket.comments.is_empty() {
            return Ok(());
        }
        if ticket.reported_by.is_none() {
            return Err(Rejection::AnonymousTicketComment);
        }
        ticket.remove_last_comment();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Notifications and read access
    // -----------------------------------------------------------------------

    /// Drain a user's pending notifications. Unknown users yield nothing.
    pub fn drain_notifications(&mut self, username: &str) -> Vec<String> {
        self.users
            .get_mut(username)
            .map(User::drain_notifications)
            .unwrap_or_default()
    }

    /// The user registry.
    #[must_use]
    pub const fn users(&self) -> &UserStore {
        &self.users
    }

    /// One user by name.
    #[must_use]
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// The ticket store.
    #[must_use]
    pub const fn tickets(&self) -> &TicketStore {
        &self.tickets
    }

    /// One ticket by id.
    #[must_use]
    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&id)
    }

    /// The milestone registry, in creation order.
    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// One milestone by name.
    #[must_use]
    pub fn milestone(&self, name: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.name == name)
    }
}

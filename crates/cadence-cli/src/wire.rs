//! Wire-format types for the two input files: the user registry and the
//! ordered command batch.
//!
//! All dates on the wire are `yyyy-MM-dd` strings; they are parsed at this
//! boundary and the core only ever sees [`chrono::NaiveDate`]. Unknown JSON
//! fields are ignored so batches produced by other tooling keep working.

use cadence_core::clock::parse_wire_date;
use cadence_core::model::ticket::{Priority, TicketDraft, TicketId, TicketType};
use cadence_core::model::user::{ExpertiseArea, Role, Seniority, User};
use serde::Deserialize;

/// One entry in the users file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub expertise_area: Option<ExpertiseArea>,
    #[serde(default)]
    pub seniority: Option<Seniority>,
    #[serde(default)]
    pub subordinates: Option<Vec<String>>,
}

impl WireUser {
    /// Convert into the core user entity.
    #[must_use]
    pub fn into_user(self) -> User {
        let mut user = User::new(self.username, self.email, self.role);
        user.hire_date = self.hire_date.as_deref().and_then(|raw| parse_wire_date(raw).ok());
        user.expertise_area = self.expertise_area;
        user.seniority = self.seniority;
        user.subordinates = self.subordinates.unwrap_or_default();
        user
    }
}

/// Ticket parameters carried by `reportTicket` commands.
///
/// Ticket-type specific payload fields (severity, frequency, business value,
/// usability score, …) feed the reporting layers that sit outside this
/// binary; they are accepted and ignored here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTicketParams {
    #[serde(rename = "type")]
    pub kind: TicketType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub business_priority: Option<Priority>,
    #[serde(default)]
    pub expertise_area: Option<ExpertiseArea>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
}

impl WireTicketParams {
    /// Convert into a ticket draft. Returns `None` when the required
    /// expertise area is missing — such a command is dropped with a warning.
    #[must_use]
    pub fn into_draft(self) -> Option<TicketDraft> {
        let expertise_area = self.expertise_area?;
        Some(TicketDraft {
            kind: self.kind,
            title: self.title.unwrap_or_default(),
            priority: self.business_priority.unwrap_or(Priority::Low),
            expertise_area,
            description: self.description.unwrap_or_default(),
            // An empty reporter name means anonymous, same as an absent one.
            reported_by: self.reported_by.filter(|name| !name.is_empty()),
        })
    }
}

/// One command in the batch. Milestone fields sit at the top level of the
/// command object, matching the established batch format.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCommand {
    pub command: String,
    pub username: String,
    pub timestamp: String,
    #[serde(default)]
    pub params: Option<WireTicketParams>,
    #[serde(default, rename = "ticketID")]
    pub ticket_id: Option<TicketId>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "dueDate")]
    pub due_date: Option<String>,
    #[serde(default, rename = "blockingFor")]
    pub blocking_for: Option<Vec<String>>,
    #[serde(default)]
    pub tickets: Option<Vec<TicketId>>,
    #[serde(default, rename = "assignedDevs")]
    pub assigned_devs: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::{WireCommand, WireTicketParams, WireUser};
    use cadence_core::model::ticket::{Priority, TicketType};
    use cadence_core::model::user::{Role, Seniority};

    #[test]
    fn users_parse_with_optional_fields_missing() {
        let raw = r#"{"username": "mira", "email": "mira@example.com", "role": "MANAGER",
                      "subordinates": ["dana"]}"#;
        let user = serde_json::from_str::<WireUser>(raw).expect("parse").into_user();
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.subordinates, vec!["dana"]);
        assert!(user.expertise_area.is_none());
        assert!(user.hire_date.is_none());
    }

    #[test]
    fn developer_fields_come_through() {
        let raw = r#"{"username": "dana", "email": "d@example.com", "role": "DEVELOPER",
                      "hireDate": "2023-05-01", "expertiseArea": "BACKEND",
                      "seniority": "SENIOR"}"#;
        let user = serde_json::from_str::<WireUser>(raw).expect("parse").into_user();
        assert_eq!(user.seniority, Some(Seniority::Senior));
        assert_eq!(
            user.hire_date,
            chrono::NaiveDate::from_ymd_opt(2023, 5, 1)
        );
    }

    #[test]
    fn empty_reporter_means_anonymous() {
        let raw = r#"{"type": "BUG", "title": "boom", "businessPriority": "HIGH",
                      "expertiseArea": "BACKEND", "description": "it broke",
                      "reportedBy": ""}"#;
        let draft = serde_json::from_str::<WireTicketParams>(raw)
            .expect("parse")
            .into_draft()
            .expect("has expertise area");
        assert!(draft.reported_by.is_none());
        assert_eq!(draft.kind, TicketType::Bug);
        assert_eq!(draft.priority, Priority::High);
    }

    #[test]
    fn unknown_payload_fields_are_ignored() {
        let raw = r#"{"type": "UI_FEEDBACK", "title": "tiny button",
                      "businessPriority": "LOW", "expertiseArea": "DESIGN",
                      "description": "hard to hit", "reportedBy": "alice",
                      "usabilityScore": "3", "uiElementId": "btn-7"}"#;
        let params = serde_json::from_str::<WireTicketParams>(raw).expect("parse");
        assert_eq!(params.kind, TicketType::UiFeedback);
    }

    #[test]
    fn milestone_commands_carry_top_level_fields() {
        let raw = r#"{"command": "createMilestone", "username": "mira",
                      "timestamp": "2024-03-01", "name": "launch",
                      "dueDate": "2024-03-20", "blockingFor": ["beta"],
                      "tickets": [1, 2], "assignedDevs": ["dana"]}"#;
        let command = serde_json::from_str::<WireCommand>(raw).expect("parse");
        assert_eq!(command.name.as_deref(), Some("launch"));
        assert_eq!(command.tickets.as_deref(), Some(&[1, 2][..]));
        assert_eq!(command.blocking_for.as_deref(), Some(&["beta".to_string()][..]));
    }
}

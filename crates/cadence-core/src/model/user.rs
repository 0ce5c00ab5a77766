use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::model::ticket::{ParseEnumError, TicketId};

/// The three participant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Manager,
    Developer,
    Reporter,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "MANAGER",
            Self::Developer => "DEVELOPER",
            Self::Reporter => "REPORTER",
        }
    }
}

/// Expertise areas for developers and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpertiseArea {
    Frontend,
    Backend,
    Devops,
    Design,
    Db,
    Mobile,
    Fullstack,
}

impl ExpertiseArea {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "FRONTEND",
            Self::Backend => "BACKEND",
            Self::Devops => "DEVOPS",
            Self::Design => "DESIGN",
            Self::Db => "DB",
            Self::Mobile => "MOBILE",
            Self::Fullstack => "FULLSTACK",
        }
    }
}

/// Developer seniority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
}

impl Seniority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Junior => "JUNIOR",
            Self::Mid => "MID",
            Self::Senior => "SENIOR",
        }
    }
}

/// A system participant.
///
/// Users own the tickets they report and hold a reference list of tickets
/// assigned to them; both are id lists into the engine's ticket store.
/// The notification inbox is the receiving half of the milestone observer
/// relationship — milestones push messages with [`User::notify`], views drain
/// them with [`User::drain_notifications`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub hire_date: Option<NaiveDate>,
    pub expertise_area: Option<ExpertiseArea>,
    pub seniority: Option<Seniority>,
    /// Manager -> developer edges.
    pub subordinates: Vec<String>,
    /// Tickets reported by this user.
    pub reported: Vec<TicketId>,
    /// Tickets currently assigned to this user.
    pub assigned: Vec<TicketId>,
    /// Pending notification messages, oldest first.
    pub notifications: Vec<String>,
}

impl User {
    /// Create a user with the mandatory fields; the rest default to empty.
    #[must_use]
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            role,
            hire_date: None,
            expertise_area: None,
            seniority: None,
            subordinates: Vec::new(),
            reported: Vec::new(),
            assigned: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Deliver a notification message.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notifications.push(message.into());
    }

    /// Take all pending notifications, leaving the inbox empty.
    pub fn drain_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ExpertiseArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MANAGER" => Ok(Self::Manager),
            "DEVELOPER" => Ok(Self::Developer),
            "REPORTER" => Ok(Self::Reporter),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for ExpertiseArea {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "FRONTEND" => Ok(Self::Frontend),
            "BACKEND" => Ok(Self::Backend),
            "DEVOPS" => Ok(Self::Devops),
            "DESIGN" => Ok(Self::Design),
            "DB" => Ok(Self::Db),
            "MOBILE" => Ok(Self::Mobile),
            "FULLSTACK" => Ok(Self::Fullstack),
            _ => Err(ParseEnumError {
                expected: "expertise area",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Seniority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "JUNIOR" => Ok(Self::Junior),
            "MID" => Ok(Self::Mid),
            "SENIOR" => Ok(Self::Senior),
            _ => Err(ParseEnumError {
                expected: "seniority",
                got: s.to_string(),
            }),
        }
    }
}

//! cadence-core: the temporal workflow engine behind cadence.
//!
//! One simulated organization, one monotonic clock, one batch of commands.
//! The engine owns the entity graph (users, tickets, milestones) and applies
//! commands strictly in order; advancing the clock replays every skipped day
//! through the milestone engine so escalation cadences and due-date
//! crossings are never lost.
//!
//! # Conventions
//!
//! - **Errors**: validation failures are [`error::Rejection`] values;
//!   fallible plumbing uses `anyhow::Result`.
//! - **Logging**: `tracing` macros (`debug!`, `trace!`); subscribers are the
//!   binary's concern.

pub mod clock;
pub mod config;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;

pub use engine::Engine;

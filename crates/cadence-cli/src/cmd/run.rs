//! `cad run` — process a command batch against a fresh engine.
//!
//! Reads the user registry and the ordered command array, stamps the clock
//! with each command's timestamp (replaying skipped days), dispatches the
//! command, and writes the collected view documents and error envelopes as
//! pretty-printed JSON.

use anyhow::{Context, Result};
use cadence_core::Engine;
use cadence_core::clock::parse_wire_date;
use cadence_core::config::{EngineConfig, load_engine_config};
use cadence_core::model::milestone::MilestoneDraft;
use clap::Args;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::views;
use crate::wire::{WireCommand, WireUser};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the JSON array of commands to process, in order.
    #[arg(long)]
    pub commands: PathBuf,

    /// Path to the JSON array of users.
    #[arg(long)]
    pub users: PathBuf,

    /// Where to write the pretty-printed JSON output array.
    #[arg(long)]
    pub output: PathBuf,

    /// Optional TOML file overriding engine defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run_batch(args: &RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_engine_config(path)?,
        None => EngineConfig::default(),
    };

    let users_raw = fs::read_to_string(&args.users)
        .with_context(|| format!("read users file {}", args.users.display()))?;
    let users: Vec<WireUser> = serde_json::from_str(&users_raw)
        .with_context(|| format!("parse users file {}", args.users.display()))?;

    let commands_raw = fs::read_to_string(&args.commands)
        .with_context(|| format!("read commands file {}", args.commands.display()))?;
    let commands: Vec<WireCommand> = serde_json::from_str(&commands_raw)
        .with_context(|| format!("parse commands file {}", args.commands.display()))?;

    let mut engine = Engine::new(config, users.into_iter().map(WireUser::into_user));
    let mut outputs: Vec<Value> = Vec::new();

    for command in &commands {
        let Ok(date) = parse_wire_date(&command.timestamp) else {
            warn!(command = %command.command, timestamp = %command.timestamp, "bad timestamp, skipping");
            continue;
        };
        engine.stamp(date);
        dispatch(&mut engine, command, &mut outputs);
    }

    let rendered = serde_json::to_string_pretty(&outputs).context("render output JSON")?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output directory {}", parent.display()))?;
        }
    }
    fs::write(&args.output, rendered)
        .with_context(|| format!("write output file {}", args.output.display()))?;
    Ok(())
}

/// Route one command into the engine, collecting any output document.
fn dispatch(engine: &mut Engine, command: &WireCommand, outputs: &mut Vec<Value>) {
    match command.command.as_str() {
        "reportTicket" => {
            let Some(params) = command.params.clone() else {
                warn!("reportTicket without params, skipping");
                return;
            };
            let Some(draft) = params.into_draft() else {
                warn!("reportTicket without expertise area, skipping");
                return;
            };
            if let Err(rejection) = engine.report_ticket(&command.username, draft) {
                outputs.push(views::error_view(command, &rejection.to_string()));
            }
        }
        "createMilestone" => match milestone_draft(command) {
            Ok(draft) => {
                if let Err(rejection) = engine.create_milestone(&command.username, draft) {
                    outputs.push(views::error_view(command, &rejection.to_string()));
                }
            }
            Err(reason) => {
                outputs.push(views::error_view(
                    command,
                    &format!("Failed to create milestone: {reason}"),
                ));
            }
        },
        "assignTicket" => {
            let Some(ticket_id) = command.ticket_id else {
                return;
            };
            if let Err(rejection) = engine.assign(&command.username, ticket_id) {
                outputs.push(views::error_view(command, &rejection.to_string()));
            }
        }
        "undoAssignTicket" => {
            if let Some(ticket_id) = command.ticket_id {
                engine.unassign(&command.username, ticket_id);
            }
        }
        "changeStatus" => {
            let Some(ticket_id) = command.ticket_id else {
                return;
            };
            if let Err(rejection) = engine.change_status(&command.username, ticket_id) {
                outputs.push(views::error_view(command, &rejection.to_string()));
            }
        }
        "undoChangeStatus" => {
            let Some(ticket_id) = command.ticket_id else {
                return;
            };
            if let Err(rejection) = engine.undo_change_status(&command.username, ticket_id) {
                outputs.push(views::error_view(command, &rejection.to_string()));
            }
        }
        "addComment" => {
            let (Some(ticket_id), Some(content)) = (command.ticket_id, command.comment.as_deref())
            else {
                return;
            };
            if let Err(rejection) = engine.add_comment(&command.username, ticket_id, content) {
                outputs.push(views::error_view(command, &rejection.to_string()));
            }
        }
        "undoAddComment" => {
            let Some(ticket_id) = command.ticket_id else {
                return;
            };
            if let Err(rejection) = engine.undo_comment(ticket_id) {
                outputs.push(views::error_view(command, &rejection.to_string()));
            }
        }
        "viewTickets" => outputs.push(views::tickets_view(engine, command)),
        "viewAssignedTickets" => outputs.push(views::assigned_tickets_view(engine, command)),
        "viewMilestones" => outputs.push(views::milestones_view(engine, command)),
        "viewTicketHistory" => outputs.push(views::ticket_history_view(engine, command)),
        "viewNotifications" => {
            if let Some(view) = views::notifications_view(engine, command) {
                outputs.push(view);
            }
        }
        // Phase-advancing marker command; the clock stamp above is its only
        // effect.
        "lostInvestors" => {}
        other => warn!(command = other, "unknown command, skipping"),
    }
}

/// Assemble a milestone draft from the command's top-level fields.
fn milestone_draft(command: &WireCommand) -> std::result::Result<MilestoneDraft, String> {
    let name = command
        .name
        .clone()
        .ok_or_else(|| "missing milestone name".to_string())?;
    let due_raw = command
        .due_date
        .as_deref()
        .ok_or_else(|| "missing due date".to_string())?;
    let due_date =
        parse_wire_date(due_raw).map_err(|err| format!("invalid due date '{due_raw}': {err}"))?;

    Ok(MilestoneDraft {
        name,
        due_date,
        blocking_for: command.blocking_for.clone().unwrap_or_default(),
        ticket_ids: command.tickets.clone().unwrap_or_default(),
        assigned_devs: command.assigned_devs.clone().unwrap_or_default(),
    })
}

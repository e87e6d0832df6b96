//! Scenario files: a staff list plus a timed script of desk operations.
//!
//! ```toml
//! [[technicians]]
//! id = "A05589"
//! name = "Andree"
//! extension = 55491
//!
//! [[steps]]
//! at = "11/1/21 8:22"
//! action = "create"
//! originator = "A21013"
//! description = "Unable to log in."
//! priority = "HIGH"
//! ```

use anyhow::{Context, Result};
use helpdesk_core::{HelpDesk, Priority, TicketId};
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub technicians: Vec<StaffEntry>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct StaffEntry {
    pub id: String,
    pub name: String,
    pub extension: u32,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    /// Clock setting applied before the action, `M/d/yy H:mm`
    #[serde(default)]
    pub at: Option<String>,

    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Create {
        originator: String,
        description: String,
        #[serde(deserialize_with = "from_name")]
        priority: Priority,
    },
    Reopen {
        ticket: TicketId,
        reason: String,
        #[serde(deserialize_with = "from_name")]
        priority: Priority,
    },
    Assign {
        ticket: TicketId,
        technician: String,
    },
    Wait {
        ticket: TicketId,
        reason: String,
    },
    Resume {
        ticket: TicketId,
        reason: String,
    },
    Resolve {
        ticket: TicketId,
        reason: String,
    },
    Note {
        ticket: TicketId,
        note: String,
    },
    Tag {
        ticket: TicketId,
        tags: Vec<String>,
    },
}

/// Accept `high`, `High` or `HIGH`
fn from_name<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::Reopen { .. } => "reopen",
            Action::Assign { .. } => "assign",
            Action::Wait { .. } => "wait",
            Action::Resume { .. } => "resume",
            Action::Resolve { .. } => "resolve",
            Action::Note { .. } => "note",
            Action::Tag { .. } => "tag",
        }
    }
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Register the staff, then run every step in order.
    ///
    /// Stops at the first failing step; the desk keeps whatever the earlier
    /// steps did.
    pub fn replay(&self, desk: &mut HelpDesk) -> Result<()> {
        for entry in &self.technicians {
            desk.add_technician(entry.id.as_str(), entry.name.as_str(), entry.extension)
                .with_context(|| format!("Failed to add technician {}", entry.id))?;
        }

        for (index, step) in self.steps.iter().enumerate() {
            step.apply(desk)
                .with_context(|| format!("Step {} ({}) failed", index + 1, step.action.name()))?;
        }

        debug!(
            technicians = self.technicians.len(),
            steps = self.steps.len(),
            "Replayed scenario"
        );
        Ok(())
    }
}

impl Step {
    fn apply(&self, desk: &mut HelpDesk) -> helpdesk_core::Result<()> {
        if let Some(at) = &self.at {
            desk.clock().set_time_str(at)?;
        }

        match &self.action {
            Action::Create {
                originator,
                description,
                priority,
            } => {
                let id = desk.create_ticket(originator.as_str(), description.as_str(), *priority)?;
                debug!(ticket = id, "Created ticket");
            }
            Action::Reopen {
                ticket,
                reason,
                priority,
            } => {
                desk.reopen_ticket(*ticket, reason.as_str(), *priority)?;
            }
            Action::Assign { ticket, technician } => desk.assign(*ticket, technician)?,
            Action::Wait { ticket, reason } => desk.wait(*ticket, reason.as_str())?,
            Action::Resume { ticket, reason } => desk.resume(*ticket, reason.as_str())?,
            Action::Resolve { ticket, reason } => desk.resolve(*ticket, reason.as_str())?,
            Action::Note { ticket, note } => desk.add_note(*ticket, note.as_str())?,
            Action::Tag { ticket, tags } => desk.add_tags(*ticket, tags)?,
        }
        Ok(())
    }
}

/// Load a scenario and replay it onto a desk built from `config`
pub fn load(config: &helpdesk_config::Config, path: &Path) -> Result<HelpDesk> {
    let scenario = Scenario::from_path(path)?;
    let mut desk = config.help_desk()?;
    scenario.replay(&mut desk)?;
    Ok(desk)
}

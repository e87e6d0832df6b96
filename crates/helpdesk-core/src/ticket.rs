//! Problem tickets and their lifecycle
//!
//! ```text
//!             assign              wait
//! CREATED ──────────────► ASSIGNED ────► WAITING
//!                            │   ▲          │
//!                            │   └──resume──┘
//!                          resolve
//!                            ▼
//!                         RESOLVED
//! ```
//!
//! Every transition appends an [`Event`]; the first event is always CREATED.
//! A ticket reopened from a resolved one keeps a `prior` link; reads that
//! span the lineage live on [`TicketView`](crate::TicketView).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, MILLIS_PER_MINUTE};
use crate::event::Event;
use crate::tag::{Tag, TagRegistry};
use crate::technician::Technician;
use crate::{Error, Result};

pub type TicketId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Created,
    Assigned,
    Waiting,
    Resolved,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "CREATED",
            Status::Assigned => "ASSIGNED",
            Status::Waiting => "WAITING",
            Status::Resolved => "RESOLVED",
        }
    }

    /// ASSIGNED or WAITING: counts toward a technician's workload
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Assigned | Status::Waiting)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "CREATED" => Ok(Status::Created),
            "ASSIGNED" => Ok(Status::Assigned),
            "WAITING" => Ok(Status::Waiting),
            "RESOLVED" => Ok(Status::Resolved),
            _ => Err(Error::InvalidArgument(format!("Unknown status: {s}"))),
        }
    }
}

/// Ordered LOW < MEDIUM < HIGH < URGENT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(Error::InvalidArgument(format!("Unknown priority: {s}"))),
        }
    }
}

/// Sort key for tickets: priority descending, then id ascending.
///
/// Priority never changes after creation, so two keys are equal exactly when
/// their ids are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketKey {
    priority: Priority,
    id: TicketId,
}

impl TicketKey {
    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl PartialOrd for TicketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TicketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id == other.id {
            return Ordering::Equal;
        }
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    id: TicketId,
    status: Status,
    priority: Priority,
    originator: String,
    description: String,
    technician: Option<String>,
    history: Vec<Event>,
    tags: BTreeSet<Tag>,
    prior: Option<TicketId>,
    clock: Clock,
}

impl Ticket {
    /// Create a ticket in CREATED status; events are stamped from `clock`
    pub fn new(
        id: TicketId,
        originator: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        clock: &Clock,
    ) -> Result<Self> {
        let originator = originator.into();
        let description = description.into();
        if originator.trim().is_empty() || description.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Originator and description must be non-empty: {originator:?}, {description:?}"
            )));
        }

        let created = Event::with_status(id, Status::Created, "Created ticket.", clock);
        debug!(ticket = id, %priority, "Created ticket");
        Ok(Self {
            id,
            status: Status::Created,
            priority,
            originator,
            description,
            technician: None,
            history: vec![created],
            tags: BTreeSet::new(),
            prior: None,
            clock: clock.clone(),
        })
    }

    /// Create a ticket that continues `prior`, which must be resolved.
    ///
    /// The new ticket takes the prior's originator, uses `reason` as its
    /// description and goes straight to the prior's technician.
    pub fn reopen(
        id: TicketId,
        prior: &Ticket,
        reason: impl Into<String>,
        priority: Priority,
        technician: &mut Technician,
        clock: &Clock,
    ) -> Result<Self> {
        if prior.status != Status::Resolved {
            return Err(Error::InvalidState(format!(
                "Can't reopen ticket {} while it is {}.",
                prior.id, prior.status
            )));
        }
        if prior.technician.as_deref() != Some(technician.id()) {
            return Err(Error::InvalidArgument(format!(
                "Ticket {} must be reopened with its own technician, not {}.",
                prior.id, technician
            )));
        }

        let mut ticket = Ticket::new(id, prior.originator.clone(), reason, priority, clock)?;
        ticket.prior = Some(prior.id);
        ticket.assign(technician)?;
        Ok(ticket)
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn originator(&self) -> &str {
        &self.originator
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Id of the current technician, if any
    pub fn technician(&self) -> Option<&str> {
        self.technician.as_deref()
    }

    /// This ticket's own events, oldest first
    pub fn history(&self) -> &[Event] {
        &self.history
    }

    /// This ticket's own tags
    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    /// The resolved ticket this one was reopened from
    pub fn prior(&self) -> Option<TicketId> {
        self.prior
    }

    pub fn key(&self) -> TicketKey {
        TicketKey {
            priority: self.priority,
            id: self.id,
        }
    }

    /// Hand the ticket to a technician. Allowed in any status but RESOLVED.
    ///
    /// A desk moving the ticket between technicians releases it from the
    /// previous one; this method only registers it with the new one.
    pub fn assign(&mut self, technician: &mut Technician) -> Result<()> {
        if self.status == Status::Resolved {
            return Err(Error::InvalidState(format!(
                "Can't re-assign resolved ticket {}.",
                self.id
            )));
        }

        self.technician = Some(technician.id().to_string());
        self.transition(Status::Assigned, format!("Assigned to {technician}."));
        technician.add_active_ticket(self)
    }

    pub fn wait(&mut self, reason: impl Into<String>) -> Result<()> {
        if self.status != Status::Assigned {
            return Err(Error::InvalidState(format!(
                "Can't wait on ticket {} until it is assigned; it is {}.",
                self.id, self.status
            )));
        }
        self.transition(Status::Waiting, reason.into());
        Ok(())
    }

    pub fn resume(&mut self, reason: impl Into<String>) -> Result<()> {
        if self.status != Status::Waiting {
            return Err(Error::InvalidState(format!(
                "Can't resume ticket {} unless it is WAITING; it is {}.",
                self.id, self.status
            )));
        }
        self.transition(Status::Assigned, reason.into());
        Ok(())
    }

    /// Resolve an ASSIGNED ticket; `technician` must be the one it is assigned to
    pub fn resolve(
        &mut self,
        reason: impl Into<String>,
        technician: &mut Technician,
    ) -> Result<()> {
        if self.status != Status::Assigned {
            return Err(Error::InvalidState(format!(
                "Can't resolve ticket {} unless it is ASSIGNED; it is {}.",
                self.id, self.status
            )));
        }
        if self.technician.as_deref() != Some(technician.id()) {
            return Err(Error::InvalidArgument(format!(
                "Ticket {} is not assigned to {}.",
                self.id, technician
            )));
        }

        self.transition(Status::Resolved, reason.into());
        technician.remove_active_ticket(self)
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.history.push(Event::new(self.id, note, &self.clock));
    }

    /// Tag the ticket; every value is resolved before any is added
    pub fn add_tags<I, S>(&mut self, registry: &TagRegistry, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = values
            .into_iter()
            .map(|value| registry.tag(value.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.tags.extend(tags);
        Ok(())
    }

    /// Whole minutes from the first to the last event of a resolved ticket
    pub fn minutes_to_resolve(&self) -> Result<i64> {
        if self.status != Status::Resolved {
            return Err(Error::InvalidState(format!(
                "Ticket {} is not yet resolved.",
                self.id
            )));
        }
        let (Some(first), Some(last)) = (self.history.first(), self.history.last()) else {
            return Err(Error::InvalidState(format!("Ticket {} has no history.", self.id)));
        };
        Ok((last.timestamp() - first.timestamp()) / MILLIS_PER_MINUTE)
    }

    /// Case-sensitive search of the description and this ticket's notes
    pub fn includes_text(&self, text: &str) -> bool {
        self.description.contains(text) || self.history.iter().any(|e| e.note().contains(text))
    }

    fn transition(&mut self, status: Status, note: String) {
        debug!(ticket = self.id, from = %self.status, to = %status, "Ticket transition");
        self.status = status;
        self.history
            .push(Event::with_status(self.id, status, note, &self.clock));
    }
}

impl PartialEq for Ticket {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ticket {}

impl Hash for Ticket {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Ticket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ticket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket {}: {} priority, {}",
            self.id, self.priority, self.status
        )
    }
}

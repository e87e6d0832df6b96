//! Support staff and their active workload

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::ticket::{Status, Ticket, TicketId, TicketKey};
use crate::{Error, Result};

/// A technician, ordered and compared by id.
///
/// The active set holds keys, not tickets: the desk owns the tickets and the
/// technician only tracks which of them are ASSIGNED or WAITING.
#[derive(Debug, Clone, Serialize)]
pub struct Technician {
    id: String,
    name: String,
    extension: u32,
    #[serde(skip)]
    active: BTreeSet<TicketKey>,
}

impl Technician {
    pub fn new(id: impl Into<String>, name: impl Into<String>, extension: u32) -> Result<Self> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() || name.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Technician id and name must be non-empty: id={id:?}, name={name:?}"
            )));
        }

        Ok(Self {
            id,
            name,
            extension,
            active: BTreeSet::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> u32 {
        self.extension
    }

    /// Ids of active tickets, highest priority first
    pub fn active_tickets(&self) -> impl Iterator<Item = TicketId> + '_ {
        self.active.iter().map(|key| key.id())
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_working_on(&self, ticket_id: TicketId) -> bool {
        self.active.iter().any(|key| key.id() == ticket_id)
    }

    /// Track a newly assigned ticket. Adding it twice is a no-op.
    pub fn add_active_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        if ticket.status() != Status::Assigned {
            return Err(Error::InvalidArgument(format!(
                "Only an ASSIGNED ticket can become active; ticket {} is {}",
                ticket.id(),
                ticket.status()
            )));
        }
        self.active.insert(ticket.key());
        Ok(())
    }

    /// Stop tracking a ticket once it is resolved
    pub fn remove_active_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        if ticket.status() != Status::Resolved {
            return Err(Error::InvalidArgument(format!(
                "Only a RESOLVED ticket can leave the active set; ticket {} is {}",
                ticket.id(),
                ticket.status()
            )));
        }
        self.active.remove(&ticket.key());
        Ok(())
    }

    /// Drop a ticket that moved to another technician
    pub(crate) fn release(&mut self, key: TicketKey) {
        self.active.remove(&key);
    }
}

impl PartialEq for Technician {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Technician {}

impl PartialOrd for Technician {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Technician {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Technician {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Technician {}, {}", self.id, self.name)
    }
}

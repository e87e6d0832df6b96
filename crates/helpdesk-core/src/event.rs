//! Ticket history entries

use std::fmt;

use serde::Serialize;
use time::UtcOffset;

use crate::clock::{self, Clock};
use crate::ticket::{Status, TicketId};

/// One immutable entry in a ticket's history, stamped from the clock at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    ticket_id: TicketId,
    timestamp: i64,
    new_status: Option<Status>,
    note: String,
    #[serde(skip)]
    offset: UtcOffset,
}

impl Event {
    /// A note that does not change the ticket's status
    pub fn new(ticket_id: TicketId, note: impl Into<String>, clock: &Clock) -> Self {
        Self::record(ticket_id, None, note.into(), clock)
    }

    /// A status transition
    pub fn with_status(
        ticket_id: TicketId,
        new_status: Status,
        note: impl Into<String>,
        clock: &Clock,
    ) -> Self {
        Self::record(ticket_id, Some(new_status), note.into(), clock)
    }

    fn record(
        ticket_id: TicketId,
        new_status: Option<Status>,
        note: String,
        clock: &Clock,
    ) -> Self {
        Self {
            ticket_id,
            timestamp: clock.time(),
            new_status,
            note,
            offset: clock.offset(),
        }
    }

    pub fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// Milliseconds since the epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn new_status(&self) -> Option<Status> {
        self.new_status
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Timestamp rendered as `M/d/yy H:mm` in the recording clock's zone
    pub fn formatted_time(&self) -> String {
        clock::format_millis(self.timestamp, self.offset)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event: ticket{}, {}", self.ticket_id, self.note)?;
        if let Some(status) = self.new_status {
            write!(f, " [{}]", status)?;
        }
        write!(f, " ({})", self.formatted_time())
    }
}

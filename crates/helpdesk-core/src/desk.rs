//! Help desk facade
//!
//! The desk owns every technician and ticket, hands out ids, balances new
//! tickets across technicians and answers the aggregate queries.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::iter;
use std::ops::Deref;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::event::Event;
use crate::tag::{Tag, TagRegistry};
use crate::technician::Technician;
use crate::ticket::{Priority, Status, Ticket, TicketId, TicketKey};
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct HelpDesk {
    clock: Clock,
    registry: TagRegistry,
    next_id: TicketId,
    technicians: BTreeMap<String, Technician>,
    tickets: HashMap<TicketId, Ticket>,
    /// Natural ticket order: priority descending, then id
    order: BTreeSet<TicketKey>,
}

impl HelpDesk {
    /// Desk with its own clock (at the epoch, UTC) and tag registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Desk sharing the given clock and tag registry
    pub fn with_services(clock: Clock, registry: TagRegistry) -> Self {
        Self {
            clock,
            registry,
            ..Self::default()
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn tag_registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Resolve raw text through this desk's registry
    pub fn tag(&self, value: &str) -> Result<Tag> {
        self.registry.tag(value)
    }

    // ========================================================================
    // Technicians
    // ========================================================================

    pub fn add_technician(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        extension: u32,
    ) -> Result<()> {
        let technician = Technician::new(id, name, extension)?;
        if self.technicians.contains_key(technician.id()) {
            return Err(Error::InvalidArgument(format!(
                "Technician {} is already registered.",
                technician.id()
            )));
        }

        debug!(technician = %technician, "Registered technician");
        self.technicians
            .insert(technician.id().to_string(), technician);
        Ok(())
    }

    /// Technicians ordered by id
    pub fn technicians(&self) -> impl Iterator<Item = &Technician> {
        self.technicians.values()
    }

    pub fn technician(&self, id: &str) -> Option<&Technician> {
        self.technicians.get(id)
    }

    // ========================================================================
    // Ticket lifecycle
    // ========================================================================

    /// Create a ticket and assign it to the least-loaded technician.
    ///
    /// Ties go to the technician with the lowest id.
    pub fn create_ticket(
        &mut self,
        originator: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Result<TicketId> {
        let Some(technician) = self
            .technicians
            .values_mut()
            .min_by_key(|technician| technician.active_count())
        else {
            return Err(no_technicians());
        };

        let id = self.next_id + 1;
        let mut ticket = Ticket::new(id, originator, description, priority, &self.clock)?;
        ticket.assign(technician)?;

        self.next_id = id;
        self.insert(ticket);
        Ok(id)
    }

    /// Create a ticket continuing a resolved one, assigned to the same
    /// technician regardless of load.
    pub fn reopen_ticket(
        &mut self,
        prior_id: TicketId,
        reason: impl Into<String>,
        priority: Priority,
    ) -> Result<TicketId> {
        if self.technicians.is_empty() {
            return Err(no_technicians());
        }
        let prior = self
            .tickets
            .get(&prior_id)
            .ok_or_else(|| unknown_ticket(prior_id))?;
        if prior.status() != Status::Resolved {
            return Err(Error::InvalidState(format!(
                "Can't reopen ticket {} while it is {}.",
                prior_id,
                prior.status()
            )));
        }
        let technician = prior
            .technician()
            .and_then(|id| self.technicians.get_mut(id))
            .ok_or_else(|| {
                Error::InvalidState(format!("Ticket {prior_id} has no registered technician."))
            })?;

        let id = self.next_id + 1;
        let ticket = Ticket::reopen(id, prior, reason, priority, technician, &self.clock)?;

        info!(ticket = id, prior = prior_id, technician = %technician, "Reopened ticket");
        self.next_id = id;
        self.insert(ticket);
        Ok(id)
    }

    /// Move a ticket to the given technician
    pub fn assign(&mut self, ticket_id: TicketId, technician_id: &str) -> Result<()> {
        let ticket = self
            .tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| unknown_ticket(ticket_id))?;
        let previous = ticket.technician().map(str::to_string);
        let technician = self
            .technicians
            .get_mut(technician_id)
            .ok_or_else(|| unknown_technician(technician_id))?;

        ticket.assign(technician)?;

        if let Some(previous) = previous.filter(|previous| previous != technician_id) {
            if let Some(previous) = self.technicians.get_mut(&previous) {
                previous.release(ticket.key());
            }
        }
        Ok(())
    }

    pub fn wait(&mut self, ticket_id: TicketId, reason: impl Into<String>) -> Result<()> {
        self.ticket_mut(ticket_id)?.wait(reason)
    }

    pub fn resume(&mut self, ticket_id: TicketId, reason: impl Into<String>) -> Result<()> {
        self.ticket_mut(ticket_id)?.resume(reason)
    }

    pub fn resolve(&mut self, ticket_id: TicketId, reason: impl Into<String>) -> Result<()> {
        let ticket = self
            .tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| unknown_ticket(ticket_id))?;
        let Some(technician_id) = ticket.technician() else {
            return Err(Error::InvalidState(format!(
                "Can't resolve ticket {ticket_id} unless it is ASSIGNED; it is {}.",
                ticket.status()
            )));
        };
        let technician = self
            .technicians
            .get_mut(technician_id)
            .ok_or_else(|| unknown_technician(technician_id))?;
        ticket.resolve(reason, technician)
    }

    pub fn add_note(&mut self, ticket_id: TicketId, note: impl Into<String>) -> Result<()> {
        self.ticket_mut(ticket_id)?.add_note(note);
        Ok(())
    }

    pub fn add_tags<I, S>(&mut self, ticket_id: TicketId, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ticket = self
            .tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| unknown_ticket(ticket_id))?;
        ticket.add_tags(&self.registry, values)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn ticket(&self, id: TicketId) -> Option<TicketView<'_>> {
        self.tickets.get(&id).map(|ticket| TicketView { desk: self, ticket })
    }

    /// All tickets, highest priority first, then by id
    pub fn tickets(&self) -> impl Iterator<Item = TicketView<'_>> {
        self.order.iter().filter_map(|key| self.ticket(key.id()))
    }

    pub fn tickets_by_status(&self, status: Status) -> impl Iterator<Item = TicketView<'_>> {
        self.tickets().filter(move |t| t.status() == status)
    }

    pub fn tickets_by_not_status(&self, status: Status) -> impl Iterator<Item = TicketView<'_>> {
        self.tickets().filter(move |t| t.status() != status)
    }

    /// Tickets currently assigned to the technician with this id
    pub fn tickets_by_technician(
        &self,
        technician_id: &str,
    ) -> impl Iterator<Item = TicketView<'_>> {
        self.tickets()
            .filter(move |t| t.technician() == Some(technician_id))
    }

    /// Tickets carrying at least one of `tags`, each listed once
    pub fn tickets_with_any_tag(&self, tags: &[Tag]) -> impl Iterator<Item = TicketView<'_>> {
        self.tickets().filter(move |t| t.has_any_tag(tags))
    }

    pub fn tickets_by_text(&self, text: &str) -> impl Iterator<Item = TicketView<'_>> {
        self.tickets().filter(move |t| t.includes_text(text))
    }

    /// Mean whole minutes to resolve, over resolved tickets; `None` if there
    /// are none
    pub fn average_minutes_to_resolve(&self) -> Option<i64> {
        let minutes: Vec<i64> = self
            .tickets_by_status(Status::Resolved)
            .filter_map(|t| t.minutes_to_resolve().ok())
            .collect();
        if minutes.is_empty() {
            return None;
        }
        let average = minutes.iter().sum::<i64>() as f64 / minutes.len() as f64;
        Some(average as i64)
    }

    /// Mean minutes to resolve per technician id. Technicians without a
    /// resolved ticket are absent.
    pub fn average_minutes_to_resolve_per_technician(&self) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<String, (i64, u32)> = BTreeMap::new();
        for ticket in self.tickets_by_status(Status::Resolved) {
            let (Some(technician), Ok(minutes)) =
                (ticket.technician(), ticket.minutes_to_resolve())
            else {
                continue;
            };
            let entry = totals.entry(technician.to_string()).or_insert((0, 0));
            entry.0 += minutes;
            entry.1 += 1;
        }

        totals
            .into_iter()
            .map(|(technician, (sum, count))| (technician, sum as f64 / f64::from(count)))
            .collect()
    }

    /// The `count` most recent events across all tickets, newest first.
    ///
    /// Each event appears once. Events sharing a timestamp keep the order in
    /// which they are met walking tickets in natural order, each history
    /// oldest first.
    pub fn latest_activity(&self, count: usize) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .order
            .iter()
            .filter_map(|key| self.tickets.get(&key.id()))
            .flat_map(|ticket| ticket.history())
            .collect();
        events.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        events.truncate(count);
        events
    }

    fn ticket_mut(&mut self, id: TicketId) -> Result<&mut Ticket> {
        self.tickets.get_mut(&id).ok_or_else(|| unknown_ticket(id))
    }

    fn insert(&mut self, ticket: Ticket) {
        self.order.insert(ticket.key());
        self.tickets.insert(ticket.id(), ticket);
    }
}

/// A ticket as seen from its desk.
///
/// Dereferences to the [`Ticket`]; `history`, `tags` and `includes_text`
/// additionally cover the tickets this one was reopened from.
#[derive(Debug, Clone, Copy)]
pub struct TicketView<'a> {
    desk: &'a HelpDesk,
    ticket: &'a Ticket,
}

impl<'a> TicketView<'a> {
    pub fn ticket(&self) -> &'a Ticket {
        self.ticket
    }

    /// The ticket, then the one it was reopened from, and so on
    pub fn lineage(&self) -> impl Iterator<Item = &'a Ticket> + use<'a> {
        let desk = self.desk;
        iter::successors(Some(self.ticket), move |ticket| {
            ticket.prior().and_then(|prior| desk.tickets.get(&prior))
        })
    }

    /// The technician record for the current assignment
    pub fn assignee(&self) -> Option<&'a Technician> {
        self.ticket
            .technician()
            .and_then(|id| self.desk.technicians.get(id))
    }

    /// Events of the whole lineage, oldest first
    pub fn history(&self) -> Vec<&'a Event> {
        let mut lineage: Vec<&'a Ticket> = self.lineage().collect();
        lineage.reverse();
        lineage
            .into_iter()
            .flat_map(|ticket| ticket.history())
            .collect()
    }

    /// Tags of the whole lineage
    pub fn tags(&self) -> BTreeSet<Tag> {
        self.lineage()
            .flat_map(|ticket| ticket.tags().iter().cloned())
            .collect()
    }

    pub fn has_any_tag(&self, tags: &[Tag]) -> bool {
        self.lineage()
            .any(|ticket| ticket.tags().iter().any(|tag| tags.contains(tag)))
    }

    pub fn includes_text(&self, text: &str) -> bool {
        self.lineage().any(|ticket| ticket.includes_text(text))
    }
}

impl Deref for TicketView<'_> {
    type Target = Ticket;

    fn deref(&self) -> &Ticket {
        self.ticket
    }
}

fn no_technicians() -> Error {
    Error::InvalidState("No technicians available yet.".to_string())
}

fn unknown_ticket(id: TicketId) -> Error {
    Error::InvalidArgument(format!("No ticket with id {id}."))
}

fn unknown_technician(id: &str) -> Error {
    Error::InvalidArgument(format!("No technician with id {id}."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MILLIS_PER_MINUTE;

    const ORIGINATOR: &str = "ORIGINATOR";
    const DESCRIPTION: &str = "DESCRIPTION";
    const PRIORITY: Priority = Priority::High;

    fn staffed_desk() -> HelpDesk {
        let mut desk = HelpDesk::new();
        desk.add_technician("A05589", "Andree", 55491).unwrap();
        desk.add_technician("A12312", "Boris", 12399).unwrap();
        desk.add_technician("A17440", "Caelem", 34002).unwrap();
        desk.add_technician("A20265", "Dineh", 60709).unwrap();
        desk.clock().set_time_str("11/1/21 8:00").unwrap();
        desk
    }

    fn create(desk: &mut HelpDesk) -> TicketId {
        desk.create_ticket(ORIGINATOR, DESCRIPTION, PRIORITY).unwrap()
    }

    fn assignee_name(desk: &HelpDesk, id: TicketId) -> String {
        desk.ticket(id).unwrap().assignee().unwrap().name().to_string()
    }

    #[test]
    fn test_no_technicians() {
        let mut desk = HelpDesk::new();
        let err = desk.create_ticket(ORIGINATOR, DESCRIPTION, PRIORITY).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(desk.tickets().count(), 0);

        let err = desk.reopen_ticket(1, "again", PRIORITY).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_duplicate_technician() {
        let mut desk = staffed_desk();
        let err = desk.add_technician("A05589", "Someone", 1).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(desk.technician("A05589").unwrap().name(), "Andree");
        assert_eq!(desk.technicians().count(), 4);
    }

    #[test]
    fn test_create_ticket() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        assert_eq!(id, 1);
        assert_eq!(desk.ticket(1).unwrap().status(), Status::Assigned);
    }

    #[test]
    fn test_assignment_sequence() {
        let mut desk = staffed_desk();
        let first = create(&mut desk);
        desk.clock().advance(MILLIS_PER_MINUTE);
        let second = create(&mut desk);
        desk.clock().advance(MILLIS_PER_MINUTE);
        let third = create(&mut desk);

        assert_eq!(assignee_name(&desk, first), "Andree");
        assert_eq!(assignee_name(&desk, second), "Boris");
        assert_eq!(assignee_name(&desk, third), "Caelem");
    }

    #[test]
    fn test_resolution_frees_capacity() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        desk.resolve(id, "RESOLVE_REASON").unwrap();

        let id = create(&mut desk);
        assert_eq!(assignee_name(&desk, id), "Andree");
    }

    #[test]
    fn test_invalid_ticket_leaves_counter() {
        let mut desk = staffed_desk();
        let err = desk.create_ticket("", DESCRIPTION, PRIORITY).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(create(&mut desk), 1);
        assert_eq!(desk.technician("A05589").unwrap().active_count(), 1);
    }

    #[test]
    fn test_unknown_ids() {
        let mut desk = staffed_desk();
        assert!(desk.ticket(1).is_none());
        assert!(desk.wait(1, "r").unwrap_err().is_invalid_argument());
        assert!(desk.add_note(1, "n").unwrap_err().is_invalid_argument());
        assert!(desk.reopen_ticket(9, "r", PRIORITY).unwrap_err().is_invalid_argument());

        let id = create(&mut desk);
        assert!(desk.assign(id, "NOBODY").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_reassign_moves_active_ticket() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        desk.wait(id, "waiting").unwrap();
        desk.assign(id, "A20265").unwrap();

        let ticket = desk.ticket(id).unwrap();
        assert_eq!(ticket.status(), Status::Assigned);
        assert_eq!(ticket.technician(), Some("A20265"));
        assert_eq!(desk.technician("A05589").unwrap().active_count(), 0);
        assert!(desk.technician("A20265").unwrap().is_working_on(id));
        assert_eq!(desk.tickets_by_technician("A05589").count(), 0);
    }

    #[test]
    fn test_state_machine_through_desk() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        assert!(desk.resume(id, "r").unwrap_err().is_invalid_state());
        desk.resolve(id, "done").unwrap();
        assert!(desk.assign(id, "A12312").unwrap_err().is_invalid_state());
        assert!(desk.wait(id, "r").unwrap_err().is_invalid_state());
        assert!(desk.resume(id, "r").unwrap_err().is_invalid_state());
        assert!(desk.resolve(id, "r").unwrap_err().is_invalid_state());
        assert_eq!(desk.ticket(id).unwrap().history().len(), 3);
        assert_eq!(desk.technician("A12312").unwrap().active_count(), 0);
    }

    #[test]
    fn test_tickets_in_natural_order() {
        let mut desk = staffed_desk();
        desk.create_ticket(ORIGINATOR, DESCRIPTION, Priority::Low).unwrap();
        desk.create_ticket(ORIGINATOR, DESCRIPTION, Priority::Urgent).unwrap();
        desk.create_ticket(ORIGINATOR, DESCRIPTION, Priority::Medium).unwrap();
        desk.create_ticket(ORIGINATOR, DESCRIPTION, Priority::Urgent).unwrap();

        let ids: Vec<_> = desk.tickets().map(|t| t.id()).collect();
        assert_eq!(ids, [2, 4, 3, 1]);
    }

    #[test]
    fn test_tickets_with_any_tag_no_duplicates() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        desk.add_tags(id, ["laptop", "audio"]).unwrap();
        create(&mut desk);

        let tags = [desk.tag("laptop").unwrap(), desk.tag("AUDIO").unwrap()];
        let found: Vec<_> = desk.tickets_with_any_tag(&tags).map(|t| t.id()).collect();
        assert_eq!(found, [id]);
    }

    #[test]
    fn test_add_tags_is_idempotent() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        desk.add_tags(id, ["x", "x"]).unwrap();
        desk.add_tags(id, ["X"]).unwrap();
        assert_eq!(desk.ticket(id).unwrap().tags().len(), 1);
    }

    #[test]
    fn test_averages() {
        let mut desk = staffed_desk();
        assert_eq!(desk.average_minutes_to_resolve(), None);
        assert!(desk.average_minutes_to_resolve_per_technician().is_empty());

        let first = create(&mut desk);
        let second = create(&mut desk);
        desk.clock().advance(3 * MILLIS_PER_MINUTE);
        desk.resolve(first, "done").unwrap();
        desk.clock().advance(2 * MILLIS_PER_MINUTE);
        desk.resolve(second, "done").unwrap();

        // 3 and 5 minutes
        assert_eq!(desk.average_minutes_to_resolve(), Some(4));
        let by_technician = desk.average_minutes_to_resolve_per_technician();
        assert_eq!(by_technician.len(), 2);
        assert_eq!(by_technician["A05589"], 3.0);
        assert_eq!(by_technician["A12312"], 5.0);
    }

    #[test]
    fn test_reopened_ticket_lineage() {
        let mut desk = staffed_desk();
        let prior = create(&mut desk);
        desk.add_tags(prior, ["laptop"]).unwrap();
        desk.clock().advance(MILLIS_PER_MINUTE);
        desk.resolve(prior, "Rebooted.").unwrap();
        desk.clock().advance(MILLIS_PER_MINUTE);
        let other = create(&mut desk);
        assert_eq!(assignee_name(&desk, other), "Andree");

        // Andree is now the busiest technician and still gets the reopen.
        let reopened = desk.reopen_ticket(prior, "Still won't boot.", Priority::Urgent).unwrap();
        assert_eq!(desk.technician("A05589").unwrap().active_count(), 2);
        desk.add_tags(reopened, ["urgent-hw"]).unwrap();

        let view = desk.ticket(reopened).unwrap();
        assert_eq!(view.prior(), Some(prior));
        assert_eq!(view.originator(), ORIGINATOR);
        assert_eq!(view.technician(), Some("A05589"));
        assert_eq!(view.history().len(), 3 + 2);
        assert_eq!(view.ticket().history().len(), 2);
        let tags: Vec<_> = view.tags().iter().map(|t| t.value().to_string()).collect();
        assert_eq!(tags, ["laptop", "urgent-hw"]);
        assert!(view.includes_text("Rebooted"));
        assert!(view.includes_text(DESCRIPTION));

        let timestamps: Vec<_> = view.history().iter().map(|e| e.timestamp()).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_reopen_unresolved() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        let err = desk.reopen_ticket(id, "again", PRIORITY).unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(desk.tickets().count(), 1);
        assert_eq!(create(&mut desk), 2);
    }

    #[test]
    fn test_reopen_chain() {
        let mut desk = staffed_desk();
        let first = create(&mut desk);
        desk.resolve(first, "one").unwrap();
        let second = desk.reopen_ticket(first, "again", PRIORITY).unwrap();
        desk.resolve(second, "two").unwrap();
        let third = desk.reopen_ticket(second, "and again", PRIORITY).unwrap();

        let view = desk.ticket(third).unwrap();
        let lineage: Vec<_> = view.lineage().map(|t| t.id()).collect();
        assert_eq!(lineage, [third, second, first]);
        assert_eq!(view.history().len(), 3 + 3 + 2);
        assert!(view.includes_text("one"));
    }

    #[test]
    fn test_latest_activity() {
        let mut desk = staffed_desk();
        let first = create(&mut desk);
        desk.clock().advance(MILLIS_PER_MINUTE);
        let second = create(&mut desk);
        desk.clock().advance(MILLIS_PER_MINUTE);
        desk.add_note(first, "latest").unwrap();

        let latest = desk.latest_activity(3);
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].note(), "latest");
        assert!(latest.windows(2).all(|w| w[0].timestamp() >= w[1].timestamp()));
        assert!(latest[1..].iter().all(|e| e.ticket_id() == second));

        assert_eq!(desk.latest_activity(100).len(), 5);
        assert!(desk.latest_activity(0).is_empty());
    }

    #[test]
    fn test_latest_activity_counts_reopened_history_once() {
        let mut desk = staffed_desk();
        let prior = create(&mut desk);
        desk.resolve(prior, "done").unwrap();
        desk.reopen_ticket(prior, "again", PRIORITY).unwrap();
        assert_eq!(desk.latest_activity(100).len(), 3 + 2);
    }

    #[test]
    fn test_text_search_is_case_sensitive() {
        let mut desk = staffed_desk();
        let id = create(&mut desk);
        desk.add_note(id, "Checked the VPN client.").unwrap();
        assert_eq!(desk.tickets_by_text("VPN").count(), 1);
        assert_eq!(desk.tickets_by_text("vpn").count(), 0);
    }
}

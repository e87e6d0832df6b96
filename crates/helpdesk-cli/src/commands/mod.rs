pub mod run;
pub mod stats;
pub mod tickets;

use helpdesk_core::{Priority, Status, TicketId, TicketView};
use serde::Serialize;

/// JSON shape of a ticket, with tags merged over its lineage
#[derive(Debug, Serialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub priority: Priority,
    pub status: Status,
    pub originator: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopened_from: Option<TicketId>,
}

impl From<&TicketView<'_>> for TicketSummary {
    fn from(view: &TicketView<'_>) -> Self {
        Self {
            id: view.id(),
            priority: view.priority(),
            status: view.status(),
            originator: view.originator().to_string(),
            description: view.description().to_string(),
            technician: view.technician().map(str::to_string),
            tags: view.tags().iter().map(|tag| tag.value().to_string()).collect(),
            reopened_from: view.prior(),
        }
    }
}

/// One text line per ticket: `Ticket 7: URGENT priority, ASSIGNED [laptop]`
pub fn print_ticket(view: &TicketView<'_>) {
    let tags: Vec<String> = view.tags().iter().map(|tag| tag.to_string()).collect();
    if tags.is_empty() {
        println!("  {}", view.ticket());
    } else {
        println!("  {} [{}]", view.ticket(), tags.join(", "));
    }
    println!("    {}: {}", view.originator(), view.description());
    if let Some(technician) = view.assignee() {
        println!("    Technician: {}", technician);
    }
    if let Some(prior) = view.prior() {
        println!("    Reopened from: {}", prior);
    }
}

/// Minutes as `24h 29m`
pub fn format_minutes(minutes: f64) -> String {
    let whole = minutes as i64;
    format!("{}h {:02}m", whole / 60, whole % 60)
}

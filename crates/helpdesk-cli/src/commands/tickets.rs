use anyhow::{Context, Result};
use helpdesk_config::Config;
use helpdesk_core::{HelpDesk, Tag, TicketId, TicketView};
use std::path::Path;

use super::{TicketSummary, print_ticket};
use crate::cli::TicketFilter;
use crate::scenario;

pub fn list(config: &Config, path: &Path, filter: &TicketFilter, json: bool) -> Result<()> {
    let desk = scenario::load(config, path)?;
    let tickets = select(&desk, filter)?;

    if json {
        let summaries: Vec<TicketSummary> = tickets.iter().map(TicketSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if tickets.is_empty() {
        println!("No matching tickets.");
        return Ok(());
    }

    println!("Tickets ({}):", tickets.len());
    for view in &tickets {
        print_ticket(view);
    }
    Ok(())
}

pub fn history(config: &Config, path: &Path, ticket_id: TicketId) -> Result<()> {
    let desk = scenario::load(config, path)?;
    let view = desk
        .ticket(ticket_id)
        .with_context(|| format!("Ticket {} not found", ticket_id))?;

    print_ticket(&view);
    println!("\nHistory:");
    for event in view.history() {
        println!("  {}", event);
    }
    Ok(())
}

/// Tickets in natural order matching every option given
fn select<'a>(desk: &'a HelpDesk, filter: &TicketFilter) -> Result<Vec<TicketView<'a>>> {
    let tags: Vec<Tag> = filter
        .tags
        .iter()
        .map(|value| desk.tag(value))
        .collect::<helpdesk_core::Result<_>>()?;

    let tickets = desk
        .tickets()
        .filter(|view| filter.status.is_none_or(|status| view.status() == status))
        .filter(|view| filter.not_status.is_none_or(|status| view.status() != status))
        .filter(|view| {
            filter
                .technician
                .as_deref()
                .is_none_or(|id| view.technician() == Some(id))
        })
        .filter(|view| tags.is_empty() || view.has_any_tag(&tags))
        .filter(|view| {
            filter
                .text
                .as_deref()
                .is_none_or(|text| view.includes_text(text))
        })
        .collect();
    Ok(tickets)
}

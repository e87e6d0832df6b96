use anyhow::Result;
use helpdesk_config::Config;
use std::path::Path;

use super::{format_minutes, print_ticket};
use crate::scenario;

/// Replay and print tickets, workloads, averages and recent events
pub fn handle(config: &Config, path: &Path, latest: usize) -> Result<()> {
    let desk = scenario::load(config, path)?;

    let tickets: Vec<_> = desk.tickets().collect();
    if tickets.is_empty() {
        println!("No tickets.");
    } else {
        println!("Tickets ({}):", tickets.len());
        for view in &tickets {
            print_ticket(view);
        }
    }

    println!("\nTechnicians:");
    for technician in desk.technicians() {
        let active: Vec<String> = technician
            .active_tickets()
            .map(|id| id.to_string())
            .collect();
        println!(
            "  {} (ext. {}): {} active [{}]",
            technician,
            technician.extension(),
            active.len(),
            active.join(", ")
        );
    }

    println!();
    match desk.average_minutes_to_resolve() {
        Some(minutes) => println!("Average time to resolve: {}", format_minutes(minutes as f64)),
        None => println!("Average time to resolve: no resolved tickets"),
    }

    let events = desk.latest_activity(latest);
    if !events.is_empty() {
        println!("\nLatest activity:");
        for event in events {
            println!("  {}", event);
        }
    }

    Ok(())
}

use anyhow::Result;
use helpdesk_config::Config;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::format_minutes;
use crate::scenario;

#[derive(Debug, Serialize)]
struct ResolutionStats {
    resolved: usize,
    average_minutes: Option<i64>,
    per_technician: BTreeMap<String, f64>,
}

pub fn handle(config: &Config, path: &Path, json: bool) -> Result<()> {
    let desk = scenario::load(config, path)?;

    let stats = ResolutionStats {
        resolved: desk
            .tickets_by_status(helpdesk_core::Status::Resolved)
            .count(),
        average_minutes: desk.average_minutes_to_resolve(),
        per_technician: desk.average_minutes_to_resolve_per_technician(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Resolved tickets: {}", stats.resolved);
    match stats.average_minutes {
        Some(minutes) => println!("Average time to resolve: {}", format_minutes(minutes as f64)),
        None => {
            println!("Average time to resolve: no resolved tickets");
            return Ok(());
        }
    }

    println!("\nBy technician:");
    for technician in desk.technicians() {
        match stats.per_technician.get(technician.id()) {
            Some(minutes) => println!("  {}: {}", technician, format_minutes(*minutes)),
            None => println!("  {}: none resolved", technician),
        }
    }

    Ok(())
}

//! Table and JSON rendering for command output.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use hapresence_core::{PresenceRecord, Probe};

use crate::error::CliError;

#[derive(Tabled)]
struct PresenceRow {
    #[tabled(rename = "ENTITY")]
    entity_id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "LAST CHANGED")]
    last_changed: String,
}

/// Render presence records as a table, or JSON with `--json`.
pub fn presence(records: &[PresenceRecord], json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No person entities found");
        return Ok(());
    }

    let rows: Vec<PresenceRow> = records
        .iter()
        .map(|r| PresenceRow {
            entity_id: r.entity_id.clone(),
            name: r.name.clone(),
            state: r.state.clone(),
            last_changed: r.last_changed.clone().unwrap_or_else(|| "-".to_owned()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

/// Render a probe outcome, or JSON with `--json`.
pub fn probe(outcome: &Probe, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    if outcome.success {
        println!("{} {}", "OK".green().bold(), outcome.message);
    } else {
        println!("{} {}", "FAIL".red().bold(), outcome.message);
    }
    Ok(())
}

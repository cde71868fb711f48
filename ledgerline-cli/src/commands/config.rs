//! Config command - show or change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use ledgerline_core::config::{Config, SETTINGS_FILE};
use serde_json::{Map, Value};

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show every setting (default)
    Show,
    /// Change one setting, e.g. `import.dateOrder dayFirst`
    Set {
        key: String,
        value: String,
    },
}

pub fn run(command: Option<ConfigCommands>, json: bool) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let mut config = Config::load(&data_dir)?;

    if let Some(ConfigCommands::Set { key, value }) = command {
        config.set(&key, &value)?;
        config.save(&data_dir)?;
        if !json {
            output::success(&format!("Set {} in {}", key, SETTINGS_FILE));
        }
    }

    let entries = config.entries();
    if json {
        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect();
        return output::json(map);
    }

    let mut table = output::create_table();
    table.set_header(vec!["Setting", "Value"]);
    for (key, value) in entries {
        let shown = if value.is_empty() { "-".dimmed().to_string() } else { value };
        table.add_row(vec![key.to_string(), shown]);
    }
    println!("{}", table);
    Ok(())
}

//! `hapresence config` — show, get, set, path.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use hapresence_core::config::{ALL_KEYS, get_or_default};
use hapresence_core::{ConfigStore, Role, keys, settings};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::FileConfig;
use crate::error::CliError;

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "KEY")]
    key: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = FileConfig::load(global.config.as_deref())?;

    match args.command {
        ConfigCommand::Show => {
            let rows: Vec<ConfigRow> = ALL_KEYS
                .iter()
                .map(|key| ConfigRow {
                    key: (*key).to_owned(),
                    value: display_value(&store, key),
                })
                .collect();

            if global.json {
                let map: serde_json::Map<String, serde_json::Value> = rows
                    .into_iter()
                    .map(|r| (r.key, serde_json::Value::String(r.value)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                let mut table = Table::new(rows);
                table.with(Style::sharp());
                println!("{table}");
            }
            Ok(())
        }

        ConfigCommand::Get { key } => {
            println!("{}", display_value(&store, &key));
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            // The CLI runs as the machine's operator, which is the
            // administrator role for this store.
            let normalized = settings::save_key(&store, Role::Admin, &key, &value)?;
            store.persist()?;
            if normalized != value {
                eprintln!("{key} normalized to {normalized}");
            }
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
    }
}

/// Effective value for display; the token is redacted.
fn display_value(store: &FileConfig, key: &str) -> String {
    if key == keys::HA_TOKEN {
        return if store.get(key).is_some_and(|t| !t.is_empty()) {
            "<set>".to_owned()
        } else {
            "<unset>".to_owned()
        };
    }
    get_or_default(store, key)
}

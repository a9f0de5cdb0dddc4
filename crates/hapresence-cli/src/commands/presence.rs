//! `hapresence presence` — fetch and render person presence.

use std::sync::Arc;

use hapresence_core::PresenceService;

use crate::cli::GlobalOpts;
use crate::config::FileConfig;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let store = Arc::new(FileConfig::load(global.config.as_deref())?);
    let service = PresenceService::new(store);

    let records = service.person_presence().await?;
    output::presence(&records, global.json)
}

//! `hapresence test` — live connectivity probe.

use std::sync::Arc;

use hapresence_core::{PresenceService, ProbeOverrides};

use crate::cli::{GlobalOpts, TestArgs};
use crate::config::FileConfig;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: TestArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = Arc::new(FileConfig::load(global.config.as_deref())?);
    let service = PresenceService::new(store);

    let outcome = service
        .test_connection(ProbeOverrides {
            url: args.url,
            token: args.token,
            timeout_secs: args.timeout,
            verify_ssl: args.verify_ssl,
        })
        .await;

    output::probe(&outcome, global.json)?;

    if outcome.success {
        Ok(())
    } else {
        Err(CliError::ProbeFailed {
            message: outcome.message,
        })
    }
}

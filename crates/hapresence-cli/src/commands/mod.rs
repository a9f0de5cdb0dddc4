//! Command handlers.

pub mod config_cmd;
pub mod presence;
pub mod probe;

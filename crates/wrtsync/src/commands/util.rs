//! Shared helpers for command handlers.

use tabled::Tabled;

use wrtsync_core::PortBinding;

use crate::error::CliError;

// ── Shared table rows ───────────────────────────────────────────────

#[derive(Tabled)]
pub struct PortRow {
    #[tabled(rename = "Protocol")]
    pub protocol: String,
    #[tabled(rename = "Port")]
    pub port: u16,
}

impl From<&PortBinding> for PortRow {
    fn from(b: &PortBinding) -> Self {
        Self {
            protocol: b.protocol.to_string(),
            port: b.port,
        }
    }
}

/// Map a dialoguer / rpassword failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

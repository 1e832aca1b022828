//! CLI configuration: thin wrapper around `wrtsync_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--router, --password, --insecure, ...) on top of the active profile.

use std::time::Duration;

use secrecy::SecretString;

use wrtsync_core::{HostKeyVerification, SyncConfig};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use wrtsync_config::{
    Config, Defaults, HostKeyMode, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// `--output`, else `defaults.output`, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        clap::ValueEnum::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

/// `--color`, else `defaults.color`, else auto.
pub fn color_mode(global: &GlobalOpts, config: &Config) -> ColorMode {
    global.color.unwrap_or_else(|| {
        clap::ValueEnum::from_str(&config.defaults.color, true).unwrap_or(ColorMode::Auto)
    })
}

/// Build the runtime `SyncConfig` for the active profile.
///
/// Flags override profile values. Without a matching profile the flags
/// alone are used, with `root` and an empty profile as the base, so a
/// one-off `wrtsync sync -r 192.168.1.1 --password ...` works unconfigured.
pub fn resolve_sync_config(global: &GlobalOpts, cfg: &Config) -> Result<SyncConfig, CliError> {
    let fallback = Profile::default();

    let (profile_name, profile) = match cfg.profile(global.profile.as_deref()) {
        Some(found) => found,
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            return Err(profile_not_found(active_profile_name(global, cfg), cfg));
        }
        None => (active_profile_name(global, cfg), &fallback),
    };

    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => wrtsync_config::resolve_password(profile, &profile_name)?,
    };

    let mut sync = wrtsync_config::profile_to_sync_config(profile, &cfg.defaults, password);

    if let Some(ref host) = global.router {
        sync.router.host = Some(host.clone());
    }
    if let Some(port) = global.port {
        sync.router.port = port;
    }
    if let Some(ref username) = global.username {
        sync.router.username.clone_from(username);
    }
    if let Some(ip) = global.local_ip {
        sync.local_address = Some(ip);
    }
    if let Some(secs) = global.timeout {
        sync.timeout = Duration::from_secs(secs);
    }
    if let Some(ref path) = global.known_hosts {
        sync.host_key = HostKeyVerification::KnownHostsFile(path.clone());
    }
    if global.insecure {
        sync.host_key = HostKeyVerification::AcceptAny;
    }

    tracing::debug!(
        profile = %profile_name,
        host = ?sync.router.host,
        port = sync.router.port,
        username = %sync.router.username,
        "resolved sync configuration"
    );
    Ok(sync)
}

pub fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

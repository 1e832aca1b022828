//! Configuration for wrtsync.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), and
//! translation to `wrtsync_core::SyncConfig`. The CLI layers its
//! `GlobalOpts` overrides on top of what this crate produces.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wrtsync_core::{HostKeyVerification, RouterEndpoint, SyncConfig};

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "wrtsync";

/// Password fallback consulted after a profile's own `password_env`.
pub const PASSWORD_ENV: &str = "WRTSYNC_PASSWORD";

const ENV_PREFIX: &str = "WRTSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// `name`, else `default_profile`, else `"default"`. The profile need not exist.
    pub fn profile_name(&self, name: Option<&str>) -> String {
        name.map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// Returns the resolved profile name alongside the profile.
    pub fn profile(&self, name: Option<&str>) -> Option<(String, &Profile)> {
        let name = self.profile_name(name);
        self.profiles.get(&name).map(|p| (name, p))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// How a profile verifies the router's SSH host key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyMode {
    #[default]
    #[serde(alias = "verify-known-hosts")]
    KnownHosts,
    AcceptAny,
}

/// A named router profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Router host or IP. The default gateway is used when absent.
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    /// Plaintext password. Prefer `password_env` or the keyring.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub host_key: HostKeyMode,

    /// known_hosts file; `~/.ssh/known_hosts` when absent.
    pub known_hosts: Option<PathBuf>,

    /// Redirect target. Probed when absent.
    pub local_address: Option<IpAddr>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            username: default_username(),
            password: None,
            password_env: None,
            host_key: HostKeyMode::default(),
            known_hosts: None,
            local_address: None,
            timeout: None,
        }
    }
}

fn default_port() -> u16 {
    22
}
fn default_username() -> String {
    "root".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "wrtsync", "wrtsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wrtsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path. A missing file yields the defaults.
///
/// Environment keys nest on a double underscore:
/// `WRTSYNC_DEFAULT_PROFILE`, `WRTSYNC_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Password resolution ─────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Password stored in the keyring for `profile_name`, if any.
///
/// An unavailable keyring backend counts as "no entry".
fn keyring_password(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name)
        .and_then(|e| e.get_password().map_err(ConfigError::from))
        .ok()
}

/// Resolve a profile's password from the process environment, the
/// keyring, or the config file, in that order.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_password,
    )
}

/// [`resolve_password`] with injectable environment and keyring lookups.
///
/// 1. the variable named by `password_env`
/// 2. `WRTSYNC_PASSWORD`
/// 3. keyring entry `wrtsync` / `<profile>/password`
/// 4. plaintext `password`
pub fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Some(pw) = keyring(profile_name) {
        return Ok(SecretString::from(pw));
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to runtime config ───────────────────────────────────

impl From<&Profile> for HostKeyVerification {
    fn from(profile: &Profile) -> Self {
        match (profile.host_key, &profile.known_hosts) {
            (HostKeyMode::AcceptAny, _) => HostKeyVerification::AcceptAny,
            (HostKeyMode::KnownHosts, Some(path)) => {
                HostKeyVerification::KnownHostsFile(path.clone())
            }
            (HostKeyMode::KnownHosts, None) => HostKeyVerification::VerifyKnownHosts,
        }
    }
}

/// Build a `SyncConfig` from a profile with an already-resolved password.
pub fn profile_to_sync_config(
    profile: &Profile,
    defaults: &Defaults,
    password: SecretString,
) -> SyncConfig {
    SyncConfig {
        router: RouterEndpoint {
            host: profile.host.clone(),
            port: profile.port,
            username: profile.username.clone(),
            password,
        },
        host_key: HostKeyVerification::from(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        local_address: profile.local_address,
        ..SyncConfig::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn no_keyring(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn profile_env_var_wins_over_global() {
        let profile = Profile {
            password_env: Some("HOME_ROUTER_PW".into()),
            password: Some("plaintext".into()),
            ..Profile::default()
        };
        let env = |name: &str| match name {
            "HOME_ROUTER_PW" => Some("from-profile-env".to_owned()),
            PASSWORD_ENV => Some("from-global-env".to_owned()),
            _ => None,
        };
        let pw = resolve_password_with(&profile, "home", env, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-profile-env");
    }

    #[test]
    fn global_env_var_used_when_profile_var_unset() {
        let profile = Profile {
            password_env: Some("UNSET_VAR".into()),
            ..Profile::default()
        };
        let env = |name: &str| (name == PASSWORD_ENV).then(|| "global".to_owned());
        let pw = resolve_password_with(&profile, "home", env, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "global");
    }

    #[test]
    fn keyring_is_consulted_for_the_named_profile() {
        let profile = Profile {
            password: Some("plaintext".into()),
            ..Profile::default()
        };
        let keyring = |name: &str| (name == "home").then(|| "from-keyring".to_owned());
        let pw = resolve_password_with(&profile, "home", no_env, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");
    }

    #[test]
    fn plaintext_password_is_the_last_resort() {
        let profile = Profile {
            password_env: Some("UNSET_VAR".into()),
            password: Some("plaintext".into()),
            ..Profile::default()
        };
        let pw = resolve_password_with(&profile, "home", no_env, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "plaintext");
    }

    #[test]
    fn no_source_is_no_credentials() {
        let err = resolve_password_with(&Profile::default(), "lab", no_env, no_keyring)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "lab"));
    }

    #[test]
    fn host_key_mode_maps_to_verification() {
        let mut profile = Profile::default();
        assert_eq!(
            HostKeyVerification::from(&profile),
            HostKeyVerification::VerifyKnownHosts
        );

        profile.known_hosts = Some("/tmp/kh".into());
        assert_eq!(
            HostKeyVerification::from(&profile),
            HostKeyVerification::KnownHostsFile("/tmp/kh".into())
        );

        profile.host_key = HostKeyMode::AcceptAny;
        assert_eq!(
            HostKeyVerification::from(&profile),
            HostKeyVerification::AcceptAny
        );
    }

    #[test]
    fn profile_timeout_overrides_default() {
        let defaults = Defaults::default();
        let mut profile = Profile::default();
        let pw = || SecretString::from("x".to_owned());

        assert_eq!(
            profile_to_sync_config(&profile, &defaults, pw()).timeout,
            Duration::from_secs(10)
        );
        profile.timeout = Some(3);
        let cfg = profile_to_sync_config(&profile, &defaults, pw());
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert_eq!(cfg.router.username, "root");
        assert_eq!(cfg.router.port, 22);
        assert!(cfg.router.host.is_none());
    }

    #[test]
    fn missing_profile_falls_back_to_default_name() {
        let mut cfg = Config::default();
        assert!(cfg.profile(None).is_none());
        cfg.profiles.insert("default".into(), Profile::default());
        let (name, _) = cfg.profile(None).unwrap();
        assert_eq!(name, "default");
        assert!(cfg.profile(Some("other")).is_none());
        assert_eq!(cfg.profile_name(Some("other")), "other");

        cfg.default_profile = None;
        assert_eq!(cfg.profile_name(None), "default");
    }
}

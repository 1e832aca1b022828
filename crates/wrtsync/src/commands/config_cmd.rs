//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, HostKeyMode, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext password.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref host) = p.host {
            let _ = writeln!(out, "host = \"{host}\"");
        }
        let _ = writeln!(out, "port = {}", p.port);
        let _ = writeln!(out, "username = \"{}\"", p.username);
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        let _ = writeln!(out, "host_key = \"{}\"", host_key_name(p.host_key));
        if let Some(ref kh) = p.known_hosts {
            let _ = writeln!(out, "known_hosts = \"{}\"", kh.display());
        }
        if let Some(ip) = p.local_address {
            let _ = writeln!(out, "local_address = \"{ip}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn host_key_name(mode: HostKeyMode) -> &'static str {
    match mode {
        HostKeyMode::KnownHosts => "known-hosts",
        HostKeyMode::AcceptAny => "accept-any",
    }
}

/// Copy of the config with plaintext passwords masked, for JSON/YAML output.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    cfg
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

fn invalid(field: &str, reason: &str) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Offer to store the password in the system keyring or return it for plaintext config.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_password_storage(password: &str, profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
        "Don't store (use WRTSYNC_PASSWORD at run time)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the router password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    match selection {
        0 => {
            wrtsync_config::store_password(profile_name, password)?;
            eprintln!("   ✓ Password stored in system keyring");
            Ok(None)
        }
        1 => Ok(Some(password.to_owned())),
        _ => Ok(None),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let format = config::output_format(global, &cfg);
            let out = output::render_single(format, &redacted(&cfg), format_config_redacted, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
        ConfigCommand::Set { key, value } => set(global, &key, value),
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: wrtsync config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(config::profile_not_found(profile_name, &cfg));
            }

            let password = rpassword::prompt_password("Router password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(invalid("password", "value cannot be empty"));
            }
            wrtsync_config::store_password(&profile_name, &password)?;
            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("wrtsync configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let host: String = Input::new()
        .with_prompt("Router address (empty = default gateway)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let port: u16 = Input::new()
        .with_prompt("SSH port")
        .default(22)
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("SSH username")
        .default("root".into())
        .interact_text()
        .map_err(prompt_err)?;

    let pass = rpassword::prompt_password("Router password: ").map_err(prompt_err)?;
    let password = if pass.is_empty() {
        None
    } else {
        prompt_password_storage(&pass, &profile_name)?
    };

    let host_key = match Select::new()
        .with_prompt("Host key verification")
        .items(&[
            "Check ~/.ssh/known_hosts (recommended)",
            "Accept any key (insecure)",
        ])
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        0 => HostKeyMode::KnownHosts,
        _ => HostKeyMode::AcceptAny,
    };

    let profile = Profile {
        host: (!host.trim().is_empty()).then(|| host.trim().to_owned()),
        port,
        username,
        password,
        host_key,
        ..Profile::default()
    };

    let mut cfg = config::load_config_or_default();
    if cfg.profiles.is_empty() {
        cfg = Config {
            default_profile: Some(profile_name.clone()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        };
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Try it: wrtsync sync --dry-run -p {profile_name}");
    Ok(())
}

// ── Set <key> <value> ───────────────────────────────────────────────

fn set(global: &GlobalOpts, key: &str, value: String) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let profile = cfg.profiles.entry(profile_name.clone()).or_default();

    match key {
        "host" | "router" => profile.host = Some(value),
        "port" => {
            profile.port = value
                .parse()
                .map_err(|_| invalid("port", "must be a number between 1 and 65535"))?;
        }
        "username" | "user" => profile.username = value,
        "password" => profile.password = Some(value),
        "password_env" | "password-env" => profile.password_env = Some(value),
        "host_key" | "host-key" => {
            profile.host_key = match value.as_str() {
                "known-hosts" | "verify-known-hosts" => HostKeyMode::KnownHosts,
                "accept-any" => HostKeyMode::AcceptAny,
                _ => return Err(invalid("host_key", "must be 'known-hosts' or 'accept-any'")),
            };
        }
        "known_hosts" | "known-hosts" => profile.known_hosts = Some(value.into()),
        "local_address" | "local-address" | "local_ip" => {
            profile.local_address = Some(
                value
                    .parse()
                    .map_err(|_| invalid("local_address", "must be an IP address"))?,
            );
        }
        "timeout" => {
            profile.timeout = Some(
                value
                    .parse()
                    .map_err(|_| invalid("timeout", "must be a number (seconds)"))?,
            );
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, port, username, \
                     password, password_env, host_key, known_hosts, local_address, timeout"
                ),
            });
        }
    }

    save_config(&cfg)?;
    eprintln!("✓ Set {key} on profile '{profile_name}'");
    Ok(())
}

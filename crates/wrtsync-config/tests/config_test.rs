#![allow(clippy::unwrap_used)]

use std::net::IpAddr;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use wrtsync_config::{Config, HostKeyMode, Profile, load_config_from, save_config_to};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert_eq!(cfg.defaults.output, "table");
    assert_eq!(cfg.defaults.timeout, 10);
    assert!(cfg.profiles.is_empty());
}

#[test]
fn reads_documented_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "home"

[defaults]
output = "json"
timeout = 5

[profiles.home]
host = "192.168.1.1"
username = "admin"
password_env = "ROUTER_PASSWORD"
host_key = "accept-any"
local_address = "192.168.1.50"

[profiles.lab]
port = 2222
host_key = "verify-known-hosts"
known_hosts = "/etc/ssh/ssh_known_hosts"
"#,
    )
    .unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.default_profile.as_deref(), Some("home"));
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.color, "auto");

    let (name, home) = cfg.profile(None).unwrap();
    assert_eq!(name, "home");
    assert_eq!(home.host.as_deref(), Some("192.168.1.1"));
    assert_eq!(home.port, 22);
    assert_eq!(home.username, "admin");
    assert_eq!(home.host_key, HostKeyMode::AcceptAny);
    assert_eq!(
        home.local_address,
        Some("192.168.1.50".parse::<IpAddr>().unwrap())
    );

    let (_, lab) = cfg.profile(Some("lab")).unwrap();
    assert_eq!(lab.host, None);
    assert_eq!(lab.port, 2222);
    assert_eq!(lab.username, "root");
    assert_eq!(lab.host_key, HostKeyMode::KnownHosts);
    assert_eq!(
        lab.known_hosts,
        Some(PathBuf::from("/etc/ssh/ssh_known_hosts"))
    );
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config {
        default_profile: Some("office".into()),
        ..Config::default()
    };
    cfg.profiles.insert(
        "office".into(),
        Profile {
            host: Some("10.0.0.1".into()),
            password_env: Some("OFFICE_PW".into()),
            timeout: Some(20),
            ..Profile::default()
        },
    );
    save_config_to(&cfg, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[profiles.office]"));
    assert!(text.contains("host_key = \"known-hosts\""));
    assert_eq!(load_config_from(&path).unwrap(), cfg);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[profiles.home]\nport = \"not a number\"\n").unwrap();

    assert!(load_config_from(&path).is_err());
}

// UCI command protocol for OpenWrt firewall redirects.
//
// Command text here is a compatibility contract with the router's `uci`
// tool and init scripts. Values are always single-quoted; callers only
// pass generated names, protocol names, digits, and IP literals.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::Error;
use crate::session::{CommandOutput, RemoteShell};

/// The `uci` executable on the router.
pub const UCI: &str = "uci";
/// Config package holding redirect sections.
pub const FIREWALL_PACKAGE: &str = "firewall";
/// Init script reloaded after a commit.
pub const FIREWALL_SERVICE: &str = "/etc/init.d/firewall";

/// One `redirect` section as printed by `uci show`, keyed by its anonymous index.
///
/// Field values have their surrounding quotes stripped. Nothing is
/// interpreted at this layer; `wrtsync-core` converts to typed rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRedirect {
    pub index: u32,
    pub fields: BTreeMap<String, String>,
}

impl RawRedirect {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

// ── Command text ────────────────────────────────────────────────────

/// `uci show firewall | grep redirect`
pub fn show_redirects_command() -> String {
    format!("{UCI} show {FIREWALL_PACKAGE} | grep redirect")
}

/// Build the batched script that appends one redirect and sets each field.
///
/// Fields are emitted in the order given, one `uci set` per line against
/// the section just added (`@redirect[-1]`). The script runs under
/// `set -e`: if `uci add` fails, `@redirect[-1]` is still the last
/// pre-existing rule and none of the `uci set` lines may run.
pub fn add_redirect_script(fields: &[(&str, String)]) -> String {
    let mut lines = Vec::with_capacity(fields.len() + 2);
    lines.push("set -e".to_owned());
    lines.push(format!("{UCI} add {FIREWALL_PACKAGE} redirect"));
    for (field, value) in fields {
        lines.push(format!(
            "{UCI} set {FIREWALL_PACKAGE}.@redirect[-1].{field}='{value}'"
        ));
    }
    lines.join("\n")
}

/// `uci commit firewall && /etc/init.d/firewall reload`
pub fn commit_and_reload_command() -> String {
    format!("{UCI} commit {FIREWALL_PACKAGE} && {FIREWALL_SERVICE} reload")
}

// ── Output parsing ──────────────────────────────────────────────────

/// Parse `uci show` output into one record per redirect index, ascending.
///
/// Lines that are not `firewall.@redirect[N].field=value` (section type
/// lines, other sections, garbage) are ignored. Repeated fields for the
/// same index keep the last value seen.
pub fn parse_redirects(output: &str) -> Vec<RawRedirect> {
    let mut by_index: BTreeMap<u32, BTreeMap<String, String>> = BTreeMap::new();

    for line in output.lines() {
        let Some((index, field, value)) = parse_redirect_line(line.trim_end()) else {
            trace!(line, "ignoring non-redirect line");
            continue;
        };
        by_index
            .entry(index)
            .or_default()
            .insert(field.to_owned(), value.to_owned());
    }

    by_index
        .into_iter()
        .map(|(index, fields)| RawRedirect { index, fields })
        .collect()
}

fn parse_redirect_line(line: &str) -> Option<(u32, &str, &str)> {
    let rest = line
        .strip_prefix(FIREWALL_PACKAGE)?
        .strip_prefix(".@redirect[")?;
    let (index, rest) = rest.split_once("].")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u32 = index.parse().ok()?;

    let (field, value) = rest.split_once('=')?;
    if field.is_empty() || !field.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let value = value.strip_prefix('\'').unwrap_or(value);
    let value = value.split('\'').next().unwrap_or_default();
    if value.is_empty() {
        return None;
    }
    Some((index, field, value))
}

// ── Client ──────────────────────────────────────────────────────────

/// UCI firewall client over any [`RemoteShell`].
///
/// Owns the shell for the length of a run; call [`close`](Self::close)
/// once when done, whether or not the work succeeded.
pub struct UciClient<S> {
    shell: S,
}

impl<S: RemoteShell> UciClient<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    /// Read every redirect section currently configured on the router.
    pub fn list_redirects(&mut self) -> Result<Vec<RawRedirect>, Error> {
        let command = show_redirects_command();
        let out = self.shell.exec(&command)?;
        // grep exits 1 when nothing matched: that is simply "no redirects".
        if out.status != 0 && !(out.status == 1 && out.stdout.trim().is_empty()) {
            return Err(command_failed(command, out));
        }
        let redirects = parse_redirects(&out.stdout);
        debug!(count = redirects.len(), "read existing redirects");
        Ok(redirects)
    }

    /// Append one redirect section with the given fields as a single batch.
    pub fn add_redirect(&mut self, fields: &[(&str, String)]) -> Result<(), Error> {
        let script = add_redirect_script(fields);
        let out = self.shell.exec(&script)?;
        if !out.success() {
            return Err(command_failed(script, out));
        }
        Ok(())
    }

    /// Persist staged changes and reload the firewall service.
    pub fn commit_and_reload(&mut self) -> Result<(), Error> {
        let command = commit_and_reload_command();
        let out = self.shell.exec(&command)?;
        if !out.success() {
            return Err(command_failed(command, out));
        }
        debug!("firewall committed and reloaded");
        Ok(())
    }

    /// Close the underlying session.
    pub fn close(&mut self) -> Result<(), Error> {
        self.shell.close()
    }

    pub fn into_inner(self) -> S {
        self.shell
    }
}

fn command_failed(command: String, out: CommandOutput) -> Error {
    Error::CommandFailed {
        command,
        status: out.status,
        stderr: out.stderr.trim().to_owned(),
    }
}

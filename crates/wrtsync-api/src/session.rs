// Remote shell sessions.
//
// `RemoteShell` is the seam between the UCI protocol layer and the actual
// transport. `SshSession` is the production implementation on top of
// libssh2; tests substitute an in-memory recorder.

use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use ssh2::{Channel, CheckResult, ErrorCode, KnownHostFileKind, Session};
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::transport::{HostKeyPolicy, TransportConfig};

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Exit status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// A command-execution session on a remote host.
///
/// Each `exec` runs to completion (exit status collected) before
/// returning, so callers observe strictly sequential execution.
pub trait RemoteShell {
    /// Run `command` through the remote login shell and wait for it to exit.
    fn exec(&mut self, command: &str) -> Result<CommandOutput, Error>;

    /// Tear down the session. Safe to call once at the end of a run.
    fn close(&mut self) -> Result<(), Error>;
}

/// Password-authenticated SSH session to a router.
pub struct SshSession {
    session: Session,
    addr: String,
    timeout: Duration,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession").field("addr", &self.addr).finish_non_exhaustive()
    }
}

impl SshSession {
    /// Connect, verify the host key per `transport.host_key`, and log in.
    pub fn connect(
        host: &str,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let addr = socket_addr_string(host, transport.port);
        let sock = addr
            .to_socket_addrs()
            .map_err(|_| Error::Resolve { host: host.into() })?
            .next()
            .ok_or_else(|| Error::Resolve { host: host.into() })?;

        debug!(%addr, "connecting to router");
        let tcp = TcpStream::connect_timeout(&sock, transport.timeout).map_err(|source| {
            if source.kind() == std::io::ErrorKind::TimedOut {
                Error::Timeout {
                    timeout_secs: transport.timeout.as_secs(),
                }
            } else {
                Error::Connect {
                    addr: addr.clone(),
                    source,
                }
            }
        })?;

        let mut session = Session::new()?;
        session.set_timeout(transport.timeout_ms());
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ssh_error(e, transport.timeout))?;

        verify_host_key(&session, host, transport.port, &transport.host_key)?;

        session
            .userauth_password(username, password.expose_secret())
            .map_err(|e| Error::Authentication {
                username: username.into(),
                message: e.message().to_owned(),
            })?;
        if !session.authenticated() {
            return Err(Error::Authentication {
                username: username.into(),
                message: "server did not accept the credentials".into(),
            });
        }

        debug!(%addr, username, "SSH session established");
        Ok(Self {
            session,
            addr,
            timeout: transport.timeout,
        })
    }
}

impl RemoteShell for SshSession {
    fn exec(&mut self, command: &str) -> Result<CommandOutput, Error> {
        debug!(addr = %self.addr, command, "sending remote command");
        let timeout = self.timeout;
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| ssh_error(e, timeout))?;
        channel.exec(command).map_err(|e| ssh_error(e, timeout))?;

        self.session.set_blocking(false);
        let drained = drain(&mut channel, timeout);
        self.session.set_blocking(true);
        let (stdout, stderr) = drained?;

        channel.wait_close().map_err(|e| ssh_error(e, timeout))?;
        let status = channel.exit_status().map_err(|e| ssh_error(e, timeout))?;
        trace!(status, stdout_bytes = stdout.len(), "exec finished");

        Ok(CommandOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    fn close(&mut self) -> Result<(), Error> {
        debug!(addr = %self.addr, "closing SSH session");
        self.session.disconnect(None, "wrtsync finished", None)?;
        Ok(())
    }
}

// ── Command output ──────────────────────────────────────────────────

/// `LIBSSH2_ERROR_TIMEOUT`
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A libssh2 timeout becomes [`Error::Timeout`]; anything else stays an SSH error.
fn ssh_error(err: ssh2::Error, timeout: Duration) -> Error {
    if matches!(err.code(), ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT)) {
        Error::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        Error::Ssh(err)
    }
}

/// The two output streams of a running remote command.
trait OutputStreams {
    fn read_stdout(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn read_stderr(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// The remote side has sent EOF.
    fn at_eof(&self) -> bool;
}

impl OutputStreams for Channel {
    fn read_stdout(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn read_stderr(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stderr().read(buf)
    }

    fn at_eof(&self) -> bool {
        self.eof()
    }
}

/// Read stdout and stderr in turn until EOF, or fail after `timeout`.
///
/// Expects non-blocking reads: an empty stream answers `WouldBlock` and
/// the other stream is read instead, so output on one never stalls the
/// other behind a full channel window.
fn drain(streams: &mut impl OutputStreams, timeout: Duration) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let deadline = Instant::now() + timeout;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let mut progressed = read_chunk(streams.read_stdout(&mut buf), &buf, &mut stdout)?;
        progressed |= read_chunk(streams.read_stderr(&mut buf), &buf, &mut stderr)?;
        if progressed {
            continue;
        }
        if streams.at_eof() {
            return Ok((stdout, stderr));
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout {
                timeout_secs: timeout.as_secs(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Append what one read produced; `true` if it produced anything.
fn read_chunk(read: io::Result<usize>, buf: &[u8], into: &mut Vec<u8>) -> Result<bool, Error> {
    match read {
        Ok(n) => {
            into.extend_from_slice(buf.get(..n).unwrap_or_default());
            Ok(n > 0)
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Format `host:port`, bracketing bare IPv6 literals.
fn socket_addr_string(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn verify_host_key(
    session: &Session,
    host: &str,
    port: u16,
    policy: &HostKeyPolicy,
) -> Result<(), Error> {
    let path = match policy {
        HostKeyPolicy::AcceptAny => {
            warn!(host, "accepting router host key without verification");
            return Ok(());
        }
        HostKeyPolicy::VerifyKnownHosts(path) => path,
    };

    let (key, _) = session
        .host_key()
        .ok_or_else(|| Error::KnownHosts("router did not present a host key".into()))?;

    let mut known = session.known_hosts()?;
    load_known_hosts(&mut known, path)?;

    let known_hosts = path.display().to_string();
    match known.check_port(host, port, key) {
        CheckResult::Match => {
            debug!(host, "host key verified");
            Ok(())
        }
        CheckResult::NotFound => Err(Error::HostKeyUnknown {
            host: host.into(),
            known_hosts,
        }),
        CheckResult::Mismatch => Err(Error::HostKeyMismatch {
            host: host.into(),
            known_hosts,
        }),
        CheckResult::Failure => Err(Error::KnownHosts(format!(
            "libssh2 could not check {host} against {known_hosts}"
        ))),
    }
}

// A missing file is an empty store: the check then reports NotFound.
fn load_known_hosts(known: &mut ssh2::KnownHosts, path: &Path) -> Result<(), Error> {
    if !path.exists() {
        return Ok(());
    }
    known
        .read_file(path, KnownHostFileKind::OpenSSH)
        .map(|_| ())
        .map_err(|e| Error::KnownHosts(format!("{}: {e}", path.display())))
}

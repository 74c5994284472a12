//! SSH transport — password-authenticated session, SCP upload, remote exec.
//!
//! The credential is handed to libssh2 as a discrete parameter. It is never
//! interpolated into a command string, an argv, or a child environment;
//! there are no child processes at all.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::DeployTarget;
use crate::error::SshError;

/// Timeout for the initial TCP connection to the VPS.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Chunk size for SCP uploads.
const UPLOAD_CHUNK: usize = 64 * 1024;

/// A password held in memory for the lifetime of the run. Redacted from
/// `Debug` output and wiped on drop; never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Session operations the deploy pipeline needs. The production
/// implementation is [`Ssh2Remote`]; tests use canned doubles.
pub trait Remote {
    /// Upload the file at `local` to `remote_path` (mode 0644). `progress`
    /// receives the cumulative byte count after each chunk. Returns the
    /// number of bytes transferred.
    ///
    /// # Errors
    ///
    /// Returns an error if the local file cannot be read or the channel
    /// write fails.
    fn upload(
        &mut self,
        local: &Path,
        remote_path: &str,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, SshError>;

    /// Run `command` in a remote shell, streaming its merged output to the
    /// local console, and return the remote exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened or the stream breaks.
    fn exec(&mut self, command: &str) -> Result<i32, SshError>;

    /// Run `command` and capture its stdout instead of streaming it.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened or read.
    fn exec_captured(&mut self, command: &str) -> Result<(i32, String), SshError>;
}

/// Opens authenticated sessions against a deployment target.
pub trait Connect {
    type Session: Remote;

    /// Connect to `target` and authenticate `target.user` with `password`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable, the handshake fails, or
    /// authentication is rejected.
    fn connect(&self, target: &DeployTarget, password: &Secret)
        -> Result<Self::Session, SshError>;
}

/// Production connector backed by libssh2.
pub struct Ssh2Connector;

impl Connect for Ssh2Connector {
    type Session = Ssh2Remote;

    fn connect(&self, target: &DeployTarget, password: &Secret) -> Result<Ssh2Remote, SshError> {
        let address = target.address();

        let addr = (target.host.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| SshError::Connect { address: address.clone(), source: e })?
            .next()
            .ok_or_else(|| SshError::Connect {
                address: address.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "hostname resolved to no addresses",
                ),
            })?;
        let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
            .map_err(|e| SshError::Connect { address: address.clone(), source: e })?;

        let mut session = ssh2::Session::new().map_err(SshError::Session)?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| SshError::Handshake { address, source: e })?;

        session
            .userauth_password(&target.user, password.expose())
            .map_err(|e| SshError::Auth { user: target.user.clone(), source: Some(e) })?;
        if !session.authenticated() {
            return Err(SshError::Auth { user: target.user.clone(), source: None });
        }

        Ok(Ssh2Remote { session })
    }
}

/// An authenticated SSH session to the VPS.
pub struct Ssh2Remote {
    session: ssh2::Session,
}

impl Remote for Ssh2Remote {
    fn upload(
        &mut self,
        local: &Path,
        remote_path: &str,
        progress: &mut dyn FnMut(u64),
    ) -> Result<u64, SshError> {
        let local_err = |source| SshError::Upload { path: local.display().to_string(), source };
        let remote_err = |source| SshError::Upload { path: remote_path.to_string(), source };

        let mut file = std::fs::File::open(local).map_err(local_err)?;
        let size = file.metadata().map_err(local_err)?.len();

        let mut channel = self
            .session
            .scp_send(Path::new(remote_path), 0o644, size, None)
            .map_err(SshError::Channel)?;

        let mut buf = vec![0u8; UPLOAD_CHUNK];
        let mut sent: u64 = 0;
        loop {
            let n = file.read(&mut buf).map_err(local_err)?;
            if n == 0 {
                break;
            }
            channel.write_all(&buf[..n]).map_err(remote_err)?;
            sent += n as u64;
            progress(sent);
        }

        channel.send_eof().map_err(SshError::Channel)?;
        channel.wait_eof().map_err(SshError::Channel)?;
        channel.close().map_err(SshError::Channel)?;
        channel.wait_close().map_err(SshError::Channel)?;
        Ok(sent)
    }

    fn exec(&mut self, command: &str) -> Result<i32, SshError> {
        let mut channel = self.session.channel_session().map_err(SshError::Channel)?;
        // Merge stderr into the stdout stream so one read loop relays
        // everything in arrival order.
        channel
            .handle_extended_data(ssh2::ExtendedData::Merge)
            .map_err(SshError::Channel)?;
        channel.exec(command).map_err(SshError::Channel)?;

        let mut stdout = std::io::stdout();
        let mut buf = [0u8; 8192];
        loop {
            let n = channel.read(&mut buf).map_err(SshError::Stream)?;
            if n == 0 {
                break;
            }
            stdout.write_all(&buf[..n]).map_err(SshError::Stream)?;
            stdout.flush().map_err(SshError::Stream)?;
        }

        channel.wait_close().map_err(SshError::Channel)?;
        channel.exit_status().map_err(SshError::Channel)
    }

    fn exec_captured(&mut self, command: &str) -> Result<(i32, String), SshError> {
        let mut channel = self.session.channel_session().map_err(SshError::Channel)?;
        channel.exec(command).map_err(SshError::Channel)?;

        let mut output = String::new();
        channel.read_to_string(&mut output).map_err(SshError::Stream)?;

        channel.wait_close().map_err(SshError::Channel)?;
        let status = channel.exit_status().map_err(SshError::Channel)?;
        Ok((status, output))
    }
}

/// Wrap `s` in single quotes for safe interpolation into a remote shell
/// command. Embedded single quotes are closed, escaped, and reopened.
#[must_use]
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

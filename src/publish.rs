//! Remote publishing of release files over SSH/SCP.
//!
//! Opens a single SSH session to the update server, verifies the server's
//! host key against the user's known-hosts store (never interactively),
//! ensures the per-extension remote directory exists, and copies the update
//! descriptor and the package artifact into it. Execution is strictly
//! sequential; the exec and SCP channels are closed after use and the
//! session itself closes on drop on every exit path.

use crate::error::{JextError, Result};
use crate::release::ReleaseOutput;
use camino::Utf8Path;
use ssh2::{CheckResult, KnownHostFileKind, Session};
use std::fs;
use std::io::{self, Read};
use std::net::TcpStream;
use std::path::Path;

/// The standard SSH port, used when none is configured.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Connection parameters for the update server.
#[derive(Debug, Clone, Default)]
pub struct SshConfig {
    /// Hostname or address of the update server.
    pub host: String,
    /// Port, defaulting to [`DEFAULT_SSH_PORT`] when absent.
    pub port: Option<u16>,
    /// Username; the local username is used when absent.
    pub user: Option<String>,
    /// Password; presence of a user or password selects password
    /// authentication, otherwise the SSH agent is consulted.
    pub password: Option<String>,
}

impl SshConfig {
    /// The port to dial.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SSH_PORT)
    }

    /// The username to authenticate as.
    ///
    /// Falls back to the invoking user's name from the environment when no
    /// username is configured, matching what an SSH client would present.
    #[must_use]
    pub fn effective_user(&self) -> String {
        self.user.clone().unwrap_or_else(|| {
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_default()
        })
    }

    /// Whether password authentication was requested.
    #[must_use]
    pub fn uses_password_auth(&self) -> bool {
        self.user.is_some() || self.password.is_some()
    }
}

/// Push both release files to the update server.
///
/// Ensures `{remote_dir}/{extension-dir-name}` exists (created recursively
/// if absent) and copies the descriptor and the package into it, preserving
/// filenames. Any failure is fatal; locally built files are left on disk.
///
/// # Errors
///
/// Returns the connection, host-key, authentication, remote-command, or
/// transfer error of the step that failed.
pub fn push_release(config: &SshConfig, remote_dir: &str, output: &ReleaseOutput) -> Result<()> {
    let target_dir = remote_target(remote_dir, &output.package_path)?;
    let session = open_session(config)?;

    log::debug!("ensuring remote directory {target_dir}");
    run_remote(&session, &format!("mkdir -p {}", shell_quote(&target_dir)))?;

    for local in [&output.descriptor_path, &output.package_path] {
        let filename = local.file_name().ok_or_else(|| JextError::Upload {
            path: (*local).clone(),
            reason: "file has no name".to_owned(),
        })?;
        let remote = format!("{target_dir}/{filename}");
        log::debug!("uploading {local} to {remote}");
        upload(&session, local, &remote)?;
    }

    Ok(())
}

/// The remote directory for this extension's update files:
/// `{remote_dir}/{extension-dir-name}`, where the extension directory name
/// is taken from the package artifact's parent directory.
fn remote_target(remote_dir: &str, package_path: &Utf8Path) -> Result<String> {
    let ext_name = package_path
        .parent()
        .and_then(Utf8Path::file_name)
        .ok_or_else(|| JextError::Upload {
            path: package_path.to_owned(),
            reason: "package path has no parent directory".to_owned(),
        })?;
    Ok(format!("{}/{ext_name}", remote_dir.trim_end_matches('/')))
}

/// Open, verify, and authenticate an SSH session.
fn open_session(config: &SshConfig) -> Result<Session> {
    let endpoint = format!("{}:{}", config.host, config.port());
    log::debug!("connecting to {endpoint}");
    let tcp = TcpStream::connect(&endpoint).map_err(|e| JextError::Connect {
        host: endpoint.clone(),
        reason: e.to_string(),
    })?;

    let mut session = Session::new().map_err(|e| JextError::Handshake {
        reason: e.to_string(),
    })?;
    session.set_tcp_stream(tcp);
    session.handshake().map_err(|e| JextError::Handshake {
        reason: e.to_string(),
    })?;

    verify_host_key(&session, config)?;
    authenticate(&session, config)?;
    Ok(session)
}

/// Check the server's host key against `~/.ssh/known_hosts`.
///
/// There is no interactive confirmation: an unknown or mismatched key, or
/// an unreadable known-hosts store, aborts the publish.
fn verify_host_key(session: &Session, config: &SshConfig) -> Result<()> {
    let host_key_error = |reason: String| JextError::HostKey {
        host: config.host.clone(),
        reason,
    };

    let known_hosts_path = directories_next::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
        .ok_or_else(|| host_key_error("cannot locate the user's home directory".to_owned()))?;

    let mut known_hosts = session
        .known_hosts()
        .map_err(|e| host_key_error(e.to_string()))?;
    known_hosts
        .read_file(&known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| {
            host_key_error(format!(
                "cannot read {}: {e}",
                known_hosts_path.display()
            ))
        })?;

    let (key, _key_type) = session
        .host_key()
        .ok_or_else(|| host_key_error("server presented no host key".to_owned()))?;

    match known_hosts.check_port(&config.host, config.port(), key) {
        CheckResult::Match => Ok(()),
        CheckResult::Mismatch => Err(host_key_error(
            "host key does not match the known-hosts entry".to_owned(),
        )),
        CheckResult::NotFound => Err(host_key_error(
            "host not present in the known-hosts store".to_owned(),
        )),
        CheckResult::Failure => Err(host_key_error("known-hosts check failed".to_owned())),
    }
}

/// Authenticate the session: password auth when a user or password was
/// supplied, agent auth otherwise.
fn authenticate(session: &Session, config: &SshConfig) -> Result<()> {
    let user = config.effective_user();
    let auth_error = |reason: String| JextError::Auth {
        user: user.clone(),
        reason,
    };

    if config.uses_password_auth() {
        let password = config.password.as_deref().unwrap_or("");
        session
            .userauth_password(&user, password)
            .map_err(|e| auth_error(e.to_string()))?;
    } else {
        session
            .userauth_agent(&user)
            .map_err(|e| auth_error(e.to_string()))?;
    }

    if session.authenticated() {
        Ok(())
    } else {
        Err(auth_error("server rejected the authentication".to_owned()))
    }
}

/// Run a command on the server and fail on a non-zero exit status.
fn run_remote(session: &Session, command: &str) -> Result<()> {
    let command_error = |reason: String| JextError::RemoteCommand {
        command: command.to_owned(),
        reason,
    };

    let mut channel = session
        .channel_session()
        .map_err(|e| command_error(e.to_string()))?;
    channel.exec(command).map_err(|e| command_error(e.to_string()))?;

    // Both streams must be drained or the remote side can block on a
    // full pipe before it reports its exit status.
    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| command_error(e.to_string()))?;
    let mut stderr = String::new();
    channel
        .stderr()
        .read_to_string(&mut stderr)
        .map_err(|e| command_error(e.to_string()))?;
    channel
        .wait_close()
        .map_err(|e| command_error(e.to_string()))?;

    let status = channel
        .exit_status()
        .map_err(|e| command_error(e.to_string()))?;
    check_exit_status(command, status, &stderr)
}

/// Map a remote exit status to a result, citing stderr on failure.
fn check_exit_status(command: &str, status: i32, stderr: &str) -> Result<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(JextError::RemoteCommand {
            command: command.to_owned(),
            reason: format!("exit status {status}: {}", stderr.trim()),
        })
    }
}

/// Copy one local file to `remote` over an SCP sub-channel.
fn upload(session: &Session, local: &Utf8Path, remote: &str) -> Result<()> {
    let upload_error = |reason: String| JextError::Upload {
        path: local.to_owned(),
        reason,
    };

    let mut file = fs::File::open(local)?;
    let size = file.metadata()?.len();

    let mut channel = session
        .scp_send(Path::new(remote), 0o644, size, None)
        .map_err(|e| upload_error(e.to_string()))?;
    io::copy(&mut file, &mut channel).map_err(|e| upload_error(e.to_string()))?;

    channel.send_eof().map_err(|e| upload_error(e.to_string()))?;
    channel.wait_eof().map_err(|e| upload_error(e.to_string()))?;
    channel.close().map_err(|e| upload_error(e.to_string()))?;
    channel
        .wait_close()
        .map_err(|e| upload_error(e.to_string()))?;
    Ok(())
}

/// Quote a path for use in a remote shell command.
fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

//! CLI argument definitions for the release tool.
//!
//! This module defines the command-line surface using clap, separated from
//! the entrypoint so argument handling stays testable. Flag names keep the
//! historical underscore spellings (`--ssh_host`, `--remote_dir`) so
//! existing release scripts continue to work.

use crate::error::{JextError, Result};
use crate::publish::SshConfig;
use camino::Utf8PathBuf;
use clap::Parser;

/// Create and publish release packages of Joomla! extensions.
#[derive(Parser, Debug)]
#[command(name = "jext")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package an extension:\n",
    "    $ jext ~/extensions/mod_example\n\n",
    "  Package and publish to the update server:\n",
    "    $ jext --push -s updates.example.com -d /srv/updates ~/extensions/mod_example\n",
))]
pub struct Cli {
    /// Path to the extension directory.
    pub path: Utf8PathBuf,

    /// Push the release files to the extension's update server.
    #[arg(long)]
    pub push: bool,

    /// SSH host of the update server (required with --push).
    #[arg(short = 's', long = "ssh_host", value_name = "HOST")]
    pub ssh_host: Option<String>,

    /// SSH port of the update server [default: 22].
    #[arg(short = 'P', long = "ssh_port", value_name = "PORT")]
    pub ssh_port: Option<u16>,

    /// SSH user for the update server.
    #[arg(short = 'u', long = "ssh_user", value_name = "USER")]
    pub ssh_user: Option<String>,

    /// SSH password for the update server.
    #[arg(short = 'p', long = "ssh_password", value_name = "PASSWORD")]
    pub ssh_password: Option<String>,

    /// Remote base directory for extension update files (required with --push).
    #[arg(short = 'd', long = "remote_dir", value_name = "DIR")]
    pub remote_dir: Option<String>,
}

/// A validated publish destination assembled from the CLI arguments.
#[derive(Debug, Clone)]
pub struct PushTarget {
    /// Connection parameters for the update server.
    pub config: SshConfig,
    /// Remote base directory for update files.
    pub remote_dir: String,
}

impl Cli {
    /// Resolve the publish destination, if any.
    ///
    /// Returns `None` when `--push` was not given. Validation happens here,
    /// before any filesystem work.
    ///
    /// # Errors
    ///
    /// Returns [`JextError::MissingPushArguments`] when `--push` is set
    /// without both an SSH host and a remote directory.
    pub fn push_target(&self) -> Result<Option<PushTarget>> {
        if !self.push {
            return Ok(None);
        }
        match (&self.ssh_host, &self.remote_dir) {
            (Some(host), Some(remote_dir)) => Ok(Some(PushTarget {
                config: SshConfig {
                    host: host.clone(),
                    port: self.ssh_port,
                    user: self.ssh_user.clone(),
                    password: self.ssh_password.clone(),
                },
                remote_dir: remote_dir.clone(),
            })),
            _ => Err(JextError::MissingPushArguments),
        }
    }
}

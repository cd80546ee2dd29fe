//! Error types for the extension release tool.
//!
//! This module defines semantic error variants for every stage of a release:
//! argument validation, manifest parsing, archive construction, descriptor
//! rewriting, and remote publishing. Each variant names the path or remote
//! endpoint involved so failures are actionable without a backtrace.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while building or publishing a release.
#[derive(Debug, Error)]
pub enum JextError {
    /// `--push` was requested without the remote parameters it needs.
    #[error(
        "--push requires both an SSH host (-s/--ssh_host) and a remote directory (-d/--remote_dir)"
    )]
    MissingPushArguments,

    /// The extension path does not name a usable directory.
    #[error("invalid extension directory {path}: {reason}")]
    ExtensionDirInvalid {
        /// The path that was supplied.
        path: Utf8PathBuf,
        /// Description of why the path is unusable.
        reason: String,
    },

    /// The extension manifest could not be read from disk.
    #[error("cannot read manifest {path}")]
    ManifestUnreadable {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The extension manifest is not well-formed XML.
    #[error("malformed manifest {path}: {reason}")]
    ManifestParse {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The extension manifest has no `version` element.
    #[error("manifest {path} has no <version> element")]
    ManifestVersionMissing {
        /// Path to the manifest file.
        path: Utf8PathBuf,
    },

    /// The update descriptor could not be read from disk.
    #[error("cannot read update descriptor {path}")]
    DescriptorUnreadable {
        /// Path to the descriptor file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The update descriptor is not well-formed XML.
    #[error("malformed update descriptor {path}: {reason}")]
    DescriptorParse {
        /// Path to the descriptor file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The update descriptor lacks an element the rewrite must target.
    #[error("update descriptor {path} has no <{element}> element")]
    DescriptorElementMissing {
        /// Path to the descriptor file.
        path: Utf8PathBuf,
        /// Name of the missing element.
        element: &'static str,
    },

    /// An exclusion rule could not be compiled into a matcher.
    #[error("invalid exclusion pattern {pattern:?}: {reason}")]
    InvalidExcludePattern {
        /// The rule string as supplied.
        pattern: String,
        /// Description of the compile failure.
        reason: String,
    },

    /// Writing an entry to the package archive failed.
    #[error("cannot build package archive {path}: {reason}")]
    Archive {
        /// Destination path of the archive.
        path: Utf8PathBuf,
        /// Description of the archive failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TCP connection to the update server could not be opened.
    #[error("cannot connect to {host}: {reason}")]
    Connect {
        /// The `host:port` endpoint that was dialled.
        host: String,
        /// Description of the connection failure.
        reason: String,
    },

    /// The SSH handshake with the update server failed.
    #[error("SSH handshake failed: {reason}")]
    Handshake {
        /// Description of the handshake failure.
        reason: String,
    },

    /// The server's host key is absent from or contradicts the known-hosts store.
    #[error("host key verification failed for {host}: {reason}")]
    HostKey {
        /// The host whose key was checked.
        host: String,
        /// Description of the verification failure.
        reason: String,
    },

    /// SSH authentication was rejected.
    #[error("SSH authentication failed for user {user}: {reason}")]
    Auth {
        /// The username presented to the server.
        user: String,
        /// Description of the authentication failure.
        reason: String,
    },

    /// A command run on the update server failed.
    #[error("remote command {command:?} failed: {reason}")]
    RemoteCommand {
        /// The command that was executed.
        command: String,
        /// Description of the failure.
        reason: String,
    },

    /// Transferring a release file to the update server failed.
    #[error("upload of {path} failed: {reason}")]
    Upload {
        /// Local path of the file being transferred.
        path: Utf8PathBuf,
        /// Description of the transfer failure.
        reason: String,
    },
}

/// Result type alias using [`JextError`].
pub type Result<T> = std::result::Result<T, JextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_push_arguments_names_both_flags() {
        let msg = JextError::MissingPushArguments.to_string();
        assert!(msg.contains("ssh_host"));
        assert!(msg.contains("remote_dir"));
    }

    #[test]
    fn manifest_version_missing_names_the_manifest() {
        let err = JextError::ManifestVersionMissing {
            path: Utf8PathBuf::from("/ext/mod_example.xml"),
        };
        let msg = err.to_string();
        assert!(msg.contains("mod_example.xml"));
        assert!(msg.contains("<version>"));
    }

    #[test]
    fn descriptor_element_missing_names_the_element() {
        let err = JextError::DescriptorElementMissing {
            path: Utf8PathBuf::from("/ext/updates/extension.xml"),
            element: "downloadurl",
        };
        let msg = err.to_string();
        assert!(msg.contains("<downloadurl>"));
    }

    #[test]
    fn manifest_unreadable_preserves_source() {
        let err = JextError::ManifestUnreadable {
            path: Utf8PathBuf::from("/ext/missing.xml"),
            source: std::io::Error::other("no such file"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn auth_error_includes_user() {
        let err = JextError::Auth {
            user: "deploy".to_owned(),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("deploy"));
        assert!(msg.contains("permission denied"));
    }
}

//! Packaging and publishing of Joomla! extension releases.
//!
//! This crate turns an extension source directory into a distributable ZIP
//! package, rewrites the extension's update-server feed to advertise the new
//! version, and optionally pushes both files to the update server over
//! SSH/SCP. It backs the `jext` CLI binary and can be driven
//! programmatically through [`release::build_release`] and
//! [`publish::push_release`].
//!
//! # Modules
//!
//! - [`archive`] - Exclusion-aware ZIP packaging of a source tree
//! - [`cli`] - Command-line argument definitions and validation
//! - [`descriptor`] - In-place rewrite of the update-server feed
//! - [`error`] - Semantic error types for every release stage
//! - [`extension`] - Extension directory model and package naming
//! - [`manifest`] - Extension manifest version extraction
//! - [`publish`] - SSH/SCP transfer of release files
//! - [`release`] - Release orchestration

pub mod archive;
pub mod cli;
pub mod descriptor;
pub mod error;
pub mod extension;
pub mod manifest;
pub mod publish;
pub mod release;

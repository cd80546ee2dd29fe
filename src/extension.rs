//! Extension directory model and package naming policy.
//!
//! An extension is identified by its source directory. The directory's base
//! name doubles as the extension name, and the segment after the final
//! underscore is the short identifier ("slug") used to locate the manifest,
//! e.g. `mod_example` → slug `example` → manifest `example.xml`.

use crate::error::{JextError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// File extension of package artifacts, including the leading dot.
pub const PACKAGE_EXTENSION: &str = ".zip";

/// Name of the subdirectory holding the update descriptor.
pub const UPDATES_DIR: &str = "updates";

/// Filename of the update descriptor inside [`UPDATES_DIR`].
pub const DESCRIPTOR_FILENAME: &str = "extension.xml";

/// An extension source directory with its derived identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    root: Utf8PathBuf,
    name: String,
    slug: String,
}

impl Extension {
    /// Derive an extension from its source directory.
    ///
    /// The path is resolved to an absolute directory; its base name becomes
    /// the extension name and the substring after the final underscore
    /// becomes the slug. Names without an underscore use the whole name as
    /// the slug.
    ///
    /// # Errors
    ///
    /// Returns [`JextError::ExtensionDirInvalid`] if the path is not an
    /// existing directory or has no usable base name.
    pub fn from_dir(path: &Utf8Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(JextError::ExtensionDirInvalid {
                path: path.to_owned(),
                reason: "not a directory".to_owned(),
            });
        }
        let root =
            path.canonicalize_utf8()
                .map_err(|e| JextError::ExtensionDirInvalid {
                    path: path.to_owned(),
                    reason: format!("cannot resolve path: {e}"),
                })?;
        let name = root
            .file_name()
            .ok_or_else(|| JextError::ExtensionDirInvalid {
                path: path.to_owned(),
                reason: "directory has no base name".to_owned(),
            })?
            .to_owned();
        let slug = name
            .rsplit_once('_')
            .map_or(name.as_str(), |(_, tail)| tail)
            .to_owned();
        Ok(Self { root, name, slug })
    }

    /// Absolute path of the extension source directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The extension name (the directory's base name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short identifier derived from the name.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Path of the extension manifest, `{root}/{slug}.xml`.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.root.join(format!("{}.xml", self.slug))
    }

    /// Path of the update descriptor, `{root}/updates/extension.xml`.
    #[must_use]
    pub fn descriptor_path(&self) -> Utf8PathBuf {
        self.root.join(UPDATES_DIR).join(DESCRIPTOR_FILENAME)
    }

    /// The package name for a release of this extension at `version`.
    #[must_use]
    pub fn package_name(&self, version: &str) -> PackageName {
        PackageName::new(self.name.clone(), version.to_owned())
    }
}

/// The deterministic filename of a package artifact:
/// `{extension-name}-{version}.zip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
    name: String,
    version: String,
}

impl PackageName {
    /// Create a package name from an extension name and version.
    #[must_use]
    pub fn new(name: String, version: String) -> Self {
        Self { name, version }
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{PACKAGE_EXTENSION}", self.name, self.version)
    }
}

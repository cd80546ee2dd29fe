//! Release orchestration: one call takes an extension directory to a fresh
//! package artifact plus an updated feed.
//!
//! The sequence is strictly ordered: derive the extension identity, read the
//! manifest version, drop stale packages, build the new archive, then point
//! the update descriptor at it. The descriptor version and the package
//! filename are set from the same manifest read, so they can never diverge
//! within one successful run.

use crate::archive::{self, ExcludeList};
use crate::descriptor;
use crate::error::Result;
use crate::extension::{Extension, PACKAGE_EXTENSION};
use crate::manifest;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// The two files a release produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutput {
    /// Path of the freshly built package artifact.
    pub package_path: Utf8PathBuf,
    /// Path of the rewritten update descriptor.
    pub descriptor_path: Utf8PathBuf,
}

/// Build a release of the extension at `ext_dir`.
///
/// Reads the version from `{dir}/{slug}.xml`, deletes any previous package
/// artifacts (`{name}*.zip`) from the directory, builds
/// `{name}-{version}.zip` with the default release exclusions, and rewrites
/// `updates/extension.xml` to advertise the new version. After a successful
/// run exactly one package artifact exists in the directory.
///
/// Re-running with an unchanged manifest produces the same filenames and
/// metadata but not a byte-identical archive (entry timestamps differ).
///
/// # Errors
///
/// Propagates any failure from manifest parsing, stale-package cleanup,
/// archive construction, or the descriptor rewrite. Failures leave already
/// written local files in place.
pub fn build_release(ext_dir: &Utf8Path) -> Result<ReleaseOutput> {
    let ext = Extension::from_dir(ext_dir)?;
    let version = manifest::read_version(&ext.manifest_path())?;
    log::debug!("releasing {} {version}", ext.name());

    remove_stale_packages(&ext)?;

    let package_filename = ext.package_name(&version).filename();
    let package_path = ext.root().join(&package_filename);
    let excludes = ExcludeList::compile(&archive::release_excludes(&package_filename))?;
    archive::build_archive(ext.root(), &package_path, &excludes)?;

    let descriptor_path = ext.descriptor_path();
    descriptor::apply_release(&descriptor_path, &version, &package_filename)?;

    Ok(ReleaseOutput {
        package_path,
        descriptor_path,
    })
}

/// Delete previous package artifacts from the extension directory.
///
/// A stale package is any regular file whose name starts with the extension
/// name and ends with the package extension.
fn remove_stale_packages(ext: &Extension) -> Result<()> {
    for entry in ext.root().read_dir_utf8()? {
        let entry = entry?;
        let name = entry.file_name();
        if name.starts_with(ext.name())
            && name.ends_with(PACKAGE_EXTENSION)
            && entry.file_type()?.is_file()
        {
            log::debug!("removing stale package {name}");
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;

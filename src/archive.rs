//! Exclusion-aware ZIP packaging of an extension source tree.
//!
//! Exclusion rules are regex fragments in the same dialect the historical
//! build scripts used: a leading `/` anchors the rule to the source root,
//! otherwise it matches at any depth, and a trailing `/` makes the rule
//! cover the named directory and everything beneath it. Rules are compiled
//! once per build into anchored matchers and applied to `/`-prefixed paths
//! relative to the source root. Archive entries are stored without the
//! leading separator and never include the source root's own name.

use crate::error::{JextError, Result};
use camino::Utf8Path;
use regex::Regex;
use std::fs;
use std::io;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Legacy build scripts excluded from every release package.
const BUILD_SCRIPT_RULES: [&str; 2] = ["/mkzip.py", "/mkzip.sh"];

/// Hidden files and directories, excluded at any depth.
const HIDDEN_ENTRY_RULE: &str = r"\..*";

/// A set of exclusion rules compiled into anchored matchers.
#[derive(Debug)]
pub struct ExcludeList {
    matchers: Vec<Regex>,
}

impl ExcludeList {
    /// Compile a list of rule strings into matchers.
    ///
    /// # Errors
    ///
    /// Returns [`JextError::InvalidExcludePattern`] if a rule is not a
    /// valid pattern fragment.
    pub fn compile<S: AsRef<str>>(rules: &[S]) -> Result<Self> {
        let matchers = rules
            .iter()
            .map(|rule| compile_rule(rule.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers })
    }

    /// Whether a `/`-prefixed root-relative path matches any rule.
    #[must_use]
    pub fn is_excluded(&self, rooted_path: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(rooted_path))
    }
}

/// Compile one rule into an anchored matcher.
///
/// Rules without a leading `/` gain an "anywhere under the root" prefix;
/// rules with a trailing `/` also match everything nested beneath the
/// named directory.
fn compile_rule(rule: &str) -> Result<Regex> {
    let (body, covers_contents) = match rule.strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (rule, false),
    };
    let anchor = if body.starts_with('/') { "" } else { "(.*/)" };
    let nested = if covers_contents { "(/.*)?" } else { "" };
    let pattern = format!("^{anchor}{body}{nested}$");
    Regex::new(&pattern).map_err(|e| JextError::InvalidExcludePattern {
        pattern: rule.to_owned(),
        reason: e.to_string(),
    })
}

/// The default exclusion rules for a release package.
///
/// Excludes legacy build scripts, the `updates` feed directory, hidden
/// entries at any depth, and the package file currently being written so
/// the archive never includes itself.
#[must_use]
pub fn release_excludes(package_filename: &str) -> Vec<String> {
    let mut rules: Vec<String> = BUILD_SCRIPT_RULES.iter().map(|&r| r.to_owned()).collect();
    rules.push(format!("/{}/", crate::extension::UPDATES_DIR));
    rules.push(HIDDEN_ENTRY_RULE.to_owned());
    // The artifact filename is a literal, not a pattern fragment.
    rules.push(format!("/{}", regex::escape(package_filename)));
    rules
}

/// Build a Deflate-compressed ZIP of `source` at `target`.
///
/// The tree is walked in sorted order for deterministic entry layout.
/// Every regular file whose `/`-prefixed root-relative path matches no
/// exclusion rule is stored under that relative path (without the leading
/// separator). The source tree is never mutated. On failure a partial
/// archive may remain at `target`; callers treat any error as a failed
/// build.
///
/// # Errors
///
/// Returns [`JextError::Io`] if the tree cannot be read or the target
/// cannot be written, and [`JextError::Archive`] on archive-level
/// failures such as non-UTF-8 entry paths.
pub fn build_archive(source: &Utf8Path, target: &Utf8Path, excludes: &ExcludeList) -> Result<()> {
    let archive_error = |reason: String| JextError::Archive {
        path: target.to_owned(),
        reason,
    };

    let file = fs::File::create(target)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| archive_error(format!("entry escapes source root: {e}")))?;
        let relative = Utf8Path::from_path(relative)
            .ok_or_else(|| archive_error(format!("non-UTF-8 path {:?}", entry.path())))?;

        let rooted = format!("/{relative}");
        if excludes.is_excluded(&rooted) {
            log::debug!("excluding {relative}");
            continue;
        }

        writer
            .start_file(relative.as_str(), options)
            .map_err(|e| archive_error(e.to_string()))?;
        let mut source_file = fs::File::open(entry.path())?;
        io::copy(&mut source_file, &mut writer)?;
    }

    writer.finish().map_err(|e| archive_error(e.to_string()))?;
    Ok(())
}

/// List the entry names of the archive at `path`, in stored order.
///
/// # Errors
///
/// Returns [`JextError::Io`] if the file cannot be opened and
/// [`JextError::Archive`] if it is not a readable ZIP.
pub fn archive_entries(path: &Utf8Path) -> Result<Vec<String>> {
    let read_error = |reason: String| JextError::Archive {
        path: path.to_owned(),
        reason,
    };
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| read_error(e.to_string()))?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| read_error(e.to_string()))?;
        names.push(entry.name().to_owned());
    }
    Ok(names)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;

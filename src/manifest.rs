//! Extension manifest parsing.
//!
//! A Joomla! extension manifest is an XML file whose root element carries a
//! `version` child, e.g. `<extension><version>2.3.1</version></extension>`.
//! Only the version is extracted here; everything else in the manifest is
//! irrelevant to packaging and left alone.

use crate::error::{JextError, Result};
use camino::Utf8Path;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::fs;

/// Raw manifest structure for deserialisation. All fields other than
/// `version` are ignored.
#[derive(Debug, Deserialize)]
struct RawManifest {
    version: Option<String>,
}

/// Read the `version` element from the manifest at `path`.
///
/// # Errors
///
/// Returns [`JextError::ManifestUnreadable`] if the file cannot be read,
/// [`JextError::ManifestParse`] if it is not well-formed XML, and
/// [`JextError::ManifestVersionMissing`] if the root element has no
/// `version` child. There is no default version; all three are fatal to
/// the release.
pub fn read_version(path: &Utf8Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|source| JextError::ManifestUnreadable {
        path: path.to_owned(),
        source,
    })?;
    let raw: RawManifest = from_str(&content).map_err(|e| JextError::ManifestParse {
        path: path.to_owned(),
        reason: e.to_string(),
    })?;
    raw.version.ok_or_else(|| JextError::ManifestVersionMissing {
        path: path.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn write_manifest(content: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("example.xml"))
            .expect("utf-8 manifest path");
        fs::write(&path, content).expect("write manifest");
        (dir, path)
    }

    #[test]
    fn reads_version_text_exactly() {
        let (_guard, path) = write_manifest(
            r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="module" client="site" method="upgrade">
  <name>Example Module</name>
  <author>Example Author</author>
  <version>2.3.1</version>
  <description>An example.</description>
</extension>"#,
        );
        assert_eq!(read_version(&path).expect("version"), "2.3.1");
    }

    #[test]
    fn missing_version_element_is_fatal() {
        let (_guard, path) = write_manifest("<extension><name>No Version</name></extension>");
        let err = read_version(&path).expect_err("expected failure");
        assert!(matches!(err, JextError::ManifestVersionMissing { .. }));
    }

    #[test]
    fn malformed_xml_is_fatal() {
        let (_guard, path) = write_manifest("<extension><version>1.0</extension>");
        let err = read_version(&path).expect_err("expected failure");
        assert!(matches!(err, JextError::ManifestParse { .. }));
    }

    #[test]
    fn missing_file_names_the_manifest_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.xml"))
            .expect("utf-8 manifest path");
        let err = read_version(&path).expect_err("expected failure");
        assert!(matches!(err, JextError::ManifestUnreadable { .. }));
        assert!(err.to_string().contains("absent.xml"));
    }
}

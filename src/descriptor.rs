//! In-place rewrite of the update-server descriptor.
//!
//! The descriptor (`updates/extension.xml`) is the feed clients poll for new
//! releases. Publishing a release touches exactly two things: the first
//! `update` element's `version` text and the final path segment of the first
//! `downloads/downloadurl` text. The file is processed as an event stream so
//! every other element, attribute, and comment passes through unchanged, and
//! the file is only written back once the whole rewrite has succeeded.

use crate::error::{JextError, Result};
use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesText, Event};
use std::fs;

/// Rewrite the descriptor at `path` for a new release.
///
/// Sets the first `update` element's `version` to `version` and replaces
/// the filename component of the first `downloads/downloadurl` text with
/// `package_filename`, preserving the URL's path prefix. All other content
/// is preserved.
///
/// # Errors
///
/// Returns [`JextError::DescriptorUnreadable`] if the file cannot be read,
/// [`JextError::DescriptorParse`] if it is not well-formed XML, and
/// [`JextError::DescriptorElementMissing`] if the `update`, `version`, or
/// `downloadurl` element the rewrite targets is absent. The file is left
/// untouched on every failure.
pub fn apply_release(path: &Utf8Path, version: &str, package_filename: &str) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|source| JextError::DescriptorUnreadable {
        path: path.to_owned(),
        source,
    })?;

    let rewritten = rewrite(&content, version, package_filename).map_err(|e| match e {
        RewriteError::Parse(reason) => JextError::DescriptorParse {
            path: path.to_owned(),
            reason,
        },
        RewriteError::Missing(element) => JextError::DescriptorElementMissing {
            path: path.to_owned(),
            element,
        },
    })?;

    fs::write(path, rewritten)?;
    Ok(())
}

/// Internal failure modes of the event-stream rewrite.
enum RewriteError {
    Parse(String),
    Missing(&'static str),
}

fn parse_err<E: std::fmt::Display>(e: E) -> RewriteError {
    RewriteError::Parse(e.to_string())
}

/// Which element's text the rewrite is currently targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    Version,
    DownloadUrl,
}

/// Run the event-stream rewrite over the descriptor text.
fn rewrite(
    content: &str,
    version: &str,
    package_filename: &str,
) -> std::result::Result<Vec<u8>, RewriteError> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Vec::new());

    // Element-name stack; the document root sits at depth 1.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_update = false;
    let mut in_target_update = false;
    let mut seen_downloads = false;
    let mut in_target_downloads = false;
    let mut version_done = false;
    let mut url_done = false;
    let mut pending = Pending::None;
    let mut replaced = false;

    loop {
        let event = reader.read_event().map_err(parse_err)?;
        match event {
            Event::Start(ref start) => {
                let name = start.name().as_ref().to_vec();
                if !seen_update && stack.len() == 1 && name == b"update" {
                    seen_update = true;
                    in_target_update = true;
                } else if in_target_update && stack.len() == 2 {
                    if name == b"version" && !version_done {
                        pending = Pending::Version;
                        replaced = false;
                    } else if name == b"downloads" && !seen_downloads {
                        seen_downloads = true;
                        in_target_downloads = true;
                    }
                } else if in_target_downloads
                    && stack.len() == 3
                    && name == b"downloadurl"
                    && !url_done
                {
                    pending = Pending::DownloadUrl;
                    replaced = false;
                }
                stack.push(name);
                writer.write_event(event).map_err(parse_err)?;
            }
            Event::End(ref end) => {
                let name = end.name().as_ref().to_vec();
                // An empty target element still receives its new text.
                match pending {
                    Pending::Version if name == b"version" => {
                        if !replaced {
                            writer
                                .write_event(Event::Text(BytesText::new(version)))
                                .map_err(parse_err)?;
                        }
                        version_done = true;
                        pending = Pending::None;
                    }
                    Pending::DownloadUrl if name == b"downloadurl" => {
                        if !replaced {
                            writer
                                .write_event(Event::Text(BytesText::new(package_filename)))
                                .map_err(parse_err)?;
                        }
                        url_done = true;
                        pending = Pending::None;
                    }
                    _ => {}
                }
                stack.pop();
                if in_target_update && stack.len() == 1 && name == b"update" {
                    in_target_update = false;
                }
                if in_target_downloads && stack.len() == 2 && name == b"downloads" {
                    in_target_downloads = false;
                }
                writer.write_event(event).map_err(parse_err)?;
            }
            Event::Empty(ref start) => {
                let name = start.name().as_ref().to_vec();
                if !seen_update && stack.len() == 1 && name == b"update" {
                    seen_update = true;
                }
                let replaces_version =
                    in_target_update && stack.len() == 2 && name == b"version" && !version_done;
                let replaces_url = in_target_downloads
                    && stack.len() == 3
                    && name == b"downloadurl"
                    && !url_done;
                if replaces_version || replaces_url {
                    // A self-closing target element gains its new text,
                    // keeping its attributes.
                    let text = if replaces_version {
                        version
                    } else {
                        package_filename
                    };
                    let end = Event::End(BytesEnd::new(String::from_utf8_lossy(&name).into_owned()));
                    writer
                        .write_event(Event::Start(start.to_owned()))
                        .map_err(parse_err)?;
                    writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(parse_err)?;
                    writer.write_event(end).map_err(parse_err)?;
                    if replaces_version {
                        version_done = true;
                    } else {
                        url_done = true;
                    }
                } else {
                    writer.write_event(event).map_err(parse_err)?;
                }
            }
            Event::Text(_) | Event::CData(_) if pending != Pending::None => {
                if replaced {
                    // Content after the first text run, e.g. text trailing
                    // an inner comment, is ordinary element content.
                    writer.write_event(event).map_err(parse_err)?;
                } else {
                    let new_text = match pending {
                        Pending::Version | Pending::None => version.to_owned(),
                        Pending::DownloadUrl => {
                            let original = original_text(&event).map_err(parse_err)?;
                            replace_url_filename(&original, package_filename)
                        }
                    };
                    writer
                        .write_event(Event::Text(BytesText::new(&new_text)))
                        .map_err(parse_err)?;
                    replaced = true;
                    if pending == Pending::Version {
                        version_done = true;
                    } else {
                        url_done = true;
                    }
                }
            }
            Event::Eof => break,
            other => {
                writer.write_event(other).map_err(parse_err)?;
            }
        }
    }

    if !seen_update {
        return Err(RewriteError::Missing("update"));
    }
    if !version_done {
        return Err(RewriteError::Missing("version"));
    }
    if !url_done {
        return Err(RewriteError::Missing("downloadurl"));
    }
    Ok(writer.into_inner())
}

/// Extract the character content of a text or CDATA event.
fn original_text(event: &Event<'_>) -> std::result::Result<String, quick_xml::Error> {
    match event {
        Event::Text(text) => Ok(text.unescape()?.into_owned()),
        Event::CData(cdata) => Ok(String::from_utf8_lossy(cdata).into_owned()),
        _ => Ok(String::new()),
    }
}

/// Replace the final `/`-segment of `url` with `filename`.
///
/// A URL without any separator is replaced wholesale.
fn replace_url_filename(url: &str, filename: &str) -> String {
    match url.rsplit_once('/') {
        Some((prefix, _)) => format!("{prefix}/{filename}"),
        None => filename.to_owned(),
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;

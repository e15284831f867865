//! Shared access to Office Open XML packages.

use super::ExtractionError;
use quick_xml::events::BytesStart;
use std::fmt::Display;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Inflated size cap for a single archive entry.
pub(crate) const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_package(bytes: &[u8]) -> Result<Package<'_>, ExtractionError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read an archive entry; `None` when the package has no such part.
pub(crate) fn read_part(
    package: &mut Package<'_>,
    name: &str,
) -> Result<Option<Vec<u8>>, ExtractionError> {
    let mut file = match package.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    read_bounded(name, &mut file, MAX_PART_BYTES).map(Some)
}

/// Read at most `limit` bytes of an entry, ignoring the size its header declares.
pub(crate) fn read_bounded(
    part: &str,
    reader: impl Read,
    limit: u64,
) -> Result<Vec<u8>, ExtractionError> {
    let mut contents = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut contents)?;
    if contents.len() as u64 > limit {
        return Err(ExtractionError::PartTooLarge {
            part: part.to_string(),
            limit,
        });
    }
    Ok(contents)
}

pub(crate) fn require_part(
    package: &mut Package<'_>,
    name: &str,
) -> Result<Vec<u8>, ExtractionError> {
    read_part(package, name)?.ok_or_else(|| ExtractionError::MissingPart(name.to_string()))
}

pub(crate) fn xml_error(part: &str, err: impl Display) -> ExtractionError {
    ExtractionError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

/// Unescaped value of the attribute whose local name is `name`.
pub(crate) fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

/// Resolve a relationship target relative to the directory of the part that owns it.
pub(crate) fn resolve_target(owner: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = owner.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

//! Helpers for normalizing client-supplied names.

use std::path::Path;

const FALLBACK_FILENAME: &str = "upload";
const MAX_FILENAME_CHARS: usize = 200;

/// Reduce a client filename to a single safe path component.
///
/// Directory parts are dropped, characters outside `[A-Za-z0-9._ -]` become `_`, and leading
/// dots are removed so the result can never escape or hide inside a directory.
pub fn sanitize_filename(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return FALLBACK_FILENAME.to_string();
    };
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.').trim();

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased extension of `filename`, without the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Filename stem suitable for naming an output folder.
pub(crate) fn stem_of(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.replace(' ', "_"))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

//! Office-to-PDF conversion through a headless LibreOffice.

use super::{ExtractionError, ScratchDir};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const TOOL: &str = "LibreOffice";

#[cfg(windows)]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\LibreOffice\program\soffice.exe",
    r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
    r"C:\Program Files\LibreOffice\program\soffice.com",
];

#[cfg(not(windows))]
const INSTALL_PATHS: &[&str] = &[
    "/usr/bin/soffice",
    "/usr/bin/libreoffice",
    "/usr/local/bin/soffice",
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
];

/// Find a LibreOffice executable: the configured path, then standard install locations,
/// then `soffice` or `libreoffice` on `PATH`.
pub fn locate_soffice(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured soffice path does not exist; searching");
    }

    INSTALL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .or_else(|| which::which("soffice").ok())
        .or_else(|| which::which("libreoffice").ok())
}

/// Name of the PDF LibreOffice writes for `filename`.
pub fn pdf_name(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("document");
    format!("{stem}.pdf")
}

/// Convert an office document to PDF and return the PDF bytes.
///
/// `filename` must already be sanitized; it names the input inside a private scratch
/// directory.
pub async fn convert_to_pdf(
    soffice: &Path,
    filename: &str,
    bytes: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, ExtractionError> {
    let scratch = ScratchDir::new()?;
    let input = scratch.path().join(filename);
    tokio::fs::write(&input, bytes).await?;

    let mut command = Command::new(soffice);
    command
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(scratch.path())
        .arg(&input)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    tracing::info!(soffice = %soffice.display(), file = %filename, "Running LibreOffice conversion");
    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| {
            tracing::error!(file = %filename, "LibreOffice conversion timed out");
            ExtractionError::Timeout {
                tool: TOOL,
                seconds: timeout.as_secs(),
            }
        })??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::error!(status = ?output.status.code(), stderr = %stderr, "LibreOffice conversion failed");
        return Err(ExtractionError::ToolFailed {
            tool: TOOL,
            message: stderr,
        });
    }

    let pdf_path = scratch.path().join(pdf_name(filename));
    match tokio::fs::read(&pdf_path).await {
        Ok(pdf) => {
            tracing::info!(bytes = pdf.len(), "Converted document to PDF");
            Ok(pdf)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ToolFailed {
            tool: TOOL,
            message: "output file not found".to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}

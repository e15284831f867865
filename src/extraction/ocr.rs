//! OCR through the Tesseract command-line tool.
//!
//! Images are decoded and normalized with the `image` crate, written as PNG into a scratch
//! directory, and recognized with `tesseract <file> stdout -l <lang> tsv`. Text is rebuilt
//! from the word rows of the TSV report.

use super::{ExtractionError, ScratchDir};
use crate::config::Config;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const TOOL: &str = "Tesseract";
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// TSV `level` of word rows.
const WORD_LEVEL: &str = "5";

/// Recognized text plus quality information.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    /// Recognized text: lines joined by newlines, paragraphs by blank lines.
    pub text: String,
    /// Mean confidence of recognized words, rounded to two decimals.
    pub confidence: Option<f64>,
    /// Width and height of the image that was recognized, after downscaling.
    pub image_size: (u32, u32),
}

/// Handle on the Tesseract binary and its settings.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    command: String,
    language: String,
    max_dimension: u32,
    timeout: Duration,
}

impl OcrEngine {
    /// Build an engine from the service configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.ocr_language.clone(),
            max_dimension: config.ocr_max_dimension,
            timeout: config.ocr_timeout,
        }
    }

    /// Whether `tesseract --version` runs successfully.
    pub async fn is_available(&self) -> bool {
        let mut command = Command::new(&self.command);
        command
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        match tokio::time::timeout(VERSION_PROBE_TIMEOUT, command.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(err)) => {
                tracing::debug!(command = %self.command, error = %err, "Tesseract probe failed");
                false
            }
            Err(_) => false,
        }
    }

    /// Recognize the text in an encoded image.
    pub async fn recognize(&self, bytes: Vec<u8>) -> Result<OcrOutput, ExtractionError> {
        if !self.is_available().await {
            return Err(ExtractionError::ToolUnavailable { tool: TOOL });
        }

        let max_dimension = self.max_dimension;
        let (png, image_size) =
            tokio::task::spawn_blocking(move || prepare_image(&bytes, max_dimension))
                .await
                .map_err(|err| ExtractionError::ToolFailed {
                    tool: TOOL,
                    message: format!("image preparation task failed: {err}"),
                })??;

        let scratch = ScratchDir::new()?;
        let input = scratch.path().join("input.png");
        tokio::fs::write(&input, &png).await?;

        let mut command = Command::new(&self.command);
        command
            .arg(&input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::info!(
            language = %self.language,
            width = image_size.0,
            height = image_size.1,
            "Running Tesseract OCR"
        );
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ExtractionError::Timeout {
                tool: TOOL,
                seconds: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(ExtractionError::ToolFailed {
                tool: TOOL,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let (text, confidence) = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        Ok(OcrOutput {
            text,
            confidence,
            image_size,
        })
    }
}

/// Decode `bytes`, normalize to RGB or greyscale, downscale to `max_dimension`, and
/// re-encode as PNG.
pub fn prepare_image(
    bytes: &[u8],
    max_dimension: u32,
) -> Result<(Vec<u8>, (u32, u32)), ExtractionError> {
    let decoded = image::load_from_memory(bytes)?;
    let mut image = match decoded {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => decoded,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let longest = image.width().max(image.height());
    if max_dimension > 0 && longest > max_dimension {
        let ratio = f64::from(max_dimension) / f64::from(longest);
        let width = ((f64::from(image.width()) * ratio) as u32).max(1);
        let height = ((f64::from(image.height()) * ratio) as u32).max(1);
        image = image.resize_exact(width, height, FilterType::Lanczos3);
        tracing::info!(width, height, "Resized image for OCR");
    }

    let mut png = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)?;
    Ok((png, (image.width(), image.height())))
}

/// Rebuild text and mean word confidence from a Tesseract TSV report.
pub fn parse_tsv(tsv: &str) -> (String, Option<f64>) {
    // (block, paragraph) -> line -> words
    let mut paragraphs: BTreeMap<(u32, u32), BTreeMap<u32, Vec<String>>> = BTreeMap::new();
    let mut confidences = Vec::new();

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 || fields[0] != WORD_LEVEL {
            continue;
        }
        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }
        let number = |idx: usize| fields[idx].parse::<u32>().unwrap_or(0);
        paragraphs
            .entry((number(2), number(3)))
            .or_default()
            .entry(number(4))
            .or_default()
            .push(word.to_string());
        if let Ok(confidence) = fields[10].parse::<f64>() {
            if confidence >= 0.0 {
                confidences.push(confidence);
            }
        }
    }

    let text = paragraphs
        .values()
        .map(|lines| {
            lines
                .values()
                .map(|words| words.join(" "))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let confidence = (!confidences.is_empty()).then(|| {
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        (mean * 100.0).round() / 100.0
    });

    (text, confidence)
}

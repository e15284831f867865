use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docproc::{
    chunking::{Chunk, chunk_text},
    extraction::{SourceFormat, extract_docx, extract_pdf, extract_pptx},
    logging,
};
use serde::Serialize;
use walkdir::WalkDir;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Parser)]
#[command(
    name = "docproc-chunk",
    about = "Extract and chunk documents from the command line"
)]
struct Cli {
    /// Log progress to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print chunks as JSON lines.
    Chunk {
        /// File or directory to process.
        path: PathBuf,
        /// Strategy for plain-text inputs (`pdf`, `docx`, `pptx`).
        #[arg(long, default_value = "pdf")]
        file_type: String,
        /// Chunk size override in estimated tokens.
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Overlap override in estimated tokens.
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Print extracted text as JSON lines.
    Extract {
        /// File or directory to process.
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct ChunkLine<'a> {
    path: String,
    #[serde(flatten)]
    chunk: &'a Chunk,
}

#[derive(Serialize)]
struct ExtractLine<'a> {
    path: String,
    file_type: &'a str,
    char_count: usize,
    text: &'a str,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match cli.command {
        Command::Chunk {
            path,
            file_type,
            chunk_size,
            chunk_overlap,
        } => for_each_input(&path, |input| {
            let (text, detected) = read_text(input)?;
            let file_type = detected.unwrap_or(file_type.as_str());
            let outcome = chunk_text(&text, file_type, chunk_size, chunk_overlap)?;
            for chunk in &outcome.chunks {
                let line = ChunkLine {
                    path: input.display().to_string(),
                    chunk,
                };
                serde_json::to_writer(&mut out, &line)?;
                writeln!(out)?;
            }
            Ok(())
        })?,
        Command::Extract { path } => for_each_input(&path, |input| {
            let (text, detected) = read_text(input)?;
            let line = ExtractLine {
                path: input.display().to_string(),
                file_type: detected.unwrap_or("text"),
                char_count: text.chars().count(),
                text: &text,
            };
            serde_json::to_writer(&mut out, &line)?;
            writeln!(out)?;
            Ok(())
        })?,
    }
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

/// Run `handle` on `path`, or on every supported file below it when it is a directory.
fn for_each_input(path: &Path, mut handle: impl FnMut(&Path) -> Result<()>) -> Result<()> {
    if path.is_file() {
        return handle(path).with_context(|| format!("failed to process {}", path.display()));
    }

    let mut processed = 0usize;
    let mut failed = 0usize;
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
    {
        processed += 1;
        if let Err(err) = handle(entry.path()) {
            failed += 1;
            tracing::warn!(path = %entry.path().display(), error = %format!("{err:#}"), "Skipping file");
        }
    }

    tracing::info!(processed, failed, "Finished walking {}", path.display());
    if processed == 0 {
        bail!("no supported files found under {}", path.display());
    }
    if failed > 0 {
        bail!("{failed} of {processed} files failed");
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    matches!(
        SourceFormat::from_filename(&path.to_string_lossy()),
        Some(SourceFormat::Pdf | SourceFormat::Docx | SourceFormat::Pptx)
    ) || extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Extract text from a document, or read a text file as-is.
///
/// Returns the detected format label for documents and `None` for plain text.
fn read_text(path: &Path) -> Result<(String, Option<&'static str>)> {
    let Some(format) = SourceFormat::from_filename(&path.to_string_lossy()) else {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok((text, None));
    };

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = match format {
        SourceFormat::Pdf => extract_pdf(&bytes)?.text,
        SourceFormat::Docx => extract_docx(&bytes)?.text,
        SourceFormat::Pptx => extract_pptx(&bytes)?.text,
        SourceFormat::Image => bail!("images need OCR; use the /extract/ocr endpoint"),
    };
    Ok((text, Some(format.as_str())))
}

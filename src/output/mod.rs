use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptionReport;

pub mod formatters;

pub use formatters::*;

/// Save a transcription report to file
pub async fn save_to_file(
    report: &TranscriptionReport,
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let content = match format {
        OutputFormat::Text => format_as_text(report),
        OutputFormat::Json => format_as_json(report)?,
        OutputFormat::Srt => format_as_srt(report),
    };

    fs_err::write(path, content)?;
    Ok(())
}

/// Print a transcription report to console
pub fn print_to_console(report: &TranscriptionReport, format: &OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Text => format_as_text(report),
        OutputFormat::Json => format_as_json(report)?,
        OutputFormat::Srt => format_as_srt(report),
    };

    println!("{}", content);
    Ok(())
}

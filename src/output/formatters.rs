use anyhow::Result;

use crate::extract::{audio_candidates, FormatCandidate};
use crate::transcribe::TranscriptionReport;

/// Plain transcript text, empty when the run produced none
pub fn format_as_text(report: &TranscriptionReport) -> String {
    report.transcript.clone().unwrap_or_default()
}

/// The full report as pretty-printed JSON
pub fn format_as_json(report: &TranscriptionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// SRT subtitles, one cue per chunk
pub fn format_as_srt(report: &TranscriptionReport) -> String {
    let mut srt = String::new();

    for chunk in &report.chunks {
        let start = srt_timestamp(chunk.start_offset_seconds);
        let end = srt_timestamp(chunk.start_offset_seconds + chunk.duration_seconds);

        srt.push_str(&format!("{}\n", chunk.index + 1));
        srt.push_str(&format!("{} --> {}\n", start, end));
        srt.push_str(&chunk.text);
        srt.push_str("\n\n");
    }

    srt
}

/// Seconds as an SRT `HH:MM:SS,mmm` timestamp
fn srt_timestamp(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let secs = (total_millis / 1000) % 60;
    let minutes = (total_millis / 60_000) % 60;
    let hours = total_millis / 3_600_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Print the audio-capable formats a probe turned up
pub fn print_format_table(candidates: &[FormatCandidate]) {
    let pool = audio_candidates(candidates);

    println!("Available audio formats:");
    if pool.is_empty() {
        println!("  (none of the offered formats carry audio)");
        return;
    }

    println!("  {:<10} {:<6} {:>8}  {}", "ID", "EXT", "KBPS", "NOTE");
    for candidate in pool {
        let bitrate = candidate
            .abr
            .map(|abr| format!("{:.0}", abr))
            .unwrap_or_else(|| "n/a".to_string());

        println!(
            "  {:<10} {:<6} {:>8}  {}",
            candidate.format_id,
            candidate.ext.as_deref().unwrap_or("?"),
            bitrate,
            candidate.format_note.as_deref().unwrap_or("")
        );
    }
}

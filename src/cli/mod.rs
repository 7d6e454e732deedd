use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::transcribe::BackendKind;

#[derive(Parser)]
#[command(
    name = "kscribe",
    about = "Kannada Scribe - Extract audio from online videos and transcribe spoken Kannada",
    version,
    long_about = "A CLI tool that pulls the best audio track out of a video or stream URL with yt-dlp, normalizes it for speech recognition, and transcribes spoken Kannada through Google Speech or a local whisper model. Long recordings are transcribed in fixed-duration chunks so a single bad stretch never loses the rest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe spoken Kannada from a video or stream URL
    Transcribe {
        /// URL of the video or stream to transcribe
        #[arg(value_name = "URL")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Language code for transcription (defaults to the configured language)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Recognition backend to use instead of the configured one
        #[arg(short, long, value_enum)]
        backend: Option<BackendKind>,

        /// Directory the extracted audio is written to
        #[arg(short = 'd', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Chunk length in seconds for long recordings
        #[arg(long, value_name = "SECONDS")]
        chunk_duration: Option<f64>,

        /// Print the available format table before transcribing
        #[arg(long)]
        list_formats: bool,
    },

    /// List the audio formats a source URL offers
    Formats {
        /// URL of the video or stream to probe
        #[arg(value_name = "URL")]
        url: String,

        /// Also dump the raw format metadata to a JSON file
        #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "data.json")]
        dump: Option<PathBuf>,
    },

    /// List the available recognition backends
    Backends,

    /// Inspect or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON report with per-chunk detail
    Json,
    /// SRT subtitle format
    Srt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
        }
    }
}

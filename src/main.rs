use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kannada_scribe::cli::{Cli, Commands};
use kannada_scribe::config::Config;
use kannada_scribe::extract::{MediaFetcher, YtDlpFetcher};
use kannada_scribe::transcribe::{LanguageTag, TranscribeOptions, TranscriptionPipeline};
use kannada_scribe::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = Config::load().await?;

    // Check for required external tools (non-fatal, they may still be reachable)
    if !cli.quiet {
        let missing = utils::check_dependencies(&config.tools).await;
        if !missing.is_empty() {
            eprintln!("{} external tool check:", style("warning:").yellow().bold());
            for dep in missing {
                eprintln!("  {}", dep);
            }
            eprintln!("  (continuing anyway - the tools may be available at run time)");
        }
    }

    match cli.command {
        Commands::Transcribe {
            url,
            output,
            format,
            language,
            backend,
            output_dir,
            chunk_duration,
            list_formats,
        } => {
            let mut config = config;
            if let Some(provider) = backend {
                config.backend.provider = provider;
            }

            let language = utils::normalize_language_code(
                language
                    .as_deref()
                    .unwrap_or(&config.transcription.default_language),
            );
            let options = TranscribeOptions {
                destination_dir: output_dir.unwrap_or_else(|| config.app.output_dir.clone()),
                language: LanguageTag::new(language),
                chunk_duration_secs: chunk_duration
                    .unwrap_or(config.transcription.chunk_duration_secs),
                long_audio_threshold_secs: config.transcription.long_audio_threshold_secs,
                list_formats,
            };
            if options.chunk_duration_secs <= 0.0 {
                anyhow::bail!("--chunk-duration must be positive");
            }

            let pipeline = TranscriptionPipeline::new(&config).await?;

            tracing::info!("Starting transcription for URL: {}", url);
            let report = pipeline.transcribe_from_url(&url, &options).await?;

            println!("Audio saved to: {}", report.audio_path.display());

            if report.transcript.is_some() {
                match output {
                    Some(path) => {
                        output::save_to_file(&report, &path, &format).await?;
                        println!("Transcript saved to: {}", path.display());
                    }
                    None => {
                        output::print_to_console(&report, &format)?;
                    }
                }
            } else {
                eprintln!(
                    "{} the recording produced no usable transcript",
                    style("warning:").yellow().bold()
                );
            }
        }
        Commands::Formats { url, dump } => {
            let url = utils::validate_url(&url)?;
            let fetcher = YtDlpFetcher::new(&config.tools);
            let source = fetcher.probe(&url).await?;

            if let Some(title) = &source.title {
                println!("Source: {}", title);
            }
            output::print_format_table(&source.candidates);

            if let Some(path) = dump {
                fs_err::write(&path, serde_json::to_string_pretty(&source.raw_formats)?)?;
                println!("Raw format dump saved to: {}", path.display());
            }
        }
        Commands::Backends => {
            println!("Available recognition backends:");
            println!(
                "  {} - Google Cloud Speech over HTTP (needs an API key)",
                style("cloud").green()
            );
            if cfg!(feature = "local-whisper") {
                println!(
                    "  {} - whisper model running on this machine",
                    style("local").green()
                );
            } else {
                println!(
                    "  {} - whisper model (rebuild with --features local-whisper)",
                    style("local").dim()
                );
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Config file: {}", Config::config_path()?.display());
                println!("Edit it to change backends, tool paths and chunking policy.");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "kannada_scribe=debug"
    } else {
        "kannada_scribe=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

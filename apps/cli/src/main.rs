use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use console::style;
use dubdeck_core::{
    DEFAULT_CHUNK_CHARS, EngineConfig, FinishReason, TrimWindow, caption_source_for, chunk_text,
    format_aligned_readable, load_aligned,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use crate::{
    preview::{PreviewArgs, run_preview},
    workers::completion_sink::PreviewOutcome,
};

mod preview;
mod probe;
mod sim;
mod workers;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "dubdeck")]
#[command(about = "Align translated captions and preview a trimmed video against dubbed audio")]
struct Cli {
    /// Config file. Defaults to <config dir>/dubdeck/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds two captions may start apart and still be paired
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pair every source caption with the closest-starting translated caption
    Align {
        /// Source captions (SRT or WebVTT), path or URL
        source: String,

        /// Translated captions (SRT or WebVTT), path or URL
        target: String,

        /// Only list captions overlapping [start, end]
        #[arg(long)]
        start: Option<f64>,

        #[arg(long)]
        end: Option<f64>,

        /// Print JSON instead of a readable listing
        #[arg(long)]
        json: bool,

        /// Also print the dubbing script split into synthesis chunks
        #[arg(long)]
        script: bool,
    },

    /// Play a trimmed preview headlessly on a simulated clock
    Preview {
        /// Source captions, path or URL
        source: String,

        /// Translated captions, path or URL
        target: String,

        /// Video file, probed with ffprobe for its duration
        #[arg(long)]
        video: Option<PathBuf>,

        /// Video duration in seconds, instead of probing
        #[arg(long)]
        duration: Option<f64>,

        /// Dubbed WAV chunks in playback order. Cached per language.
        #[arg(long = "chunk")]
        chunks: Vec<PathBuf>,

        /// Dubbing language, keys the chunk cache
        #[arg(short, long, default_value = "hi-IN")]
        lang: String,

        #[arg(long)]
        start: Option<f64>,

        #[arg(long)]
        end: Option<f64>,

        /// Listen to the video's own audio instead of the dub
        #[arg(long)]
        original_audio: bool,

        /// Clock multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Milliseconds between clock ticks, overriding the config
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Initial volume in [0, 1], overriding the config
        #[arg(long)]
        volume: Option<f64>,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).await,
        None => EngineConfig::load_default().await,
    }
    .context("loading config")?;

    if let Some(tolerance) = cli.tolerance {
        config.alignment_tolerance_secs = tolerance;
    }
    if let Command::Preview {
        tick_ms,
        volume,
        speed,
        ..
    } = &cli.command
    {
        check_speed(*speed)?;
        if let Some(tick_ms) = tick_ms {
            config.tick_interval_ms = *tick_ms;
        }
        if let Some(volume) = volume {
            config.initial_volume = *volume;
        }
    }
    config.validate()?;
    Ok(config)
}

fn check_speed(speed: f64) -> Result<f64> {
    if !speed.is_finite() || speed <= 0.0 {
        bail!("--speed must be a positive number, got {speed}");
    }
    Ok(speed)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    println!(
        "\n{}  {}\n",
        style("dubdeck").cyan().bold(),
        style("Caption & Dub Preview").dim()
    );

    match cli.command {
        Command::Align {
            source,
            target,
            start,
            end,
            json,
            script,
        } => run_align(&config, &source, &target, (start, end), json, script).await,
        Command::Preview {
            source,
            target,
            video,
            duration,
            chunks,
            lang,
            start,
            end,
            original_audio,
            speed,
            ..
        } => {
            let args = PreviewArgs {
                video,
                duration,
                source,
                target,
                chunks,
                language: lang,
                trim_start: start,
                trim_end: end,
                original_audio,
                speed,
            };
            run_preview_command(args, config).await
        }
    }
}

async fn run_align(
    config: &EngineConfig,
    source: &str,
    target: &str,
    (start, end): (Option<f64>, Option<f64>),
    json: bool,
    script: bool,
) -> Result<()> {
    let step_start = Instant::now();
    let spinner = create_spinner("Fetching captions...");
    let source = caption_source_for(source);
    let target = caption_source_for(target);
    let captions = load_aligned(source.as_ref(), target.as_ref(), &config.aligner()).await;
    let captions = match captions {
        Ok(captions) => captions,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    let matched = captions
        .entries()
        .iter()
        .filter(|c| !c.target_text.is_empty())
        .count();
    spinner.finish_with_message(format!(
        "{} Aligned: {} captions, {} translated {}",
        style("✓").green().bold(),
        captions.len(),
        matched,
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));
    println!("{}", style("─".repeat(60)).dim());

    if json {
        println!("{}", serde_json::to_string_pretty(&captions)?);
    } else {
        let duration = captions.entries().iter().map(|c| c.end).fold(0.0, f64::max);
        let mut trim = TrimWindow::new(duration);
        trim.set(start.unwrap_or(0.0), end.unwrap_or(duration));
        println!("{}", format_aligned_readable(&captions, &trim));
    }

    if script {
        let pieces = chunk_text(&captions.target_script(), DEFAULT_CHUNK_CHARS);
        println!("{}", style("─".repeat(60)).dim());
        for (i, piece) in pieces.iter().enumerate() {
            println!(
                "{} {}",
                style(format!("chunk {} ({} chars)", i + 1, piece.chars().count())).cyan(),
                piece
            );
        }
    }
    Ok(())
}

async fn run_preview_command(args: PreviewArgs, config: EngineConfig) -> Result<()> {
    let total_start = Instant::now();
    let outcome = run_preview(args, config).await?;

    let summary = match outcome {
        Some(PreviewOutcome::Finished(FinishReason::TrimEnd)) => "reached trim end".to_string(),
        Some(PreviewOutcome::Finished(FinishReason::ChunksExhausted)) => {
            "dubbed audio ran out".to_string()
        }
        Some(PreviewOutcome::Finished(FinishReason::MediaEnded)) => "video ended".to_string(),
        Some(PreviewOutcome::MediaFailed(reason)) => format!("video failed: {reason}"),
        None => "stopped".to_string(),
    };

    println!(
        "\n{} {} {}\n",
        style("Preview:").dim(),
        style(summary).cyan().bold(),
        style(format!("[{}]", format_duration(total_start.elapsed()))).dim()
    );
    Ok(())
}

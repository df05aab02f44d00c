use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use console::style;
use dubdeck_core::{
    CachedChunkProvider, ChunkProvider, DubdeckError, EngineConfig, NoticeWorker,
    PreviewSession, ResourceEvent, StaticChunkProvider, TrimWindow, caption_source_for,
    get_root_cache_dir, load_aligned,
};
use tokio::{
    sync::{mpsc, oneshot},
    time::MissedTickBehavior,
};
use tracing::{debug, info};

use crate::{
    probe::probe_duration,
    sim::{SimAudio, SimVideo},
    workers::{
        completion_sink::{CliCompletionSinkWorker, PreviewOutcome},
        progress::ProgressWorker,
    },
};

pub struct PreviewArgs {
    pub video: Option<PathBuf>,
    pub duration: Option<f64>,
    pub source: String,
    pub target: String,
    pub chunks: Vec<PathBuf>,
    pub language: String,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
    pub original_audio: bool,
    pub speed: f64,
}

type Session = PreviewSession<SimVideo, SimAudio>;

pub async fn run_preview(
    args: PreviewArgs,
    config: EngineConfig,
) -> Result<Option<PreviewOutcome>> {
    let duration = match (args.duration, &args.video) {
        (Some(duration), _) => duration,
        (None, Some(path)) => probe_duration(path).await?,
        (None, None) => bail!("either --video or --duration is required"),
    };

    let source = caption_source_for(&args.source);
    let target = caption_source_for(&args.target);
    let captions = load_aligned(source.as_ref(), target.as_ref(), &config.aligner()).await?;

    let urls = resolve_chunks(&args, &captions.target_script()).await?;
    if urls.is_empty() && !args.original_audio {
        bail!(
            "no dubbed chunks for '{}': pass --chunk or --original-audio",
            args.language
        );
    }

    let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
    let video = SimVideo::new(duration);
    let audio = SimAudio::new(chunk_tx);
    let mut session = PreviewSession::new(video.clone(), audio.clone(), captions.clone(), &config);
    info!(session_id = %session.session_id(), duration, chunks = urls.len(), "starting preview");

    let (done_tx, mut done_rx) = oneshot::channel();
    let shutdown = session.cancellation_token();
    let progress = ProgressWorker::new(captions, TrimWindow::new(duration));
    let progress_sub = session.subscribe(ProgressWorker::SUBSCRIBER_ID);
    let sink = CliCompletionSinkWorker::new(done_tx);
    let sink_sub = session.subscribe(CliCompletionSinkWorker::SUBSCRIBER_ID);

    let workers = async {
        let (progress, sink) = tokio::join!(
            progress.run(progress_sub, shutdown.clone()),
            sink.run(sink_sub, shutdown.clone()),
        );
        progress.and(sink)
    };

    let driver = async {
        session.handle_video_event(ResourceEvent::MetadataLoaded { duration });
        if args.trim_start.is_some() || args.trim_end.is_some() {
            let trim = session.trim();
            session.set_trim(
                args.trim_start.unwrap_or(trim.start()),
                args.trim_end.unwrap_or(trim.end()),
            );
        }
        session.set_chunks(urls);
        session.set_using_secondary_audio(!args.original_audio);

        let outcome = drive(
            &mut session,
            (&video, &audio),
            &mut chunk_rx,
            &mut done_rx,
            &config,
            args.speed,
        )
        .await;
        session.teardown();
        outcome
    };

    let (outcome, workers) = tokio::join!(driver, workers);
    workers?;
    Ok(outcome)
}

/// Chunks from the command line replace the cached list for the language;
/// without any the cached manifest is used.
async fn resolve_chunks(args: &PreviewArgs, script: &str) -> Result<Vec<String>> {
    for (index, path) in args.chunks.iter().enumerate() {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DubdeckError::ChunkLoadFailed {
                index,
                reason: format!("{} not found", path.display()),
            }
            .into());
        }
    }

    let given = args.chunks.iter().map(|p| p.display().to_string()).collect();
    let provider = CachedChunkProvider::new(StaticChunkProvider::new(given), get_root_cache_dir());
    debug!(provider = provider.name(), language = %args.language, "resolving chunks");

    if !args.chunks.is_empty() {
        return provider
            .regenerate(&args.language, script)
            .await
            .context("saving chunk manifest");
    }

    let urls = provider
        .chunks_for(&args.language, script)
        .await
        .context("loading chunk manifest")?;
    if provider.misses() == 0 {
        println!(
            "{} Using {} cached chunks for {}",
            style("✓").green().bold(),
            urls.len(),
            style(&args.language).yellow()
        );
    }
    Ok(urls)
}

async fn drive(
    session: &mut Session,
    (video, audio): (&SimVideo, &SimAudio),
    chunk_rx: &mut mpsc::UnboundedReceiver<ResourceEvent>,
    done_rx: &mut oneshot::Receiver<PreviewOutcome>,
    config: &EngineConfig,
    speed: f64,
) -> Option<PreviewOutcome> {
    let shutdown = session.cancellation_token();
    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let dt = config.tick_interval().as_secs_f64() * speed;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    session.play();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = &mut ctrl_c => {
                info!("interrupted");
                return None;
            }
            outcome = &mut *done_rx => return outcome.ok(),
            Some(event) = chunk_rx.recv() => {
                audio.observe(&event);
                session.handle_chunk_event(event);
            }
            _ = ticker.tick() => {
                if video.advance(dt) {
                    session.handle_video_event(ResourceEvent::Ended);
                }
                if audio.advance(dt) {
                    session.handle_chunk_event(ResourceEvent::Ended);
                }
                session.handle_video_event(ResourceEvent::PositionProgressed);
                debug!(
                    position = session.state().position,
                    video_audible = video.is_audible(),
                    dub_audible = audio.is_audible(),
                    "tick"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_chunks(chunks: Vec<PathBuf>) -> PreviewArgs {
        PreviewArgs {
            video: None,
            duration: Some(10.0),
            source: "en.srt".into(),
            target: "hi.srt".into(),
            chunks,
            language: "hi-IN".into(),
            trim_start: None,
            trim_end: None,
            original_audio: false,
            speed: 1.0,
        }
    }

    #[tokio::test]
    async fn test_missing_chunk_file_is_reported_by_index() {
        let missing = std::env::temp_dir().join("dubdeck-missing-chunk.wav");
        let args = args_with_chunks(vec![missing]);

        let err = resolve_chunks(&args, "script").await.unwrap_err();
        match err.downcast_ref::<DubdeckError>() {
            Some(DubdeckError::ChunkLoadFailed { index, .. }) => assert_eq!(*index, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

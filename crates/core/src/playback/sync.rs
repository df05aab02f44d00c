//! Dual-track transport.
//!
//! The video element's clock is the authority for `position`. The dubbed
//! chunk track follows it: it is moved on seek and re-snapped from the video
//! tick whenever it drifts past the threshold. Only one of the two sources is
//! audible at any time.

use tracing::{debug, info, warn};

use crate::{
    events::{FinishReason, Notice, NoticeBus},
    playback::{
        chunks::{ChunkSequencer, SequencerOutcome},
        resource::{ChunkResource, MediaResource, PlayRejected, ResourceEvent},
        state::{AudioSettings, PlaybackState, clamp_volume},
    },
    timeline::{TimelineTarget, TrimWindow},
};

/// Largest tolerated gap (seconds) between video and dubbed audio.
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.1;

pub struct Synchronizer<V: MediaResource, A: ChunkResource> {
    video: V,
    chunks: ChunkSequencer<A>,
    trim: TrimWindow,
    state: PlaybackState,
    audio: AudioSettings,
    drift_threshold: f64,
    resync_pending: bool,
    bus: NoticeBus,
}

impl<V: MediaResource, A: ChunkResource> Synchronizer<V, A> {
    pub fn new(
        video: V,
        chunks: ChunkSequencer<A>,
        bus: NoticeBus,
        audio: AudioSettings,
        drift_threshold: f64,
    ) -> Self {
        let trim = TrimWindow::new(video.duration().unwrap_or(0.0));
        let mut sync = Self {
            video,
            chunks,
            trim,
            state: PlaybackState::default(),
            audio,
            drift_threshold,
            resync_pending: false,
            bus,
        };
        sync.apply_audibility();
        sync
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn trim(&self) -> TrimWindow {
        self.trim
    }

    pub fn audio_settings(&self) -> AudioSettings {
        self.audio
    }

    pub fn active_chunk(&self) -> Option<usize> {
        self.chunks.active_index()
    }

    pub fn chunks(&self) -> &ChunkSequencer<A> {
        &self.chunks
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn play(&mut self) {
        if self.state.playing {
            if self.state.using_secondary_audio
                && self.chunks.needs_resume()
                && let Err(rejected) = self.chunks.play()
            {
                self.report_rejection(rejected);
            }
            return;
        }

        let position = self.state.position;
        if position >= self.trim.end() || position < self.trim.start() {
            self.relocate(self.trim.start());
        }

        if !self.video.is_playing()
            && let Err(rejected) = self.video.play()
        {
            self.report_rejection(rejected);
            return;
        }

        self.state.playing = true;
        if self.state.using_secondary_audio {
            self.resync_pending = false;
            self.chunks.seek(self.state.position);
            if let Err(rejected) = self.chunks.play() {
                self.report_rejection(rejected);
            }
        }

        debug!(position = self.state.position, "playback started");
        self.bus.publish(Notice::PlaybackStarted);
    }

    pub fn pause(&mut self) {
        if self.video.is_playing() {
            self.video.pause();
        }
        self.chunks.pause();

        if std::mem::replace(&mut self.state.playing, false) {
            debug!(position = self.state.position, "playback paused");
            self.bus.publish(Notice::PlaybackPaused);
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.state.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, t: f64) {
        let t = self.trim.clamp(t);
        self.pause();
        self.relocate(t);
    }

    pub fn set_trim(&mut self, start: f64, end: f64) {
        let update = self.trim.set(start, end);
        if update.changed {
            self.bus.publish(Notice::TrimChanged {
                start: update.window.start(),
                end: update.window.end(),
            });
        }

        if !self.trim.contains(self.state.position) {
            self.pause();
            self.relocate(self.trim.start());
        }
    }

    pub fn set_using_secondary_audio(&mut self, enabled: bool) {
        if self.state.using_secondary_audio == enabled {
            return;
        }
        self.state.using_secondary_audio = enabled;
        self.apply_audibility();

        if enabled {
            self.resync_pending = true;
        } else {
            self.chunks.pause();
        }
        debug!(enabled, "secondary audio toggled");
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.audio.volume = clamp_volume(volume);
        self.apply_audibility();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.muted = muted;
        self.apply_audibility();
    }

    /// Hand a fresh dubbing result to the chunk track.
    pub fn set_chunks(&mut self, urls: Vec<String>) {
        info!(chunks = urls.len(), "chunk list replaced");
        self.chunks.set_chunks(urls);
        self.resync_pending = true;
    }

    pub fn handle_video_event(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::PositionProgressed => self.on_tick(),
            ResourceEvent::MetadataLoaded { duration } => {
                let update = self.trim.set_duration(duration);
                info!(duration = update.window.duration(), "video metadata loaded");
                self.bus.publish(Notice::TrimChanged {
                    start: update.window.start(),
                    end: update.window.end(),
                });
                if !self.trim.contains(self.state.position) {
                    self.pause();
                    self.relocate(self.trim.start());
                }
            }
            ResourceEvent::Ended => {
                if self.state.playing {
                    self.pause();
                    self.bus.publish(Notice::PlaybackFinished {
                        reason: FinishReason::MediaEnded,
                    });
                }
            }
            ResourceEvent::LoadFailed { reason, .. } => {
                warn!(%reason, "video failed to load");
                self.pause();
                self.bus.publish(Notice::MediaLoadFailed { reason });
            }
            ResourceEvent::Loaded { .. } => {}
        }
    }

    pub fn handle_chunk_event(&mut self, event: ResourceEvent) {
        let Some(outcome) = self.chunks.on_event(event) else {
            return;
        };

        match outcome {
            SequencerOutcome::Loaded { index } => debug!(index, "chunk ready"),
            SequencerOutcome::Advanced { index } => {
                self.bus.publish(Notice::ChunkAdvanced { index });
            }
            SequencerOutcome::Finished => self.finish_secondary(),
            SequencerOutcome::LoadFailed { index, reason } => {
                self.bus.publish(Notice::ChunkLoadFailed { index, reason });
                self.finish_secondary();
            }
            SequencerOutcome::PlayRejected(rejected) => self.report_rejection(rejected),
        }
    }

    /// Stop everything. Called once when the owning view goes away.
    pub fn close(&mut self) {
        self.pause();
        self.chunks.close();
    }

    fn on_tick(&mut self) {
        let position = self.video.position();
        self.state.position = position;
        self.bus.publish(Notice::PositionChanged { position });

        if self.state.playing && position >= self.trim.end() {
            self.pause();
            self.bus.publish(Notice::PlaybackFinished {
                reason: FinishReason::TrimEnd,
            });
        }

        if !self.state.using_secondary_audio {
            return;
        }

        if self.resync_pending {
            self.resync_pending = false;
            self.chunks.seek(position);
            if self.state.playing
                && let Err(rejected) = self.chunks.play()
            {
                self.report_rejection(rejected);
            }
            return;
        }

        if let Some(secondary) = self.chunks.position()
            && (secondary - position).abs() > self.drift_threshold
        {
            debug!(secondary, position, "correcting drift");
            self.chunks.resync(position);
        }
    }

    /// Move the playhead without touching the transport state.
    fn relocate(&mut self, t: f64) {
        self.state.position = t;
        self.video.set_position(t);
        if self.state.using_secondary_audio {
            self.chunks.seek(t);
        } else {
            self.resync_pending = true;
        }
        self.bus.publish(Notice::PositionChanged { position: t });
    }

    fn finish_secondary(&mut self) {
        if self.state.using_secondary_audio && self.state.playing {
            self.pause();
            self.bus.publish(Notice::PlaybackFinished {
                reason: FinishReason::ChunksExhausted,
            });
        }
    }

    fn report_rejection(&mut self, rejected: PlayRejected) {
        warn!(reason = %rejected.reason, "play request rejected");
        self.bus.publish(Notice::PlayRejected {
            reason: rejected.reason,
        });
    }

    fn apply_audibility(&mut self) {
        let AudioSettings { volume, muted } = self.audio;
        if self.state.using_secondary_audio {
            self.video.set_muted(true);
            self.chunks.set_muted(muted);
            self.chunks.set_volume(volume);
        } else {
            self.chunks.set_muted(true);
            self.video.set_muted(muted);
            self.video.set_volume(volume);
        }
    }
}

impl<V: MediaResource, A: ChunkResource> TimelineTarget for Synchronizer<V, A> {
    fn trim(&self) -> TrimWindow {
        self.trim
    }

    fn position(&self) -> f64 {
        self.state.position
    }

    fn set_trim(&mut self, start: f64, end: f64) {
        Synchronizer::set_trim(self, start, end);
    }

    fn seek(&mut self, t: f64) {
        Synchronizer::seek(self, t);
    }
}

//! One preview view's worth of engine state.
//!
//! A session owns the synchronizer, the drag controller and the aligned
//! captions, and is the only thing a host talks to. Tearing it down (or
//! dropping it) cancels outstanding chunk loads, silences both resources and
//! ends every notice subscription. Events that arrive afterwards are ignored.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    captions::AlignedCaptions,
    config::EngineConfig,
    events::{NoticeBus, Subscription},
    playback::{
        AudioSettings, ChunkResource, ChunkSequencer, MediaResource, PlaybackState,
        ResourceEvent, Synchronizer,
    },
    timeline::{DragController, DragHandle, TimelineScale, TrimWindow},
    types::{AlignedCaption, CaptionField},
};

pub struct PreviewSession<V: MediaResource, A: ChunkResource> {
    session_id: Uuid,
    sync: Synchronizer<V, A>,
    drag: DragController,
    captions: AlignedCaptions,
    bus: NoticeBus,
    cancel: CancellationToken,
    closed: bool,
}

impl<V: MediaResource, A: ChunkResource> PreviewSession<V, A> {
    pub fn new(
        video: V,
        chunk_player: A,
        captions: AlignedCaptions,
        config: &EngineConfig,
    ) -> Self {
        let session_id = Uuid::new_v4();
        let bus = NoticeBus::new(session_id);
        let cancel = CancellationToken::new();

        let sequencer = ChunkSequencer::new(chunk_player, cancel.child_token());
        let sync = Synchronizer::new(
            video,
            sequencer,
            bus.clone(),
            config.audio_settings(),
            config.drift_threshold_secs,
        );
        let drag = DragController::new(TimelineScale::new(
            config.default_track_width_px,
            sync.trim().duration(),
        ));

        info!(%session_id, captions = captions.len(), "preview session opened");
        Self {
            session_id,
            sync,
            drag,
            captions,
            bus,
            cancel,
            closed: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn subscribe(&self, name: &'static str) -> Subscription {
        self.bus.subscribe(name)
    }

    /// Token cancelled on teardown. Hosts hang their own loops off it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn state(&self) -> PlaybackState {
        self.sync.state()
    }

    pub fn trim(&self) -> TrimWindow {
        self.sync.trim()
    }

    pub fn audio_settings(&self) -> AudioSettings {
        self.sync.audio_settings()
    }

    pub fn active_chunk(&self) -> Option<usize> {
        self.sync.active_chunk()
    }

    pub fn synchronizer(&self) -> &Synchronizer<V, A> {
        &self.sync
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn captions(&self) -> &AlignedCaptions {
        &self.captions
    }

    pub fn set_captions(&mut self, captions: AlignedCaptions) {
        self.captions = captions;
    }

    pub fn visible_captions(&self) -> Vec<(usize, &AlignedCaption)> {
        self.captions.visible_in(&self.sync.trim()).collect()
    }

    pub fn active_caption(&self) -> Option<usize> {
        self.captions
            .active_index(&self.sync.trim(), self.sync.state().position)
    }

    pub fn edit_caption(
        &mut self,
        index: usize,
        field: CaptionField,
        text: impl Into<String>,
    ) -> bool {
        self.captions.edit(index, field, text)
    }

    /// Jump the playhead to a caption's start. `false` for an unknown index.
    pub fn seek_to_caption(&mut self, index: usize) -> bool {
        let Some(start) = self.captions.get(index).map(|c| c.start) else {
            return false;
        };
        self.seek(start);
        true
    }

    pub fn play(&mut self) {
        if !self.closed {
            self.sync.play();
        }
    }

    pub fn pause(&mut self) {
        if !self.closed {
            self.sync.pause();
        }
    }

    pub fn toggle_playback(&mut self) {
        if !self.closed {
            self.sync.toggle_playback();
        }
    }

    pub fn seek(&mut self, t: f64) {
        if !self.closed {
            self.sync.seek(t);
        }
    }

    pub fn set_trim(&mut self, start: f64, end: f64) {
        if !self.closed {
            self.sync.set_trim(start, end);
        }
    }

    pub fn set_using_secondary_audio(&mut self, enabled: bool) {
        if !self.closed {
            self.sync.set_using_secondary_audio(enabled);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        if !self.closed {
            self.sync.set_volume(volume);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if !self.closed {
            self.sync.set_muted(muted);
        }
    }

    pub fn set_chunks(&mut self, urls: Vec<String>) {
        if !self.closed {
            self.sync.set_chunks(urls);
        }
    }

    pub fn set_track_width(&mut self, width_px: f64) {
        self.drag.set_track_width(width_px);
    }

    pub fn begin_drag(&mut self, handle: DragHandle) -> bool {
        !self.closed && self.drag.begin(handle, &self.sync)
    }

    pub fn drag_to(&mut self, x: f64) -> Option<f64> {
        if self.closed {
            return None;
        }
        self.drag.pointer_move(x, &mut self.sync)
    }

    pub fn end_drag(&mut self) -> Option<DragHandle> {
        self.drag.pointer_up()
    }

    /// Floating label shown next to the dragged handle.
    pub fn drag_preview(&self) -> Option<f64> {
        self.drag.preview()
    }

    pub fn handle_video_event(&mut self, event: ResourceEvent) {
        if self.closed {
            debug!(?event, "video event after teardown");
            return;
        }
        let metadata = matches!(event, ResourceEvent::MetadataLoaded { .. });
        self.sync.handle_video_event(event);
        if metadata {
            self.drag.set_duration(self.sync.trim().duration());
        }
    }

    pub fn handle_chunk_event(&mut self, event: ResourceEvent) {
        if self.closed {
            debug!(?event, "chunk event after teardown");
            return;
        }
        self.sync.handle_chunk_event(event);
    }

    pub fn teardown(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        self.drag.cancel();
        self.sync.close();
        self.cancel.cancel();
        self.bus.close();
        info!(session_id = %self.session_id, "preview session closed");
    }
}

impl<V: MediaResource, A: ChunkResource> Drop for PreviewSession<V, A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::Notice,
        playback::{chunks::tests::FakeChunk, sync::tests::FakeVideo},
    };

    fn captions() -> AlignedCaptions {
        let row = |start: f64, end: f64, src: &str| AlignedCaption {
            start,
            end,
            source_text: src.into(),
            target_text: String::new(),
        };
        AlignedCaptions::new(vec![
            row(0.0, 4.0, "one"),
            row(4.0, 9.0, "two"),
            row(12.0, 20.0, "three"),
        ])
    }

    fn session(duration: f64) -> (PreviewSession<FakeVideo, FakeChunk>, FakeVideo, FakeChunk) {
        let video = FakeVideo::with_duration(duration);
        let chunk = FakeChunk::default();
        let config = EngineConfig {
            default_track_width_px: 1000.0,
            ..Default::default()
        };
        let session = PreviewSession::new(video.clone(), chunk.clone(), captions(), &config);
        (session, video, chunk)
    }

    #[test]
    fn test_drag_end_handle_updates_trim_live() {
        let (mut s, _, _) = session(100.0);
        assert!(s.begin_drag(DragHandle::End));
        assert_eq!(s.drag_to(500.0), Some(50.0));
        assert_eq!(s.trim().end(), 50.0);
        assert_eq!(s.drag_preview(), Some(50.0));

        assert_eq!(s.end_drag(), Some(DragHandle::End));
        assert_eq!(s.drag_preview(), None);
        assert_eq!(s.trim().end(), 50.0);
    }

    #[test]
    fn test_metadata_rescales_drag_track() {
        let (mut s, _, _) = session(0.0);
        s.handle_video_event(ResourceEvent::MetadataLoaded { duration: 200.0 });
        assert_eq!(s.drag().scale().duration(), 200.0);

        s.begin_drag(DragHandle::Playhead);
        assert_eq!(s.drag_to(250.0), Some(50.0));
        assert_eq!(s.state().position, 50.0);
    }

    #[test]
    fn test_seek_to_caption_and_active_caption() {
        let (mut s, video, _) = session(30.0);
        s.play();
        assert!(s.seek_to_caption(2));
        assert_eq!(s.state().position, 12.0);
        assert!(!s.state().playing);
        assert_eq!(s.active_caption(), Some(2));
        assert!(!s.seek_to_caption(7));

        video.0.borrow_mut().position = 5.5;
        s.handle_video_event(ResourceEvent::PositionProgressed);
        assert_eq!(s.active_caption(), Some(1));

        video.0.borrow_mut().position = 10.0;
        s.handle_video_event(ResourceEvent::PositionProgressed);
        assert_eq!(s.active_caption(), None);
    }

    #[test]
    fn test_visible_captions_follow_trim() {
        let (mut s, _, _) = session(30.0);
        s.set_trim(5.0, 10.0);
        let visible: Vec<usize> = s.visible_captions().iter().map(|(i, _)| *i).collect();
        assert_eq!(visible, vec![1]);

        assert!(s.edit_caption(1, CaptionField::Target, "deux"));
        assert_eq!(s.captions().get(1).unwrap().target_text, "deux");
    }

    #[tokio::test]
    async fn test_teardown_cancels_loads_and_ends_subscriptions() {
        let (mut s, video, chunk) = session(30.0);
        let notices = s.subscribe("ui");
        let token = s.cancellation_token();

        s.set_chunks(vec!["a.wav".into()]);
        let ticket = chunk.last_ticket();
        s.set_using_secondary_audio(true);
        s.play();

        s.teardown();
        assert!(s.is_closed());
        assert!(token.is_cancelled());
        assert!(ticket.is_cancelled());
        assert!(!video.0.borrow().playing);

        let drained: Vec<Notice> = notices.drain().iter().map(|e| e.notice.clone()).collect();
        assert!(drained.contains(&Notice::PlaybackPaused));
        assert!(notices.recv().await.is_none());

        // late completion is ignored
        s.handle_chunk_event(ResourceEvent::Loaded {
            ticket_id: ticket.id(),
            duration: Some(3.0),
        });
        assert!(!chunk.0.borrow().playing);
        s.play();
        assert!(!s.state().playing);
    }

    #[test]
    fn test_drop_closes_the_bus() {
        let (s, _, _) = session(30.0);
        let notices = s.subscribe("ui");
        drop(s);
        assert!(notices.is_closed());
    }
}

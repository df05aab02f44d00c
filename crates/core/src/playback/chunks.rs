//! Ordered audio chunks presented as one continuous track.
//!
//! Logical track time is the sum of the durations of the chunks before the
//! active one plus the resource's own position. Durations are learned as
//! chunks load; until a chunk's duration is known everything after it is
//! assumed to start inside it.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::playback::resource::{ChunkResource, LoadTicket, PlayRejected, ResourceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum SequencerState {
    Empty,
    Loading(usize),
    Ready(usize),
    Playing(usize),
    Stopped(usize),
}

/// What a resource event meant for the track, for the synchronizer to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerOutcome {
    Loaded { index: usize },
    Advanced { index: usize },
    Finished,
    LoadFailed { index: usize, reason: String },
    PlayRejected(PlayRejected),
}

#[derive(Debug)]
struct PendingLoad {
    ticket: LoadTicket,
    offset: f64,
    resume: bool,
}

pub struct ChunkSequencer<A: ChunkResource> {
    resource: A,
    urls: Vec<String>,
    durations: Vec<Option<f64>>,
    active: usize,
    loaded: Option<usize>,
    state: SequencerState,
    pending: Option<PendingLoad>,
    playing: bool,
    next_ticket: u64,
    cancel: CancellationToken,
}

impl<A: ChunkResource> ChunkSequencer<A> {
    pub fn new(resource: A, cancel: CancellationToken) -> Self {
        Self {
            resource,
            urls: Vec::new(),
            durations: Vec::new(),
            active: 0,
            loaded: None,
            state: SequencerState::Empty,
            pending: None,
            playing: false,
            next_ticket: 0,
            cancel,
        }
    }

    pub fn resource(&self) -> &A {
        &self.resource
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn active_index(&self) -> Option<usize> {
        (!self.urls.is_empty()).then_some(self.active)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn chunk_duration(&self, index: usize) -> Option<f64> {
        self.durations.get(index).copied().flatten()
    }

    /// Replace the whole list. Always restarts at chunk 0, paused.
    pub fn set_chunks(&mut self, urls: Vec<String>) {
        self.cancel_pending();
        self.pause_resource();

        self.durations = vec![None; urls.len()];
        self.urls = urls;
        self.active = 0;
        self.loaded = None;
        self.playing = false;

        if self.urls.is_empty() {
            self.state = SequencerState::Empty;
            return;
        }
        self.issue_load(0, 0.0, false);
    }

    pub fn play(&mut self) -> Result<(), PlayRejected> {
        self.playing = true;
        match self.state {
            SequencerState::Empty | SequencerState::Stopped(_) => Ok(()),
            SequencerState::Loading(_) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.resume = true;
                }
                Ok(())
            }
            SequencerState::Ready(index) | SequencerState::Playing(index) => {
                if !self.resource.is_playing() {
                    if let Err(rejected) = self.resource.play() {
                        self.playing = false;
                        return Err(rejected);
                    }
                }
                self.state = SequencerState::Playing(index);
                Ok(())
            }
        }
    }

    /// A loaded chunk is sitting idle because its last play was refused.
    pub fn needs_resume(&self) -> bool {
        self.pending.is_none()
            && matches!(self.state, SequencerState::Ready(index) if self.loaded == Some(index))
            && !self.resource.is_playing()
    }

    /// Pause, and drop any auto-resume waiting on a pending load.
    pub fn pause(&mut self) {
        self.playing = false;
        if let Some(pending) = self.pending.as_mut() {
            pending.resume = false;
        }
        self.pause_resource();
        if let SequencerState::Playing(index) = self.state {
            self.state = SequencerState::Ready(index);
        }
    }

    /// Move to logical time `t`, switching chunks when needed.
    pub fn seek(&mut self, t: f64) {
        if self.urls.is_empty() {
            return;
        }

        let Some((index, local)) = self.locate(t) else {
            // past the end of the dubbed track
            self.cancel_pending();
            self.pause_resource();
            self.state = SequencerState::Stopped(self.active);
            return;
        };

        if let Some(pending) = self.pending.as_mut()
            && pending.ticket.index() == index
        {
            pending.offset = local;
            pending.resume = self.playing;
            return;
        }

        if self.pending.is_none() && self.loaded == Some(index) {
            self.active = index;
            self.resource.set_position(local);
            if let SequencerState::Stopped(_) = self.state {
                self.state = SequencerState::Ready(index);
            }
            return;
        }

        self.issue_load(index, local, self.playing);
    }

    /// Drift correction: nudge the loaded chunk's position toward logical
    /// time `t` without ever starting a load. Returns whether it moved.
    pub fn resync(&mut self, t: f64) -> bool {
        if self.pending.is_some() || self.loaded != Some(self.active) {
            return false;
        }
        let mut local = (t - self.offset_of(self.active)).max(0.0);
        if let Some(duration) = self.chunk_duration(self.active) {
            local = local.min(duration);
        }
        self.resource.set_position(local);
        true
    }

    /// Logical track time, when a chunk is loaded and in use.
    pub fn position(&self) -> Option<f64> {
        if self.pending.is_some() || self.loaded != Some(self.active) {
            return None;
        }
        match self.state {
            SequencerState::Ready(_) | SequencerState::Playing(_) => {
                Some(self.offset_of(self.active) + self.resource.position())
            }
            _ => None,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.resource.set_muted(muted);
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.resource.set_volume(volume);
    }

    pub fn on_event(&mut self, event: ResourceEvent) -> Option<SequencerOutcome> {
        match event {
            ResourceEvent::Loaded {
                ticket_id,
                duration,
            } => self.on_loaded(ticket_id, duration),
            ResourceEvent::LoadFailed { ticket_id, reason } => {
                self.on_load_failed(ticket_id, reason)
            }
            ResourceEvent::Ended => self.on_ended(),
            ResourceEvent::PositionProgressed | ResourceEvent::MetadataLoaded { .. } => None,
        }
    }

    /// Cancel outstanding work and go quiet. Used on teardown.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.pending = None;
        self.playing = false;
        self.pause_resource();
    }

    fn on_loaded(&mut self, ticket_id: u64, duration: Option<f64>) -> Option<SequencerOutcome> {
        let Some(pending) = self.take_pending(ticket_id) else {
            debug!(ticket_id, "discarding stale chunk load");
            return None;
        };
        let index = pending.ticket.index();

        if let Some(duration) = duration.or_else(|| self.resource.duration()) {
            self.durations[index] = Some(duration);
        }
        self.loaded = Some(index);
        self.resource.set_position(pending.offset);
        self.state = SequencerState::Ready(index);
        debug!(index, resume = pending.resume, "chunk loaded");

        if pending.resume && self.playing {
            match self.resource.play() {
                Ok(()) => self.state = SequencerState::Playing(index),
                Err(rejected) => {
                    self.playing = false;
                    return Some(SequencerOutcome::PlayRejected(rejected));
                }
            }
        }
        Some(SequencerOutcome::Loaded { index })
    }

    fn on_load_failed(
        &mut self,
        ticket_id: Option<u64>,
        reason: String,
    ) -> Option<SequencerOutcome> {
        let index = match ticket_id {
            Some(id) => match self.take_pending(id) {
                Some(pending) => pending.ticket.index(),
                None => {
                    debug!(ticket_id = id, "discarding stale chunk failure");
                    return None;
                }
            },
            None if self.urls.is_empty() => return None,
            None => {
                self.cancel_pending();
                self.active
            }
        };

        warn!(index, %reason, "chunk failed to load");
        self.loaded = None;
        self.playing = false;
        self.state = SequencerState::Stopped(index);
        Some(SequencerOutcome::LoadFailed { index, reason })
    }

    fn on_ended(&mut self) -> Option<SequencerOutcome> {
        let index = match self.state {
            SequencerState::Playing(index) | SequencerState::Ready(index) => index,
            _ => return None,
        };

        if self.playing && index + 1 < self.urls.len() {
            self.issue_load(index + 1, 0.0, true);
            return Some(SequencerOutcome::Advanced { index: index + 1 });
        }

        self.state = SequencerState::Stopped(index);
        let was_playing = std::mem::replace(&mut self.playing, false);
        was_playing.then_some(SequencerOutcome::Finished)
    }

    fn issue_load(&mut self, index: usize, offset: f64, resume: bool) {
        self.cancel_pending();
        self.pause_resource();

        self.next_ticket += 1;
        let ticket = LoadTicket::new(self.next_ticket, index, self.cancel.child_token());
        self.active = index;
        self.loaded = None;
        self.state = SequencerState::Loading(index);

        debug!(index, ticket_id = ticket.id(), "loading chunk");
        self.resource.load(&self.urls[index], ticket.clone());
        self.pending = Some(PendingLoad {
            ticket,
            offset,
            resume,
        });
    }

    fn take_pending(&mut self, ticket_id: u64) -> Option<PendingLoad> {
        if self.pending.as_ref().map(|p| p.ticket.id()) == Some(ticket_id) {
            self.pending.take()
        } else {
            None
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.ticket.cancel();
        }
    }

    fn pause_resource(&mut self) {
        if self.resource.is_playing() {
            self.resource.pause();
        }
    }

    fn offset_of(&self, index: usize) -> f64 {
        self.durations[..index].iter().map(|d| d.unwrap_or(0.0)).sum()
    }

    fn locate(&self, t: f64) -> Option<(usize, f64)> {
        let t = t.max(0.0);
        let mut start = 0.0;
        for (index, duration) in self.durations.iter().enumerate() {
            match duration {
                None => return Some((index, t - start)),
                Some(d) if t < start + d => return Some((index, t - start)),
                Some(d) => start += d,
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::playback::resource::MediaResource;

    #[derive(Debug, Default)]
    pub(crate) struct FakeChunkState {
        pub url: Option<String>,
        pub loads: Vec<(String, LoadTicket)>,
        pub position: f64,
        pub playing: bool,
        pub play_calls: usize,
        pub reject_next_play: bool,
        pub muted: bool,
        pub volume: f64,
    }

    /// Chunk element whose state the test keeps a handle on.
    #[derive(Clone, Default)]
    pub(crate) struct FakeChunk(pub Rc<RefCell<FakeChunkState>>);

    impl FakeChunk {
        pub fn last_ticket(&self) -> LoadTicket {
            self.0.borrow().loads.last().unwrap().1.clone()
        }
    }

    impl MediaResource for FakeChunk {
        fn position(&self) -> f64 {
            self.0.borrow().position
        }
        fn set_position(&mut self, t: f64) {
            self.0.borrow_mut().position = t;
        }
        fn duration(&self) -> Option<f64> {
            None
        }
        fn is_playing(&self) -> bool {
            self.0.borrow().playing
        }
        fn play(&mut self) -> Result<(), PlayRejected> {
            let mut s = self.0.borrow_mut();
            s.play_calls += 1;
            if std::mem::take(&mut s.reject_next_play) {
                return Err(PlayRejected::new("not allowed"));
            }
            s.playing = true;
            Ok(())
        }
        fn pause(&mut self) {
            self.0.borrow_mut().playing = false;
        }
        fn set_muted(&mut self, muted: bool) {
            self.0.borrow_mut().muted = muted;
        }
        fn set_volume(&mut self, volume: f64) {
            self.0.borrow_mut().volume = volume;
        }
    }

    impl ChunkResource for FakeChunk {
        fn load(&mut self, url: &str, ticket: LoadTicket) {
            let mut s = self.0.borrow_mut();
            s.url = Some(url.to_string());
            s.position = 0.0;
            s.loads.push((url.to_string(), ticket));
        }
    }

    fn sequencer() -> (ChunkSequencer<FakeChunk>, FakeChunk) {
        let fake = FakeChunk::default();
        (ChunkSequencer::new(fake.clone(), CancellationToken::new()), fake)
    }

    fn loaded(fake: &FakeChunk, duration: f64) -> ResourceEvent {
        ResourceEvent::Loaded {
            ticket_id: fake.last_ticket().id(),
            duration: Some(duration),
        }
    }

    #[test]
    fn test_set_chunks_resets_to_first_chunk() {
        let (mut seq, fake) = sequencer();
        assert_eq!(seq.state(), SequencerState::Empty);
        assert_eq!(seq.active_index(), None);

        seq.set_chunks(vec!["A".into(), "B".into()]);
        assert_eq!(seq.active_index(), Some(0));
        assert_eq!(seq.state(), SequencerState::Loading(0));
        seq.on_event(loaded(&fake, 4.0));
        assert_eq!(seq.state(), SequencerState::Ready(0));

        seq.set_chunks(vec!["C".into()]);
        assert_eq!(seq.active_index(), Some(0));
        assert_eq!(fake.0.borrow().url.as_deref(), Some("C"));
    }

    #[test]
    fn test_ended_advances_then_stops() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into()]);
        seq.on_event(loaded(&fake, 4.0));
        seq.play().unwrap();
        assert_eq!(seq.state(), SequencerState::Playing(0));

        assert_eq!(
            seq.on_event(ResourceEvent::Ended),
            Some(SequencerOutcome::Advanced { index: 1 })
        );
        assert_eq!(seq.active_index(), Some(1));
        assert_eq!(fake.0.borrow().url.as_deref(), Some("B"));

        assert_eq!(
            seq.on_event(loaded(&fake, 3.0)),
            Some(SequencerOutcome::Loaded { index: 1 })
        );
        assert!(fake.0.borrow().playing);
        assert_eq!(seq.state(), SequencerState::Playing(1));

        assert_eq!(seq.on_event(ResourceEvent::Ended), Some(SequencerOutcome::Finished));
        assert_eq!(seq.state(), SequencerState::Stopped(1));
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into()]);
        let first = fake.last_ticket();
        seq.set_chunks(vec!["C".into(), "D".into()]);
        assert!(first.is_cancelled());

        let stale = ResourceEvent::Loaded {
            ticket_id: first.id(),
            duration: Some(9.0),
        };
        assert_eq!(seq.on_event(stale), None);
        assert_eq!(seq.state(), SequencerState::Loading(0));
        assert_eq!(seq.chunk_duration(0), None);
    }

    #[test]
    fn test_pause_cancels_pending_auto_resume() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into()]);
        seq.on_event(loaded(&fake, 4.0));
        seq.play().unwrap();
        seq.on_event(ResourceEvent::Ended);

        seq.pause();
        seq.on_event(loaded(&fake, 3.0));
        assert!(!fake.0.borrow().playing);
        assert_eq!(seq.state(), SequencerState::Ready(1));
    }

    #[test]
    fn test_load_failure_stops_advancement() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into()]);
        seq.on_event(loaded(&fake, 4.0));
        seq.play().unwrap();
        seq.on_event(ResourceEvent::Ended);

        let failed = ResourceEvent::LoadFailed {
            ticket_id: Some(fake.last_ticket().id()),
            reason: "404".into(),
        };
        assert_eq!(
            seq.on_event(failed),
            Some(SequencerOutcome::LoadFailed {
                index: 1,
                reason: "404".into()
            })
        );
        assert_eq!(seq.state(), SequencerState::Stopped(1));
        assert_eq!(seq.on_event(ResourceEvent::Ended), None);
    }

    #[test]
    fn test_seek_across_known_chunks() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into(), "C".into()]);
        seq.on_event(loaded(&fake, 4.0));

        // inside chunk 0: no load
        seq.seek(2.5);
        assert_eq!(fake.0.borrow().loads.len(), 1);
        assert_eq!(seq.position(), Some(2.5));

        // chunk 1 duration unknown, so 6.0 lands 2.0 into it
        seq.seek(6.0);
        assert_eq!(seq.state(), SequencerState::Loading(1));
        seq.on_event(loaded(&fake, 5.0));
        assert_eq!(fake.0.borrow().position, 2.0);
        assert_eq!(seq.position(), Some(6.0));

        seq.seek(1.0);
        assert_eq!(seq.state(), SequencerState::Loading(0));
    }

    #[test]
    fn test_resync_never_loads() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into()]);
        assert!(!seq.resync(1.0));

        seq.on_event(loaded(&fake, 4.0));
        assert!(seq.resync(10.0));
        assert_eq!(fake.0.borrow().position, 4.0);
        assert_eq!(fake.0.borrow().loads.len(), 1);
    }

    #[test]
    fn test_play_rejection_is_reported_and_retryable() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into()]);
        seq.on_event(loaded(&fake, 4.0));

        fake.0.borrow_mut().reject_next_play = true;
        assert!(seq.play().is_err());
        assert_eq!(seq.state(), SequencerState::Ready(0));

        assert!(seq.play().is_ok());
        assert_eq!(seq.state(), SequencerState::Playing(0));
        assert_eq!(fake.0.borrow().play_calls, 2);
    }

    #[test]
    fn test_needs_resume_after_rejected_auto_resume() {
        let (mut seq, fake) = sequencer();
        seq.set_chunks(vec!["A".into(), "B".into()]);
        seq.on_event(loaded(&fake, 3.0));
        seq.play().unwrap();
        assert!(!seq.needs_resume());

        seq.on_event(ResourceEvent::Ended);
        assert!(!seq.needs_resume());

        fake.0.borrow_mut().reject_next_play = true;
        let outcome = seq.on_event(loaded(&fake, 4.0));
        assert!(matches!(outcome, Some(SequencerOutcome::PlayRejected(_))));
        assert_eq!(seq.state(), SequencerState::Ready(1));
        assert!(seq.needs_resume());

        seq.play().unwrap();
        assert_eq!(seq.state(), SequencerState::Playing(1));
        assert!(!seq.needs_resume());
    }
}

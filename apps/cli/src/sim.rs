//! Headless stand-ins for the video element and the dubbed-audio element.
//! Both run on a simulated clock advanced by the preview loop.

use std::{cell::RefCell, path::PathBuf, rc::Rc};

use dubdeck_core::{
    ChunkResource, LoadTicket, MediaResource, PlayRejected, ResourceEvent, wav_duration,
};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Default)]
struct Clock {
    position: f64,
    duration: Option<f64>,
    playing: bool,
    muted: bool,
    volume: f64,
}

impl Clock {
    /// Advance by `dt`; `true` when the end was reached on this step.
    fn advance(&mut self, dt: f64) -> bool {
        if !self.playing {
            return false;
        }
        self.position += dt;
        match self.duration {
            Some(duration) if self.position >= duration => {
                self.position = duration;
                self.playing = false;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Default)]
pub struct SimVideo(Rc<RefCell<Clock>>);

impl SimVideo {
    pub fn new(duration: f64) -> Self {
        let video = Self::default();
        video.0.borrow_mut().duration = Some(duration);
        video
    }

    pub fn advance(&self, dt: f64) -> bool {
        self.0.borrow_mut().advance(dt)
    }

    pub fn is_audible(&self) -> bool {
        let clock = self.0.borrow();
        clock.playing && !clock.muted && clock.volume > 0.0
    }
}

impl MediaResource for SimVideo {
    fn position(&self) -> f64 {
        self.0.borrow().position
    }

    fn set_position(&mut self, t: f64) {
        let mut clock = self.0.borrow_mut();
        clock.position = clock.duration.map_or(t, |d| t.min(d)).max(0.0);
    }

    fn duration(&self) -> Option<f64> {
        self.0.borrow().duration
    }

    fn is_playing(&self) -> bool {
        self.0.borrow().playing
    }

    fn play(&mut self) -> Result<(), PlayRejected> {
        self.0.borrow_mut().playing = true;
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

#[derive(Default)]
struct AudioState {
    clock: Clock,
    current_ticket: Option<u64>,
}

/// Plays one WAV chunk at a time. Loads read the header on a blocking task
/// and report back over `events`.
#[derive(Clone)]
pub struct SimAudio {
    state: Rc<RefCell<AudioState>>,
    events: mpsc::UnboundedSender<ResourceEvent>,
}

impl SimAudio {
    pub fn new(events: mpsc::UnboundedSender<ResourceEvent>) -> Self {
        Self {
            state: Rc::default(),
            events,
        }
    }

    pub fn advance(&self, dt: f64) -> bool {
        self.state.borrow_mut().clock.advance(dt)
    }

    pub fn is_audible(&self) -> bool {
        let state = self.state.borrow();
        state.clock.playing && !state.clock.muted && state.clock.volume > 0.0
    }

    /// Arm the clock with the chunk's length once its own load completes.
    pub fn observe(&self, event: &ResourceEvent) {
        let mut state = self.state.borrow_mut();
        if let ResourceEvent::Loaded {
            ticket_id,
            duration,
        } = event
            && state.current_ticket == Some(*ticket_id)
        {
            state.clock.duration = *duration;
        }
    }
}

impl MediaResource for SimAudio {
    fn position(&self) -> f64 {
        self.state.borrow().clock.position
    }

    fn set_position(&mut self, t: f64) {
        self.state.borrow_mut().clock.position = t.max(0.0);
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().clock.duration
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().clock.playing
    }

    fn play(&mut self) -> Result<(), PlayRejected> {
        let mut state = self.state.borrow_mut();
        if state.clock.duration.is_none() {
            return Err(PlayRejected::new("no chunk loaded"));
        }
        state.clock.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().clock.playing = false;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().clock.muted = muted;
    }

    fn set_volume(&mut self, volume: f64) {
        self.state.borrow_mut().clock.volume = volume;
    }
}

impl ChunkResource for SimAudio {
    fn load(&mut self, url: &str, ticket: LoadTicket) {
        {
            let mut state = self.state.borrow_mut();
            state.clock.position = 0.0;
            state.clock.duration = None;
            state.clock.playing = false;
            state.current_ticket = Some(ticket.id());
        }

        let path = PathBuf::from(url);
        let events = self.events.clone();
        tokio::spawn(async move {
            let ticket_id = ticket.id();
            let cancel = ticket.cancellation().clone();
            let read = tokio::task::spawn_blocking(move || wav_duration(&path));

            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(ticket_id, "chunk load cancelled");
                    return;
                }
                read = read => match read {
                    Ok(Ok(duration)) => ResourceEvent::Loaded {
                        ticket_id,
                        duration: Some(duration),
                    },
                    Ok(Err(e)) => ResourceEvent::LoadFailed {
                        ticket_id: Some(ticket_id),
                        reason: e.to_string(),
                    },
                    Err(e) => ResourceEvent::LoadFailed {
                        ticket_id: Some(ticket_id),
                        reason: format!("load task failed: {e}"),
                    },
                },
            };
            let _ = events.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_stops_at_duration() {
        let video = SimVideo::new(1.0);
        let mut handle = video.clone();
        handle.play().unwrap();
        assert!(!video.advance(0.75));
        assert!(video.advance(0.5));
        assert_eq!(handle.position(), 1.0);
        assert!(!handle.is_playing());
    }

    #[test]
    fn test_audio_refuses_to_play_before_load() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut audio = SimAudio::new(tx);
        assert!(audio.play().is_err());
    }

    #[tokio::test]
    async fn test_missing_chunk_reports_load_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let audio = SimAudio::new(tx);
        let mut sequencer = dubdeck_core::playback::ChunkSequencer::new(
            audio.clone(),
            tokio_util::sync::CancellationToken::new(),
        );
        sequencer.set_chunks(vec!["/nonexistent/chunk.wav".into()]);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ResourceEvent::LoadFailed { .. }));
        audio.observe(&event);
        assert!(sequencer.on_event(event).is_some());
    }
}

//! Pointer gestures on the timeline track.
//!
//! One gesture at a time: it starts on pointer-down over a handle, follows the
//! pointer wherever it goes until pointer-up, and pushes every move straight
//! into the target. There is no separate commit on release.

use tracing::debug;

use crate::timeline::{
    scale::TimelineScale,
    trim::{TrimWindow, clamp_time},
};

/// What a drag gesture writes into. Implemented by the synchronizer, which
/// owns both the trim window and the playhead.
pub trait TimelineTarget {
    fn trim(&self) -> TrimWindow;
    fn position(&self) -> f64;
    fn set_trim(&mut self, start: f64, end: f64);
    fn seek(&mut self, t: f64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    Start,
    End,
    Playhead,
}

/// The gesture in progress. `preview` is the clamped time under the pointer,
/// shown as a floating label while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragGesture {
    #[default]
    Idle,
    DraggingStart { preview: f64 },
    DraggingEnd { preview: f64 },
    DraggingPlayhead { preview: f64 },
}

impl DragGesture {
    pub fn handle(&self) -> Option<DragHandle> {
        match self {
            DragGesture::Idle => None,
            DragGesture::DraggingStart { .. } => Some(DragHandle::Start),
            DragGesture::DraggingEnd { .. } => Some(DragHandle::End),
            DragGesture::DraggingPlayhead { .. } => Some(DragHandle::Playhead),
        }
    }

    pub fn preview(&self) -> Option<f64> {
        match *self {
            DragGesture::Idle => None,
            DragGesture::DraggingStart { preview }
            | DragGesture::DraggingEnd { preview }
            | DragGesture::DraggingPlayhead { preview } => Some(preview),
        }
    }

    /// Each handle's own bounds.
    fn clamp(&self, t: f64, trim: &TrimWindow) -> f64 {
        match self {
            DragGesture::Idle => t,
            DragGesture::DraggingStart { .. } => clamp_time(t, 0.0, trim.end()),
            DragGesture::DraggingEnd { .. } => clamp_time(t, trim.start(), trim.duration()),
            DragGesture::DraggingPlayhead { .. } => trim.clamp(t),
        }
    }

    fn with_preview(self, preview: f64) -> Self {
        match self {
            DragGesture::Idle => DragGesture::Idle,
            DragGesture::DraggingStart { .. } => DragGesture::DraggingStart { preview },
            DragGesture::DraggingEnd { .. } => DragGesture::DraggingEnd { preview },
            DragGesture::DraggingPlayhead { .. } => DragGesture::DraggingPlayhead { preview },
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragController {
    scale: TimelineScale,
    gesture: DragGesture,
}

impl DragController {
    pub fn new(scale: TimelineScale) -> Self {
        Self {
            scale,
            gesture: DragGesture::Idle,
        }
    }

    pub fn scale(&self) -> &TimelineScale {
        &self.scale
    }

    pub fn gesture(&self) -> DragGesture {
        self.gesture
    }

    pub fn preview(&self) -> Option<f64> {
        self.gesture.preview()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture != DragGesture::Idle
    }

    pub fn set_track_width(&mut self, width_px: f64) {
        self.scale.set_width(width_px);
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.scale.set_duration(duration);
    }

    /// Pointer-down on a handle. Returns `false` and changes nothing when a
    /// gesture is already running.
    pub fn begin<T: TimelineTarget>(&mut self, handle: DragHandle, target: &T) -> bool {
        if self.is_dragging() {
            return false;
        }

        let trim = target.trim();
        self.gesture = match handle {
            DragHandle::Start => DragGesture::DraggingStart {
                preview: trim.start(),
            },
            DragHandle::End => DragGesture::DraggingEnd { preview: trim.end() },
            DragHandle::Playhead => DragGesture::DraggingPlayhead {
                preview: target.position(),
            },
        };
        debug!(?handle, "drag started");
        true
    }

    /// Pointer-move anywhere on screen; `x` is relative to the track's left
    /// edge and may fall outside it. Returns the new preview.
    pub fn pointer_move<T: TimelineTarget>(&mut self, x: f64, target: &mut T) -> Option<f64> {
        if !self.is_dragging() {
            return None;
        }

        let trim = target.trim();
        let raw = self.scale.pixel_to_time(self.scale.clamp_pixel(x));
        let proposed = self.gesture.clamp(clamp_time(raw, 0.0, trim.duration()), &trim);

        match self.gesture {
            DragGesture::Idle => {}
            DragGesture::DraggingStart { .. } => target.set_trim(proposed, trim.end()),
            DragGesture::DraggingEnd { .. } => target.set_trim(trim.start(), proposed),
            DragGesture::DraggingPlayhead { .. } => target.seek(proposed),
        }

        self.gesture = self.gesture.with_preview(proposed);
        Some(proposed)
    }

    /// Pointer-up, wherever it lands. Ends the gesture and clears the preview.
    pub fn pointer_up(&mut self) -> Option<DragHandle> {
        let ended = self.gesture.handle();
        self.gesture = DragGesture::Idle;
        if let Some(handle) = ended {
            debug!(?handle, "drag ended");
        }
        ended
    }

    /// Drop any captured gesture, e.g. when the view goes away.
    pub fn cancel(&mut self) {
        self.gesture = DragGesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeTarget {
        trim: TrimWindow,
        position: f64,
        trim_calls: Vec<(f64, f64)>,
        seeks: Vec<f64>,
    }

    impl FakeTarget {
        fn new(duration: f64) -> Self {
            Self {
                trim: TrimWindow::new(duration),
                ..Default::default()
            }
        }
    }

    impl TimelineTarget for FakeTarget {
        fn trim(&self) -> TrimWindow {
            self.trim
        }
        fn position(&self) -> f64 {
            self.position
        }
        fn set_trim(&mut self, start: f64, end: f64) {
            self.trim_calls.push((start, end));
            self.trim.set(start, end);
        }
        fn seek(&mut self, t: f64) {
            self.seeks.push(t);
            self.position = self.trim.clamp(t);
        }
    }

    fn controller() -> DragController {
        DragController::new(TimelineScale::new(800.0, 40.0))
    }

    #[test]
    fn test_start_handle_updates_live_and_stops_at_end() {
        let mut target = FakeTarget::new(40.0);
        target.set_trim(0.0, 20.0);
        let mut drag = controller();

        assert!(drag.begin(DragHandle::Start, &target));
        assert_eq!(drag.preview(), Some(0.0));

        assert_eq!(drag.pointer_move(100.0, &mut target), Some(5.0));
        assert_eq!(drag.pointer_move(200.0, &mut target), Some(10.0));
        assert_eq!(target.trim.start(), 10.0);

        // beyond the end handle
        assert_eq!(drag.pointer_move(700.0, &mut target), Some(20.0));
        assert_eq!((target.trim.start(), target.trim.end()), (20.0, 20.0));
        assert_eq!(target.trim_calls.len(), 4);
    }

    #[test]
    fn test_end_handle_clamps_to_start_and_duration() {
        let mut target = FakeTarget::new(40.0);
        target.set_trim(10.0, 30.0);
        let mut drag = controller();
        drag.begin(DragHandle::End, &target);

        assert_eq!(drag.pointer_move(-50.0, &mut target), Some(10.0));
        assert_eq!(drag.pointer_move(5000.0, &mut target), Some(40.0));
        assert_eq!((target.trim.start(), target.trim.end()), (10.0, 40.0));
    }

    #[test]
    fn test_playhead_seeks_within_trim() {
        let mut target = FakeTarget::new(40.0);
        target.set_trim(10.0, 30.0);
        target.position = 12.0;
        let mut drag = controller();
        drag.begin(DragHandle::Playhead, &target);
        assert_eq!(drag.preview(), Some(12.0));

        drag.pointer_move(0.0, &mut target);
        drag.pointer_move(500.0, &mut target);
        drag.pointer_move(800.0, &mut target);
        assert_eq!(target.seeks, vec![10.0, 25.0, 30.0]);
        assert!(target.trim_calls.len() == 1);
    }

    #[test]
    fn test_release_clears_preview_without_commit() {
        let mut target = FakeTarget::new(40.0);
        let mut drag = controller();
        drag.begin(DragHandle::Playhead, &target);
        drag.pointer_move(400.0, &mut target);

        assert_eq!(drag.pointer_up(), Some(DragHandle::Playhead));
        assert_eq!(drag.preview(), None);
        assert_eq!(target.seeks, vec![20.0]);

        assert_eq!(drag.pointer_move(600.0, &mut target), None);
        assert_eq!(target.seeks.len(), 1);
        assert_eq!(drag.pointer_up(), None);
    }

    #[test]
    fn test_second_gesture_is_refused_while_active() {
        let target = FakeTarget::new(40.0);
        let mut drag = controller();
        assert!(drag.begin(DragHandle::Start, &target));
        assert!(!drag.begin(DragHandle::End, &target));
        assert_eq!(drag.gesture().handle(), Some(DragHandle::Start));
    }

    #[test]
    fn test_resize_applies_to_next_move() {
        let mut target = FakeTarget::new(40.0);
        let mut drag = controller();
        drag.begin(DragHandle::End, &target);
        drag.set_track_width(400.0);
        assert_eq!(drag.pointer_move(100.0, &mut target), Some(10.0));
    }
}

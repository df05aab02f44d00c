use serde::Serialize;

/// Clamp `t` into `[lo, hi]`, sending NaN to `lo`.
pub(crate) fn clamp_time(t: f64, lo: f64, hi: f64) -> f64 {
    if t.is_nan() { lo } else { t.max(lo).min(hi) }
}

/// The `[start, end]` part of the media that playback is bounded to.
///
/// Always satisfies `0 <= start <= end <= duration`; the only way to move the
/// bounds is [`TrimWindow::set`], which clamps instead of rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrimWindow {
    start: f64,
    end: f64,
    duration: f64,
}

/// Result of a trim mutation. `changed` tells the owner of the playhead that
/// the bounds moved and the position has to be re-checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimUpdate {
    pub window: TrimWindow,
    pub changed: bool,
}

impl Default for TrimWindow {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TrimWindow {
    /// Full window over `duration`. Negative or non-finite durations count as 0.
    pub fn new(duration: f64) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            start: 0.0,
            end: duration,
            duration,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    /// Clamp a time into the window.
    pub fn clamp(&self, t: f64) -> f64 {
        clamp_time(t, self.start, self.end)
    }

    pub fn set(&mut self, new_start: f64, new_end: f64) -> TrimUpdate {
        let end = clamp_time(new_end, 0.0, self.duration);
        let start = clamp_time(new_start, 0.0, end);
        let changed = start != self.start || end != self.end;

        self.start = start;
        self.end = end;

        TrimUpdate {
            window: *self,
            changed,
        }
    }

    /// Adopt a newly known media duration and reset to the full range.
    pub fn set_duration(&mut self, duration: f64) -> TrimUpdate {
        let previous = *self;
        *self = Self::new(duration);
        TrimUpdate {
            window: *self,
            changed: previous != *self,
        }
    }
}

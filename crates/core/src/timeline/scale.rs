/// Candidate ruler spacings in seconds, smallest first.
const NICE_INTERVALS: [f64; 13] = [
    1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0, 1800.0, 3600.0,
];
const TARGET_TICKS: f64 = 12.0;

/// Linear mapping between a fixed-width track (pixels) and media time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineScale {
    width_px: f64,
    duration: f64,
}

impl TimelineScale {
    pub fn new(width_px: f64, duration: f64) -> Self {
        Self {
            width_px: width_px.max(0.0),
            duration: duration.max(0.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.width_px
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Called on resize; every later conversion uses the new width.
    pub fn set_width(&mut self, width_px: f64) {
        self.width_px = width_px.max(0.0);
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
    }

    pub fn pixel_to_time(&self, x: f64) -> f64 {
        if self.width_px <= 0.0 {
            return 0.0;
        }
        (x / self.width_px) * self.duration
    }

    pub fn time_to_pixel(&self, t: f64) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (t / self.duration) * self.width_px
    }

    /// Pixel column clamped onto the track.
    pub fn clamp_pixel(&self, x: f64) -> f64 {
        if x.is_nan() { 0.0 } else { x.max(0.0).min(self.width_px) }
    }
}

/// Ruler spacing giving roughly a dozen labelled ticks over `duration`.
pub fn tick_interval(duration: f64) -> f64 {
    let rough = duration / TARGET_TICKS;
    NICE_INTERVALS
        .iter()
        .copied()
        .find(|&nice| rough <= nice)
        .unwrap_or(3600.0)
}

/// Tick times `0, i, 2i, ...` up to and including `duration`.
pub fn ruler_ticks(duration: f64) -> Vec<f64> {
    if !duration.is_finite() || duration < 0.0 {
        return Vec::new();
    }
    let interval = tick_interval(duration);
    let count = (duration / interval).floor() as usize;
    (0..=count).map(|i| i as f64 * interval).collect()
}

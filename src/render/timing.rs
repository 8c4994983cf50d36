/// Fade-in length when enabled, in seconds
pub const FADE_IN_SECS: f64 = 1.0;

/// Fade-out length when enabled, in seconds
pub const FADE_OUT_SECS: f64 = 2.0;

/// A fade-out starting earlier than this into the video is pointless; it is
/// force-disabled instead.
const MIN_FADE_OUT_START: f64 = 1.0;

/// Derived audio fade window for one render job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSpec {
    /// Fade-in duration from time zero; 0 when disabled
    pub fade_in: f64,

    /// Fade-out duration; 0 when disabled
    pub fade_out: f64,

    /// Start of the fade-out window; equals the total duration when the
    /// fade-out is disabled
    pub fade_out_start: f64,
}

impl FadeSpec {
    /// Derive the fade windows for a video of `total_secs`.
    ///
    /// A fade-out that would have to start less than one second in gets
    /// force-disabled, so very short videos never end on a near-total fade.
    pub fn derive(fade_in_enabled: bool, fade_out_enabled: bool, total_secs: f64) -> Self {
        let fade_in = if fade_in_enabled { FADE_IN_SECS } else { 0.0 };
        let mut fade_out = if fade_out_enabled { FADE_OUT_SECS } else { 0.0 };

        let mut fade_out_start = total_secs - fade_out;
        if fade_out_start < MIN_FADE_OUT_START {
            fade_out = 0.0;
            fade_out_start = total_secs;
        }

        Self { fade_in, fade_out, fade_out_start }
    }

    pub fn fade_in_enabled(&self) -> bool {
        self.fade_in > 0.0
    }

    pub fn fade_out_enabled(&self) -> bool {
        self.fade_out > 0.0
    }
}

/// Uniform per-slide timing: the video is exactly `count` slides long
pub fn total_duration(per_slide_secs: f64, slide_count: usize) -> f64 {
    per_slide_secs * slide_count as f64
}

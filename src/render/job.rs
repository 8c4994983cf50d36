use std::path::PathBuf;

use crate::deck::SlideDeck;
use crate::error::{Result, ValidationError};
use crate::render::timing::{self, FadeSpec};

/// Immutable snapshot of everything one render needs.
///
/// Taken at submission time so the deck and caches can keep mutating while
/// the job runs; the worker never looks back at live state.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Image paths in deck order
    pub image_paths: Vec<PathBuf>,

    /// Seconds each slide is shown
    pub per_slide_secs: f64,

    /// Optional background music track
    pub music_path: Option<PathBuf>,

    /// Fade the music in over the first second
    pub fade_in: bool,

    /// Fade the music out over the last two seconds
    pub fade_out: bool,

    /// Final video destination
    pub output_path: PathBuf,
}

impl RenderJob {
    /// Snapshot the deck's current order into a job
    pub fn from_deck(
        deck: &SlideDeck,
        per_slide_secs: f64,
        music_path: Option<PathBuf>,
        fade_in: bool,
        fade_out: bool,
        output_path: PathBuf,
    ) -> Self {
        Self {
            image_paths: deck.image_paths(),
            per_slide_secs,
            music_path,
            fade_in,
            fade_out,
            output_path,
        }
    }

    /// Fail fast before any encoder process is spawned
    pub fn validate(&self) -> Result<()> {
        if self.image_paths.is_empty() {
            return Err(ValidationError::EmptySlideList.into());
        }

        if !self.per_slide_secs.is_finite() || self.per_slide_secs <= 0.0 {
            return Err(ValidationError::InvalidDuration { seconds: self.per_slide_secs }.into());
        }

        Ok(())
    }

    /// Total video duration in seconds
    pub fn total_duration(&self) -> f64 {
        timing::total_duration(self.per_slide_secs, self.image_paths.len())
    }

    /// Fade windows derived from the flags and the total duration
    pub fn fade_spec(&self) -> FadeSpec {
        FadeSpec::derive(self.fade_in, self.fade_out, self.total_duration())
    }
}

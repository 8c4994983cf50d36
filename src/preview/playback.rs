use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::deck::SlideDeck;
use crate::error::{Result, ValidationError};
use crate::gate::{ActivityGate, ActivityToken};
use crate::preview::audio::AudioSink;

/// Extra slack added to every tick so compositing finishes before the next
/// selection change.
const TICK_SLACK_MS: u64 = 50;

/// What a timer tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Selection advanced to this index; the boundary recomposites
    Advanced(usize),
    /// Terminal tick: playback ended and the saved selection was restored
    Finished,
}

enum State {
    Editing,
    Previewing {
        saved_selection: Option<usize>,
        _token: ActivityToken,
    },
}

/// State machine that emulates playback by cycling the deck's selection.
///
/// The controller defines the transitions; the boundary owns the scheduler
/// that calls `tick` at the period returned by `start`. Edge-triggered by
/// design, no ambient callbacks: every transition is an explicit call.
pub struct PreviewPlaybackController {
    state: State,
}

impl PreviewPlaybackController {
    pub fn new() -> Self {
        Self { state: State::Editing }
    }

    /// `Editing -> Previewing`.
    ///
    /// Saves the current selection, starts the music (when given) from time
    /// zero, selects slide 0 and returns the timer period the scheduler
    /// should use. Fails when already previewing, when the deck is empty,
    /// or when a render holds the activity gate.
    pub fn start(
        &mut self,
        deck: &mut SlideDeck,
        per_slide_secs: f64,
        music: Option<&Path>,
        audio: &mut dyn AudioSink,
        gate: &Arc<ActivityGate>,
    ) -> Result<Duration> {
        if self.is_previewing() {
            return Err(ValidationError::PreviewActive.into());
        }
        if deck.is_empty() {
            return Err(ValidationError::EmptySlideList.into());
        }

        let token = gate.begin_preview()?;

        let saved_selection = deck.selection();
        if let Some(music_path) = music {
            audio.play(music_path)?;
        }
        deck.select(Some(0));

        self.state = State::Previewing { saved_selection, _token: token };

        let period = Self::tick_period(per_slide_secs);
        info!("Preview started: {} slides, tick every {:?}", deck.len(), period);
        Ok(period)
    }

    /// Advance the selection by one slide; valid only while previewing.
    ///
    /// The tick that would step past the last slide is terminal: it stops
    /// the audio, restores the saved selection and returns to `Editing`.
    pub fn tick(&mut self, deck: &mut SlideDeck, audio: &mut dyn AudioSink) -> Result<TickOutcome> {
        let State::Previewing { saved_selection, .. } = &self.state else {
            return Err(ValidationError::NoPreviewActive.into());
        };
        let saved_selection = *saved_selection;

        let next = deck.selection().map(|i| i + 1).unwrap_or(0);
        if next == deck.len() {
            debug!("Terminal tick, returning to editing");
            self.finish(deck, audio, saved_selection);
            return Ok(TickOutcome::Finished);
        }

        deck.select(Some(next));
        Ok(TickOutcome::Advanced(next))
    }

    /// Manual `Previewing -> Editing` transition
    pub fn stop(&mut self, deck: &mut SlideDeck, audio: &mut dyn AudioSink) -> Result<()> {
        let State::Previewing { saved_selection, .. } = &self.state else {
            return Err(ValidationError::NoPreviewActive.into());
        };
        let saved_selection = *saved_selection;

        info!("Preview stopped");
        self.finish(deck, audio, saved_selection);
        Ok(())
    }

    fn finish(&mut self, deck: &mut SlideDeck, audio: &mut dyn AudioSink, saved: Option<usize>) {
        audio.stop();
        deck.select(saved);
        // Dropping the state releases the activity gate token
        self.state = State::Editing;
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self.state, State::Previewing { .. })
    }

    /// Timer period for one slide: the slide duration plus a little slack
    /// so recompositing lands before the next advance.
    pub fn tick_period(per_slide_secs: f64) -> Duration {
        Duration::from_millis((per_slide_secs * 1000.0).round() as u64 + TICK_SLACK_MS)
    }
}

impl Default for PreviewPlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

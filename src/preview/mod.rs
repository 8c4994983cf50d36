//! # Preview Module
//!
//! Everything needed to show the slideshow before it is rendered: a bounded
//! decode cache, the blurred-background frame compositor, the playback
//! state machine that cycles the deck's selection on a timer, and the audio
//! sink seam used to play the music track during preview.

pub mod audio;
pub mod cache;
pub mod compositor;
pub mod playback;

pub use audio::{AudioSink, NullSink, RodioSink};
pub use cache::ImageDecodeCache;
pub use compositor::PreviewCompositor;
pub use playback::{PreviewPlaybackController, TickOutcome};

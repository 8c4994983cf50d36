//! # music-slides
//!
//! Turn a user-ordered stack of still images plus optional background music
//! into a rendered slideshow video, with a live, cheaper-to-compute preview
//! of the same composition.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use music_slides::{
//!     config::Config,
//!     deck::SlideDeck,
//!     gate::ActivityGate,
//!     render::{RenderJob, RenderWorker},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let gate = ActivityGate::new();
//!
//! let mut deck = SlideDeck::new();
//! deck.insert_after_selection("sunrise.jpg");
//! deck.insert_after_selection("beach.jpg");
//!
//! let (worker, mut events) = RenderWorker::new(config.render, gate);
//! worker.submit(RenderJob::from_deck(
//!     &deck,
//!     2.0,
//!     Some("song.mp3".into()),
//!     true,
//!     true,
//!     "slideshow.mp4".into(),
//! ))?;
//!
//! let outcome = events.recv().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`deck`] - Ordered slide collection with selection and reorder operations
//! - [`preview`] - Decode cache, frame compositor and playback state machine
//! - [`render`] - Two-pass external-encoder synthesis pipeline and worker
//! - [`gate`] - Mutual exclusion between preview playback and rendering
//! - [`config`] - Configuration management
//!
//! The deck, cache and compositor run on the interactive side; a render job
//! takes an immutable snapshot of the deck's order and parameters, so the
//! background worker never shares mutable state with them.

pub mod config;
pub mod deck;
pub mod error;
pub mod gate;
pub mod preview;
pub mod render;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    deck::{Slide, SlideDeck},
    error::{Result, SlidesError},
    gate::ActivityGate,
    preview::{PreviewCompositor, PreviewPlaybackController},
    render::{RenderJob, RenderPipeline, RenderWorker},
};

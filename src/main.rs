use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber;

use music_slides::{
    config::Config,
    deck::{self, SlideDeck},
    gate::ActivityGate,
    preview::{AudioSink, NullSink, PreviewCompositor, PreviewPlaybackController, RodioSink, TickOutcome},
    render::{RenderEvent, RenderJob, RenderWorker},
};

#[derive(Parser)]
#[command(
    name = "music-slides",
    version,
    about = "Turn still images and music into a slideshow video",
    long_about = "music-slides renders an ordered set of still images into a slideshow video \
        with a blurred-background composition, optionally muxing in a music track with fades. \
        The preview subcommands show the same composition without running the expensive encode."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Render the slideshow to a video file
    Render {
        /// Image files in slide order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output video file path
        #[arg(short, long)]
        output: PathBuf,

        /// Seconds each slide is shown
        #[arg(short, long, default_value_t = 2.0)]
        duration: f64,

        /// Background music file
        #[arg(short, long)]
        music: Option<PathBuf>,

        /// Fade the music in over the first second
        #[arg(long)]
        fade_in: bool,

        /// Fade the music out over the last two seconds
        #[arg(long)]
        fade_out: bool,
    },

    /// Cycle through the slides on a timer, simulating the final video
    Preview {
        /// Image files in slide order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Seconds each slide is shown
        #[arg(short, long, default_value_t = 2.0)]
        duration: f64,

        /// Background music file
        #[arg(short, long)]
        music: Option<PathBuf>,

        /// Preview canvas size as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1280x720")]
        size: String,
    },

    /// Export one composited preview frame as a PNG
    Frame {
        /// Image file to composite
        image: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Canvas size as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1280x720")]
        size: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    config.validate()?;

    match cli.command {
        Command::Render { images, output, duration, music, fade_in, fade_out } => {
            run_render(&config, images, output, duration, music, fade_in, fade_out).await
        }
        Command::Preview { images, duration, music, size } => {
            run_preview(&config, images, duration, music, &size).await
        }
        Command::Frame { image, output, size } => run_frame(&config, &image, &output, &size),
    }
}

/// Build a deck from the given paths, decode-checking each image first.
///
/// A bad image is reported and skipped; it never aborts the rest of the
/// batch.
fn build_deck(compositor: &mut PreviewCompositor, images: &[PathBuf]) -> SlideDeck {
    let mut deck = SlideDeck::new();

    for path in images {
        if !deck::is_supported_image(path) {
            warn!("Skipping {:?}: not a supported image type", path);
            continue;
        }

        match compositor.cache_mut().get(path) {
            Ok(_) => {
                deck.insert_after_selection(path.clone());
            }
            Err(e) => warn!("Skipping {:?}: {}", path, e.user_message()),
        }
    }

    deck
}

async fn run_render(
    config: &Config,
    images: Vec<PathBuf>,
    output: PathBuf,
    duration: f64,
    music: Option<PathBuf>,
    fade_in: bool,
    fade_out: bool,
) -> Result<()> {
    let duration = duration.clamp(config.render.min_slide_secs, config.render.max_slide_secs);

    let mut compositor = PreviewCompositor::new(config.preview.clone());
    let deck = build_deck(&mut compositor, &images);
    if deck.is_empty() {
        return Err(anyhow!("none of the given images are usable"));
    }

    let gate = ActivityGate::new();
    let (worker, mut events) = RenderWorker::new(config.render.clone(), gate);

    worker.submit(RenderJob::from_deck(&deck, duration, music, fade_in, fade_out, output))?;

    match events.recv().await {
        Some(RenderEvent::Finished { output }) => {
            info!("Saved video to {:?}", output);
            Ok(())
        }
        Some(RenderEvent::Failed { error }) => Err(anyhow!(error.user_message())),
        None => Err(anyhow!("render worker went away without reporting")),
    }
}

async fn run_preview(
    config: &Config,
    images: Vec<PathBuf>,
    duration: f64,
    music: Option<PathBuf>,
    size: &str,
) -> Result<()> {
    let target = parse_size(size)?;
    let duration = duration.clamp(config.render.min_slide_secs, config.render.max_slide_secs);

    let mut compositor = PreviewCompositor::new(config.preview.clone());
    let mut deck = build_deck(&mut compositor, &images);
    if deck.is_empty() {
        return Err(anyhow!("none of the given images are usable"));
    }

    let mut audio: Box<dyn AudioSink> = if music.is_some() {
        Box::new(RodioSink::new())
    } else {
        Box::new(NullSink)
    };

    let gate = ActivityGate::new();
    let mut controller = PreviewPlaybackController::new();
    let period = controller.start(&mut deck, duration, music.as_deref(), audio.as_mut(), &gate)?;

    show_slide(&mut compositor, &deck, target);

    let mut timer = tokio::time::interval(period);
    timer.tick().await; // First tick fires immediately; slide 0 is already up

    loop {
        timer.tick().await;
        match controller.tick(&mut deck, audio.as_mut())? {
            TickOutcome::Advanced(_) => show_slide(&mut compositor, &deck, target),
            TickOutcome::Finished => break,
        }
    }

    info!("Preview finished");
    Ok(())
}

/// Composite the selected slide, standing in for the boundary's image view
fn show_slide(compositor: &mut PreviewCompositor, deck: &SlideDeck, target: (u32, u32)) {
    let Some(slide) = deck.selected_slide() else { return };

    match compositor.compose(&slide.image_path, target) {
        Ok(_) => info!(
            "Showing slide {}/{}: {}",
            deck.selection().map(|i| i + 1).unwrap_or(0),
            deck.len(),
            slide.display_name(),
        ),
        Err(e) => warn!("Could not composite {:?}: {}", slide.image_path, e.user_message()),
    }
}

fn run_frame(config: &Config, image: &PathBuf, output: &PathBuf, size: &str) -> Result<()> {
    let target = parse_size(size)?;

    let mut compositor = PreviewCompositor::new(config.preview.clone());
    let frame = compositor
        .compose(image, target)
        .map_err(|e| anyhow!(e.user_message()))?;

    frame.save(output)?;
    info!("Saved preview frame to {:?}", output);
    Ok(())
}

fn parse_size(size: &str) -> Result<(u32, u32)> {
    let (w, h) = size
        .split_once('x')
        .ok_or_else(|| anyhow!("size must be WIDTHxHEIGHT, e.g. 1280x720"))?;

    Ok((w.parse()?, h.parse()?))
}

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::{DecodeError, Result};

/// Seam between the playback controller and actual audio output.
///
/// The controller only ever asks to start a file from time zero and to
/// stop; fades are not applied live, they are baked into the final render
/// only (known gap).
pub trait AudioSink {
    /// Start playing `path` from the beginning, replacing any current playback
    fn play(&mut self, path: &Path) -> Result<()>;

    /// Stop playback; no-op when nothing is playing
    fn stop(&mut self);
}

/// Silent sink for previews without music
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// rodio-backed sink used by the CLI boundary.
///
/// The output stream is opened lazily on the first `play` and kept alive
/// with the sink; dropping either tears the audio down.
pub struct RodioSink {
    stream: Option<(rodio::OutputStream, rodio::OutputStreamHandle)>,
    sink: Option<rodio::Sink>,
}

impl RodioSink {
    pub fn new() -> Self {
        Self { stream: None, sink: None }
    }

    fn handle(&mut self) -> Result<rodio::OutputStreamHandle> {
        if let Some((_, handle)) = &self.stream {
            return Ok(handle.clone());
        }

        let (stream, handle) = rodio::OutputStream::try_default().map_err(|e| {
            DecodeError::AudioUnplayable {
                path: "<output device>".to_string(),
                reason: e.to_string(),
            }
        })?;

        self.stream = Some((stream, handle.clone()));
        Ok(handle)
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for RodioSink {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.stop();

        let handle = self.handle()?;
        let file = File::open(path).map_err(|e| DecodeError::AudioUnplayable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let source = rodio::Decoder::new(BufReader::new(file)).map_err(|e| {
            DecodeError::AudioUnplayable {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let sink = rodio::Sink::try_new(&handle).map_err(|e| DecodeError::AudioUnplayable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!("Playing {:?}", path);
        sink.append(source);
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

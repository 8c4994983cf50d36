use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{FilesystemError, Result};

/// Concat-style encoder input list: one `(path, duration)` pair per slide
/// in deck order, durations formatted to one decimal place.
#[derive(Debug, Clone)]
pub struct ConcatList {
    paths: Vec<PathBuf>,
    per_slide_secs: f64,
}

impl ConcatList {
    pub fn new(paths: &[PathBuf], per_slide_secs: f64) -> Self {
        Self { paths: paths.to_vec(), per_slide_secs }
    }

    /// The `(path, duration)` pairs exactly as they are written out
    pub fn entries(&self) -> impl Iterator<Item = (&Path, String)> {
        let duration = format!("{:.1}", self.per_slide_secs);
        self.paths.iter().map(move |path| (path.as_path(), duration.clone()))
    }

    /// Render the list in the concat-demuxer text format.
    ///
    /// The final path is repeated once without a duration; the demuxer
    /// otherwise drops the last slide's display time.
    pub fn render(&self) -> String {
        let mut script = String::new();

        for (path, duration) in self.entries() {
            script.push_str(&format!("file '{}'\n", path.display()));
            script.push_str(&format!("duration {}\n", duration));
        }

        if let Some(last) = self.paths.last() {
            script.push_str(&format!("file '{}'\n", last.display()));
        }

        script
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_script(path, &self.render())
    }
}

/// Filter graph handed to the external encoder.
///
/// The source is split in two: the background branch stretches the image
/// over the full target frame (ignoring aspect), normalizes the pixel
/// aspect ratio and box-blurs it; the foreground branch scales the image
/// aspect-preserving to the target height. The foreground is then overlaid
/// centered on the background. Visually this matches the in-process preview
/// compositor, which implements the same effect independently.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    width: u32,
    height: u32,
}

impl FilterGraph {
    /// Box-blur kernel applied to the background branch
    const BLUR_KERNEL: u32 = 20;

    pub fn new(resolution: (u32, u32)) -> Self {
        Self { width: resolution.0, height: resolution.1 }
    }

    pub fn render(&self) -> String {
        format!(
            "[0:v]split=2[bgsrc][fgsrc];\
             [bgsrc]scale={w}:{h},setsar=1,boxblur={blur}:{blur}[bg];\
             [fgsrc]scale=-1:{h}[fg];\
             [bg][fg]overlay=(W-w)/2:(H-h)/2[v]",
            w = self.width,
            h = self.height,
            blur = Self::BLUR_KERNEL,
        )
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_script(path, &self.render())
    }
}

fn write_script(path: &Path, content: &str) -> Result<()> {
    let mut file = File::create(path).map_err(|e| FilesystemError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    file.write_all(content.as_bytes()).map_err(|e| FilesystemError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}

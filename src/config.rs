use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for music-slides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preview compositing settings
    pub preview: PreviewConfig,

    /// Render pipeline settings
    pub render: RenderConfig,

    /// Last-used directories, persisted for the boundary layer
    pub directories: DirectoriesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview: PreviewConfig::default(),
            render: RenderConfig::default(),
            directories: DirectoriesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.preview.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

/// Preview compositing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Maximum number of decoded images kept in memory
    pub cache_capacity: usize,

    /// First (coarse) background blur radius
    pub blur_radius_coarse: f32,

    /// Second (smoothing) background blur radius
    pub blur_radius_fine: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 20,
            blur_radius_coarse: 50.0,
            blur_radius_fine: 20.0,
        }
    }
}

impl PreviewConfig {
    fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "preview.cache_capacity".to_string(),
                value: self.cache_capacity.to_string(),
            }
            .into());
        }

        if self.blur_radius_coarse <= 0.0 || self.blur_radius_fine <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "preview.blur_radii".to_string(),
                value: format!("{}/{}", self.blur_radius_coarse, self.blur_radius_fine),
            }
            .into());
        }

        Ok(())
    }
}

/// Render pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// External encoder binary name or path
    pub encoder_binary: String,

    /// Output frame rate
    pub fps: u32,

    /// Output resolution (width, height)
    pub resolution: (u32, u32),

    /// Video codec passed to the encoder
    pub video_codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,

    /// Audio bitrate passed to the encoder on the mux pass
    pub audio_bitrate: String,

    /// Minimum accepted per-slide duration in seconds
    pub min_slide_secs: f64,

    /// Maximum accepted per-slide duration in seconds
    pub max_slide_secs: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            encoder_binary: "ffmpeg".to_string(),
            fps: 30,
            resolution: (1920, 1080),
            video_codec: "libx264".to_string(),
            quality: 85,
            audio_bitrate: "192k".to_string(),
            min_slide_secs: 0.1,
            max_slide_secs: 60.0,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.resolution".to_string(),
                value: format!("{}x{}", self.resolution.0, self.resolution.1),
            }
            .into());
        }

        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "render.quality".to_string(),
                value: self.quality.to_string(),
            }
            .into());
        }

        if self.max_slide_secs <= self.min_slide_secs {
            return Err(ConfigError::InvalidValue {
                key: "render.slide_secs_range".to_string(),
                value: format!("{}-{}", self.min_slide_secs, self.max_slide_secs),
            }
            .into());
        }

        Ok(())
    }
}

/// Last-used directories for the boundary layer's file pickers.
///
/// The boundary receives this object explicitly; the core never reads it as
/// ambient state. Remembering one kind of directory seeds the other when it
/// is still unset, so the first picked folder becomes the default for both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Directory of the most recently picked image
    pub image_dir: Option<PathBuf>,

    /// Directory of the most recently picked music file
    pub music_dir: Option<PathBuf>,
}

impl DirectoriesConfig {
    /// Remember the directory an image was picked from
    pub fn remember_image_dir<P: Into<PathBuf>>(&mut self, dir: P) {
        let dir = dir.into();
        if self.music_dir.is_none() {
            self.music_dir = Some(dir.clone());
        }
        self.image_dir = Some(dir);
    }

    /// Remember the directory a music file was picked from
    pub fn remember_music_dir<P: Into<PathBuf>>(&mut self, dir: P) {
        let dir = dir.into();
        if self.image_dir.is_none() {
            self.image_dir = Some(dir.clone());
        }
        self.music_dir = Some(dir);
    }
}

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::error::{FilesystemError, ProcessError, Result};
use crate::render::job::RenderJob;
use crate::render::script::{ConcatList, FilterGraph};
use crate::render::timing::FadeSpec;

/// Two-pass slideshow synthesis through an external encoder.
///
/// Pass 1 turns the concat input list plus the filter graph into a silent
/// video stream. Pass 2 only runs when the job carries music: it copies the
/// video stream unchanged and muxes in the faded audio. Without music,
/// pass 1 writes straight to the final output and no scratch video exists.
///
/// All scratch artifacts live in one process-scoped directory that is
/// recursively removed by `cleanup` or on drop, success or failure.
pub struct RenderPipeline {
    config: RenderConfig,
    scratch_dir: Option<PathBuf>,
}

impl RenderPipeline {
    pub fn new(config: RenderConfig) -> Self {
        Self { config, scratch_dir: None }
    }

    /// Probe for the configured encoder binary
    pub fn check_encoder_available(binary: &str) -> bool {
        Command::new(binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn ensure_scratch_dir(&mut self) -> Result<PathBuf> {
        if let Some(ref dir) = self.scratch_dir {
            return Ok(dir.clone());
        }

        // Keyed by pid plus a sequence number so concurrent pipelines in
        // one process never share scratch space
        static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);

        let dir = std::env::temp_dir().join(format!("music_slides_{}_{}", std::process::id(), seq));
        create_dir_all(&dir).map_err(|e| FilesystemError::ScratchDirFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        self.scratch_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Run the whole job and return the final output path
    pub async fn render(&mut self, job: &RenderJob) -> Result<PathBuf> {
        job.validate()?;

        if !Self::check_encoder_available(&self.config.encoder_binary) {
            return Err(ProcessError::NotFound { binary: self.config.encoder_binary.clone() }.into());
        }

        let fade = job.fade_spec();
        info!(
            "Rendering {} slides, {:.1}s each ({:.1}s total), music: {}",
            job.image_paths.len(),
            job.per_slide_secs,
            job.total_duration(),
            job.music_path.is_some(),
        );

        let scratch = self.ensure_scratch_dir()?;

        let list_path = scratch.join("slides.txt");
        ConcatList::new(&job.image_paths, job.per_slide_secs).write_to(&list_path)?;

        let graph_path = scratch.join("filtergraph.txt");
        FilterGraph::new(self.config.resolution).write_to(&graph_path)?;

        let pass1_target = self.pass1_target(job, &scratch);

        self.encode_slides(&list_path, &graph_path, &pass1_target).await?;

        if let Some(music_path) = &job.music_path {
            let muxed = self
                .mux_audio(&pass1_target, music_path, &fade, &job.output_path)
                .await;

            // The pass-1 scratch video goes away whether the mux worked or not
            if let Err(e) = std::fs::remove_file(&pass1_target) {
                warn!("Failed to remove intermediate video {:?}: {}", pass1_target, e);
            }

            muxed?;
        }

        info!("Render complete: {:?}", job.output_path);
        Ok(job.output_path.clone())
    }

    /// Where pass 1 writes: a scratch path when a mux pass follows, the
    /// final output otherwise
    fn pass1_target(&self, job: &RenderJob, scratch: &Path) -> PathBuf {
        if job.music_path.is_some() {
            scratch.join("video_only.mp4")
        } else {
            job.output_path.clone()
        }
    }

    /// Pass 1: stills to a silent, fixed-rate video stream
    async fn encode_slides(&self, list_path: &Path, graph_path: &Path, target: &Path) -> Result<()> {
        info!("Pass 1: encoding slides to {:?}", target);

        let args = vec![
            "-f".to_string(), "concat".to_string(),
            "-safe".to_string(), "0".to_string(),
            "-i".to_string(), list_path.display().to_string(),
            "-filter_complex_script".to_string(), graph_path.display().to_string(),
            "-map".to_string(), "[v]".to_string(),
            "-r".to_string(), self.config.fps.to_string(),
            "-c:v".to_string(), self.config.video_codec.clone(),
            "-crf".to_string(), self.quality_to_crf().to_string(),
            "-pix_fmt".to_string(), "yuv420p".to_string(),
            "-an".to_string(),
            "-y".to_string(),
            target.display().to_string(),
        ];

        self.run_encoder(args, target).await
    }

    /// Pass 2: copy the video stream, fade and mux the music
    async fn mux_audio(
        &self,
        video_path: &Path,
        music_path: &Path,
        fade: &FadeSpec,
        output_path: &Path,
    ) -> Result<()> {
        info!("Pass 2: muxing {:?} into {:?}", music_path, output_path);

        let mut args = vec![
            "-i".to_string(), video_path.display().to_string(),
            "-i".to_string(), music_path.display().to_string(),
            "-map".to_string(), "0:v".to_string(),
            "-map".to_string(), "1:a".to_string(),
            "-c:v".to_string(), "copy".to_string(),
        ];

        let mut fades = Vec::new();
        if fade.fade_in_enabled() {
            fades.push(format!("afade=t=in:st=0:d={:.1}", fade.fade_in));
        }
        if fade.fade_out_enabled() {
            fades.push(format!("afade=t=out:st={:.1}:d={:.1}", fade.fade_out_start, fade.fade_out));
        }
        if !fades.is_empty() {
            args.push("-af".to_string());
            args.push(fades.join(","));
        }

        args.extend([
            "-c:a".to_string(), "aac".to_string(),
            "-b:a".to_string(), self.config.audio_bitrate.clone(),
            "-shortest".to_string(),
            "-y".to_string(),
            output_path.display().to_string(),
        ]);

        self.run_encoder(args, output_path).await
    }

    /// Invoke the encoder, capturing combined stdout+stderr. A nonzero exit
    /// deletes whatever partial file exists at `partial` before raising.
    async fn run_encoder(&self, args: Vec<String>, partial: &Path) -> Result<()> {
        let binary = self.config.encoder_binary.clone();
        debug!("{} {}", binary, args.join(" "));

        let output = task::spawn_blocking(move || Command::new(&binary).args(&args).output())
            .await
            .map_err(|e| ProcessError::LaunchFailed { reason: e.to_string() })?
            .map_err(|e| ProcessError::LaunchFailed { reason: e.to_string() })?;

        if !output.status.success() {
            let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
            log.push_str(&String::from_utf8_lossy(&output.stderr));

            if partial.exists() {
                if let Err(e) = std::fs::remove_file(partial) {
                    warn!("Failed to remove partial output {:?}: {}", partial, e);
                }
            }

            return Err(ProcessError::ExitFailure {
                code: output.status.code().unwrap_or(-1),
                log,
            }
            .into());
        }

        Ok(())
    }

    fn quality_to_crf(&self) -> u8 {
        let quality = self.config.quality.min(100) as f32;
        (51.0 - (quality / 100.0) * 51.0) as u8
    }

    /// Recursively remove the scratch directory
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.scratch_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Failed to remove scratch directory {:?}: {}", dir, e);
            }
        }
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SlidesError, ValidationError};

    fn job_without_music() -> RenderJob {
        RenderJob {
            image_paths: vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")],
            per_slide_secs: 1.0,
            music_path: None,
            fade_in: false,
            fade_out: false,
            output_path: PathBuf::from("/videos/out.mp4"),
        }
    }

    #[tokio::test]
    async fn test_empty_job_fails_before_anything_runs() {
        let mut pipeline = RenderPipeline::new(RenderConfig::default());
        let mut job = job_without_music();
        job.image_paths.clear();

        let result = pipeline.render(&job).await;
        assert!(matches!(
            result,
            Err(SlidesError::Validation(ValidationError::EmptySlideList))
        ));
        // Validation failed fast: no scratch directory was created
        assert!(pipeline.scratch_dir.is_none());
    }

    #[test]
    fn test_pass1_goes_straight_to_output_without_music() {
        let pipeline = RenderPipeline::new(RenderConfig::default());
        let scratch = Path::new("/tmp/scratch");

        let job = job_without_music();
        assert_eq!(pipeline.pass1_target(&job, scratch), PathBuf::from("/videos/out.mp4"));

        let mut with_music = job_without_music();
        with_music.music_path = Some(PathBuf::from("song.mp3"));
        assert_eq!(
            pipeline.pass1_target(&with_music, scratch),
            PathBuf::from("/tmp/scratch/video_only.mp4")
        );
    }

    #[test]
    fn test_scratch_dir_created_once_and_cleaned_up() {
        let mut pipeline = RenderPipeline::new(RenderConfig::default());

        let first = pipeline.ensure_scratch_dir().unwrap();
        let second = pipeline.ensure_scratch_dir().unwrap();
        assert_eq!(first, second);
        assert!(first.exists());

        pipeline.cleanup();
        assert!(!first.exists());
        assert!(pipeline.scratch_dir.is_none());
    }

    /// Stand-in encoder: logs every invocation next to itself and creates
    /// its last argument as an empty file, like a successful encode would.
    #[cfg(unix)]
    fn write_fake_encoder(dir: &Path, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            "#!/bin/sh\n\
             log=\"$(dirname \"$0\")/calls.log\"\n\
             printf '%s\\n' \"$*\" >> \"$log\"\n\
             if [ \"$1\" = \"-version\" ]; then exit 0; fi\n\
             for last in \"$@\"; do :; done\n\
             touch \"$last\"\n\
             exit {exit_code}\n"
        );

        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, script).unwrap();

        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    fn encoder_calls(encoder: &Path) -> Vec<String> {
        let log = encoder.parent().unwrap().join("calls.log");
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .filter(|line| !line.starts_with("-version"))
            .map(str::to_string)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_job_without_music_runs_one_pass_straight_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = write_fake_encoder(dir.path(), 0);

        let mut config = RenderConfig::default();
        config.encoder_binary = encoder.display().to_string();

        let mut job = job_without_music();
        job.output_path = dir.path().join("out.mp4");

        let mut pipeline = RenderPipeline::new(config);
        let output = pipeline.render(&job).await.unwrap();
        assert_eq!(output, job.output_path);
        assert!(output.exists());

        let calls = encoder_calls(&encoder);
        assert_eq!(calls.len(), 1, "no-music jobs run a single pass");
        assert!(calls[0].contains("-an"));
        assert!(calls[0].ends_with(&job.output_path.display().to_string()));
        assert!(!calls[0].contains("video_only.mp4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_job_with_music_runs_two_passes_and_drops_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = write_fake_encoder(dir.path(), 0);

        let mut config = RenderConfig::default();
        config.encoder_binary = encoder.display().to_string();

        // 3 slides at 2.0s: fade-out window is [4.0, 6.0]
        let job = RenderJob {
            image_paths: vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg"), PathBuf::from("c.jpg")],
            per_slide_secs: 2.0,
            music_path: Some(PathBuf::from("song.mp3")),
            fade_in: true,
            fade_out: true,
            output_path: dir.path().join("out.mp4"),
        };

        let mut pipeline = RenderPipeline::new(config);
        pipeline.render(&job).await.unwrap();

        let calls = encoder_calls(&encoder);
        assert_eq!(calls.len(), 2, "music jobs run encode then mux");

        // Pass 1: silent video into the scratch file
        assert!(calls[0].contains("-an"));
        assert!(calls[0].contains("video_only.mp4"));

        // Pass 2: stream copy plus the derived fade windows
        assert!(calls[1].contains("-c:v copy"));
        assert!(calls[1].contains("afade=t=in:st=0:d=1.0"));
        assert!(calls[1].contains("afade=t=out:st=4.0:d=2.0"));
        assert!(calls[1].contains("-b:a 192k"));
        assert!(calls[1].contains("-shortest"));

        // Intermediate deleted, final output in place
        assert!(job.output_path.exists());
        let scratch = pipeline.scratch_dir.clone().unwrap();
        assert!(!scratch.join("video_only.mp4").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_short_total_duration_muxes_without_fade_out() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = write_fake_encoder(dir.path(), 0);

        let mut config = RenderConfig::default();
        config.encoder_binary = encoder.display().to_string();

        // 2 slides at 1.0s: the fade-out would start at 0s and is dropped
        let job = RenderJob {
            image_paths: vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")],
            per_slide_secs: 1.0,
            music_path: Some(PathBuf::from("song.mp3")),
            fade_in: false,
            fade_out: true,
            output_path: dir.path().join("out.mp4"),
        };

        let mut pipeline = RenderPipeline::new(config);
        pipeline.render(&job).await.unwrap();

        let calls = encoder_calls(&encoder);
        assert_eq!(calls.len(), 2);
        assert!(!calls[1].contains("afade"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_pass_deletes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = write_fake_encoder(dir.path(), 3);

        let mut config = RenderConfig::default();
        config.encoder_binary = encoder.display().to_string();

        let mut job = job_without_music();
        job.output_path = dir.path().join("out.mp4");

        let mut pipeline = RenderPipeline::new(config);
        match pipeline.render(&job).await {
            Err(SlidesError::Process(crate::error::ProcessError::ExitFailure { code, .. })) => {
                assert_eq!(code, 3);
            }
            other => panic!("expected ExitFailure, got {other:?}"),
        }

        // The fake encoder touched the output before failing; the pipeline
        // must have removed the partial file
        assert!(!job.output_path.exists());
    }

    #[test]
    fn test_quality_to_crf_range() {
        let mut config = RenderConfig::default();

        config.quality = 100;
        assert_eq!(RenderPipeline::new(config.clone()).quality_to_crf(), 0);

        config.quality = 0;
        assert_eq!(RenderPipeline::new(config.clone()).quality_to_crf(), 51);

        config.quality = 85;
        let crf = RenderPipeline::new(config).quality_to_crf();
        assert!(crf < 15);
    }
}

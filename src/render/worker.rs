use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::config::RenderConfig;
use crate::error::{Result, SlidesError};
use crate::gate::ActivityGate;
use crate::render::job::RenderJob;
use crate::render::pipeline::RenderPipeline;

/// Completion event delivered to the boundary when a job ends
#[derive(Debug)]
pub enum RenderEvent {
    /// The job produced this file
    Finished { output: PathBuf },

    /// The job failed; partial outputs were already cleaned up
    Failed { error: SlidesError },
}

/// Runs render jobs on a dedicated background task, one at a time.
///
/// There is no queue: while a job is in flight, further submissions are
/// rejected. The activity gate is claimed for the job's whole duration, so
/// preview playback is locked out too. A started job runs to completion or
/// failure; there is no cancellation.
pub struct RenderWorker {
    config: RenderConfig,
    gate: Arc<ActivityGate>,
    events: UnboundedSender<RenderEvent>,
}

impl RenderWorker {
    /// Create a worker and the receiver the boundary listens on
    pub fn new(config: RenderConfig, gate: Arc<ActivityGate>) -> (Self, UnboundedReceiver<RenderEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { config, gate, events }, receiver)
    }

    /// Submit one job.
    ///
    /// Returns immediately once the job is accepted; the outcome arrives as
    /// a `RenderEvent`. Fails when another job is in flight or a preview is
    /// playing.
    pub fn submit(&self, job: RenderJob) -> Result<()> {
        let token = self.gate.begin_render()?;

        info!("Render job accepted: {:?}", job.output_path);

        let config = self.config.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut pipeline = RenderPipeline::new(config);
            let event = match pipeline.render(&job).await {
                Ok(output) => RenderEvent::Finished { output },
                Err(error) => {
                    warn!("Render job failed: {}", error);
                    RenderEvent::Failed { error }
                }
            };

            // Release the gate before notifying, so a boundary reacting to
            // the event can immediately start the next activity
            drop(token);

            if events.send(event).is_err() {
                warn!("Render finished but the boundary stopped listening");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn failing_job() -> RenderJob {
        // Empty image list: fails validation before any process is spawned
        RenderJob {
            image_paths: vec![],
            per_slide_secs: 1.0,
            music_path: None,
            fade_in: false,
            fade_out: false,
            output_path: PathBuf::from("out.mp4"),
        }
    }

    #[tokio::test]
    async fn test_failure_reported_as_event_and_gate_released() {
        let gate = ActivityGate::new();
        let (worker, mut events) = RenderWorker::new(RenderConfig::default(), Arc::clone(&gate));

        worker.submit(failing_job()).unwrap();

        match events.recv().await {
            Some(RenderEvent::Failed { error }) => {
                assert!(matches!(
                    error,
                    SlidesError::Validation(ValidationError::EmptySlideList)
                ));
            }
            other => panic!("expected Failed event, got {other:?}"),
        }

        // The token dropped with the job; new submissions are accepted
        assert!(gate.is_idle());
        worker.submit(failing_job()).unwrap();
        assert!(events.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_in_flight() {
        let gate = ActivityGate::new();
        let (worker, _events) = RenderWorker::new(RenderConfig::default(), Arc::clone(&gate));

        // Simulate an in-flight job by holding the gate's render slot
        let _held = gate.begin_render().unwrap();

        match worker.submit(failing_job()) {
            Err(SlidesError::Validation(ValidationError::RenderInFlight)) => {}
            other => panic!("expected RenderInFlight, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submission_rejected_while_previewing() {
        let gate = ActivityGate::new();
        let (worker, _events) = RenderWorker::new(RenderConfig::default(), Arc::clone(&gate));

        let _previewing = gate.begin_preview().unwrap();

        match worker.submit(failing_job()) {
            Err(SlidesError::Validation(ValidationError::PreviewActive)) => {}
            other => panic!("expected PreviewActive, got {other:?}"),
        }
    }
}

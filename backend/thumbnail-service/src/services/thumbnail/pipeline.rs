//! Thumbnail pipeline - coordinates a single thumbnail run
//!
//! This service handles the complete thumbnail generation workflow:
//! 1. Download original image from the object store
//! 2. Generate thumbnail
//! 3. Upload thumbnail to the object store
//!
//! Each stage starts only once the previous one has fully completed, and the
//! first failure ends the run. Nothing is written unless fetch and transform
//! both succeeded, and the source object is only ever read. Dropping the
//! `run` future before the upload is issued leaves the destination untouched.

use super::processor::{ThumbnailConfig, ThumbnailProcessor};
use crate::error::{PipelineFailure, PipelineOutcome, PipelineStage};
use crate::models::{Dimensions, ThumbnailJob};
use s3_utils::{ObjectRef, ObjectStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Transforming,
    Uploading,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` directly follows `self`; terminal states go nowhere
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, Fetching) | (Fetching, Transforming) | (Transforming, Uploading) => true,
            (Uploading, Succeeded) => true,
            (Fetching | Transforming | Uploading, Failed) => true,
            _ => false,
        }
    }
}

/// Tracks and logs state transitions of a single run
struct RunTracker<'a> {
    state: RunState,
    source: &'a ObjectRef,
}

impl<'a> RunTracker<'a> {
    fn new(source: &'a ObjectRef) -> Self {
        Self {
            state: RunState::Idle,
            source,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(source = %self.source, from = ?self.state, to = ?next, "Pipeline state transition");
        self.state = next;
    }

    fn fail(&mut self, failure: PipelineFailure) -> PipelineFailure {
        self.enter(RunState::Failed);
        warn!(
            source = %self.source,
            stage = %failure.stage,
            kind = ?failure.kind(),
            retryable = failure.is_retryable(),
            error = %failure.cause,
            "Thumbnail run failed"
        );
        failure
    }
}

/// Runs fetch -> transform -> upload against an explicitly supplied store.
///
/// Cheap to clone; clones share the store and processor and may run
/// concurrently.
#[derive(Clone)]
pub struct ThumbnailPipeline {
    store: Arc<dyn ObjectStore>,
    processor: Arc<ThumbnailProcessor>,
}

impl ThumbnailPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, config: ThumbnailConfig) -> Self {
        Self {
            store,
            processor: Arc::new(ThumbnailProcessor::new(config)),
        }
    }

    pub fn processor(&self) -> &ThumbnailProcessor {
        &self.processor
    }

    /// Run a validated job
    pub async fn run_job(&self, job: &ThumbnailJob) -> PipelineOutcome {
        self.run(&job.source, &job.destination, job.target).await
    }

    /// Generate the thumbnail of `source` at `target` size and write it to `destination`
    pub async fn run(
        &self,
        source: &ObjectRef,
        destination: &ObjectRef,
        target: Dimensions,
    ) -> PipelineOutcome {
        let mut tracker = RunTracker::new(source);

        info!(
            source = %source,
            destination = %destination,
            width = target.width(),
            height = target.height(),
            "Generating thumbnail"
        );

        tracker.enter(RunState::Fetching);
        let original = match self.store.get(source).await {
            Ok(data) => data,
            Err(e) => return Err(tracker.fail(PipelineFailure::new(PipelineStage::Fetch, e))),
        };
        debug!(source = %source, size = original.len(), "Original downloaded");

        tracker.enter(RunState::Transforming);
        let thumbnail = match self.processor.clone().generate_async(original, target).await {
            Ok(result) => result,
            Err(e) => {
                return Err(tracker.fail(PipelineFailure::new(PipelineStage::Transform, e)))
            }
        };
        let size = thumbnail.data.len();
        let content_type = thumbnail.content_type;

        tracker.enter(RunState::Uploading);
        if let Err(e) = self.store.put(destination, thumbnail.into()).await {
            return Err(tracker.fail(PipelineFailure::new(PipelineStage::Upload, e)));
        }

        tracker.enter(RunState::Succeeded);
        info!(
            source = %source,
            destination = %destination,
            content_type,
            size,
            "Thumbnail created successfully"
        );

        Ok(destination.clone())
    }
}

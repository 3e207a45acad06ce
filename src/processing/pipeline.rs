//! Drives an [`ImageFilter`] over a batch of images.
//!
//! Two strategies share one event contract:
//!
//! - **Parallel**: every image becomes its own blocking task. Each task
//!   reports as soon as it finishes and writes its result into a pre-sized
//!   slot addressed by input index, so the aggregate comes out in input order
//!   whatever the completion order was.
//! - **Sequential**: one image at a time, in input order. Each item's event is
//!   sent before the next item starts.
//!
//! Filter work runs on tokio's blocking pool so the async runtime is never
//! stalled by pixel loops. All events flow through one channel to the
//! [`JobHandle`], which gives the caller serialized delivery.

use std::sync::{Arc, OnceLock};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::core::{CancellationToken, Image, PipelineEvent, Strategy};
use crate::processing::{ImageFilter, JobHandle};
use crate::utils::FilterError;

/// Per-invocation record of one processing run.
struct Job {
    strategy: Strategy,
    items: Vec<Image>,
    token: CancellationToken,
}

/// Entry point for processing runs.
#[derive(Clone)]
pub struct Pipeline {
    filter: Arc<dyn ImageFilter>,
    max_parallel: Option<usize>,
}

impl Pipeline {
    pub fn new(filter: impl ImageFilter + 'static) -> Self {
        Self {
            filter: Arc::new(filter),
            max_parallel: None,
        }
    }

    /// Bound how many filters the parallel strategy runs at once.
    /// `None` dispatches every image immediately.
    pub fn with_max_parallel(mut self, limit: Option<usize>) -> Self {
        self.max_parallel = limit.map(|n| n.max(1));
        self
    }

    /// Start processing `images` with a fresh cancellation token.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, images: Vec<Image>, strategy: Strategy) -> JobHandle {
        self.start_with_token(images, strategy, CancellationToken::new())
    }

    /// Start processing `images`, observing `token` for cancellation.
    ///
    /// A token that is already cancelled is honored at the first checkpoint.
    pub fn start_with_token(
        &self,
        images: Vec<Image>,
        strategy: Strategy,
        token: CancellationToken,
    ) -> JobHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let total = images.len();
        let job = Job {
            strategy,
            items: images,
            token: token.clone(),
        };

        info!("Processing {} images ({})", total, strategy);

        let filter = Arc::clone(&self.filter);
        let max_parallel = self.max_parallel;
        let task = tokio::spawn(async move {
            match job.strategy {
                Strategy::Parallel => run_parallel(job, filter, max_parallel, tx).await,
                Strategy::Sequential => run_sequential(job, filter, tx).await,
            }
        });

        JobHandle::new(strategy, total, token, rx, task)
    }
}

/// Request cooperative cancellation of a running job.
pub fn cancel(handle: &JobHandle) {
    handle.cancel();
}

fn emit(events: &UnboundedSender<PipelineEvent>, event: PipelineEvent) {
    if events.send(event).is_err() {
        debug!("Event receiver dropped; discarding event");
    }
}

fn panicked(err: tokio::task::JoinError) -> FilterError {
    FilterError::application(format!("Filter task panicked: {err}"))
}

async fn run_parallel(
    job: Job,
    filter: Arc<dyn ImageFilter>,
    max_parallel: Option<usize>,
    events: UnboundedSender<PipelineEvent>,
) {
    let Job { items, token, .. } = job;
    let total = items.len();

    // One slot per input; each task is the only writer of its own slot.
    let slots: Arc<Vec<OnceLock<Image>>> = Arc::new((0..total).map(|_| OnceLock::new()).collect());
    let limiter = max_parallel.map(|n| Arc::new(Semaphore::new(n)));
    let mut dispatched = Vec::with_capacity(total);

    for (index, image) in items.into_iter().enumerate() {
        let permit = match &limiter {
            Some(semaphore) => match Arc::clone(semaphore).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    warn!("Failed to acquire filter slot: {}", e);
                    break;
                }
            },
            None => None,
        };

        if token.is_cancelled() {
            info!("Cancelled; {} of {} images dispatched", index, total);
            break;
        }

        let filter = Arc::clone(&filter);
        let slots = Arc::clone(&slots);
        let events = events.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = filter.apply(&image);
            match &result {
                Ok(output) => {
                    let _ = slots[index].set(output.clone());
                    debug!("Image {} filtered", index);
                }
                Err(e) => warn!("Image {} failed: {}", index, e),
            }
            emit(&events, PipelineEvent::ItemCompleted { index, result });
        });
        dispatched.push((index, handle));
    }

    // Join barrier: every dispatched image has reported before the aggregate.
    for (index, handle) in dispatched {
        if let Err(e) = handle.await {
            warn!("Image {} task did not finish: {}", index, e);
            emit(&events, PipelineEvent::ItemCompleted { index, result: Err(panicked(e)) });
        }
    }

    if token.is_cancelled() {
        emit(&events, PipelineEvent::BatchCancelled { processed: None });
        return;
    }

    let processed: Vec<Image> = slots.iter().filter_map(|slot| slot.get().cloned()).collect();
    if processed.len() < total {
        warn!(
            "Batch processing completed with {} failed images out of {}",
            total - processed.len(),
            total
        );
    } else {
        info!("Batch processing completed successfully: {} images processed", total);
    }
    emit(&events, PipelineEvent::BatchCompleted { processed });
}

async fn run_sequential(
    job: Job,
    filter: Arc<dyn ImageFilter>,
    events: UnboundedSender<PipelineEvent>,
) {
    let Job { items, token, .. } = job;
    let total = items.len();
    let mut processed = Vec::with_capacity(total);

    for (index, image) in items.into_iter().enumerate() {
        if token.is_cancelled() {
            info!("Cancelled after {} of {} images", index, total);
            emit(&events, PipelineEvent::BatchCancelled { processed: Some(processed) });
            return;
        }

        let filter = Arc::clone(&filter);
        let result = tokio::task::spawn_blocking(move || filter.apply(&image))
            .await
            .unwrap_or_else(|e| Err(panicked(e)));

        match &result {
            Ok(output) => {
                debug!("Image {}/{} filtered", index + 1, total);
                processed.push(output.clone());
            }
            Err(e) => warn!("Image {} failed: {}", index, e),
        }
        emit(&events, PipelineEvent::ItemCompleted { index, result });
    }

    info!("Sequential run finished: {}/{} images processed", processed.len(), total);
    emit(&events, PipelineEvent::BatchCompleted { processed });
}

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::core::{CancellationToken, PipelineEvent, PipelineObserver, Strategy};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Cancelled,
}

/// Handle to a running processing job.
///
/// Owns the only receiver of the job's events, so whoever drains it gets
/// them one at a time.
#[derive(Debug)]
pub struct JobHandle {
    strategy: Strategy,
    total: usize,
    token: CancellationToken,
    events: UnboundedReceiver<PipelineEvent>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub(crate) fn new(
        strategy: Strategy,
        total: usize,
        token: CancellationToken,
        events: UnboundedReceiver<PipelineEvent>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            strategy,
            total,
            token,
            events,
            task,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of images in the job
    pub fn total(&self) -> usize {
        self.total
    }

    /// A clone of the job's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request cooperative cancellation. Items already running still report.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Next event, or `None` once the terminal event has been taken.
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// Deliver every remaining event to `observer` and report how the run ended.
    pub async fn drive<O: PipelineObserver + ?Sized>(mut self, observer: &mut O) -> BatchOutcome {
        let mut outcome = BatchOutcome::Cancelled;
        while let Some(event) = self.events.recv().await {
            match &event {
                PipelineEvent::BatchCompleted { .. } => outcome = BatchOutcome::Completed,
                PipelineEvent::BatchCancelled { .. } => outcome = BatchOutcome::Cancelled,
                PipelineEvent::ItemCompleted { .. } => {}
            }
            event.dispatch(observer);
        }
        self.join().await;
        outcome
    }

    /// Gather every remaining event in delivery order.
    pub async fn collect(mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        self.join().await;
        events
    }

    async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("Processing job ended abnormally: {}", e);
        }
    }
}

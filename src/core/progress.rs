use serde::Serialize;
use crate::core::Image;
use crate::utils::{FilterError, TimingError};

/// Event emitted by a processing job.
///
/// Events are delivered through a single channel, so an observer never sees
/// two of them at once even when the work runs concurrently.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// One image resolved. `index` is its position in the input.
    ItemCompleted {
        index: usize,
        result: Result<Image, FilterError>,
    },
    /// Every item resolved. Successful results in input order; failures omitted.
    BatchCompleted { processed: Vec<Image> },
    /// Cancellation was observed before the run finished.
    ///
    /// Sequential runs carry the in-order successes gathered so far. Parallel
    /// runs carry `None`: their aggregate update is suppressed.
    BatchCancelled { processed: Option<Vec<Image>> },
}

/// Event emitted by the progress simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatorEvent {
    Step { step: usize, total: usize },
    Cancelled,
    Finished,
    Failed(TimingError),
}

/// Receiver of pipeline events.
pub trait PipelineObserver {
    fn on_item_completed(&mut self, index: usize, result: Result<Image, FilterError>);

    fn on_batch_completed(&mut self, processed: Vec<Image>);

    fn on_batch_cancelled(&mut self, _processed: Option<Vec<Image>>) {}
}

/// Receiver of simulator events.
pub trait ProgressObserver {
    fn on_progress_step(&mut self, step: usize, total: usize);

    fn on_progress_cancelled(&mut self);

    fn on_progress_finished(&mut self);

    fn on_progress_failed(&mut self, _error: TimingError) {
        self.on_progress_cancelled();
    }
}

impl PipelineEvent {
    /// True for the single event that ends a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::ItemCompleted { .. })
    }

    pub fn dispatch<O: PipelineObserver + ?Sized>(self, observer: &mut O) {
        match self {
            Self::ItemCompleted { index, result } => observer.on_item_completed(index, result),
            Self::BatchCompleted { processed } => observer.on_batch_completed(processed),
            Self::BatchCancelled { processed } => observer.on_batch_cancelled(processed),
        }
    }

    /// Serializable summary used for machine-readable output.
    pub fn to_record(&self) -> EventRecord {
        match self {
            Self::ItemCompleted { index, result: Ok(image) } => EventRecord {
                index: Some(*index),
                width: Some(image.width()),
                height: Some(image.height()),
                ..EventRecord::new(EventType::ItemCompleted)
            },
            Self::ItemCompleted { index, result: Err(error) } => EventRecord {
                index: Some(*index),
                error: Some(error.to_string()),
                ..EventRecord::new(EventType::ItemFailed)
            },
            Self::BatchCompleted { processed } => EventRecord {
                processed: Some(processed.len()),
                ..EventRecord::new(EventType::BatchCompleted)
            },
            Self::BatchCancelled { processed } => EventRecord {
                processed: processed.as_ref().map(Vec::len),
                ..EventRecord::new(EventType::BatchCancelled)
            },
        }
    }
}

impl SimulatorEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Step { .. })
    }

    pub fn dispatch<O: ProgressObserver + ?Sized>(self, observer: &mut O) {
        match self {
            Self::Step { step, total } => observer.on_progress_step(step, total),
            Self::Cancelled => observer.on_progress_cancelled(),
            Self::Finished => observer.on_progress_finished(),
            Self::Failed(error) => observer.on_progress_failed(error),
        }
    }

    pub fn to_record(&self) -> EventRecord {
        match self {
            Self::Step { step, total } => EventRecord {
                step: Some(*step),
                total: Some(*total),
                progress_percentage: Some(if *total > 0 { step * 100 / total } else { 0 }),
                ..EventRecord::new(EventType::ProgressStep)
            },
            Self::Cancelled => EventRecord::new(EventType::ProgressCancelled),
            Self::Finished => EventRecord::new(EventType::ProgressFinished),
            Self::Failed(error) => EventRecord {
                error: Some(error.to_string()),
                ..EventRecord::new(EventType::ProgressFailed)
            },
        }
    }
}

/// Event type tag for [`EventRecord`]
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    ItemCompleted,
    ItemFailed,
    BatchCompleted,
    BatchCancelled,
    ProgressStep,
    ProgressCancelled,
    ProgressFinished,
    ProgressFailed,
}

/// Flat, serializable form of a pipeline or simulator event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Number of images in the aggregate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// Progress percentage (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventRecord {
    fn new(event: EventType) -> Self {
        Self {
            event,
            index: None,
            width: None,
            height: None,
            processed: None,
            step: None,
            total: None,
            progress_percentage: None,
            error: None,
        }
    }
}

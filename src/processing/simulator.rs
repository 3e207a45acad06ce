//! A fixed-length timed countdown with cooperative cancellation.
//!
//! Independent of the pipeline: both may run at the same time, and cancelling
//! one does not touch the other unless the caller shares a token.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::core::{CancellationToken, ProgressObserver, SimulatorEvent};
use crate::utils::TimingError;

pub const DEFAULT_STEPS: usize = 20;
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct ProgressSimulator {
    total_steps: usize,
    interval: Duration,
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS, DEFAULT_STEP_INTERVAL)
    }
}

impl ProgressSimulator {
    pub fn new(total_steps: usize, interval: Duration) -> Self {
        Self {
            total_steps,
            interval,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Run the countdown on a new task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, token: CancellationToken) -> SimulatorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let simulator = *self;
        let task = tokio::spawn({
            let token = token.clone();
            async move { simulator.run(token, tx).await }
        });
        SimulatorHandle {
            token,
            events: rx,
            task,
        }
    }

    async fn run(self, token: CancellationToken, events: UnboundedSender<SimulatorEvent>) {
        let emit = |event: SimulatorEvent| {
            if events.send(event).is_err() {
                debug!("Simulator receiver dropped");
            }
        };

        for step in 1..=self.total_steps {
            if token.is_cancelled() {
                info!("Simulation cancelled after {} of {} steps", step - 1, self.total_steps);
                emit(SimulatorEvent::Cancelled);
                return;
            }

            let Some(deadline) = Instant::now().checked_add(self.interval) else {
                let error = TimingError::DeadlineOverflow {
                    step,
                    interval_ms: self.interval.as_millis(),
                };
                warn!("Simulation failed: {}", error);
                emit(SimulatorEvent::Failed(error));
                return;
            };

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Simulation cancelled after {} of {} steps", step - 1, self.total_steps);
                    emit(SimulatorEvent::Cancelled);
                    return;
                }
                _ = sleep_until(deadline) => {}
            }

            debug!("Step {} of {}", step, self.total_steps);
            emit(SimulatorEvent::Step {
                step,
                total: self.total_steps,
            });
        }

        info!("Simulation finished");
        emit(SimulatorEvent::Finished);
    }
}

/// Handle to a running simulation.
#[derive(Debug)]
pub struct SimulatorHandle {
    token: CancellationToken,
    events: UnboundedReceiver<SimulatorEvent>,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn next_event(&mut self) -> Option<SimulatorEvent> {
        self.events.recv().await
    }

    /// Deliver every remaining event to `observer`; returns the terminal event.
    pub async fn drive<O: ProgressObserver + ?Sized>(mut self, observer: &mut O) -> Option<SimulatorEvent> {
        let mut last = None;
        while let Some(event) = self.events.recv().await {
            if event.is_terminal() {
                last = Some(event.clone());
            }
            event.dispatch(observer);
        }
        if let Err(e) = self.task.await {
            warn!("Simulation task ended abnormally: {}", e);
        }
        last
    }

    pub async fn collect(mut self) -> Vec<SimulatorEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }
}

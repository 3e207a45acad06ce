//! Terminal rendering of pipeline and simulator events.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::core::{
    EventRecord, Image, PipelineEvent, PipelineObserver, ProgressObserver, SimulatorEvent,
};
use crate::utils::{FilterError, TimingError};

/// Renders events either as progress bars on stderr or as JSON lines on stdout.
pub struct Presenter {
    mode: Mode,
    total: usize,
    failed: usize,
}

enum Mode {
    Json,
    Bars {
        multi: MultiProgress,
        images: ProgressBar,
        steps: Option<ProgressBar>,
    },
}

impl Presenter {
    /// JSON lines on stdout.
    pub fn json(total: usize) -> Self {
        Self {
            mode: Mode::Json,
            total,
            failed: 0,
        }
    }

    /// Progress bars for `total` images and, if given, a simulated step count.
    pub fn bars(total: usize, steps: Option<usize>) -> Self {
        let multi = MultiProgress::new();

        let images = multi.add(ProgressBar::new(total as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} images [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            images.set_style(style.progress_chars("#>-"));
        }

        let steps = steps.map(|total_steps| {
            let bar = multi.add(ProgressBar::new(total_steps as u64));
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.yellow} steps  [{bar:30.yellow/white}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar
        });

        Self {
            mode: Mode::Bars {
                multi,
                images,
                steps,
            },
            total,
            failed: 0,
        }
    }

    /// Number of images that reported an error so far
    pub fn failed(&self) -> usize {
        self.failed
    }

    fn print_json(record: EventRecord) {
        match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("warning: cannot serialize event: {e}"),
        }
    }

    fn report_error(&self, message: String) {
        match &self.mode {
            Mode::Json => eprintln!("error: {message}"),
            Mode::Bars { multi, .. } => multi.suspend(|| eprintln!("error: {message}")),
        }
    }
}

impl PipelineObserver for Presenter {
    fn on_item_completed(&mut self, index: usize, result: Result<Image, FilterError>) {
        if let Err(e) = &result {
            self.failed += 1;
            self.report_error(format!("image {index}: {e}"));
        }
        match &self.mode {
            Mode::Json => Self::print_json(PipelineEvent::ItemCompleted { index, result }.to_record()),
            Mode::Bars { images, .. } => {
                images.inc(1);
                images.set_message(format!("#{index}"));
            }
        }
    }

    fn on_batch_completed(&mut self, processed: Vec<Image>) {
        match &self.mode {
            Mode::Json => Self::print_json(PipelineEvent::BatchCompleted { processed }.to_record()),
            Mode::Bars { images, .. } => images.finish_with_message(format!(
                "done: {} processed, {} failed of {}",
                processed.len(),
                self.failed,
                self.total
            )),
        }
    }

    fn on_batch_cancelled(&mut self, processed: Option<Vec<Image>>) {
        match &self.mode {
            Mode::Json => Self::print_json(PipelineEvent::BatchCancelled { processed }.to_record()),
            Mode::Bars { images, .. } => images.abandon_with_message("cancelled"),
        }
    }
}

impl ProgressObserver for Presenter {
    fn on_progress_step(&mut self, step: usize, total: usize) {
        match &self.mode {
            Mode::Json => Self::print_json(SimulatorEvent::Step { step, total }.to_record()),
            Mode::Bars { steps: Some(bar), .. } => {
                bar.set_position(step as u64);
                bar.set_message(format!("calculation {step} of {total}"));
            }
            Mode::Bars { steps: None, .. } => {}
        }
    }

    fn on_progress_cancelled(&mut self) {
        match &self.mode {
            Mode::Json => Self::print_json(SimulatorEvent::Cancelled.to_record()),
            Mode::Bars { steps: Some(bar), .. } => bar.abandon_with_message("calculations cancelled"),
            Mode::Bars { steps: None, .. } => {}
        }
    }

    fn on_progress_finished(&mut self) {
        match &self.mode {
            Mode::Json => Self::print_json(SimulatorEvent::Finished.to_record()),
            Mode::Bars { steps: Some(bar), .. } => bar.finish_with_message("calculations finished"),
            Mode::Bars { steps: None, .. } => {}
        }
    }

    fn on_progress_failed(&mut self, error: TimingError) {
        self.report_error(format!("calculation failed: {error}"));
        match &self.mode {
            Mode::Json => Self::print_json(SimulatorEvent::Failed(error).to_record()),
            Mode::Bars { steps: Some(bar), .. } => bar.abandon_with_message("calculations failed"),
            Mode::Bars { steps: None, .. } => {}
        }
    }
}

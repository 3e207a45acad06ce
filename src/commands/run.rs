//! Runs the pipeline and the simulator side by side and renders their events.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::commands::presenter::Presenter;
use crate::commands::{Cli, ExitCode};
use crate::core::{
    CancellationToken, Image, ImageSource, PipelineEvent, PipelineObserver, SimulatorEvent,
    bundled_names,
};
use crate::processing::{
    BatchOutcome, ColorFilter, FilterSelection, Pipeline, ProgressSimulator, SimulatorHandle,
};
use crate::utils::{AppError, AssetFormat, FilterError, create_dir_all, processed_file_name};

/// Load the bundled images, process them and wait for the simulator.
///
/// Ctrl-C cancels both the pipeline and the simulator. Events from both are
/// consumed on this task, one at a time.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.resolve_config().context("invalid configuration")?;

    let selection: FilterSelection = config
        .pipeline
        .filter
        .parse()
        .map_err(AppError::from)
        .context("invalid filter")?;

    let mut source = ImageSource::load_bundled(&config.assets.dir, bundled_names(config.assets.count))
        .context("cannot load bundled images")?;
    if source.is_empty() {
        warn!("No bundled images found in {}", config.assets.dir.display());
    }

    let job_token = CancellationToken::new();
    let sim_token = CancellationToken::new();
    let interrupt = tokio::spawn({
        let (job_token, sim_token) = (job_token.clone(), sim_token.clone());
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Cancellation requested");
                job_token.cancel();
                sim_token.cancel();
            }
        }
    });

    let simulator = ProgressSimulator::new(config.simulator.steps, config.simulator.step_interval());
    let mut presenter = if cli.json {
        Presenter::json(source.len())
    } else {
        Presenter::bars(
            source.len(),
            config.simulator.enabled.then_some(simulator.total_steps()),
        )
    };

    let filter = ColorFilter::new(selection);
    debug!("Filter selection: {:?}", filter.selection());
    let pipeline = Pipeline::new(filter).with_max_parallel(config.pipeline.max_parallel);
    let mut job = pipeline.start_with_token(source.images().to_vec(), config.pipeline.strategy, job_token);
    debug!("Started {} job over {} images", job.strategy(), job.total());
    let mut simulation: Option<SimulatorHandle> =
        config.simulator.enabled.then(|| simulator.spawn(sim_token));

    let mut outputs = IndexedOutputs::default();
    let mut outcome = BatchOutcome::Cancelled;
    let mut job_done = false;
    let mut sim_done = simulation.is_none();

    while !(job_done && sim_done) {
        tokio::select! {
            event = job.next_event(), if !job_done => match event {
                Some(event) => {
                    if matches!(event, PipelineEvent::BatchCompleted { .. }) {
                        outcome = BatchOutcome::Completed;
                    }
                    event.clone().dispatch(&mut source);
                    event.clone().dispatch(&mut outputs);
                    event.dispatch(&mut presenter);
                }
                None => job_done = true,
            },
            event = next_simulator_event(&mut simulation), if !sim_done => match event {
                Some(event) => event.dispatch(&mut presenter),
                None => sim_done = true,
            },
        }
    }
    interrupt.abort();

    debug!(
        "Run finished: {:?}, {} kept, {} failed images",
        outcome,
        source.processed().len(),
        presenter.failed()
    );

    if let Some(dir) = &config.assets.output_dir {
        let unsaved = save_processed(dir, &outputs.into_sorted()).await?;
        if unsaved > 0 {
            return Ok(ExitCode::Error);
        }
    }

    Ok(match outcome {
        BatchOutcome::Completed => ExitCode::Success,
        BatchOutcome::Cancelled => ExitCode::Cancelled,
    })
}

/// Successful results keyed by input index, kept under the same rule as
/// [`ImageSource`]: a cancelled run without a prefix keeps nothing.
#[derive(Debug, Default)]
struct IndexedOutputs {
    images: Vec<(usize, Image)>,
}

impl IndexedOutputs {
    fn into_sorted(mut self) -> Vec<(usize, Image)> {
        self.images.sort_unstable_by_key(|(index, _)| *index);
        self.images
    }
}

impl PipelineObserver for IndexedOutputs {
    fn on_item_completed(&mut self, index: usize, result: Result<Image, FilterError>) {
        if let Ok(image) = result {
            self.images.push((index, image));
        }
    }

    fn on_batch_completed(&mut self, _processed: Vec<Image>) {}

    fn on_batch_cancelled(&mut self, processed: Option<Vec<Image>>) {
        if processed.is_none() {
            self.images.clear();
        }
    }
}

async fn next_simulator_event(simulation: &mut Option<SimulatorHandle>) -> Option<SimulatorEvent> {
    match simulation {
        Some(handle) => handle.next_event().await,
        None => None,
    }
}

/// Write each processed image as `processed_<input index>.png` into `dir`.
///
/// Returns how many images could not be written; each one is reported on stderr.
async fn save_processed(dir: &Path, images: &[(usize, Image)]) -> Result<usize> {
    create_dir_all(dir).await?;

    let mut unsaved = 0;
    for (index, image) in images {
        let path = dir.join(processed_file_name(*index));
        let image = image.clone();
        let target = path.clone();
        let saved = tokio::task::spawn_blocking(move || {
            image.save_with_format(&target, AssetFormat::PNG.to_image_format())
        })
        .await
        .context("image save task panicked")?;

        match saved {
            Ok(()) => debug!("Saved {}", path.display()),
            Err(e) => {
                unsaved += 1;
                let err = AppError::image(&path, e);
                warn!("{}", err);
                eprintln!("error: cannot save image {index}: {err}");
            }
        }
    }

    info!(
        "Wrote {} of {} processed images to {}",
        images.len() - unsaved,
        images.len(),
        dir.display()
    );
    Ok(unsaved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn image(width: u32) -> Image {
        Image::new(DynamicImage::new_rgb8(width, 1))
    }

    #[test]
    fn outputs_keep_input_indices_around_failures() {
        let mut outputs = IndexedOutputs::default();
        PipelineEvent::ItemCompleted { index: 2, result: Ok(image(3)) }.dispatch(&mut outputs);
        PipelineEvent::ItemCompleted { index: 0, result: Err(FilterError::application("bad")) }
            .dispatch(&mut outputs);
        PipelineEvent::ItemCompleted { index: 1, result: Ok(image(2)) }.dispatch(&mut outputs);
        PipelineEvent::BatchCompleted { processed: vec![image(2), image(3)] }.dispatch(&mut outputs);

        let indices: Vec<_> = outputs.into_sorted().into_iter().map(|(i, img)| (i, img.width())).collect();
        assert_eq!(indices, [(1, 2), (2, 3)]);
    }

    #[test]
    fn cancelled_parallel_run_keeps_no_outputs() {
        let mut outputs = IndexedOutputs::default();
        PipelineEvent::ItemCompleted { index: 0, result: Ok(image(1)) }.dispatch(&mut outputs);
        PipelineEvent::BatchCancelled { processed: None }.dispatch(&mut outputs);
        assert!(outputs.into_sorted().is_empty());

        let mut outputs = IndexedOutputs::default();
        PipelineEvent::ItemCompleted { index: 0, result: Ok(image(1)) }.dispatch(&mut outputs);
        PipelineEvent::BatchCancelled { processed: Some(vec![image(1)]) }.dispatch(&mut outputs);
        assert_eq!(outputs.into_sorted().len(), 1);
    }

    #[tokio::test]
    async fn saved_files_are_named_after_input_index() {
        let dir = tempfile::tempdir().unwrap();
        let unsaved = save_processed(dir.path(), &[(1, image(2)), (3, image(4))]).await.unwrap();

        assert_eq!(unsaved, 0);
        assert!(!dir.path().join("processed_0.png").exists());
        assert!(dir.path().join("processed_1.png").exists());
        assert!(dir.path().join("processed_3.png").exists());
    }

    #[tokio::test]
    async fn unwritable_image_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("processed_0.png")).unwrap();

        let unsaved = save_processed(dir.path(), &[(0, image(1)), (1, image(2))]).await.unwrap();

        assert_eq!(unsaved, 1);
        assert!(dir.path().join("processed_1.png").exists());
    }
}

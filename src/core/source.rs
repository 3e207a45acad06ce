//! The ordered set of input images and their processed counterparts.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::{Image, PipelineObserver};
use crate::utils::{AppResult, FilterError, find_asset, format_from_extension, validate_asset_dir};

/// Number of bundled assets looked up by default (`Image1` .. `Image10`).
pub const DEFAULT_BUNDLED_COUNT: usize = 10;

/// Names of the bundled assets, `Image1` through `Image{count}`.
pub fn bundled_names(count: usize) -> impl Iterator<Item = String> {
    (1..=count).map(|i| format!("Image{i}"))
}

/// Input images in display order, plus the processed images of the last run.
///
/// `processed` never holds more images than `images`.
#[derive(Debug, Clone, Default)]
pub struct ImageSource {
    images: Vec<Image>,
    processed: Vec<Image>,
}

impl ImageSource {
    pub fn from_images(images: Vec<Image>) -> Self {
        Self {
            images,
            processed: Vec::new(),
        }
    }

    /// Load bundled assets from `dir` in the order of `names`.
    ///
    /// Names with no matching file are skipped; files that fail to decode are
    /// skipped with a warning.
    pub fn load_bundled<I, S>(dir: impl AsRef<Path>, names: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dir = dir.as_ref();
        validate_asset_dir(dir)?;

        let mut source = Self::default();
        for name in names {
            let name = name.as_ref();
            let Some(path) = find_asset(dir, name) else {
                debug!("No asset named '{}' in {}", name, dir.display());
                continue;
            };

            match image::open(&path) {
                Ok(decoded) => {
                    debug!(
                        "Loaded '{}' ({:?}): {}×{}",
                        name,
                        format_from_extension(&path).ok(),
                        decoded.width(),
                        decoded.height()
                    );
                    source.push(Image::new(decoded));
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} bundled images from {}", source.len(), dir.display());
        Ok(source)
    }

    pub fn push(&mut self, image: Image) {
        self.images.push(image);
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn processed(&self) -> &[Image] {
        &self.processed
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Replace the processed images with the outcome of a run.
    pub fn set_processed(&mut self, mut processed: Vec<Image>) {
        if processed.len() > self.images.len() {
            warn!(
                "Dropping {} processed images beyond the {} inputs",
                processed.len() - self.images.len(),
                self.images.len()
            );
            processed.truncate(self.images.len());
        }
        self.processed = processed;
    }
}

impl PipelineObserver for ImageSource {
    fn on_item_completed(&mut self, index: usize, result: Result<Image, FilterError>) {
        if let Err(e) = result {
            debug!("Image {} left unprocessed: {}", index, e);
        }
    }

    fn on_batch_completed(&mut self, processed: Vec<Image>) {
        self.set_processed(processed);
    }

    fn on_batch_cancelled(&mut self, processed: Option<Vec<Image>>) {
        if let Some(processed) = processed {
            self.set_processed(processed);
        }
    }
}

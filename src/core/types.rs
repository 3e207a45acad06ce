//! Core types shared by the filter, the pipeline and the front end.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

/// A decoded raster image.
///
/// Cloning is cheap: the pixel buffer is shared, so the same result can be
/// handed to an item event and kept for the batch aggregate.
#[derive(Debug, Clone)]
pub struct Image(Arc<DynamicImage>);

impl Image {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    /// Borrow the underlying `image` crate buffer.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.0
    }

    /// Whether both handles point at the same pixel buffer.
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Image {
    type Target = DynamicImage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Execution strategy for a processing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One concurrent unit of work per image, joined at the end
    #[default]
    Parallel,
    /// One image at a time, in input order
    Sequential,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parallel => f.write_str("parallel"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            other => Err(AppError::config(format!(
                "Unknown strategy '{other}', expected 'parallel' or 'sequential'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Sequential".parse::<Strategy>().unwrap(), Strategy::Sequential);
        assert_eq!("PARALLEL".parse::<Strategy>().unwrap(), Strategy::Parallel);
        assert!("serial".parse::<Strategy>().is_err());
    }

    #[test]
    fn image_clones_share_pixels() {
        let image = Image::new(DynamicImage::new_rgba8(2, 3));
        let copy = image.clone();
        assert!(image.ptr_eq(&copy));
        assert_eq!((copy.width(), copy.height()), (2, 3));
    }
}

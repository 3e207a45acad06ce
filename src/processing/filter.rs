//! Color transforms applied to one image at a time.
//!
//! [`ColorFilter`] is the stock [`ImageFilter`]: either a fixed transform or a
//! per-image random pick from a set. Each call is pure; the input image is
//! never modified.

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GenericImageView, Rgba};
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::core::Image;
use crate::utils::FilterError;

/// Something that turns one image into a filtered copy.
pub trait ImageFilter: Send + Sync {
    fn apply(&self, image: &Image) -> Result<Image, FilterError>;
}

impl<F> ImageFilter for F
where
    F: Fn(&Image) -> Result<Image, FilterError> + Send + Sync,
{
    fn apply(&self, image: &Image) -> Result<Image, FilterError> {
        self(image)
    }
}

/// A single color transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    Invert,
    Grayscale,
    Sepia,
    /// Gaussian blur with the given sigma
    Blur(f32),
    /// Add to every channel, clamped
    Brighten(i32),
    /// Rotate hue by degrees
    HueRotate(i32),
    /// Contrast adjustment; negative values reduce contrast
    Contrast(f32),
}

impl FilterKind {
    /// The transforms `random` picks from.
    pub const PALETTE: [FilterKind; 7] = [
        Self::Invert,
        Self::Grayscale,
        Self::Sepia,
        Self::Blur(2.0),
        Self::Brighten(40),
        Self::HueRotate(90),
        Self::Contrast(30.0),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Invert => "invert",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Blur(_) => "blur",
            Self::Brighten(_) => "brighten",
            Self::HueRotate(_) => "huerotate",
            Self::Contrast(_) => "contrast",
        }
    }

    /// Check the parameters can produce a transform.
    pub fn validate(&self) -> Result<(), FilterError> {
        match *self {
            Self::Blur(sigma) if !sigma.is_finite() || sigma <= 0.0 => Err(FilterError::creation(
                format!("blur sigma must be a positive number, got {sigma}"),
            )),
            Self::Contrast(c) if !c.is_finite() => Err(FilterError::creation(format!(
                "contrast must be a finite number, got {c}"
            ))),
            _ => Ok(()),
        }
    }

    fn transform(&self, source: &DynamicImage) -> DynamicImage {
        match *self {
            Self::Invert => {
                let mut out = source.clone();
                out.invert();
                out
            }
            Self::Grayscale => source.grayscale(),
            Self::Sepia => sepia(source),
            Self::Blur(sigma) => source.blur(sigma),
            Self::Brighten(value) => source.brighten(value),
            Self::HueRotate(degrees) => source.huerotate(degrees),
            Self::Contrast(c) => source.adjust_contrast(c),
        }
    }

    /// Apply this transform to `image`.
    pub fn apply_to(&self, image: &Image) -> Result<Image, FilterError> {
        self.validate()?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FilterError::application(format!(
                "{} cannot process a {width}×{height} image",
                self.name()
            )));
        }

        let output = self.transform(image.as_dynamic());
        if output.width() == 0 || output.height() == 0 {
            return Err(FilterError::application(format!(
                "{} produced an empty image",
                self.name()
            )));
        }

        Ok(Image::new(output))
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blur(v) | Self::Contrast(v) => write!(f, "{}:{}", self.name(), v),
            Self::Brighten(v) | Self::HueRotate(v) => write!(f, "{}:{}", self.name(), v),
            _ => f.write_str(self.name()),
        }
    }
}

/// Parses `name` or `name:param`, e.g. `blur:3.5`. `CIColorInvert` is accepted
/// as an alias for `invert`.
impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, param) = match s.trim().split_once(':') {
            Some((name, param)) => (name.trim(), Some(param.trim())),
            None => (s.trim(), None),
        };

        fn parse<T: FromStr>(name: &str, param: &str) -> Result<T, FilterError> {
            param
                .parse()
                .map_err(|_| FilterError::creation(format!("invalid parameter '{param}' for {name}")))
        }

        let kind = match (name.to_lowercase().as_str(), param) {
            ("invert" | "cicolorinvert", None) => Self::Invert,
            ("grayscale" | "greyscale", None) => Self::Grayscale,
            ("sepia", None) => Self::Sepia,
            ("blur", None) => Self::Blur(2.0),
            ("blur", Some(p)) => Self::Blur(parse(name, p)?),
            ("brighten", None) => Self::Brighten(40),
            ("brighten", Some(p)) => Self::Brighten(parse(name, p)?),
            ("huerotate", None) => Self::HueRotate(90),
            ("huerotate", Some(p)) => Self::HueRotate(parse(name, p)?),
            ("contrast", None) => Self::Contrast(30.0),
            ("contrast", Some(p)) => Self::Contrast(parse(name, p)?),
            (other, Some(_)) if ["invert", "cicolorinvert", "grayscale", "greyscale", "sepia"].contains(&other) => {
                return Err(FilterError::creation(format!("{name} takes no parameter")));
            }
            _ => return Err(FilterError::creation(format!("unknown filter '{name}'"))),
        };

        kind.validate()?;
        Ok(kind)
    }
}

/// Which transform a [`ColorFilter`] applies.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSelection {
    Fixed(FilterKind),
    /// Pick uniformly among these for every image
    Random(Vec<FilterKind>),
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::Fixed(FilterKind::Invert)
    }
}

/// Parses `random`, a single filter, or a comma separated list to pick from.
impl FromStr for FilterSelection {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            return Ok(Self::Random(FilterKind::PALETTE.to_vec()));
        }

        let kinds = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(FilterKind::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        match kinds.as_slice() {
            [] => Err(FilterError::creation("no filter named")),
            [kind] => Ok(Self::Fixed(*kind)),
            _ => Ok(Self::Random(kinds)),
        }
    }
}

/// The stock filter used by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ColorFilter {
    selection: FilterSelection,
}

impl ColorFilter {
    pub fn new(selection: FilterSelection) -> Self {
        Self { selection }
    }

    pub fn fixed(kind: FilterKind) -> Self {
        Self::new(FilterSelection::Fixed(kind))
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    fn pick(&self) -> Result<FilterKind, FilterError> {
        match &self.selection {
            FilterSelection::Fixed(kind) => Ok(*kind),
            FilterSelection::Random(kinds) => kinds
                .choose(&mut rand::rng())
                .copied()
                .ok_or_else(|| FilterError::creation("random filter set is empty")),
        }
    }
}

impl ImageFilter for ColorFilter {
    fn apply(&self, image: &Image) -> Result<Image, FilterError> {
        let kind = self.pick()?;
        debug!("Applying {} to {}×{} image", kind, image.width(), image.height());
        kind.apply_to(image)
    }
}

fn sepia(source: &DynamicImage) -> DynamicImage {
    let mut rgba = source.to_rgba8();
    for Rgba([r, g, b, _]) in rgba.pixels_mut() {
        let (fr, fg, fb) = (*r as f32, *g as f32, *b as f32);
        *r = (0.393 * fr + 0.769 * fg + 0.189 * fb).min(255.0) as u8;
        *g = (0.349 * fr + 0.686 * fg + 0.168 * fb).min(255.0) as u8;
        *b = (0.272 * fr + 0.534 * fg + 0.131 * fb).min(255.0) as u8;
    }
    DynamicImage::ImageRgba8(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn sample() -> Image {
        let mut buffer = RgbaImage::new(4, 2);
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 60) as u8, (y * 100) as u8, 200, 255]);
        }
        Image::new(DynamicImage::ImageRgba8(buffer))
    }

    #[test]
    fn invert_flips_color_channels_and_keeps_alpha() {
        let source = sample();
        let inverted = FilterKind::Invert.apply_to(&source).unwrap();

        let before = source.to_rgba8();
        let after = inverted.to_rgba8();
        for (a, b) in before.pixels().zip(after.pixels()) {
            assert_eq!(b[0], 255 - a[0]);
            assert_eq!(b[1], 255 - a[1]);
            assert_eq!(b[2], 255 - a[2]);
            assert_eq!(b[3], a[3]);
        }
    }

    #[test]
    fn invert_twice_restores_the_input() {
        let source = sample();
        let twice = FilterKind::Invert
            .apply_to(&FilterKind::Invert.apply_to(&source).unwrap())
            .unwrap();
        assert_eq!(twice.to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn input_is_left_untouched() {
        let source = sample();
        let snapshot = source.to_rgba8();
        let _ = ColorFilter::fixed(FilterKind::Sepia).apply(&source).unwrap();
        assert_eq!(source.to_rgba8(), snapshot);
    }

    #[test]
    fn every_palette_entry_preserves_dimensions() {
        let source = sample();
        for kind in FilterKind::PALETTE {
            let out = kind.apply_to(&source).unwrap();
            assert_eq!(out.dimensions(), (4, 2), "{kind}");
        }
    }

    #[test]
    fn zero_extent_input_is_an_application_error() {
        let empty = Image::new(DynamicImage::new_rgba8(0, 5));
        let err = ColorFilter::default().apply(&empty).unwrap_err();
        assert!(matches!(err, FilterError::Application(_)));
    }

    #[test]
    fn bad_parameters_are_creation_errors() {
        assert!(matches!(FilterKind::Blur(-1.0).apply_to(&sample()), Err(FilterError::Creation(_))));
        assert!(matches!("blur:0".parse::<FilterKind>(), Err(FilterError::Creation(_))));
        assert!(matches!("contrast:abc".parse::<FilterKind>(), Err(FilterError::Creation(_))));
        assert!(matches!("sepia:2".parse::<FilterKind>(), Err(FilterError::Creation(_))));
        assert!(matches!("warp".parse::<FilterKind>(), Err(FilterError::Creation(_))));
    }

    #[test]
    fn names_and_aliases_parse() {
        assert_eq!("CIColorInvert".parse::<FilterKind>().unwrap(), FilterKind::Invert);
        assert_eq!("greyscale".parse::<FilterKind>().unwrap(), FilterKind::Grayscale);
        assert_eq!("blur:3.5".parse::<FilterKind>().unwrap(), FilterKind::Blur(3.5));
        assert_eq!(FilterKind::HueRotate(45).to_string(), "huerotate:45");
    }

    #[test]
    fn selections_parse() {
        assert_eq!(
            "invert".parse::<FilterSelection>().unwrap(),
            FilterSelection::Fixed(FilterKind::Invert)
        );
        assert_eq!(
            "random".parse::<FilterSelection>().unwrap(),
            FilterSelection::Random(FilterKind::PALETTE.to_vec())
        );
        assert_eq!(
            "sepia, grayscale".parse::<FilterSelection>().unwrap(),
            FilterSelection::Random(vec![FilterKind::Sepia, FilterKind::Grayscale])
        );
        assert!(" , ".parse::<FilterSelection>().is_err());
    }

    #[test]
    fn random_selection_applies_one_of_its_kinds() {
        let source = sample();
        let kinds = vec![FilterKind::Invert, FilterKind::Grayscale];
        let candidates: Vec<_> = kinds
            .iter()
            .map(|k| k.apply_to(&source).unwrap().to_rgba8())
            .collect();

        let filter = ColorFilter::new(FilterSelection::Random(kinds));
        for _ in 0..10 {
            let out = filter.apply(&source).unwrap().to_rgba8();
            assert!(candidates.contains(&out));
        }
    }

    #[test]
    fn empty_random_set_fails_to_create() {
        let filter = ColorFilter::new(FilterSelection::Random(Vec::new()));
        assert!(matches!(filter.apply(&sample()), Err(FilterError::Creation(_))));
    }

    #[test]
    fn closures_are_filters() {
        let always_fails = |_: &Image| -> Result<Image, FilterError> {
            Err(FilterError::application("nope"))
        };
        assert!(always_fails.apply(&sample()).is_err());
    }
}

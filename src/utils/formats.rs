use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use crate::utils::AppError;

/// Raster formats accepted for bundled assets, in lookup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    PNG,
    JPEG,
    WebP,
    BMP,
    GIF,
    TIFF,
}

impl AssetFormat {
    pub const ALL: [AssetFormat; 6] = [
        Self::PNG,
        Self::JPEG,
        Self::WebP,
        Self::BMP,
        Self::GIF,
        Self::TIFF,
    ];

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::PNG => &["png"],
            Self::JPEG => &["jpg", "jpeg"],
            Self::WebP => &["webp"],
            Self::BMP => &["bmp"],
            Self::GIF => &["gif"],
            Self::TIFF => &["tiff", "tif"],
        }
    }

    /// Check if the extension matches this format
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions().contains(&ext.as_str())
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &'static str {
        self.extensions()[0]
    }

    /// Every extension tried when resolving an asset name, in priority order.
    pub fn lookup_extensions() -> impl Iterator<Item = &'static str> {
        Self::ALL.into_iter().flat_map(|f| f.extensions().iter().copied())
    }

    /// The `image` crate format used to encode processed output.
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::PNG => image::ImageFormat::Png,
            Self::JPEG => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
            Self::BMP => image::ImageFormat::Bmp,
            Self::GIF => image::ImageFormat::Gif,
            Self::TIFF => image::ImageFormat::Tiff,
        }
    }
}

impl FromStr for AssetFormat {
    type Err = AppError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.matches_extension(ext))
            .ok_or_else(|| AppError::format(format!("Unsupported image format: {}", ext)))
    }
}

/// Get format from file extension
pub fn format_from_extension(path: impl AsRef<Path>) -> Result<AssetFormat, AppError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| AppError::format(format!("File has no extension: {}", path.display())))?;

    AssetFormat::from_str(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(format_from_extension("Image1.JPG").unwrap(), AssetFormat::JPEG);
        assert_eq!(format_from_extension("a/b/scan.tif").unwrap(), AssetFormat::TIFF);
    }

    #[test]
    fn unknown_or_missing_extension_is_rejected() {
        assert!(matches!(format_from_extension("notes.txt"), Err(AppError::Format(_))));
        assert!(matches!(format_from_extension("Image1"), Err(AppError::Format(_))));
    }

    #[test]
    fn lookup_prefers_png_first() {
        let exts: Vec<_> = AssetFormat::lookup_extensions().collect();
        assert_eq!(exts.first(), Some(&"png"));
        assert!(exts.contains(&"jpeg"));
        assert_eq!(exts.len(), 8);
    }
}

use std::path::{Path, PathBuf};
use tokio::fs;
use crate::utils::{AppError, AppResult, AssetFormat};

/// Resolve a bundled asset name (`Image3`) to the first existing file in `dir`
/// among the supported extensions.
pub fn find_asset(dir: impl AsRef<Path>, name: &str) -> Option<PathBuf> {
    let dir = dir.as_ref();
    AssetFormat::lookup_extensions()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Check that the asset directory exists and is a directory
pub fn validate_asset_dir(dir: impl AsRef<Path>) -> AppResult<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(AppError::IO(format!("Asset directory does not exist: {}", dir.display())));
    }
    if !dir.is_dir() {
        return Err(AppError::IO(format!("Asset path is not a directory: {}", dir.display())));
    }
    Ok(())
}

/// Create the output directory, including parents
pub async fn create_dir_all(path: impl AsRef<Path>) -> AppResult<()> {
    fs::create_dir_all(path.as_ref())
        .await
        .map_err(|e| AppError::IO(format!("Failed to create {}: {}", path.as_ref().display(), e)))
}

/// Output file name for the processed image at `index`
pub fn processed_file_name(index: usize) -> String {
    format!("processed_{}.{}", index, AssetFormat::PNG.primary_extension())
}

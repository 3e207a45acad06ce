pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{AppError, AppResult, FilterError, TimingError};
pub use validation::validate_config;
pub use formats::{AssetFormat, format_from_extension};
pub use fs::{
    create_dir_all,
    find_asset,
    processed_file_name,
    validate_asset_dir,
};

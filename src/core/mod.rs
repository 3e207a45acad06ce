//! Core types and state shared across the crate.
//!
//! - [`Image`]: shared handle to a decoded raster
//! - [`ImageSource`]: input images and the processed images of the last run
//! - [`Strategy`]: parallel or sequential execution
//! - [`PipelineEvent`] / [`SimulatorEvent`]: what observers receive
//! - [`CancellationToken`]: cooperative cancellation passed into a run
//! - [`AppConfig`]: TOML configuration for the front end

mod cancel;
mod config;
mod progress;
pub mod source;
mod types;

pub use cancel::CancellationToken;
pub use config::{AppConfig, AssetsConfig, PipelineConfig, SimulatorConfig};
pub use progress::{
    EventRecord, EventType, PipelineEvent, PipelineObserver, ProgressObserver, SimulatorEvent,
};
pub use source::{ImageSource, bundled_names};
pub use types::{Image, Strategy};

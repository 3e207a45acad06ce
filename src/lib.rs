// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod processing;
pub mod commands;

// Public exports for external consumers
pub use self::core::{
    CancellationToken, Image, ImageSource, PipelineEvent, PipelineObserver, ProgressObserver,
    SimulatorEvent, Strategy,
};
pub use processing::{
    BatchOutcome, ColorFilter, FilterKind, FilterSelection, ImageFilter, JobHandle, Pipeline,
    ProgressSimulator, SimulatorHandle, cancel,
};
pub use utils::{AppError, AppResult, FilterError, TimingError};

// This library file is used as a public API for consuming this crate as a library.
// The command-line entry point is in main.rs.

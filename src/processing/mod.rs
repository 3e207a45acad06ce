mod filter;
mod job;
mod pipeline;
mod simulator;

pub use filter::{ColorFilter, FilterKind, FilterSelection, ImageFilter};
pub use job::{BatchOutcome, JobHandle};
pub use pipeline::{Pipeline, cancel};
pub use simulator::{DEFAULT_STEPS, DEFAULT_STEP_INTERVAL, ProgressSimulator, SimulatorHandle};

//! Batch orchestration for the starload warehouse loader.
//!
//! Wires the input bundle, the configured [`Warehouse`] backend and the run
//! report together. The `starload` binary is a thin wrapper around
//! [`Pipeline::run`].
//!
//! [`Warehouse`]: starload_core::store::Warehouse

pub mod error;
pub mod input;
pub mod pipeline;
pub mod report;
pub mod settings;

pub use error::{Error, Result};
pub use input::TransformedData;
pub use pipeline::Pipeline;
pub use report::RunReport;
pub use settings::PipelineConfig;

//! Core abstractions for indicator adapters

pub mod error;
pub mod log;
pub mod observation;

// Re-export main types for cleaner imports
pub use error::FetchError;
pub use observation::{Observation, ReceiptsLatest, ReceiptsProvider, SeriesLatest, SeriesProvider};

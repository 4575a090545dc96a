//! Observation types and adapter traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::FetchError;

/// A single normalized data point from an economic time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// ISO-like calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Always finite; non-finite candidates are rejected during parsing.
    pub value: f64,
}

/// Latest observation of a published time series, with the URL it came from.
#[derive(Debug, Clone)]
pub struct SeriesLatest {
    pub observation: Observation,
    pub source_url: String,
}

/// Latest fiscal receipts record for a classification, with the URL it came
/// from.
#[derive(Debug, Clone)]
pub struct ReceiptsLatest {
    pub observation: Observation,
    pub source_url: String,
}

/// Fetches the most recent valid observation of a named time series.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn latest(&self, series_id: &str) -> Result<SeriesLatest, FetchError>;
}

/// Fetches the most recent receipts record for a classification, reading the
/// numeric value at `field`.
#[async_trait]
pub trait ReceiptsProvider: Send + Sync {
    async fn latest(&self, classification: &str, field: &str)
        -> Result<ReceiptsLatest, FetchError>;
}

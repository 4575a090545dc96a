use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{MetricConfig, DEFAULT_CLASSIFICATION, DEFAULT_FIELD};
use crate::core::FetchError;
use crate::server::AppState;

const FRED_SOURCE: &str = "FRED";
const TREASURY_SOURCE: &str = "Treasury Fiscal Data (MTS Table 4)";

/// Hint to the hosting transport layer; the adapters themselves never cache.
const CACHE_HINT: &str = "public, max-age=3600";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FredLatestBody {
    pub ok: bool,
    pub id: String,
    pub date: String,
    pub value: f64,
    pub source: &'static str,
    pub source_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryLatestBody {
    pub ok: bool,
    pub classification: String,
    pub record_date: String,
    pub value: f64,
    pub field: String,
    pub source: &'static str,
    pub source_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

fn status_for(err: &FetchError) -> StatusCode {
    match err {
        FetchError::Input(_) => StatusCode::BAD_REQUEST,
        FetchError::UpstreamStatus { .. } | FetchError::Transport(_) | FetchError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (
        status,
        Json(ErrorBody { ok: false, error }),
    )
        .into_response()
}

fn cached_ok<T: Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, CACHE_HINT)],
        Json(body),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct FredLatestParams {
    pub id: Option<String>,
}

pub async fn fred_latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FredLatestParams>,
) -> Response {
    let Some(id) = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "missing required query parameter: id".to_string(),
        );
    };

    match state.series.latest(id).await {
        Ok(latest) => cached_ok(FredLatestBody {
            ok: true,
            id: id.to_string(),
            date: latest.observation.date,
            value: latest.observation.value,
            source: FRED_SOURCE,
            source_url: latest.source_url,
        }),
        Err(err) => {
            tracing::warn!(series = %id, error = %err, "FRED fetch failed");
            error_response(status_for(&err), err.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TreasuryLatestParams {
    pub classification: Option<String>,
    pub field: Option<String>,
}

pub async fn treasury_latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TreasuryLatestParams>,
) -> Response {
    let classification = params
        .classification
        .unwrap_or_else(|| DEFAULT_CLASSIFICATION.to_string());
    let field = params.field.unwrap_or_else(|| DEFAULT_FIELD.to_string());

    match state.receipts.latest(&classification, &field).await {
        Ok(latest) => cached_ok(TreasuryLatestBody {
            ok: true,
            classification,
            record_date: latest.observation.date,
            value: latest.observation.value,
            field,
            source: TREASURY_SOURCE,
            source_url: latest.source_url,
        }),
        Err(err) => {
            tracing::warn!(%classification, %field, error = %err, "Treasury fetch failed");
            error_response(status_for(&err), err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    pub ok: bool,
    pub label: String,
    pub date: String,
    pub value: f64,
    pub source: &'static str,
    pub source_url: String,
}

#[derive(Debug, Serialize)]
pub struct MetricError {
    pub ok: bool,
    pub label: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MetricEntry {
    Value(MetricValue),
    Error(MetricError),
}

#[derive(Debug, Serialize)]
pub struct DashboardBody {
    pub metrics: Vec<MetricEntry>,
}

async fn fetch_metric(state: &AppState, metric: &MetricConfig) -> MetricEntry {
    match metric {
        MetricConfig::Fred { label, id } => match state.series.latest(id).await {
            Ok(latest) => MetricEntry::Value(MetricValue {
                ok: true,
                label: label.clone(),
                date: latest.observation.date,
                value: latest.observation.value,
                source: FRED_SOURCE,
                source_url: latest.source_url,
            }),
            Err(err) => MetricEntry::Error(MetricError {
                ok: false,
                label: label.clone(),
                error: err.to_string(),
            }),
        },
        MetricConfig::TreasuryMts {
            label,
            classification,
            field,
        } => match state.receipts.latest(classification, field).await {
            Ok(latest) => MetricEntry::Value(MetricValue {
                ok: true,
                label: label.clone(),
                date: latest.observation.date,
                value: latest.observation.value,
                source: TREASURY_SOURCE,
                source_url: latest.source_url,
            }),
            Err(err) => MetricEntry::Error(MetricError {
                ok: false,
                label: label.clone(),
                error: err.to_string(),
            }),
        },
    }
}

/// One adapter call per configured metric, all in flight at once. A failing
/// metric shows up as its own `ok: false` entry and never fails the endpoint.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let metric_futures = state.metrics.iter().map(|metric| fetch_metric(&state, metric));
    let metrics = join_all(metric_futures).await;

    cached_ok(DashboardBody { metrics })
}

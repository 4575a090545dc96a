use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::core::error::FetchError;
use crate::core::observation::{Observation, SeriesLatest, SeriesProvider};

const USER_AGENT: &str = "macrodash/0.1";
const MAX_SERIES_ID_LEN: usize = 64;

/// Adapter over the FRED `fredgraph.csv` endpoint.
///
/// The CSV feed has no server-side "latest" filter, so the full series is
/// fetched and reduced client-side by scanning rows from the end.
pub struct FredProvider {
    base_url: String,
}

impl FredProvider {
    pub fn new(base_url: &str) -> Self {
        FredProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn series_url(&self, series_id: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/graph/fredgraph.csv", self.base_url))
            .map_err(|e| FetchError::Input(format!("invalid FRED base URL: {e}")))?;
        url.query_pairs_mut().append_pair("id", series_id);
        Ok(url)
    }
}

/// Published FRED series identifiers are short alphanumeric codes. Anything
/// else is rejected before an upstream request is made.
fn validate_series_id(series_id: &str) -> Result<(), FetchError> {
    if series_id.is_empty() {
        return Err(FetchError::Input(
            "series identifier must not be empty".to_string(),
        ));
    }
    if series_id.len() > MAX_SERIES_ID_LEN
        || !series_id.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(FetchError::Input(format!(
            "invalid series identifier: {series_id}"
        )));
    }
    Ok(())
}

/// Extracts the most recent valid `(date, value)` row from a two-column CSV
/// payload (`DATE,VALUE` header plus chronologically ascending data rows).
///
/// Rows are scanned from the last toward the first and the scan stops at the
/// first valid row, so trailing missing-data sentinels cost O(k) where k is
/// their count. A row is skipped when either field is empty, the value is the
/// "." or "nan" missing-data sentinel, the date is not `YYYY-MM-DD`, or the
/// value does not parse to a finite number.
fn latest_valid_observation(body: &str) -> Result<Observation, FetchError> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(FetchError::Parse(
            "no observations in series payload".to_string(),
        ));
    }

    for line in lines[1..].iter().rev() {
        let Some((date, raw_value)) = line.split_once(',') else {
            continue;
        };
        let (date, raw_value) = (date.trim(), raw_value.trim());
        if date.is_empty() || raw_value.is_empty() {
            continue;
        }
        if raw_value == "." || raw_value.eq_ignore_ascii_case("nan") {
            continue;
        }
        if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            continue;
        }
        let Ok(value) = raw_value.parse::<f64>() else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        return Ok(Observation {
            date: date.to_string(),
            value,
        });
    }

    Err(FetchError::Parse(
        "could not parse latest observation".to_string(),
    ))
}

#[async_trait]
impl SeriesProvider for FredProvider {
    async fn latest(&self, series_id: &str) -> Result<SeriesLatest, FetchError> {
        validate_series_id(series_id)?;

        let url = self.series_url(series_id)?;
        debug!("Requesting series CSV from {}", url);

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("{e} for series: {series_id}")))?;

        if !response.status().is_success() {
            return Err(FetchError::UpstreamStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let observation = latest_valid_observation(&body)?;
        debug!(
            "Latest observation for series {}: {} on {}",
            series_id, observation.value, observation.date
        );

        Ok(SeriesLatest {
            observation,
            source_url: url.to_string(),
        })
    }
}

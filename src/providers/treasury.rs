use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::core::error::FetchError;
use crate::core::observation::{Observation, ReceiptsLatest, ReceiptsProvider};

const USER_AGENT: &str = "macrodash/0.1";
const MTS_TABLE_4_PATH: &str = "/services/api/fiscal_service/v1/accounting/mts/mts_table_4";

/// Adapter over the Treasury Fiscal Data API (Monthly Treasury Statement,
/// Table 4).
///
/// Unlike the FRED feed, this API can select the latest record server-side:
/// the request filters by classification, sorts descending by record date and
/// asks for a single-record page, so no client-side reduction is needed.
pub struct TreasuryMtsProvider {
    base_url: String,
}

impl TreasuryMtsProvider {
    pub fn new(base_url: &str) -> Self {
        TreasuryMtsProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn latest_record_url(&self, classification: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, MTS_TABLE_4_PATH))
            .map_err(|e| FetchError::Input(format!("invalid fiscal data base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("filter", &format!("classification_desc:eq:{classification}"))
            .append_pair("sort", "-record_date")
            .append_pair("page[size]", "1");
        Ok(url)
    }
}

/// Fiscal Data serializes amounts as JSON strings; accept a plain number too.
fn numeric_field(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn extract_observation(record: &Value, field: &str) -> Result<Observation, FetchError> {
    let record_date = record
        .get("record_date")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|date| !date.is_empty());
    let value = record.get(field).and_then(numeric_field);

    match (record_date, value) {
        (Some(date), Some(value)) => Ok(Observation {
            date: date.to_string(),
            value,
        }),
        (record_date, value) => {
            let mut invalid = Vec::new();
            if record_date.is_none() {
                invalid.push("record_date");
            }
            if value.is_none() {
                invalid.push(field);
            }
            Err(FetchError::Parse(format!(
                "missing or invalid field(s) in latest record: {}",
                invalid.join(", ")
            )))
        }
    }
}

#[async_trait]
impl ReceiptsProvider for TreasuryMtsProvider {
    async fn latest(
        &self,
        classification: &str,
        field: &str,
    ) -> Result<ReceiptsLatest, FetchError> {
        let url = self.latest_record_url(classification)?;
        debug!("Requesting latest receipts record from {}", url);

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = client.get(url.clone()).send().await.map_err(|e| {
            FetchError::Transport(format!("{e} for classification: {classification}"))
        })?;

        if !response.status().is_success() {
            return Err(FetchError::UpstreamStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            FetchError::Parse(format!("invalid JSON from fiscal data API: {e}"))
        })?;

        let record = payload
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| {
                FetchError::Parse(format!(
                    "no data returned for classification: {classification}"
                ))
            })?;

        let observation = extract_observation(record, field)?;
        debug!(
            "Latest {} for {}: {} on {}",
            field, classification, observation.value, observation.date
        );

        Ok(ReceiptsLatest {
            observation,
            source_url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CLASSIFICATION: &str = "Customs Duties";
    const FIELD: &str = "current_month_net_rcpt_amt";

    async fn create_mts_mock_server(mock_response: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(MTS_TABLE_4_PATH))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_receipts_fetch() {
        let mock_response =
            r#"{"data":[{"record_date":"2025-03-01","current_month_net_rcpt_amt":"123.45"}]}"#;
        let mock_server = create_mts_mock_server(mock_response, 200).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await.unwrap();

        assert_eq!(result.observation.date, "2025-03-01");
        assert_eq!(result.observation.value, 123.45);
        assert!(result.source_url.contains("sort=-record_date"));
    }

    #[tokio::test]
    async fn test_request_asks_upstream_for_latest_record() {
        let mock_server = MockServer::start().await;
        let mock_response =
            r#"{"data":[{"record_date":"2025-03-01","current_month_net_rcpt_amt":"1"}]}"#;

        Mock::given(method("GET"))
            .and(path(MTS_TABLE_4_PATH))
            .and(query_param(
                "filter",
                "classification_desc:eq:Customs Duties",
            ))
            .and(query_param("sort", "-record_date"))
            .and(query_param("page[size]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        provider.latest(CLASSIFICATION, FIELD).await.unwrap();
    }

    #[tokio::test]
    async fn test_numeric_json_value_accepted() {
        let mock_response =
            r#"{"data":[{"record_date":"2025-03-01","current_month_net_rcpt_amt":678.9}]}"#;
        let mock_server = create_mts_mock_server(mock_response, 200).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await.unwrap();

        assert_eq!(result.observation.value, 678.9);
    }

    #[tokio::test]
    async fn test_empty_data_array_fails() {
        let mock_server = create_mts_mock_server(r#"{"data":[]}"#, 200).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "no data returned for classification: Customs Duties"
        );
    }

    #[tokio::test]
    async fn test_missing_field_named_in_error() {
        let mock_response = r#"{"data":[{"record_date":"2025-03-01"}]}"#;
        let mock_server = create_mts_mock_server(mock_response, 200).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await;

        let msg = result.unwrap_err().to_string();
        assert_eq!(
            msg,
            "missing or invalid field(s) in latest record: current_month_net_rcpt_amt"
        );
    }

    #[tokio::test]
    async fn test_non_numeric_field_and_blank_date_both_named() {
        let mock_response =
            r#"{"data":[{"record_date":"","current_month_net_rcpt_amt":"n/a"}]}"#;
        let mock_server = create_mts_mock_server(mock_response, 200).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await;

        let msg = result.unwrap_err().to_string();
        assert_eq!(
            msg,
            "missing or invalid field(s) in latest record: record_date, current_month_net_rcpt_amt"
        );
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mock_server = create_mts_mock_server("Server Error", 500).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "upstream responded with HTTP 500"
        );
    }

    #[tokio::test]
    async fn test_malformed_json_fails() {
        let mock_server = create_mts_mock_server("not json", 200).await;

        let provider = TreasuryMtsProvider::new(&mock_server.uri());
        let result = provider.latest(CLASSIFICATION, FIELD).await;

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("invalid JSON from fiscal data API"));
    }

    #[test]
    fn test_numeric_field_rejects_non_finite() {
        assert_eq!(numeric_field(&json!("123.45")), Some(123.45));
        assert_eq!(numeric_field(&json!(42)), Some(42.0));
        assert_eq!(numeric_field(&json!("nan")), None);
        assert_eq!(numeric_field(&json!("inf")), None);
        assert_eq!(numeric_field(&json!(null)), None);
        assert_eq!(numeric_field(&json!(["1"])), None);
    }
}

//! Climatiq estimate API client

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{EmissionFactorProvider, ProviderError};
use crate::activity::ActivityQuery;
use crate::config::ClimatiqConfig;

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    co2e: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Client for the Climatiq estimate endpoint.
///
/// Without a usable API key every lookup fails with `NotConfigured`, so
/// reports still come back with the provider categories at zero.
pub struct ClimatiqProvider {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
}

impl ClimatiqProvider {
    pub fn new(config: &ClimatiqConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Self {
            agent,
            endpoint: format!("{}/estimate", config.base_url.trim_end_matches('/')),
            api_key: config.usable_api_key().map(str::to_string),
        }
    }
}

/// Request body for a single estimate call
pub fn estimate_request_body(query: &ActivityQuery) -> Value {
    let dimension = query.unit.dimension();
    let mut parameters = serde_json::Map::new();
    parameters.insert(dimension.to_string(), json!(query.quantity));
    parameters.insert(format!("{dimension}_unit"), json!(query.unit.as_str()));

    json!({
        "emission_factor": { "activity_id": query.activity_id },
        "parameters": parameters,
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().to_string())
}

impl EmissionFactorProvider for ClimatiqProvider {
    fn name(&self) -> &str {
        "climatiq"
    }

    fn estimate(&self, query: &ActivityQuery) -> Result<Option<f64>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured("missing Climatiq API key"))?;

        debug!(
            activity_id = query.activity_id,
            quantity = query.quantity,
            unit = %query.unit,
            "Requesting Climatiq estimate"
        );

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", api_key))
            .send_json(estimate_request_body(query));

        match response {
            Ok(resp) => {
                let body: EstimateResponse = resp
                    .into_json()
                    .map_err(|e| ProviderError::Malformed(e.to_string()))?;
                Ok(body.co2e)
            }
            Err(ureq::Error::Status(401, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(ProviderError::Unauthorized(error_message(&body)))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(ProviderError::Status {
                    status,
                    message: error_message(&body),
                })
            }
            Err(ureq::Error::Transport(t)) => Err(ProviderError::Transport(t.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::activity::{Category, ELECTRICITY_ACTIVITY, Unit, WASTE_ACTIVITY};
    use crate::calculator::calculate_report;
    use crate::models::InputRecord;

    #[test]
    fn body_names_quantity_by_dimension() {
        let query = ActivityQuery {
            category: Category::Electricity,
            activity_id: ELECTRICITY_ACTIVITY,
            quantity: 250.0,
            unit: Unit::KWh,
        };
        let body = estimate_request_body(&query);
        assert_eq!(body["emission_factor"]["activity_id"], ELECTRICITY_ACTIVITY);
        assert_eq!(body["parameters"]["energy"], 250.0);
        assert_eq!(body["parameters"]["energy_unit"], "kWh");
    }

    #[test]
    fn waste_body_uses_weight() {
        let query = ActivityQuery {
            category: Category::Waste,
            activity_id: WASTE_ACTIVITY,
            quantity: 30.0,
            unit: Unit::Kg,
        };
        let body = estimate_request_body(&query);
        assert_eq!(body["parameters"]["weight"], 30.0);
        assert_eq!(body["parameters"]["weight_unit"], "kg");
        assert!(body["parameters"].get("distance").is_none());
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(error_message(r#"{"error":"bad_key","message":"nope"}"#), "bad_key");
        assert_eq!(error_message(r#"{"message":"quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_message("gateway timeout\n"), "gateway timeout");
    }

    /// Serves one canned HTTP response and hands back the request head
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/data/v1", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            head
        });

        (base_url, handle)
    }

    fn provider_at(base_url: String) -> ClimatiqProvider {
        ClimatiqProvider::new(&ClimatiqConfig {
            api_key: Some("test-key".to_string()),
            base_url,
            timeout_secs: 5,
        })
    }

    fn grid_query() -> ActivityQuery {
        ActivityQuery {
            category: Category::Electricity,
            activity_id: ELECTRICITY_ACTIVITY,
            quantity: 250.0,
            unit: Unit::KWh,
        }
    }

    #[test]
    fn reads_co2e_from_success_response() {
        let (base_url, server) = serve_once("200 OK", r#"{"co2e":12.5,"co2e_unit":"kg"}"#);
        let figure = provider_at(base_url).estimate(&grid_query()).unwrap();
        assert_eq!(figure, Some(12.5));

        let head = server.join().unwrap();
        assert!(head.starts_with("POST /data/v1/estimate "), "{head}");
        assert!(
            head.lines().any(|l| l.eq_ignore_ascii_case("authorization: Bearer test-key")),
            "{head}"
        );
    }

    #[test]
    fn null_co2e_is_no_figure() {
        let (base_url, server) = serve_once("200 OK", r#"{"co2e":null}"#);
        assert_eq!(provider_at(base_url).estimate(&grid_query()).unwrap(), None);
        server.join().unwrap();
    }

    #[test]
    fn rejected_key_maps_to_unauthorized() {
        let (base_url, server) = serve_once("401 Unauthorized", r#"{"error":"invalid_api_key"}"#);
        let err = provider_at(base_url).estimate(&grid_query()).unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized(ref m) if m == "invalid_api_key"), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn other_error_status_surfaces_message() {
        let (base_url, server) = serve_once("500 Internal Server Error", r#"{"message":"x"}"#);
        let err = provider_at(base_url).estimate(&grid_query()).unwrap_err();
        assert!(
            matches!(err, ProviderError::Status { status: 500, ref message } if message == "x"),
            "{err}"
        );
        server.join().unwrap();
    }

    #[test]
    fn lookups_fail_without_key() {
        let config = ClimatiqConfig {
            api_key: Some("YOUR_CLIMATIQ_API_KEY".to_string()),
            ..Default::default()
        };
        let provider = ClimatiqProvider::new(&config);
        assert!(matches!(
            provider.estimate(&grid_query()),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn missing_key_still_yields_a_report() {
        let provider = ClimatiqProvider::new(&ClimatiqConfig::default());
        let input: InputRecord =
            serde_json::from_str(r#"{"type":"individual","diet":"meat","travelMode":"car","travelKm":100}"#).unwrap();
        let report = calculate_report(&provider, &input);
        assert_eq!(report.category_breakdown.travel, 0.0);
        assert_eq!(report.category_breakdown.diet, 150.0);
        assert_eq!(report.total_emissions, 150.0);
    }

    #[test]
    fn endpoint_joins_base_url() {
        let config = ClimatiqConfig {
            api_key: Some("k".to_string()),
            base_url: "https://example.test/data/v1/".to_string(),
            ..Default::default()
        };
        let provider = ClimatiqProvider::new(&config);
        assert_eq!(provider.endpoint, "https://example.test/data/v1/estimate");
    }
}

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::models::Coordinates;

const REVERSE_GEOCODE_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";

/// Best-effort lookup of a locality name for a coordinate pair. Callers absorb
/// every failure; an error here only means "use the coordinate string".
pub trait ReverseGeocoder: Send + Sync {
    fn locality(
        &self,
        coords: Coordinates,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Reverse geocoder backed by the BigDataCloud client endpoint (no API key).
pub struct HttpReverseGeocoder {
    client: reqwest::Client,
}

impl HttpReverseGeocoder {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpReverseGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverseGeocoder for HttpReverseGeocoder {
    async fn locality(&self, coords: Coordinates) -> Result<String> {
        let response = self
            .client
            .get(REVERSE_GEOCODE_URL)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ])
            .send()
            .await
            .context("reverse geocode request failed")?;

        let body: Value = response
            .json()
            .await
            .context("reverse geocode response was not JSON")?;

        extract_locality(&body).ok_or_else(|| anyhow!("no administrative locality in response"))
    }
}

/// Picks the first named administrative area out of the response, preferring
/// the broadest entry the way the host application displays it.
fn extract_locality(body: &Value) -> Option<String> {
    let administrative = body
        .get("localityInfo")?
        .get("administrative")?
        .as_array()?;

    administrative
        .iter()
        .take(2)
        .find_map(|entry| entry.get("name").and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_first_named_administrative_entry() {
        let body = json!({
            "localityInfo": {
                "administrative": [
                    { "name": "Karnataka", "order": 1 },
                    { "name": "Bengaluru", "order": 2 }
                ]
            }
        });

        assert_eq!(extract_locality(&body), Some("Karnataka".to_string()));
    }

    #[test]
    fn missing_locality_info_yields_none() {
        assert_eq!(extract_locality(&json!({})), None);
        assert_eq!(
            extract_locality(&json!({ "localityInfo": { "administrative": [] } })),
            None
        );
    }
}

//! EPA WATERS lookup tool
//!
//! Finds the nearest stream segment downstream of a coordinate and, when it
//! has a COMID, attaches the StreamCat watershed metrics for it.

use super::{Tool, ToolOutput};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.epa.gov/waters";

/// Longest StreamCat excerpt handed back to the model
const METRICS_EXCERPT_CHARS: usize = 500;

pub struct EpaWaterTool {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct EpaWaterInput {
    latitude: f64,
    longitude: f64,
}

/// What the upstream/downstream response says about the start point
#[derive(Debug, Clone, PartialEq, Eq)]
enum FeatureLookup {
    NoOutput,
    NoFeatures,
    Found { name: String, comid: Option<String> },
}

impl EpaWaterTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<ToolOutput, reqwest::Error> {
        let start_point = json!({
            "type": "Point",
            "coordinates": [longitude, latitude],
        })
        .to_string();

        let resp = self
            .client
            .get(format!("{}/v4/upstreamdownstream", self.base_url))
            .query(&[
                ("start_point", start_point.as_str()),
                ("navigation_type", "DM"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(ToolOutput::error(format!("Error querying EPA API: {body}")));
        }

        let data: Value = resp.json().await?;
        let mut parts = Vec::new();

        match nearest_feature(&data) {
            FeatureLookup::NoOutput => {
                parts.push("No water features found in response.".to_string());
            }
            FeatureLookup::NoFeatures => {
                parts.push("No water features found (empty feature list).".to_string());
            }
            FeatureLookup::Found { name, comid } => {
                parts.push(format!(
                    "Found nearby water feature: {name} (COMID: {})",
                    comid.as_deref().unwrap_or("None")
                ));
                if let Some(comid) = comid {
                    parts.push(self.streamcat(&comid).await?);
                }
            }
        }

        Ok(ToolOutput::success(parts.join("\n")))
    }

    async fn streamcat(&self, comid: &str) -> Result<String, reqwest::Error> {
        let resp = self
            .client
            .get(format!("{}/v2_5/streamcat_json", self.base_url))
            .query(&[("comid", comid), ("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), comid, "StreamCat lookup failed");
            return Ok("Could not retrieve StreamCat data.".to_string());
        }

        let metrics: Value = resp.json().await?;
        Ok(metrics_excerpt(&metrics))
    }
}

fn nearest_feature(data: &Value) -> FeatureLookup {
    let output = match data.get("output") {
        Some(output) if is_present(output) => output,
        _ => return FeatureLookup::NoOutput,
    };

    let Some(first) = output
        .get("features")
        .and_then(Value::as_array)
        .and_then(|features| features.first())
    else {
        return FeatureLookup::NoFeatures;
    };

    let props = first.get("properties");
    let prop = |key: &str| props.and_then(|p| p.get(key)).filter(|v| is_present(v));

    let comid = prop("COMID").or_else(|| prop("comid")).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    let name = prop("GNIS_NAME")
        .and_then(Value::as_str)
        .unwrap_or("Unnamed Stream")
        .to_string();

    FeatureLookup::Found { name, comid }
}

/// Null, empty and zero values count as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn metrics_excerpt(metrics: &Value) -> String {
    let excerpt: String = metrics
        .to_string()
        .chars()
        .take(METRICS_EXCERPT_CHARS)
        .collect();
    format!("Watershed Metrics: {excerpt}...")
}

#[async_trait]
impl Tool for EpaWaterTool {
    fn name(&self) -> &'static str {
        "get_epa_water_data"
    }

    fn description(&self) -> String {
        "Retrieve watershed and water quality information from the US EPA WATERS API for a latitude/longitude. Returns the nearest downstream water feature and its StreamCat watershed metrics.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["latitude", "longitude"],
            "properties": {
                "latitude": {
                    "type": "number",
                    "description": "Latitude of the location"
                },
                "longitude": {
                    "type": "number",
                    "description": "Longitude of the location"
                }
            }
        })
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: EpaWaterInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        match self.lookup(input.latitude, input.longitude).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "EPA WATERS request failed");
                ToolOutput::error(format!("Error querying EPA WATERS API: {e}"))
            }
        }
    }
}

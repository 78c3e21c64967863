use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::models::detection::{BoundingBox, DetectedRegion};
use crate::services::http::{send_with_retry, GatewayHttpConfig};

const GATEWAY: &str = "detection";

const USER_ID: &str = "clarifai";
const APP_ID: &str = "main";
const MODEL_ID: &str = "general-image-detection";
const MODEL_VERSION_ID: &str = "1580bb1932594c93b7e2e04456af7c6f";

/// What the caller hands to the detector: a remote URL or raw bytes,
/// mutually exclusive by construction.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Url(String),
    Bytes { data: Vec<u8>, uri: Option<String> },
}

/// Object detection seam. Implementations never error: a failed call is an
/// empty region list.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: &ImageInput) -> Vec<DetectedRegion>;
}

#[derive(Serialize)]
struct DetectRequest {
    user_app_id: UserAppId,
    inputs: Vec<DetectInput>,
}

#[derive(Serialize)]
struct UserAppId {
    user_id: &'static str,
    app_id: &'static str,
}

#[derive(Serialize)]
struct DetectInput {
    data: InputData,
}

#[derive(Serialize)]
struct InputData {
    image: ImagePayload,
}

#[derive(Serialize)]
struct ImagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
}

#[derive(Deserialize, Default)]
struct DetectResponse {
    #[serde(default)]
    outputs: Vec<DetectOutput>,
}

#[derive(Deserialize, Default)]
struct DetectOutput {
    #[serde(default)]
    data: OutputData,
}

#[derive(Deserialize, Default)]
struct OutputData {
    #[serde(default)]
    regions: Vec<Region>,
}

#[derive(Deserialize, Default)]
struct Region {
    #[serde(default)]
    region_info: RegionInfo,
    #[serde(default)]
    data: RegionData,
}

#[derive(Deserialize, Default)]
struct RegionInfo {
    #[serde(default)]
    bounding_box: RawBoundingBox,
}

#[derive(Deserialize, Default)]
struct RawBoundingBox {
    #[serde(default)]
    top_row: f64,
    #[serde(default)]
    left_col: f64,
    #[serde(default)]
    bottom_row: f64,
    #[serde(default)]
    right_col: f64,
}

#[derive(Deserialize, Default)]
struct RegionData {
    #[serde(default)]
    concepts: Vec<Concept>,
}

#[derive(Deserialize, Default)]
struct Concept {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: f64,
}

/// Clarifai-backed detector.
pub struct ClarifaiDetector {
    client: Client,
    http: GatewayHttpConfig,
    api_key: String,
    endpoint: String,
}

impl ClarifaiDetector {
    pub fn new(config: &GatewayConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: config.http.build_client(GATEWAY)?,
            http: config.http.clone(),
            api_key: config.detection_api_key.clone(),
            endpoint: format!(
                "{}/v2/models/{MODEL_ID}/versions/{MODEL_VERSION_ID}/outputs",
                config.detection_api_url.trim_end_matches('/')
            ),
        })
    }

    fn payload(image: &ImageInput) -> DetectRequest {
        let image_payload = match image {
            ImageInput::Url(url) => ImagePayload {
                url: Some(url.clone()),
                base64: None,
            },
            ImageInput::Bytes { data, .. } => ImagePayload {
                url: None,
                base64: Some(base64::engine::general_purpose::STANDARD.encode(data)),
            },
        };
        DetectRequest {
            user_app_id: UserAppId {
                user_id: USER_ID,
                app_id: APP_ID,
            },
            inputs: vec![DetectInput {
                data: InputData {
                    image: image_payload,
                },
            }],
        }
    }

    fn regions_from_response(response: DetectResponse) -> Vec<DetectedRegion> {
        let Some(output) = response.outputs.into_iter().next() else {
            return Vec::new();
        };
        output
            .data
            .regions
            .into_iter()
            .filter_map(|region| {
                let concept = region.data.concepts.into_iter().next()?;
                if concept.name.is_empty() {
                    return None;
                }
                let raw = region.region_info.bounding_box;
                let Some(bounding_box) = BoundingBox::from_edges(
                    raw.top_row,
                    raw.left_col,
                    raw.bottom_row,
                    raw.right_col,
                ) else {
                    warn!(label = %concept.name, "Dropping region with inverted bounding box");
                    return None;
                };
                Some(DetectedRegion {
                    label: concept.name,
                    confidence: concept.value,
                    bounding_box,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ObjectDetector for ClarifaiDetector {
    async fn detect(&self, image: &ImageInput) -> Vec<DetectedRegion> {
        let payload = match serde_json::to_value(Self::payload(image)) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Failed to encode detection request");
                return Vec::new();
            }
        };

        let response = send_with_retry(&self.http, GATEWAY, || {
            self.client
                .post(&self.endpoint)
                .header("Authorization", format!("Key {}", self.api_key))
                .json(&payload)
        })
        .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Detection request failed, returning no regions");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Detection gateway returned error status");
            return Vec::new();
        }

        match response.json::<DetectResponse>().await {
            Ok(parsed) => {
                let regions = Self::regions_from_response(parsed);
                debug!(count = regions.len(), "Detection completed");
                regions
            }
            Err(e) => {
                warn!(error = %e, "Malformed detection payload, returning no regions");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_parsed_from_gateway_shape() {
        let body = serde_json::json!({
            "outputs": [{
                "data": {
                    "regions": [{
                        "region_info": {
                            "bounding_box": {
                                "top_row": 0.1, "left_col": 0.1,
                                "bottom_row": 0.4, "right_col": 0.3
                            }
                        },
                        "data": { "concepts": [{ "name": "cup", "value": 0.95 }] }
                    }]
                }
            }]
        });
        let parsed: DetectResponse = serde_json::from_value(body).unwrap();
        let regions = ClarifaiDetector::regions_from_response(parsed);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].label, "cup");
        assert_eq!(regions[0].confidence, 0.95);
        assert!((regions[0].bounding_box.center_x - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_missing_regions_yields_empty_list() {
        let parsed: DetectResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(ClarifaiDetector::regions_from_response(parsed).is_empty());

        let parsed: DetectResponse =
            serde_json::from_value(serde_json::json!({ "outputs": [{ "data": {} }] })).unwrap();
        assert!(ClarifaiDetector::regions_from_response(parsed).is_empty());
    }

    #[test]
    fn test_inverted_region_is_dropped() {
        let body = serde_json::json!({
            "outputs": [{
                "data": {
                    "regions": [{
                        "region_info": {
                            "bounding_box": {
                                "top_row": 0.9, "left_col": 0.8,
                                "bottom_row": 0.1, "right_col": 0.2
                            }
                        },
                        "data": { "concepts": [{ "name": "cup", "value": 0.5 }] }
                    }]
                }
            }]
        });
        let parsed: DetectResponse = serde_json::from_value(body).unwrap();
        assert!(ClarifaiDetector::regions_from_response(parsed).is_empty());
    }

    #[test]
    fn test_request_payload_is_mutually_exclusive() {
        let url_req = ClarifaiDetector::payload(&ImageInput::Url("https://x/y.jpg".into()));
        let v = serde_json::to_value(&url_req).unwrap();
        let image = &v["inputs"][0]["data"]["image"];
        assert_eq!(image["url"], "https://x/y.jpg");
        assert!(image.get("base64").is_none());

        let bytes_req = ClarifaiDetector::payload(&ImageInput::Bytes {
            data: vec![1, 2, 3],
            uri: None,
        });
        let v = serde_json::to_value(&bytes_req).unwrap();
        let image = &v["inputs"][0]["data"]["image"];
        assert!(image.get("url").is_none());
        assert_eq!(image["base64"], "AQID");
    }
}

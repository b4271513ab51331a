//! HTTP client for the external comparison-augmentation webhook.
//!
//! One POST per comparison, bounded by the configured timeout, no retries.
//! Every failure mode is a distinct [`AugmentError`] variant, logged here
//! once; callers treat them all as "augmentation unavailable".

use std::time::Duration;

use comparely_core::{AugmentConfig, Device, DeviceId, Highlight};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AugmentError {
    #[error("augmentation is disabled")]
    Disabled,
    #[error("augmentation webhook URL is not configured")]
    EndpointUnset,
    #[error("could not connect to augmentation service: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("augmentation request timed out after {0:?}")]
    Timeout(Duration),
    #[error("augmentation service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed augmentation response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("augmentation request failed: {0}")]
    Http(#[source] reqwest::Error),
}

/// Device fields sent to the webhook, flattened to primitives.
#[derive(Debug, Serialize)]
struct DevicePayload<'a> {
    id: DeviceId,
    name: &'a str,
    brand: &'a str,
    price: f64,
    cpu: Option<&'a str>,
    ram: Option<&'a str>,
    camera: Option<&'a str>,
    battery: Option<&'a str>,
    release_year: Option<i32>,
}

impl<'a> From<&'a Device> for DevicePayload<'a> {
    fn from(d: &'a Device) -> Self {
        Self {
            id: d.id,
            name: &d.name,
            brand: &d.brand,
            price: d.price.unwrap_or(0.0),
            cpu: d.cpu.as_deref(),
            ram: d.ram.as_deref(),
            camera: d.camera.as_deref(),
            battery: d.battery.as_deref(),
            release_year: d.release_year,
        }
    }
}

#[derive(Debug, Serialize)]
struct AugmentRequest<'a> {
    device_1: DevicePayload<'a>,
    device_2: DevicePayload<'a>,
    rule_based_highlights: Vec<&'a str>,
}

/// Webhook client. Construct once and share behind an `Arc`.
pub struct AugmentationClient {
    client: reqwest::Client,
    config: AugmentConfig,
}

impl AugmentationClient {
    /// Build a client whose requests are bounded by `config.timeout`.
    pub fn new(config: AugmentConfig) -> Result<Self, AugmentError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AugmentError::Http)?;
        Ok(Self { client, config })
    }

    /// True when a call would actually be attempted.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.endpoint().is_some()
    }

    /// Send both devices and the rule-based sentences to the webhook and
    /// return its JSON body.
    pub async fn augment(
        &self,
        first: &Device,
        second: &Device,
        rule_highlights: &[Highlight],
    ) -> Result<Value, AugmentError> {
        let result = self.send(first, second, rule_highlights).await;
        match &result {
            Ok(_) => info!(
                first = %first.name,
                second = %second.name,
                "received augmentation response"
            ),
            Err(AugmentError::Disabled) => info!("augmentation disabled"),
            Err(e) => warn!(error = %e, "augmentation unavailable"),
        }
        result
    }

    async fn send(
        &self,
        first: &Device,
        second: &Device,
        rule_highlights: &[Highlight],
    ) -> Result<Value, AugmentError> {
        if !self.config.enabled {
            return Err(AugmentError::Disabled);
        }
        let url = self.config.endpoint().ok_or(AugmentError::EndpointUnset)?;

        let body = AugmentRequest {
            device_1: first.into(),
            device_2: second.into(),
            rule_based_highlights: rule_highlights.iter().map(|h| h.reason.as_str()).collect(),
        };

        info!(url, first = %first.name, second = %second.name, "sending comparison to augmentation service");
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AugmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn classify(&self, e: reqwest::Error) -> AugmentError {
        if e.is_timeout() {
            AugmentError::Timeout(self.config.timeout)
        } else if e.is_connect() {
            AugmentError::Connect(e)
        } else {
            AugmentError::Http(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn devices() -> (Device, Device) {
        let a = Device {
            id: 1,
            name: "Galaxy A55".into(),
            brand: "Samsung".into(),
            price: Some(5_999_000.0),
            ram: Some("8GB".into()),
            release_year: Some(2024),
            ..Default::default()
        };
        let b = Device {
            id: 2,
            name: "Redmi Note 13".into(),
            brand: "Xiaomi".into(),
            price: None,
            ..Default::default()
        };
        (a, b)
    }

    fn rule_highlights() -> Vec<Highlight> {
        vec![Highlight {
            category: "Release year".into(),
            winner: "Galaxy A55".into(),
            winner_id: Some(1),
            reason: "Galaxy A55 is newer (released 2024)".into(),
        }]
    }

    fn client_for(url: String, timeout: Duration) -> AugmentationClient {
        AugmentationClient::new(AugmentConfig {
            enabled: true,
            webhook_url: Some(url),
            timeout,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn disabled_makes_no_call() {
        let client = AugmentationClient::new(AugmentConfig::default()).unwrap();
        assert!(!client.is_enabled());
        let (a, b) = devices();
        let err = client.augment(&a, &b, &[]).await.unwrap_err();
        assert!(matches!(err, AugmentError::Disabled));
    }

    #[tokio::test]
    async fn enabled_without_url_is_unset() {
        let client = AugmentationClient::new(AugmentConfig {
            enabled: true,
            webhook_url: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        let (a, b) = devices();
        let err = client.augment(&a, &b, &[]).await.unwrap_err();
        assert!(matches!(err, AugmentError::EndpointUnset));
    }

    #[tokio::test]
    async fn posts_payload_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/compare"))
            .and(body_partial_json(json!({
                "device_1": { "id": 1, "name": "Galaxy A55", "price": 5999000.0, "release_year": 2024 },
                "device_2": { "id": 2, "price": 0.0 },
                "rule_based_highlights": ["Galaxy A55 is newer (released 2024)"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ai_highlights": [],
                "ai_summary": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(format!("{}/webhook/compare", server.uri()), Duration::from_secs(5));
        let (a, b) = devices();
        let body = client.augment(&a, &b, &rule_highlights()).await.unwrap();
        assert_eq!(body["ai_summary"], "ok");
    }

    #[tokio::test]
    async fn non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = client_for(server.uri(), Duration::from_secs(5));
        let (a, b) = devices();
        let err = client.augment(&a, &b, &[]).await.unwrap_err();
        match err {
            AugmentError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = client_for(server.uri(), Duration::from_secs(5));
        let (a, b) = devices();
        let err = client.augment(&a, &b, &[]).await.unwrap_err();
        assert!(matches!(err, AugmentError::Json(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(100);
        let client = client_for(server.uri(), timeout);
        let (a, b) = devices();
        let err = client.augment(&a, &b, &[]).await.unwrap_err();
        assert!(matches!(err, AugmentError::Timeout(t) if t == timeout));
    }

    #[tokio::test]
    async fn connection_refused() {
        let client = client_for("http://127.0.0.1:1/webhook".into(), Duration::from_secs(5));
        let (a, b) = devices();
        let err = client.augment(&a, &b, &[]).await.unwrap_err();
        assert!(matches!(err, AugmentError::Connect(_)));
    }
}

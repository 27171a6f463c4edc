// Telemetry API client
use crate::application::telemetry_source::{FetchError, TelemetrySource};
use crate::domain::date::DateRange;
use crate::domain::telemetry::TelemetryPayload;
use crate::infrastructure::config::{Secret, TelemetrySettings};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    client: reqwest::Client,
    url: String,
    username: String,
    password: Secret,
    device_id: String,
    max_retries: u32,
}

impl HttpTelemetrySource {
    pub fn new(settings: &TelemetrySettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            device_id: settings.device_id.clone(),
            max_retries: settings.max_retries,
        })
    }

    fn request(&self, range: &DateRange) -> reqwest::RequestBuilder {
        self.client
            .get(&self.url)
            .query(&[
                ("start", range.start.as_str()),
                ("end", range.end.as_str()),
                ("device", self.device_id.as_str()),
            ])
            .basic_auth(&self.username, Some(self.password.expose()))
            .header("Accept", "application/json")
    }

    async fn send(&self, range: &DateRange) -> Result<reqwest::Response, FetchError> {
        let mut attempt = 0;
        loop {
            match self.request(range).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "Telemetry request failed, retrying");
                }
                Err(e) => return Err(FetchError::Transport(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch(&self, range: &DateRange) -> Result<TelemetryPayload, FetchError> {
        tracing::debug!(
            start = %range.start,
            end = %range.end,
            device = %self.device_id,
            "Fetching telemetry"
        );

        let response = self.send(range).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Telemetry API rejected request");
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        response
            .json::<TelemetryPayload>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::Reading;
    use crate::infrastructure::testing::serve;
    use axum::{
        extract::{Query, State},
        http::{header, HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

    fn settings(url: String, max_retries: u32) -> TelemetrySettings {
        TelemetrySettings {
            url,
            username: "reader".to_string(),
            password: Secret::from("secret"),
            device_id: "DEVICE-1".to_string(),
            timeout_secs: 5,
            max_retries,
        }
    }

    fn range() -> DateRange {
        DateRange::from_query(Some("06082024"), Some("08082024")).unwrap()
    }

    async fn record(
        State(seen): State<Seen>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Json<Value> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push((params, authorization));
        Json(json!({ "salinity": [{ "time": "2024-08-06T00:00:00Z", "value": 3.5 }] }))
    }

    async fn counting_router(hits: Arc<AtomicUsize>, status: StatusCode, body: &'static str) -> String {
        let router = Router::new()
            .route(
                "/telemetry",
                get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (status, body)
                }),
            )
            .with_state(hits);
        serve(router).await
    }

    #[tokio::test]
    async fn test_fetch_sends_range_device_and_basic_auth() {
        let seen = Seen::default();
        let base = serve(Router::new().route("/telemetry", get(record)).with_state(seen.clone())).await;

        let source = HttpTelemetrySource::new(&settings(format!("{}/telemetry", base), 0)).unwrap();
        let payload = source.fetch(&range()).await.unwrap();

        assert_eq!(
            payload.readings("salinity").unwrap().unwrap(),
            vec![Reading::new("2024-08-06T00:00:00Z", 3.5)]
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (params, authorization) = &seen[0];
        assert_eq!(params["start"], "2024-08-06T00:00:00Z");
        assert_eq!(params["end"], "2024-08-08T00:00:00Z");
        assert_eq!(params["device"], "DEVICE-1");
        assert_eq!(authorization.as_deref(), Some("Basic cmVhZGVyOnNlY3JldA=="));
    }

    #[tokio::test]
    async fn test_non_success_status_is_passed_through_without_retry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = counting_router(hits.clone(), StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;

        let source = HttpTelemetrySource::new(&settings(format!("{}/telemetry", base), 2)).unwrap();
        let err = source.fetch(&range()).await.unwrap_err();

        assert!(matches!(err, FetchError::Upstream { status: 503 }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_a_decode_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = counting_router(hits, StatusCode::OK, "not json").await;

        let source = HttpTelemetrySource::new(&settings(format!("{}/telemetry", base), 0)).unwrap();
        assert!(matches!(source.fetch(&range()).await, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_transport_failures_are_retried() {
        // Accepts and immediately drops every connection
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });

        let source = HttpTelemetrySource::new(&settings(format!("http://{}/telemetry", addr), 2)).unwrap();
        let err = source.fetch(&range()).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_debug_output_hides_password() {
        let source = HttpTelemetrySource::new(&settings("http://telemetry.local".to_string(), 0)).unwrap();
        assert!(!format!("{:?}", source).contains("secret"));
    }
}

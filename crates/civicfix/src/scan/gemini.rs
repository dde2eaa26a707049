use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::classifier::{ClassifierError, ImageClassifier};
use super::domain::{
    classification_prompt, response_schema, ClassificationRequest, ClassificationResult,
    SchemaViolation,
};
use crate::config::ClassifierConfig;

const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

/// Gemini `generateContent` client constrained to the classification schema.
pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    max_retries: u32,
    backoff: Duration,
}

impl GeminiClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint,
            max_retries: config.max_retries,
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Override the linear retry backoff unit.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn attempt(
        &self,
        api_key: &str,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ClassifierError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": request.mime_type,
                            "data": STANDARD.encode(&request.image),
                        }
                    },
                    { "text": classification_prompt(&request.filename) }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseJsonSchema": response_schema(),
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|err| SchemaViolation::Shape(err.to_string()))?;
        let output = envelope.first_text().ok_or(ClassifierError::EmptyResponse)?;

        Ok(ClassificationResult::from_model_output(output)?)
    }
}

#[async_trait]
impl ImageClassifier for GeminiClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult, ClassifierError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ClassifierError::NotConfigured)?;

        let mut attempt = 0;
        loop {
            match self.attempt(api_key, request).await {
                Ok(result) => {
                    debug!(
                        filename = %request.filename,
                        label = %result.label,
                        attempt,
                        "image classified"
                    );
                    return Ok(result);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        filename = %request.filename,
                        error = %err,
                        attempt,
                        "retrying classification"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    use super::*;
    use crate::scan::domain::IssueCategory;

    #[derive(Default)]
    struct FakeGemini {
        replies: Mutex<VecDeque<(StatusCode, Value)>>,
        requests: Mutex<Vec<(String, Option<String>, Value)>>,
    }

    impl FakeGemini {
        fn reply(&self, status: StatusCode, body: Value) {
            self.replies
                .lock()
                .expect("replies mutex poisoned")
                .push_back((status, body));
        }

        fn requests(&self) -> Vec<(String, Option<String>, Value)> {
            self.requests
                .lock()
                .expect("requests mutex poisoned")
                .clone()
        }
    }

    async fn generate_content(
        State(fake): State<Arc<FakeGemini>>,
        Path(model): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        fake.requests
            .lock()
            .expect("requests mutex poisoned")
            .push((model, key, body));

        let (status, reply) = fake
            .replies
            .lock()
            .expect("replies mutex poisoned")
            .pop_front()
            .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, json!({})));
        (status, Json(reply))
    }

    async fn spawn_fake(fake: Arc<FakeGemini>) -> SocketAddr {
        let app = Router::new()
            .route("/v1beta/models/:model", post(generate_content))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake gemini");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake gemini serves");
        });
        addr
    }

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn classifier(addr: SocketAddr, api_key: Option<&str>, max_retries: u32) -> GeminiClassifier {
        let config = ClassifierConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-2.5-flash".to_string(),
            base_url: format!("http://{addr}/"),
            timeout: Duration::from_secs(5),
            max_retries,
        };
        GeminiClassifier::new(&config)
            .expect("client builds")
            .with_backoff(Duration::ZERO)
    }

    fn request() -> ClassificationRequest {
        ClassificationRequest {
            image: vec![0xFF, 0xD8, 0xFF, 0xE0],
            filename: "pothole.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn sends_inline_image_with_schema_and_parses_reply() {
        let fake = Arc::new(FakeGemini::default());
        fake.reply(
            StatusCode::OK,
            candidate(r#"{"filename":"pothole.jpg","label":"roads","confidence":0.87}"#),
        );
        let addr = spawn_fake(fake.clone()).await;

        let result = classifier(addr, Some("test-key"), 0)
            .classify(&request())
            .await
            .expect("classification succeeds");
        assert_eq!(result.label, IssueCategory::Roads);
        assert!((result.confidence - 0.87).abs() < f64::EPSILON);

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        let (model, key, body) = &requests[0];
        assert_eq!(model, "gemini-2.5-flash:generateContent");
        assert_eq!(key.as_deref(), Some("test-key"));

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(parts[1]["text"]
            .as_str()
            .expect("prompt text")
            .contains("lighting & signals"));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseJsonSchema"], response_schema());
    }

    #[tokio::test]
    async fn schema_violations_fail_without_retry() {
        let fake = Arc::new(FakeGemini::default());
        fake.reply(
            StatusCode::OK,
            candidate(r#"{"filename":"pothole.jpg","label":"potholes","confidence":0.9}"#),
        );
        let addr = spawn_fake(fake.clone()).await;

        let err = classifier(addr, Some("test-key"), 3)
            .classify(&request())
            .await
            .expect_err("label outside the set");
        assert!(matches!(
            err,
            ClassifierError::Schema(SchemaViolation::UnknownLabel(_))
        ));
        assert_eq!(fake.requests().len(), 1);
    }

    #[tokio::test]
    async fn transient_upstream_errors_are_retried() {
        let fake = Arc::new(FakeGemini::default());
        fake.reply(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": { "code": 503, "status": "UNAVAILABLE" } }),
        );
        fake.reply(
            StatusCode::OK,
            candidate(r#"{"filename":"drift.png","label":"snow & ice","confidence":0.66}"#),
        );
        let addr = spawn_fake(fake.clone()).await;

        let result = classifier(addr, Some("test-key"), 1)
            .classify(&request())
            .await
            .expect("second attempt succeeds");
        assert_eq!(result.label, IssueCategory::SnowAndIce);
        assert_eq!(fake.requests().len(), 2);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let fake = Arc::new(FakeGemini::default());
        for _ in 0..3 {
            fake.reply(StatusCode::TOO_MANY_REQUESTS, json!({}));
        }
        let addr = spawn_fake(fake.clone()).await;

        let err = classifier(addr, Some("test-key"), 2)
            .classify(&request())
            .await
            .expect_err("retries exhausted");
        assert!(matches!(err, ClassifierError::Status { status: 429, .. }));
        assert_eq!(fake.requests().len(), 3);
    }

    #[tokio::test]
    async fn rejected_payloads_surface_as_status_errors() {
        let fake = Arc::new(FakeGemini::default());
        fake.reply(
            StatusCode::BAD_REQUEST,
            json!({ "error": { "code": 400, "message": "Unable to process input image." } }),
        );
        let addr = spawn_fake(fake.clone()).await;

        let err = classifier(addr, Some("test-key"), 2)
            .classify(&request())
            .await
            .expect_err("upstream rejects payload");
        assert!(matches!(err, ClassifierError::Status { status: 400, .. }));
        assert_eq!(fake.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_candidates_are_an_error() {
        let fake = Arc::new(FakeGemini::default());
        fake.reply(StatusCode::OK, json!({ "candidates": [] }));
        let addr = spawn_fake(fake.clone()).await;

        let err = classifier(addr, Some("test-key"), 0)
            .classify(&request())
            .await
            .expect_err("nothing to parse");
        assert!(matches!(err, ClassifierError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_api_key_short_circuits() {
        let fake = Arc::new(FakeGemini::default());
        let addr = spawn_fake(fake.clone()).await;

        let err = classifier(addr, None, 2)
            .classify(&request())
            .await
            .expect_err("no key configured");
        assert!(matches!(err, ClassifierError::NotConfigured));
        assert!(fake.requests().is_empty());
    }
}

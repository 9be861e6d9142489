use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::sse::SseDecoder;
use super::ResponseMode;
use crate::provider::{FragmentStream, GenerationRequest, LlmError, LlmProvider};

/// Finish reasons that mean the candidate was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Google Generative Language API (`generateContent` / `streamGenerateContent`).
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    mode: ResponseMode,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: String, mode: ResponseMode) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            mode,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_generation_config(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        match self.mode {
            ResponseMode::Buffered => {
                format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
            }
            ResponseMode::Streamed => format!(
                "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
                self.base_url, model
            ),
        }
    }

    /// Build the request body for the Gemini generateContent API.
    fn build_request_body(
        prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = temperature {
            generation_config.insert("temperature".into(), json!(t));
        }
        if let Some(m) = max_tokens {
            generation_config.insert("maxOutputTokens".into(), json!(m));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        body
    }

    async fn send(&self, model: &str, prompt: &str) -> Result<reqwest::Response, LlmError> {
        let url = self.endpoint(model);
        let body = Self::build_request_body(prompt, self.temperature, self.max_tokens);

        debug!(model = %model, mode = ?self.mode, "Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn stream(&self, request: GenerationRequest) -> Result<FragmentStream, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let response = self.send(model, &request.prompt).await?;

        match self.mode {
            ResponseMode::Buffered => {
                let resp: Value = response
                    .json()
                    .await
                    .map_err(|e| LlmError::ParseError(e.to_string()))?;
                let text = parse_candidate_text(&resp)?;
                Ok(Box::pin(stream::once(async move { Ok::<_, LlmError>(text) })))
            }
            ResponseMode::Streamed => Ok(sse_fragments(Box::pin(response.bytes_stream()))),
        }
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}

/// Map a non-2xx status to an error. Gemini reports a bad key as a 400
/// with reason `API_KEY_INVALID`.
fn classify_error(status: u16, body: String) -> LlmError {
    if status == 401 || status == 403 || body.contains("API_KEY_INVALID") {
        return LlmError::AuthError(body);
    }
    LlmError::ApiError { status, body }
}

/// Text of the first candidate, all parts concatenated. Empty when the
/// payload carries no text (e.g. a usage-only stream event).
fn parse_candidate_text(resp: &Value) -> Result<String, LlmError> {
    if let Some(error) = resp.get("error") {
        let status = error["code"].as_u64().unwrap_or(0) as u16;
        return Err(classify_error(status, error.to_string()));
    }

    if let Some(reason) = resp["promptFeedback"]["blockReason"].as_str() {
        return Err(LlmError::Blocked(format!("prompt blocked: {reason}")));
    }

    let candidate = &resp["candidates"][0];
    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = candidate["finishReason"].as_str() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(LlmError::Blocked(format!("candidate withheld: {reason}")));
            }
        }
    }

    Ok(text)
}

/// Turn one SSE payload into a fragment; `None` for events without text.
fn fragment_from_event(data: &str) -> Option<Result<String, LlmError>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let parsed = match serde_json::from_str::<Value>(data) {
        Ok(v) => v,
        Err(e) => return Some(Err(LlmError::ParseError(format!("bad SSE payload: {e}")))),
    };
    match parse_candidate_text(&parsed) {
        Ok(text) if text.is_empty() => None,
        other => Some(other),
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

struct SseState {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, LlmError>>,
    finished: bool,
}

/// Lazily decode an SSE byte stream into answer fragments. The stream ends
/// after the upstream closes or after the first error.
fn sse_fragments(bytes: ByteStream) -> FragmentStream {
    let state = SseState {
        bytes,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    let fragments = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for data in state.decoder.push(&chunk) {
                        state.pending.extend(fragment_from_event(&data));
                    }
                }
                Some(Err(e)) => {
                    warn!("Gemini stream interrupted: {}", e);
                    state.finished = true;
                    return Some((Err(LlmError::NetworkError(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    if let Some(data) = state.decoder.finish() {
                        state.pending.extend(fragment_from_event(&data));
                    }
                }
            }
        }
    });

    Box::pin(fragments)
}

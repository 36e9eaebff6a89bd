// Claude API streaming client using reqwest-eventsource.
//
// Sends one game prompt to the Anthropic Messages API with `stream: true`,
// optionally with the server-side web search tool enabled, and folds the
// Server-Sent Events into a finished `Completion` (text plus cited sources).

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use gnerd_core::describe::{Citation, Describer, Description, GameFacts};
use gnerd_core::error::DescriptionError;

use crate::prompt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const WEB_SEARCH_TOOL: &str = "web_search_20250305";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// `[llm]` section of the watchability config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Let the model search the web for recent news about the matchup.
    pub web_search: bool,
    pub max_web_searches: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1000,
            web_search: true,
            max_web_searches: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

/// Finished response from one streamed request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub citations: Vec<Citation>,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Low-level Claude API streaming client.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    web_search: Option<u32>,
}

impl ClaudeClient {
    /// Create a new client with the given API key and model identifier.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            web_search: None,
        }
    }

    /// Enable the web search tool, allowing up to `max_uses` searches per
    /// request.
    pub fn with_web_search(mut self, max_uses: u32) -> Self {
        self.web_search = Some(max_uses);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, system: &str, user_content: &str, max_tokens: u32) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "stream": true,
            "system": system,
            "messages": [{ "role": "user", "content": user_content }]
        });
        if let Some(max_uses) = self.web_search {
            body["tools"] = serde_json::json!([{
                "type": WEB_SEARCH_TOOL,
                "name": "web_search",
                "max_uses": max_uses
            }]);
        }
        body
    }

    /// Send a message to the Claude API and collect the streamed response.
    ///
    /// Returns when `message_stop` arrives or the stream ends. An `error`
    /// event or a transport failure is returned as `Err`.
    pub async fn stream_message(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
    ) -> anyhow::Result<Completion> {
        if self.api_key.is_empty() {
            anyhow::bail!("API key not configured");
        }

        let request = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.request_body(system, user_content, max_tokens));

        let mut es = request
            .eventsource()
            .map_err(|e| anyhow::anyhow!("Failed to create event source: {e}"))?;

        let mut acc = StreamAccumulator::default();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => match acc.apply(&msg.event, &msg.data) {
                    Ok(StreamStep::Continue) => {}
                    Ok(StreamStep::Done) => {
                        es.close();
                        return Ok(acc.finish());
                    }
                    Err(message) => {
                        es.close();
                        anyhow::bail!(message);
                    }
                },
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    es.close();
                    anyhow::bail!(extract_error_message(&err));
                }
            }
        }

        // Stream ended without message_stop.
        if acc.text.is_empty() {
            anyhow::bail!("Stream ended unexpectedly without any content");
        }
        Ok(acc.finish())
    }
}

// ---------------------------------------------------------------------------
// Stream accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamStep {
    Continue,
    Done,
}

/// Folds SSE events into a `Completion`.
#[derive(Debug, Default)]
pub(crate) struct StreamAccumulator {
    text: String,
    citations: Vec<Citation>,
    input_tokens: u32,
    output_tokens: u32,
}

impl StreamAccumulator {
    /// Apply one SSE event. `Err` carries the API's error message.
    pub(crate) fn apply(&mut self, event_type: &str, data: &str) -> Result<StreamStep, String> {
        match event_type {
            "message_start" => {
                match parse_input_tokens(data) {
                    Some(n) => self.input_tokens = n,
                    None => warn!("failed to parse input_tokens from message_start"),
                }
                debug!(input_tokens = self.input_tokens, "message_start");
            }
            "content_block_delta" => match parse_delta(data) {
                Some(Delta::Text(text)) => self.text.push_str(&text),
                Some(Delta::Citation(citation)) => self.push_citation(citation),
                None => {}
            },
            "message_delta" => {
                match parse_output_tokens(data) {
                    Some(n) => self.output_tokens = n,
                    None => warn!("failed to parse output_tokens from message_delta"),
                }
                debug!(output_tokens = self.output_tokens, "message_delta");
            }
            "message_stop" => {
                debug!("message_stop, streaming complete");
                return Ok(StreamStep::Done);
            }
            "error" => {
                return Err(parse_stream_error(data)
                    .unwrap_or_else(|| "API returned an unreadable error event".to_string()));
            }
            // ping, content_block_start (including search results), content_block_stop
            _ => {
                debug!(event_type, "ignoring SSE event");
            }
        }
        Ok(StreamStep::Continue)
    }

    fn push_citation(&mut self, citation: Citation) {
        if !self.citations.iter().any(|c| c.url == citation.url) {
            self.citations.push(citation);
        }
    }

    pub(crate) fn finish(self) -> Completion {
        Completion {
            text: self.text.trim().to_string(),
            citations: self.citations,
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active Claude client or disabled.
pub enum LlmClient {
    /// Claude API is configured and ready.
    Active(ClaudeClient),
    /// LLM functionality is disabled (no API key configured).
    Disabled,
}

impl LlmClient {
    /// Returns `Active` if a non-empty API key is given, otherwise `Disabled`.
    pub fn from_settings(api_key: Option<&str>, settings: &LlmSettings) -> Self {
        match api_key {
            Some(key) if !key.is_empty() => {
                let client = ClaudeClient::new(key.to_string(), settings.model.clone());
                let client = if settings.web_search {
                    client.with_web_search(settings.max_web_searches)
                } else {
                    client
                };
                LlmClient::Active(client)
            }
            _ => LlmClient::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }
}

// ---------------------------------------------------------------------------
// Describer adapter
// ---------------------------------------------------------------------------

/// Generates game descriptions through the Claude API.
pub struct LlmDescriber {
    client: LlmClient,
    max_tokens: u32,
}

impl LlmDescriber {
    pub fn new(client: LlmClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }
}

#[async_trait]
impl Describer for LlmDescriber {
    async fn describe(&self, facts: &GameFacts) -> Result<Description, DescriptionError> {
        let client = match &self.client {
            LlmClient::Active(client) => client,
            LlmClient::Disabled => return Err(DescriptionError::Disabled),
        };

        let system = prompt::system_prompt();
        let user = prompt::build_game_prompt(facts);
        let completion = client
            .stream_message(&system, &user, self.max_tokens)
            .await
            .map_err(|e| DescriptionError::Request(format!("{e:#}")))?;

        info!(
            away = %facts.away_team.name,
            home = %facts.home_team.name,
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            sources = completion.citations.len(),
            "generated game description"
        );
        into_description(completion)
    }
}

fn into_description(completion: Completion) -> Result<Description, DescriptionError> {
    if completion.text.is_empty() {
        return Err(DescriptionError::EmptyResponse);
    }
    Ok(Description {
        text: completion.text,
        sources: completion.citations,
    })
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Payload of a `content_block_delta` event we care about.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Delta {
    Text(String),
    Citation(Citation),
}

/// Extract `input_tokens` from a `message_start` event's JSON.
///
/// Expected shape: `{ "type": "message_start", "message": { "usage": { "input_tokens": N } } }`
pub(crate) fn parse_input_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("message")?
        .get("usage")?
        .get("input_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract a text or citation delta from a `content_block_delta` event.
///
/// Text: `{ "delta": { "type": "text_delta", "text": "..." } }`
/// Citation: `{ "delta": { "type": "citations_delta", "citation": { "url", "title", "cited_text" } } }`
pub(crate) fn parse_delta(data: &str) -> Option<Delta> {
    let v: Value = serde_json::from_str(data).ok()?;
    let delta = v.get("delta")?;
    match delta.get("type").and_then(Value::as_str) {
        Some("citations_delta") => {
            let c = delta.get("citation")?;
            let url = c.get("url")?.as_str()?.to_string();
            let title = c
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .unwrap_or(&url)
                .to_string();
            let cited_text = c
                .get("cited_text")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(Delta::Citation(Citation {
                title,
                url,
                cited_text,
            }))
        }
        Some("text_delta") | None => delta
            .get("text")?
            .as_str()
            .map(|s| Delta::Text(s.to_string())),
        // input_json_delta for tool calls, thinking deltas, ...
        Some(_) => None,
    }
}

/// Extract `output_tokens` from a `message_delta` event's JSON.
///
/// Expected shape: `{ "type": "message_delta", "usage": { "output_tokens": N } }`
pub(crate) fn parse_output_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("usage")?
        .get("output_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract the message from an in-stream `error` event.
///
/// Expected shape: `{ "type": "error", "error": { "type": "overloaded_error", "message": "..." } }`
pub(crate) fn parse_stream_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    let err = v.get("error")?;
    let message = err.get("message")?.as_str()?;
    match err.get("type").and_then(Value::as_str) {
        Some(kind) => Some(format!("{kind}: {message}")),
        None => Some(message.to_string()),
    }
}

/// Extract a human-readable error message from an SSE error.
fn extract_error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            format!("API returned status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => {
            format!("Network error: {e}")
        }
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- SSE JSON parsing tests --

    #[test]
    fn parse_message_start_input_tokens() {
        let data = r#"{
            "type": "message_start",
            "message": {
                "id": "msg_123",
                "type": "message",
                "role": "assistant",
                "content": [],
                "model": "claude-sonnet-4-20250514",
                "usage": { "input_tokens": 42, "output_tokens": 0 }
            }
        }"#;
        assert_eq!(parse_input_tokens(data), Some(42));
    }

    #[test]
    fn parse_message_start_missing_usage() {
        let data = r#"{ "type": "message_start", "message": { "id": "msg_1" } }"#;
        assert_eq!(parse_input_tokens(data), None);
    }

    #[test]
    fn parse_text_delta() {
        let data = r#"{
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": "Skenes takes the mound" }
        }"#;
        assert_eq!(
            parse_delta(data),
            Some(Delta::Text("Skenes takes the mound".to_string()))
        );
    }

    #[test]
    fn parse_citation_delta() {
        let data = r#"{
            "type": "content_block_delta",
            "index": 2,
            "delta": {
                "type": "citations_delta",
                "citation": {
                    "type": "web_search_result_location",
                    "url": "https://www.mlb.com/news/preview",
                    "title": "Series preview",
                    "encrypted_index": "abc",
                    "cited_text": "The Pirates ace has allowed one run in his last three starts."
                }
            }
        }"#;
        assert_eq!(
            parse_delta(data),
            Some(Delta::Citation(Citation {
                title: "Series preview".to_string(),
                url: "https://www.mlb.com/news/preview".to_string(),
                cited_text: Some(
                    "The Pirates ace has allowed one run in his last three starts.".to_string()
                ),
            }))
        );
    }

    #[test]
    fn citation_without_title_falls_back_to_url() {
        let data = r#"{
            "delta": { "type": "citations_delta", "citation": { "url": "https://x.test/a", "title": "" } }
        }"#;
        match parse_delta(data) {
            Some(Delta::Citation(c)) => {
                assert_eq!(c.title, "https://x.test/a");
                assert_eq!(c.cited_text, None);
            }
            other => panic!("expected citation, got {other:?}"),
        }
    }

    #[test]
    fn tool_input_deltas_are_ignored() {
        let data = r#"{
            "delta": { "type": "input_json_delta", "partial_json": "{\"query\": \"pirates" }
        }"#;
        assert_eq!(parse_delta(data), None);
    }

    #[test]
    fn parse_delta_invalid_json() {
        assert_eq!(parse_delta("{broken"), None);
    }

    #[test]
    fn parse_message_delta_output_tokens() {
        let data = r#"{
            "type": "message_delta",
            "delta": { "stop_reason": "end_turn", "stop_sequence": null },
            "usage": { "output_tokens": 128 }
        }"#;
        assert_eq!(parse_output_tokens(data), Some(128));
    }

    #[test]
    fn parse_error_event() {
        let data = r#"{ "type": "error", "error": { "type": "overloaded_error", "message": "Overloaded" } }"#;
        assert_eq!(
            parse_stream_error(data),
            Some("overloaded_error: Overloaded".to_string())
        );
        assert_eq!(parse_stream_error("{}"), None);
    }

    // -- Accumulator --

    #[test]
    fn accumulator_collects_text_and_unique_citations() {
        let mut acc = StreamAccumulator::default();
        let events = [
            ("message_start", r#"{"message":{"usage":{"input_tokens":900}}}"#),
            ("ping", "{}"),
            ("content_block_start", r#"{"content_block":{"type":"web_search_tool_result"}}"#),
            ("content_block_delta", r#"{"delta":{"type":"text_delta","text":"  Two aces "}}"#),
            (
                "content_block_delta",
                r#"{"delta":{"type":"citations_delta","citation":{"url":"https://a.test","title":"A"}}}"#,
            ),
            ("content_block_delta", r#"{"delta":{"type":"text_delta","text":"meet tonight.\n"}}"#),
            (
                "content_block_delta",
                r#"{"delta":{"type":"citations_delta","citation":{"url":"https://a.test","title":"A again"}}}"#,
            ),
            ("message_delta", r#"{"usage":{"output_tokens":55}}"#),
        ];
        for (event, data) in events {
            assert_eq!(acc.apply(event, data), Ok(StreamStep::Continue));
        }
        assert_eq!(acc.apply("message_stop", "{}"), Ok(StreamStep::Done));

        let done = acc.finish();
        assert_eq!(done.text, "Two aces meet tonight.");
        assert_eq!(done.citations.len(), 1);
        assert_eq!(done.citations[0].title, "A");
        assert_eq!(done.input_tokens, 900);
        assert_eq!(done.output_tokens, 55);
    }

    #[test]
    fn accumulator_surfaces_error_event() {
        let mut acc = StreamAccumulator::default();
        let step = acc.apply(
            "error",
            r#"{"type":"error","error":{"type":"api_error","message":"boom"}}"#,
        );
        assert_eq!(step, Err("api_error: boom".to_string()));
    }

    // -- Request body --

    #[test]
    fn request_body_includes_web_search_only_when_enabled() {
        let plain = ClaudeClient::new("k".into(), "m".into());
        let body = plain.request_body("sys", "user", 500);
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["stream"], true);
        assert!(body.get("tools").is_none());

        let searching = ClaudeClient::new("k".into(), "m".into()).with_web_search(2);
        let body = searching.request_body("sys", "user", 500);
        assert_eq!(body["tools"][0]["type"], WEB_SEARCH_TOOL);
        assert_eq!(body["tools"][0]["max_uses"], 2);
    }

    // -- LlmClient::from_settings --

    #[test]
    fn client_disabled_without_key() {
        let settings = LlmSettings::default();
        assert!(!LlmClient::from_settings(None, &settings).is_active());
        assert!(!LlmClient::from_settings(Some(""), &settings).is_active());
    }

    #[test]
    fn client_active_with_key() {
        let settings = LlmSettings {
            model: "claude-test".into(),
            ..LlmSettings::default()
        };
        match LlmClient::from_settings(Some("sk-ant-test"), &settings) {
            LlmClient::Active(c) => {
                assert_eq!(c.model(), "claude-test");
                assert_eq!(c.web_search, Some(3));
            }
            LlmClient::Disabled => panic!("expected Active"),
        }
    }

    #[test]
    fn empty_completion_is_an_error() {
        let err = into_description(Completion::default()).unwrap_err();
        assert_eq!(err, DescriptionError::EmptyResponse);

        let ok = into_description(Completion {
            text: "Worth a look.".into(),
            ..Completion::default()
        })
        .unwrap();
        assert_eq!(ok.text, "Worth a look.");
        assert!(ok.sources.is_empty());
    }
}

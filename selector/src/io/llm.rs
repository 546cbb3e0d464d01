//! Model client for schema-constrained selection requests.
//!
//! The [`ModelClient`] trait decouples selection from the HTTP backend
//! (an OpenAI-compatible chat completions endpoint). Tests use scripted
//! clients that return predetermined answers without network access.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::Draft;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::io::prompt::Prompt;

const SELECTION_SCHEMA: &str = include_str!("../../schemas/selection.schema.json");
const SELECTION_SCHEMA_NAME: &str = "selection";
const ERROR_BODY_PREVIEW_CHARS: usize = 500;

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: Prompt,
    /// JSON Schema the answer must conform to.
    pub schema_name: String,
    pub schema: Value,
}

/// Abstraction over model backends. Returns the raw answer text.
pub trait ModelClient {
    fn complete(&self, request: &ModelRequest) -> Result<String>;
}

/// Client for `POST {base_url}/chat/completions` with structured outputs.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    temperature: Option<f32>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    fn with_client(client: Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature: None,
        }
    }

    /// Sampling temperature sent with every request; `None` leaves it to the model.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

impl ModelClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %request.model))]
    fn complete(&self, request: &ModelRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        info!(%url, "requesting model completion");
        debug!(system = %request.prompt.system, user = %request.prompt.user, "prompt");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&chat_request_body(request, self.temperature))
            .send()
            .context("call chat completions API")?;

        let status = response.status();
        let body = response.text().context("read chat completions response")?;
        if !status.is_success() {
            warn!(%status, "chat completions request failed");
            bail!(
                "chat completions request failed: HTTP {status}: {}",
                preview(&body)
            );
        }
        let content = parse_chat_response(&body)?;
        debug!(content = %content, "model answer");
        Ok(content)
    }
}

/// Build the JSON body for a chat completions request.
pub fn chat_request_body(request: &ModelRequest, temperature: Option<f32>) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.prompt.system },
            { "role": "user", "content": request.prompt.user },
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": request.schema_name,
                "strict": true,
                "schema": request.schema,
            }
        }
    });
    if let Some(temperature) = temperature {
        body["temperature"] = json!(temperature);
    }
    body
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    refusal: Option<String>,
}

/// Extract the answer text from a chat completions response body.
pub fn parse_chat_response(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .with_context(|| format!("parse chat completions response: {}", preview(body)))?;
    let message = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| anyhow!("chat completions response has no choices"))?;
    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        bail!("model refused the request: {refusal}");
    }
    message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| anyhow!("model returned an empty answer"))
}

/// Parsed `selection.schema.json`.
pub fn selection_schema() -> Result<Value> {
    serde_json::from_str(SELECTION_SCHEMA).context("parse selection schema")
}

#[derive(Debug, Deserialize)]
struct SelectionAnswer {
    selected: Vec<String>,
}

/// Send `prompt` with the selection schema and return the selected strings.
///
/// The answer is validated against the schema before use, since not every
/// compatible endpoint enforces `strict` structured outputs.
pub fn request_selection<C: ModelClient>(
    client: &C,
    model: &str,
    prompt: Prompt,
) -> Result<Vec<String>> {
    let schema = selection_schema()?;
    let request = ModelRequest {
        model: model.to_string(),
        prompt,
        schema_name: SELECTION_SCHEMA_NAME.to_string(),
        schema,
    };
    let raw = client.complete(&request)?;
    let answer: Value = serde_json::from_str(raw.trim())
        .with_context(|| format!("model answer is not JSON: {}", preview(&raw)))?;
    validate_schema(&answer, &request.schema)?;
    let parsed: SelectionAnswer =
        serde_json::from_value(answer).context("parse model answer as selection")?;
    Ok(parsed.selected)
}

/// Validate JSON instance against a JSON Schema (Draft 2020-12).
fn validate_schema(instance: &Value, schema: &Value) -> Result<()> {
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .context("compile json schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("model answer does not match schema:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    if out.len() < text.len() {
        out.push_str("...");
    }
    out
}

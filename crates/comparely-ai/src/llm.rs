//! Chat-completion client for free-text device analysis.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. The model is
//! asked to answer in JSON; replies that still fail to parse are handed back
//! verbatim as [`Analysis::Raw`] rather than treated as errors.

use comparely_core::{Device, LlmConfig, format_thousands};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How many devices a recommendation prompt lists.
pub const RECOMMENDATION_PROMPT_SIZE: usize = 3;

/// Use cases offered to users when asking for recommendations.
pub const USE_CASES: &[&str] = &["gaming", "photography", "work", "study", "multimedia"];

const SYSTEM_PROMPT: &str = "You are a technology expert helping users choose a smartphone. \
Always answer with valid JSON only.";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("AI API key is not configured")]
    MissingApiKey,
    #[error("AI request timed out")]
    Timeout,
    #[error("could not connect to AI service: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("AI service rejected the API key")]
    Unauthorized,
    #[error("AI service rate limit reached")]
    RateLimited,
    #[error("AI service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("AI request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("unexpected AI response format: {0}")]
    Json(#[from] serde_json::Error),
    #[error("AI response contained no message")]
    EmptyResponse,
}

impl LlmError {
    /// Short explanation suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey => {
                "AI analysis is not available: set AI_API_KEY and restart.".to_string()
            }
            Self::Timeout => {
                "The AI service took too long to respond. Try again in a moment.".to_string()
            }
            Self::Connect(_) => {
                "Could not reach the AI service. Check your internet connection.".to_string()
            }
            Self::Unauthorized => {
                "The AI API key was rejected. Check that AI_API_KEY is correct and active."
                    .to_string()
            }
            Self::RateLimited => {
                "The AI usage quota has been reached. Wait a while and try again.".to_string()
            }
            Self::Status { status, .. } => {
                format!("The AI service returned HTTP {status}.")
            }
            Self::Http(_) => "The request to the AI service failed.".to_string(),
            Self::Json(_) | Self::EmptyResponse => {
                "The AI service returned a response in an unexpected format.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// A model reply: parsed into `T` when possible, otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Analysis<T> {
    Structured(T),
    Raw(String),
}

impl<T: DeserializeOwned> Analysis<T> {
    /// Parse a reply, tolerating a surrounding Markdown code fence.
    pub fn parse(reply: &str) -> Self {
        match serde_json::from_str(strip_code_fence(reply)) {
            Ok(parsed) => Self::Structured(parsed),
            Err(e) => {
                debug!(error = %e, "AI reply is not the requested JSON, keeping raw text");
                Self::Raw(reply.trim().to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonAnalysis {
    pub performance: String,
    pub camera: String,
    pub battery: String,
    pub value_for_money: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationAnalysis {
    pub top_1: Option<String>,
    pub top_2: Option<String>,
    pub top_3: Option<String>,
    pub summary: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Http)?;
        Ok(Self { client, config })
    }

    /// True when an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }

    /// Send `messages` and return the first choice's text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let key = self.config.api_key().ok_or(LlmError::MissingApiKey)?;
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        info!(url = %self.config.api_url, model = %self.config.model, "requesting chat completion");
        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        match status.as_u16() {
            401 => return Err(LlmError::Unauthorized),
            429 => return Err(LlmError::RateLimited),
            _ if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(LlmError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let bytes = resp.bytes().await.map_err(classify)?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    /// Ask for a section-by-section comparison of two devices.
    pub async fn analyze_comparison(
        &self,
        first: &Device,
        second: &Device,
    ) -> Result<Analysis<ComparisonAnalysis>, LlmError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(comparison_prompt(first, second)),
        ];
        let reply = self
            .complete(&messages)
            .await
            .inspect_err(|e| warn!(error = %e, "comparison analysis failed"))?;
        Ok(Analysis::parse(&reply))
    }

    /// Ask for a short ranking of the leading candidates.
    ///
    /// Only the first [`RECOMMENDATION_PROMPT_SIZE`] devices are sent.
    pub async fn recommend(
        &self,
        devices: &[Device],
        use_case: Option<&str>,
        max_price: Option<f64>,
    ) -> Result<Analysis<RecommendationAnalysis>, LlmError> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(recommendation_prompt(devices, use_case, max_price)),
        ];
        let reply = self
            .complete(&messages)
            .await
            .inspect_err(|e| warn!(error = %e, "recommendation analysis failed"))?;
        Ok(Analysis::parse(&reply))
    }
}

fn classify(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::Connect(e)
    } else {
        LlmError::Http(e)
    }
}

/// Remove a leading ```` ``` ```` or ```` ```json ```` fence and its closer.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn or_na(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("N/A")
}

fn price_label(price: Option<f64>) -> String {
    price.map_or_else(|| "price unknown".to_string(), |p| format!("Rp {}", format_thousands(p)))
}

fn year_label(year: Option<i32>) -> String {
    year.map_or_else(|| "year unknown".to_string(), |y| y.to_string())
}

fn describe_device(d: &Device) -> String {
    format!(
        "{} ({}) - {} - {}\nCPU: {}, RAM: {}, Camera: {}, Battery: {}",
        d.name,
        d.brand,
        price_label(d.price),
        year_label(d.release_year),
        or_na(&d.cpu),
        or_na(&d.ram),
        or_na(&d.camera),
        or_na(&d.battery),
    )
}

fn comparison_prompt(first: &Device, second: &Device) -> String {
    format!(
        "Compare the following two smartphones.\n\n\
         Device 1: {}\n\n\
         Device 2: {}\n\n\
         Answer with exactly this JSON object:\n\
         {{\n  \
           \"performance\": \"CPU and RAM comparison in 1-2 sentences\",\n  \
           \"camera\": \"camera comparison in 1 sentence\",\n  \
           \"battery\": \"battery comparison in 1 sentence\",\n  \
           \"value_for_money\": \"price versus features in 1-2 sentences\",\n  \
           \"recommendation\": \"Choose device 1 if... Choose device 2 if...\"\n\
         }}",
        describe_device(first),
        describe_device(second),
    )
}

fn recommendation_prompt(devices: &[Device], use_case: Option<&str>, max_price: Option<f64>) -> String {
    let mut heading = String::from("Recommend a smartphone");
    if let Some(use_case) = use_case.map(str::trim).filter(|s| !s.is_empty()) {
        heading.push_str(&format!(" for {use_case}"));
    }
    if let Some(max) = max_price {
        heading.push_str(&format!(" with a budget of at most Rp {}", format_thousands(max)));
    }

    let list: String = devices
        .iter()
        .take(RECOMMENDATION_PROMPT_SIZE)
        .enumerate()
        .map(|(i, d)| {
            format!(
                "{}. {} - {} ({})\n",
                i + 1,
                d.name,
                price_label(d.price),
                year_label(d.release_year)
            )
        })
        .collect();

    format!(
        "{heading}:\n\n{list}\n\
         Answer with exactly this JSON object:\n\
         {{\n  \
           \"top_1\": \"device name and a short reason\",\n  \
           \"top_2\": \"device name and a short reason\",\n  \
           \"top_3\": \"device name and a short reason\",\n  \
           \"summary\": \"1-2 sentence conclusion\"\n\
         }}"
    )
}

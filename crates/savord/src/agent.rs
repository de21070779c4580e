//! LLM search agent - asks a web-search capable model for restaurant
//! candidates with a strict JSON output schema.
//!
//! A single invocation is all-or-nothing: any upstream error, missing
//! output text, or schema-invalid output fails the whole call and the
//! caller never sees partial candidates.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use savor_common::AgentConfig;

/// Low sampling temperature keeps suggestions stable between calls.
const TEMPERATURE: f64 = 0.3;

/// Input sent when the caller supplies no free-text query.
const DEFAULT_QUERY: &str = "Any recommendation";

/// One model-proposed suggestion, prior to directory verification.
/// Exact duplicate triples collapse in the result set; near-duplicates
/// with a different rationale do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub reference_url: String,
    pub rationale: String,
}

/// Everything one agent invocation needs.
#[derive(Debug, Clone, Default)]
pub struct CandidateQuery {
    pub city: String,
    pub query: String,
    pub cuisines: Vec<String>,
    pub prices: Vec<String>,
    pub max_suggestions: usize,
    /// Per-request credential; the configured key is the fallback.
    pub api_key: Option<String>,
}

/// Agent errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Http(String),

    #[error("agent returned HTTP {0}")]
    Status(u16),

    #[error("agent output did not match the expected schema: {0}")]
    InvalidOutput(String),

    #[error("agent returned no output text")]
    EmptyResponse,
}

/// Candidate-search capability.
///
/// Production code uses [`HttpSearchAgent`]; tests use
/// [`FakeSearchAgent`] with canned candidate sets.
#[async_trait]
pub trait SearchAgent: Send + Sync {
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<HashSet<Candidate>, AgentError>;
}

#[derive(Debug, Deserialize)]
struct CandidateList {
    restaurants: Vec<Candidate>,
}

/// Real agent backed by the model service's responses endpoint.
pub struct HttpSearchAgent {
    config: AgentConfig,
    http: reqwest::Client,
}

impl HttpSearchAgent {
    pub fn new(config: AgentConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("Failed to build agent HTTP client")?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl SearchAgent for HttpSearchAgent {
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<HashSet<Candidate>, AgentError> {
        let url = format!("{}/responses", self.config.endpoint.trim_end_matches('/'));
        let input = if query.query.is_empty() {
            DEFAULT_QUERY
        } else {
            query.query.as_str()
        };

        let body = serde_json::json!({
            "model": self.config.model,
            "instructions": build_instructions(query),
            "input": input,
            "tools": [{ "type": "web_search" }],
            "parallel_tool_calls": true,
            "temperature": TEMPERATURE,
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "restaurant_candidates",
                    "strict": true,
                    "schema": output_schema(),
                }
            },
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) =
            resolve_api_key(query.api_key.as_deref(), self.config.api_key.as_deref())
        {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::Status(response.status().as_u16()));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidOutput(e.to_string()))?;

        let text = extract_output_text(&response_json).ok_or(AgentError::EmptyResponse)?;
        let candidates = parse_candidates(text)?;
        debug!("Agent returned {} candidates", candidates.len());

        Ok(candidates)
    }
}

/// Build the concierge instruction for one query. Filters become
/// natural-language constraints appended to the instruction.
fn build_instructions(query: &CandidateQuery) -> String {
    let mut filters: Vec<String> = Vec::new();
    if !query.cuisines.is_empty() {
        filters.push(format!("cuisine(s): {}", query.cuisines.join(", ")));
    }
    if !query.prices.is_empty() {
        filters.push(format!("price: {}", query.prices.join(", ")));
    }

    let mut instructions = format!(
        "You are a dining concierge for {}. \
         Return **only** JSON that validates against the provided schema. \
         Include at most {} places with valid directory pages. \
         For each place add a short `rationale` string explaining, in one \
         sentence, why you are recommending it.",
        query.city, query.max_suggestions
    );
    if !filters.is_empty() {
        instructions.push_str(&format!(" Required filters: {}.", filters.join(" and ")));
    }

    instructions
}

/// Resolve the credential for one request: the caller's override wins,
/// the process-wide default is the fallback.
fn resolve_api_key<'a>(
    override_key: Option<&'a str>,
    default_key: Option<&'a str>,
) -> Option<&'a str> {
    override_key.or(default_key)
}

fn output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "restaurants": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "reference_url": { "type": "string" },
                        "rationale": { "type": "string" }
                    },
                    "required": ["name", "reference_url", "rationale"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["restaurants"],
        "additionalProperties": false
    })
}

/// Pull the structured-output text out of a responses-API payload.
fn extract_output_text(response: &serde_json::Value) -> Option<&str> {
    response
        .get("output")?
        .as_array()?
        .iter()
        .find(|item| item.get("type").and_then(|t| t.as_str()) == Some("message"))?
        .get("content")?
        .as_array()?
        .iter()
        .find(|part| part.get("type").and_then(|t| t.as_str()) == Some("output_text"))?
        .get("text")?
        .as_str()
}

/// Parse the model's JSON and collapse exact duplicate triples.
fn parse_candidates(text: &str) -> Result<HashSet<Candidate>, AgentError> {
    let list: CandidateList =
        serde_json::from_str(text).map_err(|e| AgentError::InvalidOutput(e.to_string()))?;
    Ok(list.restaurants.into_iter().collect())
}

/// Fake agent for tests: canned candidate sets or errors, a call
/// counter, and the last query it was handed.
pub struct FakeSearchAgent {
    responses: Mutex<Vec<Result<Vec<Candidate>, AgentError>>>,
    call_count: Mutex<usize>,
    last_query: Mutex<Option<CandidateQuery>>,
}

impl FakeSearchAgent {
    pub fn new(responses: Vec<Result<Vec<Candidate>, AgentError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// A fake that returns the same candidates on every call.
    pub fn always(candidates: Vec<Candidate>) -> Self {
        Self::new(vec![Ok(candidates)])
    }

    /// A fake that fails every call.
    pub fn always_error(error: AgentError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// The query from the most recent call, if any.
    pub fn last_query(&self) -> Option<CandidateQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchAgent for FakeSearchAgent {
    async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<HashSet<Candidate>, AgentError> {
        *self.call_count.lock().unwrap() += 1;
        *self.last_query.lock().unwrap() = Some(query.clone());

        let mut responses = self.responses.lock().unwrap();
        let response = if responses.is_empty() {
            Err(AgentError::EmptyResponse)
        } else if responses.len() == 1 {
            responses[0].clone()
        } else {
            responses.remove(0)
        };

        response.map(|candidates| candidates.into_iter().collect())
    }
}

//! Gemini API client for task enrichment.
//!
//! Calls `generateContent` in JSON mode and defensively parses the model
//! output into a [`TaskEnrichment`]. Shape mismatches become
//! [`EnrichmentError::Malformed`], never a propagated parse failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Enricher, EnrichmentError, TaskEnrichment};
use crate::store::{Task, SUBTASKS_PER_TASK};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl Enricher for GeminiClient {
    async fn enrich(&self, task: &Task) -> Result<TaskEnrichment, EnrichmentError> {
        let url = format!("{}/{}:generateContent", GEMINI_API_URL, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(task),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Network(format!("request timed out: {}", e))
                } else {
                    EnrichmentError::Network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(EnrichmentError::Http {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        parse_response(&body)
    }
}

/// Request/response shapes for the `generateContent` endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn build_prompt(task: &Task) -> String {
    format!(
        "You are a project planning assistant. A user created this task:\n\
         Title: {title}\n\
         Description: {description}\n\
         Priority: {priority}\n\n\
         Respond with a single JSON object with these fields:\n\
         - \"summary\": a one-sentence summary of the task\n\
         - \"sub_tasks\": an array of exactly {count} short, actionable subtask titles\n\
         - \"category\": a short category label such as \"Bug Fix\" or \"Feature\"",
        title = task.title,
        description = task.description,
        priority = task.priority,
        count = SUBTASKS_PER_TASK,
    )
}

/// Extract the enrichment payload from a raw `generateContent` body.
fn parse_response(body: &str) -> Result<TaskEnrichment, EnrichmentError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| EnrichmentError::Malformed(format!("unexpected response envelope: {}", e)))?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| EnrichmentError::Malformed("response contained no candidates".to_string()))?;

    serde_json::from_str(strip_code_fences(&text)).map_err(|e| {
        EnrichmentError::Malformed(format!("model did not return the expected JSON shape: {}", e))
    })
}

/// Models sometimes wrap JSON-mode output in a markdown fence anyway.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

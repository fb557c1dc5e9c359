//! Gemini vision client: turns a photo of food into `{name, quantity}` guesses.

use crate::error::{Error, Result};
use crate::models::ScannedItem;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SCAN_PROMPT: &str = "Analyze the food items in the image. Return a JSON array where each \
object has a 'name' (string) and 'quantity' (string). \
Example: [{\"name\": \"Apple\", \"quantity\": \"3\"}].";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

/// Vision model client
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    pub(crate) base_url: String,
}

impl VisionClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Point the client at another endpoint (a proxy, or a mock server in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a JPEG photo to the model and return the model's raw text answer.
    pub async fn analyze_image(&self, image: &[u8]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingApiKey("Gemini"))?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: SCAN_PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        log::info!("Sending {} byte image to {}", image.len(), self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .inspect_err(|e| log::error!("Gemini request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Gemini API error: {} - {}", status, body);
            return Err(Error::HttpStatus { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::InvalidResponse("no candidates in Gemini response".to_string()))
    }

    /// Photo in, scanned item guesses out.
    pub async fn extract_items(&self, image: &[u8]) -> Result<Vec<ScannedItem>> {
        let text = self.analyze_image(image).await?;
        log::debug!("Gemini result: {}", text);
        parse_scanned_items(&text)
    }
}

/// Strip a surrounding markdown code fence (```json ... ```) from model output.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse model output into scanned items. The payload must be a JSON array.
pub fn parse_scanned_items(text: &str) -> Result<Vec<ScannedItem>> {
    let value: serde_json::Value = serde_json::from_str(&strip_code_fences(text))?;
    if !value.is_array() {
        return Err(Error::InvalidResponse(
            "Invalid response format: expected an array".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
#[path = "vision_tests.rs"]
mod tests;

//! Groq chat-completions client for recipe suggestions and recipe metadata.
//!
//! Both calls degrade instead of failing: a missing key, a network error or an
//! unparseable answer yields no suggestions / no metadata and a logged warning.

use crate::error::{Error, Result};
use crate::models::{RecipeMetadata, RecipeSuggestion};
use crate::vision::strip_code_fences;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Number of recipes requested when the caller does not ask for a count
pub const DEFAULT_SUGGESTION_COUNT: usize = 3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn suggestion_prompt(ingredients: &[String], count: usize) -> String {
    format!(
        "You are a helpful cooking assistant.\n\n\
         Given these available ingredients:\n{}\n\n\
         Suggest {} simple recipes.\n\n\
         Rules:\n\
         - Return ONLY valid JSON\n\
         - No explanations\n\
         - No backticks\n\
         - Format:\n\
         [\n  {{ \"name\": \"Recipe name\", \"ingredients\": [\"ingredient1\", \"ingredient2\"], \"how_to_cook\": \"Step 1...\" }}\n]\n",
        ingredients.join(", "),
        count
    )
}

fn metadata_prompt(name: &str, ingredients: &[String]) -> String {
    format!(
        "You are a cooking expert.\n\
         Recipe: {}\n\
         Ingredients: {}\n\n\
         Estimate the preparation time, difficulty, and servings.\n\
         Return ONLY valid JSON. No backticks.\n\
         Format:\n\
         {{\n  \"time\": \"e.g. 30 mins\",\n  \"difficulty\": \"Easy/Medium/Hard\",\n  \"servings\": \"e.g. 2 people\"\n}}\n",
        name,
        ingredients.join(", ")
    )
}

/// Language model client for recipe suggestions
#[derive(Debug, Clone)]
pub struct RecipeClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    pub(crate) base_url: String,
}

impl RecipeClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: GROQ_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Suggest `count` (default 3) recipes for the given ingredient names.
    ///
    /// An empty ingredient list returns no suggestions without calling out.
    pub async fn suggest_recipes(
        &self,
        ingredients: &[String],
        count: Option<usize>,
    ) -> Vec<RecipeSuggestion> {
        if ingredients.is_empty() {
            return Vec::new();
        }
        let prompt = suggestion_prompt(ingredients, count.unwrap_or(DEFAULT_SUGGESTION_COUNT));
        match self.complete_json::<Vec<RecipeSuggestion>>(prompt, 0.7).await {
            Ok(recipes) => {
                log::info!("Received {} recipe suggestions", recipes.len());
                recipes
            }
            Err(e) => {
                log::warn!("Groq recipe error: {}", e);
                Vec::new()
            }
        }
    }

    /// Estimate time, difficulty and servings for a recipe.
    pub async fn generate_metadata(
        &self,
        name: &str,
        ingredients: &[String],
    ) -> Option<RecipeMetadata> {
        match self
            .complete_json::<RecipeMetadata>(metadata_prompt(name, ingredients), 0.5)
            .await
        {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                log::warn!("Groq metadata error for {}: {}", name, e);
                None
            }
        }
    }

    /// Send one user message and parse the first choice's content as JSON.
    async fn complete_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        temperature: f32,
    ) -> Result<T> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingApiKey("Groq"))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::HttpStatus { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::InvalidResponse("empty completion".to_string()))?;
        log::debug!("Groq content: {}", content);

        Ok(serde_json::from_str(&strip_code_fences(&content))?)
    }
}

#[cfg(test)]
#[path = "groq_tests.rs"]
mod tests;

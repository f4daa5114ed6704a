//! Story generation for `gemini-story` rewards.
//!
//! Generation never fails from the caller's point of view: a missing API key
//! or a failed request yields a fixed fallback story.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The key is sent as a header, never in the URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Returned when no API key is configured.
pub const NO_API_KEY_STORY: &str = "API Key not found. Please ask your developer to configure it. For now, here's a placeholder story: Once upon a time, two wonderful people decided to build an app to celebrate their love. They completed quests, earned rewards, and lived happily ever after. The end.";

/// Returned when the generation request fails.
pub const FALLBACK_STORY: &str = "There was a little hiccup creating your story. Let's try again later! For now, know that our story is my favorite.";

/// Produces story text from a reward prompt and the couple's names.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, partner_name: &str, your_name: &str) -> String;
}

/// Full instruction sent to the model.
pub fn compose_prompt(prompt: &str, partner_name: &str, your_name: &str) -> String {
    format!(
        "{} The story should be about a couple. One person is named {}, and the other is {}. Make it romantic, sweet, and about 200 words long.",
        prompt.trim(),
        partner_name,
        your_name
    )
}

/// Story generator backed by the Gemini `generateContent` endpoint.
pub struct GeminiStoryGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiStoryGenerator {
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request(&self, api_key: &str, full_prompt: String) -> anyhow::Result<String> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: full_prompt }],
            }],
        };
        debug!("gemini: POST models/{}:generateContent", self.model);

        let resp = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("gemini returned {status}: {text}");
        }

        let parsed: GeminiResponse = resp.json().await.map_err(reqwest::Error::without_url)?;
        parsed
            .first_text()
            .ok_or_else(|| anyhow::anyhow!("gemini returned no text"))
    }
}

#[async_trait]
impl StoryGenerator for GeminiStoryGenerator {
    async fn generate(&self, prompt: &str, partner_name: &str, your_name: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return NO_API_KEY_STORY.to_string();
        };
        match self
            .request(api_key, compose_prompt(prompt, partner_name, your_name))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Error generating story with Gemini: {:#}", e);
                FALLBACK_STORY.to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<String> {
        self.candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
    }
}

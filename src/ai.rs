//! Clients for the external text- and image-generation collaborators.
//!
//! Both collaborators speak the common chat-completion / image-generation
//! wire shapes; the endpoints and credentials come from the environment.

use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

const SUMMARY_SYSTEM_PROMPT: &str = "You are an assistant that writes article summaries. \
    Given a title and body, write a concise, engaging summary of 100-200 words that \
    captures the core points of the article and draws the reader in.";

// Only the opening of the article is sent to the summariser.
const SUMMARY_CONTENT_LIMIT: usize = 2000;

pub struct AiConfig {
    pub api_url: String,
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
}

impl AiConfig {
    pub fn from_env() -> Result<Self, RequestError> {
        let api_url = std::env::var("AI_API_URL").map_err(|_| {
            tracing::error!("AI_API_URL is not set");
            RequestError::ServerError
        })?;
        let api_key = std::env::var("AI_API_KEY").map_err(|_| {
            tracing::error!("AI_API_KEY is not set");
            RequestError::ServerError
        })?;
        let text_model =
            std::env::var("AI_TEXT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let image_model =
            std::env::var("AI_IMAGE_MODEL").unwrap_or_else(|_| "dall-e-3".to_string());
        Ok(AiConfig {
            api_url,
            api_key,
            text_model,
            image_model,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: String,
}

pub async fn generate_summary(
    config: &AiConfig,
    title: &str,
    content: &str,
) -> Result<String, RequestError> {
    let excerpt: String = content.chars().take(SUMMARY_CONTENT_LIMIT).collect();
    let request = ChatRequest {
        model: &config.text_model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SUMMARY_SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: format!("Title: {title}\n\nBody:\n{excerpt}"),
            },
        ],
    };

    let response = reqwest::Client::new()
        .post(config.endpoint("chat/completions"))
        .bearer_auth(&config.api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("summary request failed: {}", e);
            RequestError::Upstream("Failed to generate summary")
        })?;

    if !response.status().is_success() {
        tracing::error!("summary request returned {}", response.status());
        return Err(RequestError::Upstream("Failed to generate summary"));
    }

    let response: ChatResponse = response.json().await.map_err(|e| {
        tracing::error!("summary response was malformed: {}", e);
        RequestError::Upstream("Failed to generate summary")
    })?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .filter(|summary| !summary.is_empty())
        .ok_or(RequestError::Upstream("Failed to generate summary"))
}

pub async fn generate_cover_image(
    config: &AiConfig,
    title: &str,
    keywords: &[String],
) -> Result<String, RequestError> {
    let keywords = if keywords.is_empty() {
        String::new()
    } else {
        format!(", with the keywords: {}", keywords.join(", "))
    };
    let request = ImageRequest {
        model: &config.image_model,
        prompt: format!(
            "Create a modern, elegant cover image for a blog article titled \
             \"{title}\"{keywords}. The style should suit a high-end blog: soft \
             colors, artistic and contemporary."
        ),
        n: 1,
    };

    let response = reqwest::Client::new()
        .post(config.endpoint("images/generations"))
        .bearer_auth(&config.api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("cover image request failed: {}", e);
            RequestError::Upstream("Failed to generate cover image")
        })?;

    if !response.status().is_success() {
        tracing::error!("cover image request returned {}", response.status());
        return Err(RequestError::Upstream("Failed to generate cover image"));
    }

    let response: ImageResponse = response.json().await.map_err(|e| {
        tracing::error!("cover image response was malformed: {}", e);
        RequestError::Upstream("Failed to generate cover image")
    })?;

    response
        .data
        .into_iter()
        .next()
        .map(|datum| datum.url)
        .ok_or(RequestError::Upstream("Failed to generate cover image"))
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    build_branching_user_message, parse_options_payload, sanitise_title, GenerateError,
    GeneratedOptions, GeneratedTitle, Generator, OptionsRequest, DEFAULT_TITLE,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const OPTIONS_SYSTEM_PROMPT: &str = "You help product teams explore creative directions \
    through branching prompts. Given the user's latest prompt (and optional context), respond \
    with a JSON object: {\"options\": [string, string, string, string]} Each string should be \
    an evocative, specific angle or framing. Keep them under 12 words. Do not add numbering or \
    commentary.";

const TITLE_SYSTEM_PROMPT: &str = "You are a naming assistant that crafts concise, intriguing \
    brainstorming session titles. Respond with a single title no longer than six words.";

/// Sampling settings for one request kind.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sampling {
    temperature: f32,
    max_tokens: u32,
    json: bool,
}

const OPTIONS_SAMPLING: Sampling = Sampling { temperature: 0.85, max_tokens: 500, json: true };
const TITLE_SAMPLING: Sampling = Sampling { temperature: 0.7, max_tokens: 60, json: false };

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

struct Completion {
    content: Option<String>,
    tokens: u64,
}

/// Chat-completions backend for OpenAI and compatible endpoints.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        sampling: Sampling,
    ) -> Result<Completion, GenerateError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            response_format: sampling.json.then_some(ResponseFormat { kind: "json_object" }),
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() || err.is_timeout() {
                    GenerateError::Unavailable(format!("{}: {err}", self.base_url))
                } else {
                    GenerateError::Http(err)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(GenerateError::Api { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| GenerateError::MalformedResponse(err.to_string()))?;
        let tokens = parsed.usage.map_or(0, |usage| usage.total_tokens);
        let content = parsed.choices.into_iter().next().and_then(|choice| choice.message.content);
        tracing::debug!(model = %self.model, tokens, "chat completion finished");
        Ok(Completion { content, tokens })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate_options(
        &self,
        request: &OptionsRequest,
    ) -> Result<GeneratedOptions, GenerateError> {
        let user = build_branching_user_message(request);
        let completion = self.complete(OPTIONS_SYSTEM_PROMPT, &user, OPTIONS_SAMPLING).await?;
        let raw = completion.content.as_deref().unwrap_or("{}");
        let options = parse_options_payload(raw)?;
        Ok(GeneratedOptions { options, tokens: completion.tokens })
    }

    async fn generate_title(&self, prompt: &str) -> Result<GeneratedTitle, GenerateError> {
        let user = format!(
            "Prompt or theme: {prompt}\n\nReturn only the title text. \
             Do not include quotes or explanations."
        );
        let completion = self.complete(TITLE_SYSTEM_PROMPT, &user, TITLE_SAMPLING).await?;
        let title =
            completion.content.as_deref().map_or_else(|| DEFAULT_TITLE.to_owned(), sanitise_title);
        Ok(GeneratedTitle { title, tokens: completion.tokens })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionRequest, send_json};
use crate::domain::ProviderKind;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

/// Chat completions against OpenAI or any compatible gateway.
pub async fn complete(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &CompletionRequest<'_>,
) -> Result<Completion> {
    let url = format!("{base_url}/chat/completions");

    let body = ChatRequest {
        model: request.model,
        messages: vec![
            Message {
                role: "system",
                content: &request.prompt.system,
            },
            Message {
                role: "user",
                content: &request.prompt.user,
            },
        ],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format: request.json.then_some(ResponseFormat {
            kind: "json_object",
        }),
    };

    let response: ChatResponse = send_json(
        client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body),
        ProviderKind::OpenAI,
    )
    .await?;

    let text = response
        .choices
        .into_iter()
        .find_map(|c| c.message.content)
        .ok_or_else(|| Error::provider("openai", "response contained no choices"))?;

    Ok(Completion {
        text: text.trim().to_string(),
        tokens: response.usage.map_or(0, |u| u.total_tokens),
    })
}

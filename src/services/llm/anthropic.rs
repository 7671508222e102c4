// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Completion, CompletionRequest, send_json};
use crate::domain::ProviderKind;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

pub async fn complete(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &CompletionRequest<'_>,
) -> Result<Completion> {
    let url = format!("{base_url}/messages");

    // No JSON mode here; the prompt already asks for a bare object.
    let body = MessagesRequest {
        model: request.model,
        system: &request.prompt.system,
        messages: vec![Message {
            role: "user",
            content: &request.prompt.user,
        }],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };

    let response: MessagesResponse = send_json(
        client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body),
        ProviderKind::Anthropic,
    )
    .await?;

    let text: String = response
        .content
        .into_iter()
        .filter(|b| b.block_type == "text")
        .filter_map(|b| b.text)
        .collect();

    if text.trim().is_empty() {
        return Err(Error::provider("anthropic", "response contained no text"));
    }

    Ok(Completion {
        text: text.trim().to_string(),
        tokens: response
            .usage
            .map_or(0, |u| u.input_tokens + u.output_tokens),
    })
}

//! Telegram Bot API client and the update types the server consumes.
//!
//! Replies longer than the platform's message limit are split on paragraph
//! boundaries and sent as a sequence of messages, pacing the sends so the
//! platform does not throttle the bot.

use crate::config::TelegramConfig;
use crate::error::TelegramError;
use finsight_core::ChatId;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::time::Duration;

/// The platform's hard limit on message length.
const MAX_MESSAGE_LENGTH: usize = 4096;

/// Pause between consecutive chunks of one long reply.
const CHUNK_SEND_DELAY: Duration = Duration::from_secs(1);

/// An incoming update from the Bot API.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// The message, when the update carries one.
    pub message: Option<IncomingMessage>,
}

/// The subset of a Telegram message the server consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// The chat the message came from.
    pub chat: Chat,
    /// Plain message text.
    pub text: Option<String>,
    /// Caption accompanying an upload.
    pub caption: Option<String>,
    /// Attached document, if any.
    pub document: Option<DocumentAttachment>,
}

/// The originating chat.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Chat {
    /// Platform chat identifier.
    pub id: ChatId,
}

/// An attached document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentAttachment {
    /// Opaque handle for downloading the file.
    pub file_id: String,
    /// Declared media type.
    pub mime_type: Option<String>,
    /// Original file name, if the platform passes one.
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Client for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TelegramClient {
    /// Creates a client from configuration.
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.api_key)
    }

    async fn call(&self, method: &str, body: &JsonValue) -> Result<JsonValue, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::RequestFailed {
                reason: e.to_string(),
            })?;

        let payload: JsonValue =
            response
                .json()
                .await
                .map_err(|e| TelegramError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        if payload["ok"] != json!(true) {
            let description = payload["description"]
                .as_str()
                .unwrap_or("no description")
                .to_string();
            return Err(TelegramError::ApiRejected { description });
        }

        Ok(payload)
    }

    /// Sends a text reply, splitting long texts into paced chunks.
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        let chunks = split_message(text);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            self.call("sendMessage", &json!({"chat_id": chat_id, "text": chunk}))
                .await?;
            if i < last {
                tokio::time::sleep(CHUNK_SEND_DELAY).await;
            }
        }

        Ok(())
    }

    /// Resolves a file handle into a downloadable path.
    pub async fn get_file(&self, file_id: &str) -> Result<String, TelegramError> {
        let payload = self.call("getFile", &json!({"file_id": file_id})).await?;
        let info: FileInfo = serde_json::from_value(payload["result"].clone()).map_err(|e| {
            TelegramError::MalformedResponse {
                reason: e.to_string(),
            }
        })?;

        info.file_path
            .ok_or_else(|| TelegramError::MalformedResponse {
                reason: "getFile result carried no file_path".to_string(),
            })
    }

    /// Downloads a file's bytes by the path `getFile` returned.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TelegramError> {
        let url = format!("{}/file/bot{}/{file_path}", self.base_url, self.api_key);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TelegramError::RequestFailed {
                reason: e.to_string(),
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelegramError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }

    /// Registers the webhook URL with the platform.
    pub async fn set_webhook(&self, url: &str) -> Result<JsonValue, TelegramError> {
        self.call("setWebhook", &json!({"url": url})).await
    }

    /// Fetches the current webhook registration.
    pub async fn webhook_info(&self) -> Result<JsonValue, TelegramError> {
        self.call("getWebhookInfo", &json!({})).await
    }

    /// Removes the webhook registration.
    pub async fn delete_webhook(&self) -> Result<JsonValue, TelegramError> {
        self.call("deleteWebhook", &json!({})).await
    }
}

/// Splits a reply into chunks within the platform limit.
///
/// Splitting prefers blank-line paragraph boundaries; a single paragraph
/// longer than the limit is split mid-text as a last resort.
fn split_message(text: &str) -> Vec<String> {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in text.split("\n\n") {
        for piece in hard_split(paragraph) {
            let piece_len = piece.chars().count();
            let separator_len = if current.is_empty() { 0 } else { 2 };

            if !current.is_empty() && current_len + separator_len + piece_len > MAX_MESSAGE_LENGTH
            {
                push_chunk(&mut chunks, &current);
                current.clear();
                current_len = 0;
            }

            if !current.is_empty() {
                current.push_str("\n\n");
                current_len += 2;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }

    push_chunk(&mut chunks, &current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn hard_split(paragraph: &str) -> Vec<String> {
    if paragraph.chars().count() <= MAX_MESSAGE_LENGTH {
        return vec![paragraph.to_string()];
    }

    let chars: Vec<char> = paragraph.chars().collect();
    chars
        .chunks(MAX_MESSAGE_LENGTH)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

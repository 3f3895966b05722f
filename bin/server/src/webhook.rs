//! Webhook routes: update handling and webhook management passthroughs.
//!
//! Upload validation happens before routing: a missing caption or a media
//! type outside the allow-list sends a fixed explanation and discards the
//! event without touching session state. Failures while answering are
//! logged with their category and turned into a fixed apology; the user
//! never sees a raw error or a raw tool payload.

use crate::telegram::{DocumentAttachment, IncomingMessage, TelegramClient, Update};
use axum::Json;
use axum::extract::{Query, State};
use finsight_advisor::{AdvisorError, Mediator};
use finsight_conversation::{RouteAction, Router};
use finsight_core::{ChatId, QueryId};
use finsight_extract::{DocumentKind, extract_text};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

const WELCOME_TEXT: &str = "Hi and welcome! \u{1F44B}\n\
FinSight helps you make smarter financial decisions by providing:\n\n\
\u{1F4C4} Automated analysis of financial statements \u{2013} Upload reports and get clear, actionable insights.\n\
\u{1F3E2} Public company insights \u{2013} Dive into key metrics, trends, and performance indicators.\n\
\u{1F4C8} Real-time stock data \u{2013} Stay updated with the latest stock prices and market movements.\n\
\u{1F4A1} Personalized financial guidance \u{2013} Understand what the numbers really mean for your portfolio.\n\n\
To attach a file, upload it and enter your question in the caption.\n\
Or you can just enter your question directly to get started!\n\n\
[Enter /end] - End the session";

const FAREWELL_TEXT: &str = "Thanks for using FinSight!\n\
We hope the insights were helpful in guiding your financial decisions.\n\n\
Until next time, stay informed and invest wisely!\n\
Type /start whenever you're ready to begin a new session.";

const ASK_START_TEXT: &str = "Please enter /start to start a session";

const CAPTION_REQUIRED_TEXT: &str =
    "Please enter your prompt in the caption when uploading a file!";

const UNSUPPORTED_FILE_TEXT: &str =
    "I am sorry that I can only accept CSV, Excel, or PDF file. Please re-upload a correct file.";

const FILE_UNREADABLE_TEXT: &str =
    "I could not read that file. Please re-upload it and try again.";

const RETRIEVAL_FAILED_TEXT: &str = "I couldn't retrieve market data for that request. Please \
     double-check the ticker symbol and try again.";

const ANSWER_FAILED_TEXT: &str =
    "Something went wrong while answering your question. Please try again in a moment.";

/// Shared application state behind every route.
pub struct AppState {
    /// Message router over the session store.
    pub router: Router,
    /// The two-round tool-calling mediator.
    pub mediator: Mediator,
    /// Telegram Bot API client.
    pub telegram: TelegramClient,
}

/// `GET /` liveness text.
pub async fn index() -> &'static str {
    "FinSight webhook server is running!"
}

/// `GET /webhook` liveness check.
pub async fn webhook_status() -> Json<JsonValue> {
    Json(json!({"status": "ok", "message": "Webhook is active"}))
}

/// `POST /webhook`: one incoming update.
pub async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> Json<JsonValue> {
    let Some(message) = update.message else {
        return Json(json!({"status": "error", "message": "Invalid request"}));
    };

    let chat_id = message.chat.id;
    let query_id = QueryId::new();

    let text = match effective_text(&state, &message).await {
        Ok(text) => text,
        Err(rejection) => {
            tracing::info!(%chat_id, %query_id, rejection = rejection.label(), "upload rejected");
            reply(&state, chat_id, rejection.user_text()).await;
            return Json(json!({"error": rejection.label(), "status": "error"}));
        }
    };

    let action = match state.router.route(chat_id, &text).await {
        Ok(action) => action,
        Err(e) => {
            tracing::error!(%chat_id, %query_id, error = %e, "session store failed");
            reply(&state, chat_id, ANSWER_FAILED_TEXT).await;
            return Json(json!({"status": "error", "message": "session store failed"}));
        }
    };

    match action {
        RouteAction::ShowWelcome => {
            reply(&state, chat_id, WELCOME_TEXT).await;
            Json(json!({"action": "welcome", "status": "success"}))
        }
        RouteAction::ShowFarewell => {
            reply(&state, chat_id, FAREWELL_TEXT).await;
            Json(json!({"action": "end", "status": "success"}))
        }
        RouteAction::RejectNotStarted => {
            reply(&state, chat_id, ASK_START_TEXT).await;
            Json(json!({"action": "ask_start", "status": "success"}))
        }
        RouteAction::Forward(prompt) => match state.mediator.answer(&prompt).await {
            Ok(answer) => {
                tracing::info!(%chat_id, %query_id, "answered query");
                reply(&state, chat_id, &answer).await;
                Json(json!({"action": "reply_message", "status": "success"}))
            }
            Err(e) => {
                tracing::error!(%chat_id, %query_id, error = %e, "failed to answer query");
                reply(&state, chat_id, failure_text(&e)).await;
                Json(json!({"action": "answer_failed", "status": "error"}))
            }
        },
    }
}

/// Query parameters for `GET /setup_webhook`.
#[derive(Debug, Deserialize)]
pub struct SetupWebhookQuery {
    url: Option<String>,
}

/// `GET /setup_webhook?url=...`: registers the webhook with the platform.
pub async fn setup_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SetupWebhookQuery>,
) -> Json<JsonValue> {
    let Some(url) = query.url else {
        return Json(json!({"status": "error", "message": "No webhook URL provided"}));
    };

    passthrough(state.telegram.set_webhook(&url).await)
}

/// `GET /get_webhook_info`: the current webhook registration.
pub async fn get_webhook_info(State(state): State<Arc<AppState>>) -> Json<JsonValue> {
    passthrough(state.telegram.webhook_info().await)
}

/// `GET /delete_webhook`: removes the webhook registration.
pub async fn delete_webhook(State(state): State<Arc<AppState>>) -> Json<JsonValue> {
    passthrough(state.telegram.delete_webhook().await)
}

fn passthrough(result: Result<JsonValue, crate::error::TelegramError>) -> Json<JsonValue> {
    match result {
        Ok(payload) => Json(payload),
        Err(e) => Json(json!({"status": "error", "message": e.to_string()})),
    }
}

/// Why an upload never reached routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadRejection {
    MissingCaption,
    UnsupportedType,
    FileUnreadable,
}

impl UploadRejection {
    fn label(self) -> &'static str {
        match self {
            Self::MissingCaption => "no caption",
            Self::UnsupportedType => "not correct file type",
            Self::FileUnreadable => "file unreadable",
        }
    }

    fn user_text(self) -> &'static str {
        match self {
            Self::MissingCaption => CAPTION_REQUIRED_TEXT,
            Self::UnsupportedType => UNSUPPORTED_FILE_TEXT,
            Self::FileUnreadable => FILE_UNREADABLE_TEXT,
        }
    }
}

/// Validates an upload before routing: caption first, then the media type.
fn classify_upload(
    document: &DocumentAttachment,
    caption: Option<&str>,
) -> Result<DocumentKind, UploadRejection> {
    if caption.is_none_or(|c| c.trim().is_empty()) {
        return Err(UploadRejection::MissingCaption);
    }

    document
        .mime_type
        .as_deref()
        .and_then(DocumentKind::from_mime)
        .ok_or(UploadRejection::UnsupportedType)
}

/// Builds the text the router sees: plain text, or extracted document text
/// with the caption appended.
async fn effective_text(
    state: &AppState,
    message: &IncomingMessage,
) -> Result<String, UploadRejection> {
    let Some(document) = &message.document else {
        return Ok(message.text.clone().unwrap_or_default());
    };

    let caption = message.caption.as_deref();
    let kind = classify_upload(document, caption)?;
    let caption = caption.unwrap_or_default();

    let file_path = state
        .telegram
        .get_file(&document.file_id)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, file = ?document.file_name, "could not resolve upload");
            UploadRejection::FileUnreadable
        })?;
    let bytes = state
        .telegram
        .download_file(&file_path)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, file = ?document.file_name, "could not download upload");
            UploadRejection::FileUnreadable
        })?;

    let document_text = extract_text(kind, &bytes).map_err(|e| {
        tracing::warn!(error = %e, file = ?document.file_name, "could not extract upload text");
        UploadRejection::FileUnreadable
    })?;

    Ok(format!("{document_text}\n\n{caption}"))
}

/// Picks the fixed user-facing text for an answering failure, by category.
fn failure_text(error: &AdvisorError) -> &'static str {
    match error {
        AdvisorError::Retrieval(_) => RETRIEVAL_FAILED_TEXT,
        _ => ANSWER_FAILED_TEXT,
    }
}

async fn reply(state: &AppState, chat_id: ChatId, text: &str) {
    if let Err(e) = state.telegram.send_message(chat_id, text).await {
        tracing::warn!(%chat_id, error = %e, "failed to deliver reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_ai::LlmError;
    use finsight_market::MarketError;

    fn document(mime: Option<&str>) -> DocumentAttachment {
        DocumentAttachment {
            file_id: "file-1".to_string(),
            mime_type: mime.map(str::to_owned),
            file_name: Some("report.csv".to_string()),
        }
    }

    #[test]
    fn missing_caption_is_rejected_before_the_media_type() {
        // Even a disallowed type reports the caption problem first.
        let err = classify_upload(&document(Some("image/png")), None).unwrap_err();
        assert_eq!(err, UploadRejection::MissingCaption);

        let err = classify_upload(&document(Some("text/csv")), Some("   ")).unwrap_err();
        assert_eq!(err, UploadRejection::MissingCaption);
    }

    #[test]
    fn disallowed_media_type_is_rejected() {
        let err = classify_upload(&document(Some("image/png")), Some("analyze")).unwrap_err();
        assert_eq!(err, UploadRejection::UnsupportedType);

        let err = classify_upload(&document(None), Some("analyze")).unwrap_err();
        assert_eq!(err, UploadRejection::UnsupportedType);
    }

    #[test]
    fn allowed_upload_classifies_to_its_kind() {
        let kind = classify_upload(&document(Some("application/pdf")), Some("summarize"))
            .expect("classify");
        assert_eq!(kind, DocumentKind::Pdf);
    }

    #[test]
    fn failure_texts_differ_by_category() {
        let retrieval = AdvisorError::Retrieval(MarketError::UnknownTicker {
            ticker: "NOPE".to_string(),
        });
        let model = AdvisorError::Model(LlmError::EmptyResponse);

        assert_eq!(failure_text(&retrieval), RETRIEVAL_FAILED_TEXT);
        assert_eq!(failure_text(&model), ANSWER_FAILED_TEXT);
    }
}

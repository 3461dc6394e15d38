use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use tracing::{info, warn};
use veritas_protocol::{ChatRole, Language, VoiceAssistantRequest, WireMessage};

use super::parse_body;
use crate::error::EdgeError;
use crate::prompts::assistant_prompt;
use crate::state::AppState;

pub(crate) async fn voice_assistant(
    State(state): State<AppState>,
    payload: Result<Json<VoiceAssistantRequest>, JsonRejection>,
) -> Result<Response, EdgeError> {
    let request = parse_body(payload)?;
    let language = request.language();
    let messages = build_conversation(language, request.messages)?;
    info!(
        language = %language,
        messages = messages.len(),
        "voice assistant request"
    );

    let stream = state.gateway.stream_chat(messages).await.map_err(|err| {
        warn!(error = %err, "voice assistant upstream failed");
        EdgeError::from(err)
    })?;

    let stream = stream.take_until(state.shutdown.clone().cancelled_owned());
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Prepends the assistant prompt; system messages from the caller are dropped.
fn build_conversation(
    language: Language,
    messages: Vec<WireMessage>,
) -> Result<Vec<WireMessage>, EdgeError> {
    let total = messages.len();
    let mut conversation = Vec::with_capacity(total + 1);
    conversation.push(WireMessage::new(ChatRole::System, assistant_prompt(language)));
    conversation.extend(
        messages
            .into_iter()
            .filter(|message| message.role != ChatRole::System),
    );
    let dropped = total + 1 - conversation.len();
    if dropped > 0 {
        warn!(dropped, "ignored caller-supplied system messages");
    }
    if conversation.len() == 1 {
        return Err(EdgeError::BadRequest(
            "messages must include at least one user or assistant message".to_string(),
        ));
    }
    Ok(conversation)
}

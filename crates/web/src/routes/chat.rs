//! Chat route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::db::ChatRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{ChatMessage, CurrentUser};
use crate::state::AppState;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Send-message form data.
#[derive(Debug, Deserialize)]
pub struct SendMessageForm {
    #[serde(default)]
    pub message: String,
}

/// A message as shown in the chat room.
pub struct MessageView {
    pub author: String,
    pub time: String,
    pub body: String,
    /// Sent by the viewer.
    pub own: bool,
}

impl MessageView {
    fn new(message: &ChatMessage, viewer: &CurrentUser) -> Self {
        Self {
            author: message.author_name.clone(),
            time: message.display_time(),
            body: message.body.clone(),
            own: message.user_id == Some(viewer.id),
        }
    }
}

/// Chat page template.
#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub current_user: Option<CurrentUser>,
    pub messages: Vec<MessageView>,
    pub max_chars: usize,
}

/// Display every chat message, oldest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let messages = ChatRepository::new(state.pool())
        .list_messages()
        .await?
        .iter()
        .map(|m| MessageView::new(m, &user))
        .collect();

    Ok(ChatTemplate {
        current_user: Some(user),
        messages,
        max_chars: MAX_MESSAGE_CHARS,
    })
}

/// Post a message to the chat room.
///
/// The message is trimmed first. Blank messages are ignored and the length
/// limit applies to the trimmed text.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn send(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<SendMessageForm>,
) -> Result<Redirect, AppError> {
    let message = form.message.trim();
    if message.is_empty() {
        return Ok(Redirect::to("/chat"));
    }

    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message is too long (maximum {MAX_MESSAGE_CHARS} characters)"
        )));
    }

    ChatRepository::new(state.pool())
        .add_message(Some(user.id), &user.name, message, Utc::now())
        .await?;

    Ok(Redirect::to("/chat"))
}

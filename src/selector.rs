//! Random fact selection and response formatting.
//!
//! A fact is served either as plain text or as an in-channel chat webhook
//! message with a single attachment that repeats the fact.
//!
//! `pick` takes a typed `FormatMode`; the webhook route always asks for
//! JSON. `pick_named` is the string-keyed entry point for library callers
//! and answers an unrecognized mode name with `FALLBACK_MESSAGE` rather
//! than an error.

use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::facts::FactStore;

pub const RESPONSE_TYPE_IN_CHANNEL: &str = "in_channel";
pub const AUTHOR_NAME: &str = "Sammy The Shark";
pub const ATTACHMENT_TITLE: &str = "Shark Fact!";

/// Returned for a format mode nobody recognizes
pub const FALLBACK_MESSAGE: &str = "Error! I can't find a shark fact for you :(";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
    Text,
    Json,
}

impl FromStr for FormatMode {
    type Err = UnknownFormatMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(FormatMode::Text),
            "json" => Ok(FormatMode::Json),
            _ => Err(UnknownFormatMode(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown format mode {0:?}")]
pub struct UnknownFormatMode(pub String);

/// Chat webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackMessage {
    pub response_type: &'static str,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub fallback: String,
    pub author_name: &'static str,
    pub title: &'static str,
    pub text: String,
}

impl SlackMessage {
    pub fn for_fact(fact: &str) -> Self {
        Self {
            response_type: RESPONSE_TYPE_IN_CHANNEL,
            text: fact.to_string(),
            attachments: vec![Attachment {
                fallback: fact.to_string(),
                author_name: AUTHOR_NAME,
                title: ATTACHMENT_TITLE,
                text: fact.to_string(),
            }],
        }
    }
}

/// A formatted fact. Serializes as a bare string or as the webhook object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FactResponse {
    Text(String),
    Json(SlackMessage),
}

impl FactResponse {
    /// The fact carried by this response.
    pub fn text(&self) -> &str {
        match self {
            FactResponse::Text(text) => text,
            FactResponse::Json(message) => &message.text,
        }
    }
}

/// Draw one fact uniformly at random and format it.
///
/// Draws are independent, so repeats are expected.
pub fn pick<R: Rng + ?Sized>(store: &FactStore, mode: FormatMode, rng: &mut R) -> FactResponse {
    let fact = store.random(rng);
    match mode {
        FormatMode::Text => FactResponse::Text(fact.to_string()),
        FormatMode::Json => FactResponse::Json(SlackMessage::for_fact(fact)),
    }
}

/// Like `pick`, but takes the mode by name and answers unknown modes with
/// `FALLBACK_MESSAGE` instead of a fact.
pub fn pick_named<R: Rng + ?Sized>(store: &FactStore, mode: &str, rng: &mut R) -> FactResponse {
    match mode.parse::<FormatMode>() {
        Ok(mode) => pick(store, mode, rng),
        Err(e) => {
            tracing::warn!(error = %e, "Unrecognized format mode");
            FactResponse::Text(FALLBACK_MESSAGE.to_string())
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned by a generated handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A generated stub that has not been filled in yet.
    #[error("{0} not implemented")]
    NotImplemented(String),
    /// Arguments did not decode into the declared input type.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// Unknown tool, resource or prompt.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn not_implemented(name: impl Into<String>) -> Self {
        HandlerError::NotImplemented(name.into())
    }

    pub fn invalid_params(err: impl fmt::Display) -> Self {
        HandlerError::InvalidParams(err.to_string())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        HandlerError::NotFound(what.into())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

/// Per-call metadata handed to every handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Session identifier assigned by the transport, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-form `_meta` sent by the client.
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// Contents returned when a resource is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64-encoded binary payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

impl ResourceContents {
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            text: Some(text.into()),
            blob: None,
        }
    }

    pub fn blob(uri: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: None,
            text: None,
            blob: Some(base64.into()),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Messages produced by a prompt handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

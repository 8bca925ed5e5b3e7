//! Conversion of message content between the two schemas: decoding Claude
//! block lists, building canonical media parts, and flattening canonical
//! content back to text.

use serde_json::Value;

use super::anthropic_types::{ContentBlock, ImageSource, Message};
use super::openai_types::{ChatContent, ContentPart, ImageUrlDetail};
use crate::error::{RelayError, Result};

impl Message {
    /// Decode the message content into typed blocks.
    ///
    /// A plain string becomes a single text block (none if empty). Anything
    /// that is neither a string nor a block list is a content parse error.
    pub fn parse_content(&self) -> Result<Vec<ContentBlock>> {
        match &self.content {
            Value::String(text) if text.is_empty() => Ok(Vec::new()),
            Value::String(text) => Ok(vec![ContentBlock::Text { text: text.clone() }]),
            Value::Null => Ok(Vec::new()),
            Value::Array(_) => serde_json::from_value(self.content.clone()).map_err(|e| {
                RelayError::content_parse(format!("invalid content blocks in {:?} message: {e}", self.role))
            }),
            other => Err(RelayError::content_parse(format!(
                "unsupported content shape in {:?} message: expected string or array, got {}",
                self.role,
                json_kind(other)
            ))),
        }
    }

    pub fn string_content(&self) -> Option<&str> {
        self.content.as_str()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonical `image_url` part for a Claude image source. Base64 sources are
/// inlined as a data URI.
pub fn image_part(source: &ImageSource) -> ContentPart {
    let url = match &source.url {
        Some(url) if source.source_type == "url" => url.clone(),
        _ => format!("data:{};base64,{}", source.media_type, source.data),
    };
    ContentPart::ImageUrl {
        image_url: ImageUrlDetail { url, detail: None },
    }
}

/// Text sent upstream for a tool result: the string itself, or the JSON
/// encoding of structured content.
pub fn tool_result_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// JSON-encode tool input for a canonical tool call.
pub fn encode_arguments(input: &Value) -> String {
    match input {
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

impl ChatContent {
    /// Flatten to a single string; text parts are concatenated in order and
    /// image parts are dropped.
    pub fn as_text(&self) -> String {
        match self {
            ChatContent::Text(text) => text.clone(),
            ChatContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChatContent::Text(text) => text.is_empty(),
            ChatContent::Parts(parts) => parts.is_empty(),
        }
    }
}

//! Error envelope translation in both directions.
//!
//! The source error's type tag is replaced by the gateway's own tag; only the
//! message and the HTTP status survive.

use super::anthropic_types::{ClaudeErrorWithStatus, ErrorBody};
use super::openai_types::{ChatError, OpenAIErrorWithStatus};

pub fn openai_error_to_claude(err: &OpenAIErrorWithStatus, error_type: &str) -> ClaudeErrorWithStatus {
    ClaudeErrorWithStatus {
        error: ErrorBody {
            error_type: error_type.to_string(),
            message: err.error.message.clone(),
        },
        status_code: err.status_code,
    }
}

pub fn claude_error_to_openai(err: &ClaudeErrorWithStatus, error_type: &str) -> OpenAIErrorWithStatus {
    OpenAIErrorWithStatus {
        error: ChatError {
            message: err.error.message.clone(),
            error_type: error_type.to_string(),
            code: None,
        },
        status_code: err.status_code,
    }
}

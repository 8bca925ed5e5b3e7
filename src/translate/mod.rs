//! API translation between Claude and `OpenAI` formats.
//!
//! The core of the relay: converts requests, responses, streaming events and
//! error envelopes between the two API formats. All translation functions are
//! pure (no I/O).

pub mod anthropic_types;
pub mod content;
pub mod error_map;
pub mod openai_types;
pub mod request;
pub mod response;
pub mod streaming;

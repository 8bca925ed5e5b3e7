pub mod config;
pub mod error;
pub mod relay;
pub mod translate;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use relay::SseEvent;
pub use translate::streaming::StreamTranslator;

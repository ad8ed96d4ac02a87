//! Chat assistant: keyword intent classification, replies composed from the
//! lead tables, and delegation of general questions to a completion service.

pub mod completion;
pub mod compose;
pub mod intent;
pub mod resolver;

pub use completion::{CompletionConfig, CompletionError, CompletionService, GeminiClient};
pub use intent::{Classification, Intent, classify};
pub use resolver::{CHAT_INTENT_LABEL, ChatError, ChatResolver, ChatTurn, FALLBACK_REPLY};

//! Text-generation provider layer for debate-rs
//!
//! This crate provides provider-agnostic abstractions for asking a Large
//! Language Model for text. It includes:
//!
//! - Message types for LLM communication
//! - Completion request/response types, including a structured (JSON) output mode
//! - Provider trait for LLM implementations
//! - Error classification that separates rate-limit failures from everything else
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, ResponseFormat, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(any(feature = "gemini", feature = "openai"))]
pub mod providers;

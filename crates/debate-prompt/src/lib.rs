//! Prompt template management for debate-rs
//!
//! This crate provides a small, type-safe system for managing the prompt
//! templates that debate agents are instructed with.
//!
//! # Features
//!
//! - **Variable interpolation**: Jinja2 syntax (`{{ variable }}`) via MiniJinja
//! - **Strict rendering**: a variable the caller forgot is an error, never an
//!   empty hole in an agent's instructions
//! - **Template registry**: centralized, thread-safe lookup by name
//!
//! # Quick Start
//!
//! ```
//! use debate_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("analyzer", "Analyze {{ symbol }}").unwrap());
//!
//! let prompt = registry.render("analyzer", &json!({ "symbol": "AAPL" })).unwrap();
//! assert_eq!(prompt, "Analyze AAPL");
//!
//! // Missing variables are rejected
//! assert!(registry.render("analyzer", &json!({})).is_err());
//! ```

mod error;
mod jinja;
mod registry;
mod template;

// Re-export core types
pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;

//! Core prompt template trait

use crate::Result;

/// Core trait for prompt templates
///
/// This trait is dyn-compatible, using `serde_json::Value` for variables
/// instead of generics, so a registry can hold any implementation.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Render the template with variables
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Get raw template string (for debugging/inspection)
    fn raw_template(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Plain string substitution, enough to exercise the trait object
    struct EchoTemplate;

    impl PromptTemplate for EchoTemplate {
        fn name(&self) -> &str {
            "echo"
        }

        fn render(&self, vars: &serde_json::Value) -> Result<String> {
            Ok(vars["text"].as_str().unwrap_or_default().to_string())
        }

        fn raw_template(&self) -> &str {
            "{text}"
        }
    }

    #[test]
    fn test_dyn_compatible() {
        let template: Box<dyn PromptTemplate> = Box::new(EchoTemplate);
        assert_eq!(template.name(), "echo");
        assert_eq!(template.render(&json!({ "text": "hi" })).unwrap(), "hi");
        assert_eq!(template.raw_template(), "{text}");
    }
}

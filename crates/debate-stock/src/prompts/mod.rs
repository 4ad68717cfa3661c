//! Debate prompt templates and the segmenter that fills them
//!
//! Each analyst sees only its own slice of the data. The adjudicator sees
//! everything plus the three reports.

pub mod agents;

use crate::debate::{AgentRole, DebateRecord};
use crate::error::Result;
use crate::market::AgentViews;
use debate_prompt::PromptRegistry;
use serde_json::json;

/// Register the four debate templates with `registry`
pub fn register_prompts(registry: &PromptRegistry) -> debate_prompt::Result<()> {
    registry.register(agents::bull_analyst()?);
    registry.register(agents::bear_risk_manager()?);
    registry.register(agents::quant_analyst()?);
    registry.register(agents::cio_adjudicator()?);
    Ok(())
}

/// Renders role-scoped prompts from [`AgentViews`]
///
/// Rendering is deterministic: the same views always produce the same
/// prompt text.
#[derive(Debug)]
pub struct PromptSegmenter {
    registry: PromptRegistry,
}

impl PromptSegmenter {
    /// Create a segmenter with the built-in templates
    pub fn new() -> Result<Self> {
        let registry = PromptRegistry::new();
        register_prompts(&registry)?;
        Ok(Self { registry })
    }

    /// Create a segmenter over a caller-supplied registry
    ///
    /// The registry must contain templates under the names in [`agents`].
    pub fn with_registry(registry: PromptRegistry) -> Self {
        Self { registry }
    }

    /// Prompt for one analyst, embedding only that analyst's view
    pub fn agent_prompt(&self, role: AgentRole, views: &AgentViews) -> Result<String> {
        let prompt = match role {
            AgentRole::Bull => self.registry.render(
                agents::BULL,
                &json!({ "fundamentals_json": serde_json::to_string_pretty(views.bull_view())? }),
            )?,
            AgentRole::Bear => self.registry.render(
                agents::BEAR,
                &json!({ "macro_risk_json": serde_json::to_string_pretty(&views.bear_view())? }),
            )?,
            AgentRole::Quant => self.registry.render(
                agents::QUANT,
                &json!({
                    "technicals_sentiment_json": serde_json::to_string_pretty(&views.quant_view())?
                }),
            )?,
        };
        Ok(prompt)
    }

    /// Prompts for all three analysts, in [`AgentRole::ALL`] order
    pub fn debate_prompts(&self, views: &AgentViews) -> Result<Vec<(AgentRole, String)>> {
        AgentRole::ALL
            .into_iter()
            .map(|role| Ok((role, self.agent_prompt(role, views)?)))
            .collect()
    }

    /// Adjudicator prompt with the full payload and the three reports
    pub fn cio_prompt(&self, views: &AgentViews, debate: &DebateRecord) -> Result<String> {
        Ok(self.registry.render(
            agents::CIO,
            &json!({
                "ticker": views.ticker,
                "raw_data_json": serde_json::to_string_pretty(&views.full_payload())?,
                "bull_output": debate.bull,
                "bear_output": debate.bear,
                "quant_output": debate.quant,
            }),
        )?)
    }
}

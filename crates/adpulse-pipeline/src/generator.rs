//! The pluggable creative-generation capability.
//!
//! The content stage is written against [`CreativeGenerator`] so the shipped
//! deterministic template and a real generative backend are interchangeable
//! without touching the orchestrator or the data model.

use adpulse_db::ActionRow;

use crate::PipelineError;

/// Brand voice constraints handed to the generator alongside each action.
#[derive(Debug, Clone)]
pub struct BrandContext {
    pub tone: String,
    pub voice: String,
    pub forbidden_words: Vec<String>,
}

impl Default for BrandContext {
    fn default() -> Self {
        Self {
            tone: "professional".to_string(),
            voice: "confident".to_string(),
            forbidden_words: Vec::new(),
        }
    }
}

/// The generated creative fields, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeDraft {
    pub platform: String,
    pub creative_type: String,
    pub headline: String,
    pub primary_text: String,
    pub description: String,
    pub call_to_action: String,
}

/// A creative-content backend.
pub trait CreativeGenerator: Send + Sync {
    /// Produces one creative draft for a test-type action.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Generation`] if the backend cannot produce
    /// content; the failure aborts the content stage and fails the run.
    fn generate(
        &self,
        brand: &BrandContext,
        action: &ActionRow,
    ) -> Result<CreativeDraft, PipelineError>;
}

/// Deterministic stub backend: a fixed ad-copy template targeting Meta.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

impl CreativeGenerator for TemplateGenerator {
    fn generate(
        &self,
        _brand: &BrandContext,
        _action: &ActionRow,
    ) -> Result<CreativeDraft, PipelineError> {
        Ok(CreativeDraft {
            platform: "meta".to_string(),
            creative_type: "ad_copy".to_string(),
            headline: "Transform Your Business Today".to_string(),
            primary_text: "Join thousands of companies achieving better results with our platform."
                .to_string(),
            description: "Trusted by industry leaders".to_string(),
            call_to_action: "Learn More".to_string(),
        })
    }
}

//! Plan generation stage - alternative time-boxed plans for the window

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PipelineSettings, ensure_configured};
use crate::domain::{PlanQuery, PlanSet};
use crate::error::{PlannerError, Stage};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::PromptLoader;
use crate::query::{PersonaStrategy, build_plan_prompt, build_plan_search_query, plan_context_text};
use crate::search::{SearchClient, SearchContext, SearchRequest};

/// Resolves a [`PlanSet`] from a [`PlanQuery`] and a persona
pub struct PlanGenerationStage {
    search: Arc<dyn SearchClient>,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    settings: Arc<PipelineSettings>,
}

impl PlanGenerationStage {
    pub fn new(
        search: Arc<dyn SearchClient>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        debug!("PlanGenerationStage::new: called");
        Self {
            search,
            llm,
            prompts,
            settings,
        }
    }

    /// Search, reason, parse
    pub async fn generate(&self, query: &PlanQuery, persona: &dyn PersonaStrategy) -> Result<PlanSet, PlannerError> {
        debug!(persona = persona.name(), "PlanGenerationStage::generate: called");
        self.preflight(query)?;
        let context = self.search_context(query, persona).await;
        self.reason(query.clone(), &context, persona).await
    }

    /// Credentials and window checks, before any provider call
    pub fn preflight(&self, query: &PlanQuery) -> Result<(), PlannerError> {
        debug!("PlanGenerationStage::preflight: called");
        ensure_configured(self.search.as_ref(), self.llm.as_ref(), &self.settings)?;
        query.mobility.validate()
    }

    /// Activity search; any failure yields an empty context
    pub async fn search_context(&self, query: &PlanQuery, persona: &dyn PersonaStrategy) -> SearchContext {
        let text = build_plan_search_query(query, persona, self.settings.locale);
        debug!(query = %text, "PlanGenerationStage::search_context: called");
        let request = SearchRequest::new(text, self.settings.plan_depth, self.settings.plan_max_results);
        match self.search.search(&request).await {
            Ok(response) => SearchContext::from_response(&response),
            Err(e) => {
                warn!(query = %request.query, error = %e, "Plan search failed; continuing with empty context");
                SearchContext::empty()
            }
        }
    }

    /// Reasoning call and strict parse into a [`PlanSet`]
    pub async fn reason(
        &self,
        query: PlanQuery,
        context: &SearchContext,
        persona: &dyn PersonaStrategy,
    ) -> Result<PlanSet, PlannerError> {
        debug!(persona = persona.name(), entries = context.len(), "PlanGenerationStage::reason: called");
        let locale = self.settings.locale;
        let context_text = plan_context_text(context, locale);
        let prompt = build_plan_prompt(&self.prompts, &query, &context_text, persona, locale)?;

        let request = CompletionRequest::json(prompt, self.settings.plan_max_tokens);
        let text = self
            .llm
            .complete(request)
            .await
            .and_then(|response| response.into_text())
            .map_err(|e| PlannerError::from_llm(Stage::PlanGeneration, e))?;

        let plans = PlanSet::parse_patterns(&text)?;
        let set = PlanSet {
            decision: query.decision,
            plans,
        };

        if self.settings.enforce_tiling {
            debug!("PlanGenerationStage::reason: enforcing tiling");
            set.validate(&query.mobility)
                .map_err(|e| PlannerError::malformed(Stage::PlanGeneration, e.to_string()))?;
        }

        info!(persona = persona.name(), plans = set.plans.len(), "Plan generation complete");
        Ok(set)
    }
}

//! Mobility decision stage - transit or on foot

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PipelineSettings, ensure_configured};
use crate::domain::{MobilityDecision, MobilityQuery};
use crate::error::{PlannerError, Stage};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::PromptLoader;
use crate::query::{RouteLookup, build_mobility_decision_prompt, build_route_search_queries, route_context_text};
use crate::search::{SearchClient, SearchContext, SearchRequest};

/// Resolves a [`MobilityDecision`] from a [`MobilityQuery`]
pub struct MobilityDecisionStage {
    search: Arc<dyn SearchClient>,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    settings: Arc<PipelineSettings>,
}

impl MobilityDecisionStage {
    pub fn new(
        search: Arc<dyn SearchClient>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        debug!("MobilityDecisionStage::new: called");
        Self {
            search,
            llm,
            prompts,
            settings,
        }
    }

    /// Decide how to bridge the window
    ///
    /// Search failures degrade the prompt context; reasoning failures and
    /// malformed output abort. The reasoning call is never retried here.
    pub async fn decide(&self, query: &MobilityQuery) -> Result<MobilityDecision, PlannerError> {
        debug!(
            departure = %query.departure.place,
            arrival = %query.arrival.place,
            "MobilityDecisionStage::decide: called"
        );
        ensure_configured(self.search.as_ref(), self.llm.as_ref(), &self.settings)?;
        query.validate()?;

        let locale = self.settings.locale;
        let lookup = self.lookup_route(query).await;
        let route_context = route_context_text(&lookup, locale);
        let prompt = build_mobility_decision_prompt(&self.prompts, &route_context, query, locale)?;

        let request = CompletionRequest::json(prompt, self.settings.decision_max_tokens);
        let text = self
            .llm
            .complete(request)
            .await
            .and_then(|response| response.into_text())
            .map_err(|e| PlannerError::from_llm(Stage::MobilityDecision, e))?;

        let decision = MobilityDecision::from_completion(&text)?;

        let available = query.available_minutes();
        if decision.exceeds_budget(available) {
            warn!(
                estimated = decision.estimated_minutes,
                available, "Decision estimate exceeds the free window; keeping it as returned"
            );
        }

        info!(
            transit = decision.use_public_transport,
            mode = %decision.recommended_mode,
            estimated = decision.estimated_minutes,
            "Mobility decision complete"
        );
        Ok(decision)
    }

    /// Run every route query, merging what succeeds
    async fn lookup_route(&self, query: &MobilityQuery) -> RouteLookup {
        let queries = build_route_search_queries(query, self.settings.locale);
        debug!(query_count = queries.len(), "MobilityDecisionStage::lookup_route: called");

        let mut context = SearchContext::empty();
        let mut succeeded = 0usize;
        for text in queries {
            let request = SearchRequest::new(text, self.settings.route_depth, self.settings.route_max_results);
            match self.search.search(&request).await {
                Ok(response) => {
                    succeeded += 1;
                    context.extend(&response);
                }
                Err(e) => {
                    warn!(query = %request.query, error = %e, "Route search failed; continuing without it");
                }
            }
        }

        if succeeded == 0 {
            debug!("MobilityDecisionStage::lookup_route: every route search failed");
            RouteLookup::Failed
        } else if context.is_empty() {
            debug!("MobilityDecisionStage::lookup_route: no usable results");
            RouteLookup::NoResults
        } else {
            debug!(entries = context.len(), "MobilityDecisionStage::lookup_route: found context");
            RouteLookup::Found(context)
        }
    }
}

//! Planning pipeline
//!
//! Two stages, each composing the search client, the reasoning client and
//! the query builder, plus the [`Planner`] facade running them in order.
//! Clients are passed in; the pipeline owns no provider state.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

mod decision;
mod generation;
mod state;

pub use decision::MobilityDecisionStage;
pub use generation::PlanGenerationStage;
pub use state::{PipelineRun, PipelineState};

use crate::config::Config;
use crate::domain::{MobilityQuery, PlanQuery, PlanSet};
use crate::error::PlannerError;
use crate::llm::LlmClient;
use crate::prompts::PromptLoader;
use crate::query::{AthleticPlanner, GeneralPlanner, Locale, PersonaKind, PersonaStrategy};
use crate::search::{SearchClient, SearchDepth};

/// Stage knobs resolved from [`Config`]
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub locale: Locale,
    pub route_depth: SearchDepth,
    pub route_max_results: u32,
    pub plan_depth: SearchDepth,
    pub plan_max_results: u32,
    pub decision_max_tokens: u32,
    pub plan_max_tokens: u32,
    /// Reject generated plans that do not tile the window
    pub enforce_tiling: bool,
    /// Named in configuration errors
    pub llm_key_env: String,
    pub search_key_env: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        debug!("PipelineSettings::from_config: called");
        Self {
            locale: config.planner.locale,
            route_depth: config.search.route_depth,
            route_max_results: config.search.route_max_results,
            plan_depth: config.search.plan_depth,
            plan_max_results: config.search.plan_max_results,
            decision_max_tokens: config.planner.decision_max_tokens,
            plan_max_tokens: config.planner.plan_max_tokens,
            enforce_tiling: config.planner.enforce_tiling,
            llm_key_env: config.llm.api_key_env.clone(),
            search_key_env: config.search.api_key_env.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Fail with a configuration error unless both providers have credentials
fn ensure_configured(
    search: &dyn SearchClient,
    llm: &dyn LlmClient,
    settings: &PipelineSettings,
) -> Result<(), PlannerError> {
    debug!("ensure_configured: called");
    if !llm.is_configured() {
        return Err(PlannerError::Configuration(format!(
            "reasoning provider API key is missing: set the {} environment variable",
            settings.llm_key_env
        )));
    }
    if !search.is_configured() {
        return Err(PlannerError::Configuration(format!(
            "search provider API key is missing: set the {} environment variable",
            settings.search_key_env
        )));
    }
    Ok(())
}

/// The two standard pipelines over shared stages
pub struct Planner {
    decision: MobilityDecisionStage,
    generation: PlanGenerationStage,
    locale: Locale,
}

impl Planner {
    pub fn new(
        search: Arc<dyn SearchClient>,
        llm: Arc<dyn LlmClient>,
        prompts: PromptLoader,
        settings: PipelineSettings,
    ) -> Self {
        debug!(locale = %settings.locale, "Planner::new: called");
        let prompts = Arc::new(prompts);
        let settings = Arc::new(settings);
        Self {
            decision: MobilityDecisionStage::new(search.clone(), llm.clone(), prompts.clone(), settings.clone()),
            generation: PlanGenerationStage::new(search, llm, prompts, settings.clone()),
            locale: settings.locale,
        }
    }

    /// Build from config, loading template overrides relative to the working directory
    pub fn from_config(config: &Config, search: Arc<dyn SearchClient>, llm: Arc<dyn LlmClient>) -> Self {
        debug!("Planner::from_config: called");
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let prompts = PromptLoader::new(config.planner.prompts_dir.as_deref(), root);
        Self::new(search, llm, prompts, PipelineSettings::from_config(config))
    }

    pub fn decision_stage(&self) -> &MobilityDecisionStage {
        &self.decision
    }

    pub fn generation_stage(&self) -> &PlanGenerationStage {
        &self.generation
    }

    /// Decision stage, then plan stage with the general persona
    pub async fn run_comprehensive_planner(&self, query: &MobilityQuery) -> Result<PlanSet, PlannerError> {
        self.run_persona(&GeneralPlanner, query, &mut PipelineRun::new()).await
    }

    /// Plan stage only, with the athletic persona's fixed decision
    pub async fn run_athletic_planner(&self, query: &MobilityQuery) -> Result<PlanSet, PlannerError> {
        self.run_persona(&AthleticPlanner, query, &mut PipelineRun::new()).await
    }

    pub async fn run(&self, kind: PersonaKind, query: &MobilityQuery) -> Result<PlanSet, PlannerError> {
        self.run_persona(kind.strategy().as_ref(), query, &mut PipelineRun::new())
            .await
    }

    /// Run a pipeline and return the states it went through alongside the result
    pub async fn run_traced(&self, kind: PersonaKind, query: &MobilityQuery) -> (Result<PlanSet, PlannerError>, PipelineRun) {
        let mut run = PipelineRun::new();
        let result = self.run_persona(kind.strategy().as_ref(), query, &mut run).await;
        (result, run)
    }

    async fn run_persona(
        &self,
        persona: &dyn PersonaStrategy,
        query: &MobilityQuery,
        run: &mut PipelineRun,
    ) -> Result<PlanSet, PlannerError> {
        let run_id = run.id();
        info!(%run_id, persona = persona.name(), "Starting planner run");
        let result = self.drive(persona, query, run).await;
        match &result {
            Ok(set) => {
                run.advance(PipelineState::Done);
                info!(%run_id, plans = set.plans.len(), "Planner run complete");
            }
            Err(e) => {
                run.fail(e.to_string());
                warn!(%run_id, class = %e.class(), error = %e, "Planner run failed");
            }
        }
        result
    }

    async fn drive(
        &self,
        persona: &dyn PersonaStrategy,
        query: &MobilityQuery,
        run: &mut PipelineRun,
    ) -> Result<PlanSet, PlannerError> {
        let decision = match persona.synthetic_decision(self.locale) {
            Some(decision) => {
                debug!(run_id = %run.id(), "Planner::drive: persona supplies its own decision");
                decision
            }
            None => {
                run.advance(PipelineState::DecisionInFlight);
                self.decision.decide(query).await?
            }
        };
        run.advance(PipelineState::DecisionDone);

        let plan_query = PlanQuery::new(query.clone(), decision);
        self.generation.preflight(&plan_query)?;

        run.advance(PipelineState::PlanSearchInFlight);
        let context = self.generation.search_context(&plan_query, persona).await;

        run.advance(PipelineState::PlanReasoningInFlight);
        self.generation.reason(plan_query, &context, persona).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TimeAnchor, parse_timestamp};
    use crate::error::{ErrorClass, Stage};
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use crate::search::mock::{MockSearchClient, hit};

    const DECISION: &str = r#"{"use_public_transport": true, "recommended_mode": "train",
        "reasoning": "The train is quick.", "estimated_time": 20, "estimated_cost": "200 yen"}"#;

    const PLANS: &str = r#"{"plans": [
        {"pattern_description": "Cafe", "events": [
            {"title": "Move", "start_time": "2025-06-01T10:00:00+09:00", "end_time": "2025-06-01T10:10:00+09:00"},
            {"title": "Coffee", "start_time": "2025-06-01T10:10:00+09:00", "end_time": "2025-06-01T11:20:00+09:00"},
            {"title": "Move", "start_time": "2025-06-01T11:20:00+09:00", "end_time": "2025-06-01T11:30:00+09:00"}
        ]},
        {"pattern_description": "Books", "events": []}
    ]}"#;

    fn window(minutes: i64) -> MobilityQuery {
        let start = parse_timestamp("2025-06-01T10:00:00+09:00").unwrap();
        MobilityQuery::new(
            TimeAnchor::new("Station A", start),
            TimeAnchor::new("Station B", start + chrono::Duration::minutes(minutes)),
            "minimize cost",
        )
    }

    fn planner(search: Arc<MockSearchClient>, llm: Arc<MockLlmClient>) -> Planner {
        Planner::new(search, llm, PromptLoader::embedded_only(), PipelineSettings::default())
    }

    #[tokio::test]
    async fn test_comprehensive_end_to_end() {
        let search = Arc::new(MockSearchClient::with_hits(vec![hit("Trains every 5 minutes", "https://t.example")]));
        let llm = Arc::new(MockLlmClient::new(vec![
            MockReply::Content(DECISION.to_string()),
            MockReply::Content(PLANS.to_string()),
        ]));
        let planner = planner(search.clone(), llm.clone());

        let set = planner.run_comprehensive_planner(&window(90)).await.unwrap();

        assert_eq!(set.decision.estimated_minutes, 20);
        assert_eq!(set.plans.len(), 2);
        assert_eq!(set.plans[1].description, "Books");

        // two route queries, then the plan query
        let queries: Vec<_> = search.requests().into_iter().map(|r| r.query).collect();
        assert_eq!(queries.len(), 3);
        assert_eq!(
            queries[2],
            "things to enjoy in 70 minutes between Station A and Station B or nearby"
        );

        let prompts = llm.requests();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|r| r.json_mode));
        assert!(prompts[1].system_prompt.contains("The train is quick."));
    }

    #[tokio::test]
    async fn test_athletic_skips_decision_stage() {
        let search = Arc::new(MockSearchClient::with_hits(vec![hit("Track open 24h", "https://gym.example")]));
        let llm = Arc::new(MockLlmClient::repeating(PLANS));
        let planner = planner(search.clone(), llm.clone());

        let set = planner.run_athletic_planner(&window(90)).await.unwrap();

        assert_eq!(llm.call_count(), 1);
        assert!(!set.decision.use_public_transport);
        assert_eq!(set.decision.estimated_minutes, 0);
        assert_eq!(search.requests().len(), 1);
        assert!(search.requests()[0].query.contains("running"));
    }

    #[tokio::test]
    async fn test_traced_states() {
        let search = Arc::new(MockSearchClient::with_hits(vec![]));
        let llm = Arc::new(MockLlmClient::new(vec![
            MockReply::Content(DECISION.to_string()),
            MockReply::Content(PLANS.to_string()),
        ]));
        let planner = planner(search, llm);

        let (result, run) = planner.run_traced(PersonaKind::General, &window(90)).await;
        assert!(result.is_ok());
        assert_eq!(
            run.history(),
            &[
                PipelineState::Start,
                PipelineState::DecisionInFlight,
                PipelineState::DecisionDone,
                PipelineState::PlanSearchInFlight,
                PipelineState::PlanReasoningInFlight,
                PipelineState::Done,
            ]
        );

        let llm = Arc::new(MockLlmClient::repeating(PLANS));
        let planner = planner_with(llm);
        let (_, run) = planner.run_traced(PersonaKind::Athletic, &window(90)).await;
        assert_eq!(run.history()[1], PipelineState::DecisionDone);
    }

    fn planner_with(llm: Arc<MockLlmClient>) -> Planner {
        planner(Arc::new(MockSearchClient::with_hits(vec![])), llm)
    }

    #[tokio::test]
    async fn test_traced_failure_in_decision() {
        let llm = Arc::new(MockLlmClient::repeating(r#"{"use_public_transport": true}"#));
        let planner = planner_with(llm.clone());

        let (result, run) = planner.run_traced(PersonaKind::General, &window(90)).await;
        assert!(matches!(
            result,
            Err(PlannerError::MalformedResponse {
                stage: Stage::MobilityDecision,
                ..
            })
        ));
        assert!(matches!(run.state(), PipelineState::Failed(_)));
        assert_eq!(run.history()[1], PipelineState::DecisionInFlight);
        assert_eq!(llm.call_count(), 1, "no retry after malformed output");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let planner = planner(
            Arc::new(MockSearchClient::with_hits(vec![])),
            Arc::new(MockLlmClient::unconfigured()),
        );
        for kind in [PersonaKind::General, PersonaKind::Athletic] {
            let err = planner.run(kind, &window(90)).await.unwrap_err();
            assert_eq!(err.class(), ErrorClass::ServiceUnavailable);
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        }

        let planner = planner_with_search(Arc::new(MockSearchClient::unconfigured()));
        let err = planner.run_comprehensive_planner(&window(90)).await.unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    fn planner_with_search(search: Arc<MockSearchClient>) -> Planner {
        planner(search, Arc::new(MockLlmClient::repeating(PLANS)))
    }

    #[tokio::test]
    async fn test_inverted_window_is_bad_request() {
        let llm = Arc::new(MockLlmClient::repeating(PLANS));
        let planner = planner_with(llm.clone());
        let err = planner.run_athletic_planner(&window(-10)).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::BadRequest);
        assert_eq!(llm.call_count(), 0);
    }
}

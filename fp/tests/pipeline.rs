//! Integration tests for the planning pipeline
//!
//! These drive the public API with in-process fake providers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};

use freeplan::domain::parse_timestamp;
use freeplan::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use freeplan::prompts::PromptLoader;
use freeplan::search::{SearchClient, SearchError, SearchHit, SearchRequest, SearchResponse};
use freeplan::{
    ErrorClass, MobilityQuery, PersonaKind, PipelineSettings, PipelineState, PlannerError, Planner, Stage, TimeAnchor,
};

// =============================================================================
// Fake providers
// =============================================================================

struct FakeSearch {
    fail: bool,
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    fn ok(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            hits,
            queries: Mutex::new(Vec::new()),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            hits: vec![],
            queries: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.queries.lock().unwrap().push(request.query.clone());
        if self.fail {
            return Err(SearchError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(SearchResponse {
            results: self.hits.clone(),
            ..Default::default()
        })
    }

    fn is_configured(&self) -> bool {
        true
    }
}

struct FakeLlm {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    fn scripted(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        assert!(request.json_mode, "stages must request JSON-object output");
        self.prompts.lock().unwrap().push(request.system_prompt);
        match self.replies.lock().unwrap().pop_front() {
            Some(text) => Ok(CompletionResponse::text(text)),
            None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }

    fn is_configured(&self) -> bool {
        true
    }
}

// =============================================================================
// Fixtures
// =============================================================================

const DECISION_TRANSIT_20: &str = r#"{
    "use_public_transport": true,
    "recommended_mode": "public transport",
    "reasoning": "Two stops on the loop line, about 20 minutes door to door.",
    "estimated_time": 20,
    "estimated_cost": "about 200 yen"
}"#;

const TWO_PLANS: &str = r#"{"plans": [
    {"pattern_description": "Cafe and bookshop", "events": [
        {"title": "Train to Midtown", "start_time": "2025-06-01T10:00:00+09:00", "end_time": "2025-06-01T10:10:00+09:00", "location": "Station A"},
        {"title": "Browse books", "start_time": "2025-06-01T10:10:00+09:00", "end_time": "2025-06-01T11:20:00+09:00", "location": "Midtown Books"},
        {"title": "Train to Station B", "start_time": "2025-06-01T11:20:00+09:00", "end_time": "2025-06-01T11:30:00+09:00"}
    ]},
    {"pattern_description": "Garden walk", "events": [
        {"title": "Train to the park", "start_time": "2025-06-01T10:00:00+09:00", "end_time": "2025-06-01T10:15:00+09:00"},
        {"title": "Stroll", "start_time": "2025-06-01T10:15:00+09:00", "end_time": "2025-06-01T11:15:00+09:00"},
        {"title": "Train to Station B", "start_time": "2025-06-01T11:15:00+09:00", "end_time": "2025-06-01T11:30:00+09:00"}
    ]}
]}"#;

fn t0() -> DateTime<FixedOffset> {
    parse_timestamp("2025-06-01T10:00:00+09:00").unwrap()
}

fn window(minutes: i64) -> MobilityQuery {
    MobilityQuery::new(
        TimeAnchor::new("Station A", t0()),
        TimeAnchor::new("Station B", t0() + Duration::minutes(minutes)),
        "minimize cost",
    )
}

fn hit(content: &str) -> SearchHit {
    SearchHit {
        title: None,
        url: "https://example.com/route".to_string(),
        content: content.to_string(),
        score: Some(0.8),
    }
}

fn planner(search: Arc<FakeSearch>, llm: Arc<FakeLlm>, settings: PipelineSettings) -> Planner {
    Planner::new(search, llm, PromptLoader::embedded_only(), settings)
}

// =============================================================================
// Comprehensive planner
// =============================================================================

#[tokio::test]
async fn test_ninety_minute_window_searches_between_stations() {
    let search = FakeSearch::ok(vec![hit("Loop line, 2 stops, 200 yen")]);
    let llm = FakeLlm::scripted(&[DECISION_TRANSIT_20, TWO_PLANS]);
    let planner = planner(search.clone(), llm.clone(), PipelineSettings::default());

    let set = planner.run_comprehensive_planner(&window(90)).await.unwrap();

    assert_eq!(set.decision.estimated_minutes, 20);
    assert!(set.decision.use_public_transport);
    assert_eq!(set.plans.len(), 2);
    assert!(set.validate(&window(90)).is_ok());

    let plan_query = search.queries().last().cloned().unwrap();
    assert!(plan_query.contains("between Station A and Station B"), "{}", plan_query);
    assert!(plan_query.contains("70 minutes"), "{}", plan_query);

    let prompts = llm.prompts();
    assert!(prompts[0].contains("Loop line, 2 stops, 200 yen"));
    assert!(prompts[1].contains("Two stops on the loop line"));
}

#[tokio::test]
async fn test_search_outage_degrades_both_stages() {
    let search = FakeSearch::down();
    let llm = FakeLlm::scripted(&[DECISION_TRANSIT_20, TWO_PLANS]);
    let planner = planner(search.clone(), llm.clone(), PipelineSettings::default());

    let set = planner.run_comprehensive_planner(&window(90)).await.unwrap();

    assert_eq!(set.plans.len(), 2);
    assert_eq!(search.queries().len(), 3);
    assert_eq!(llm.prompts().len(), 2);
}

#[tokio::test]
async fn test_plan_output_without_plans_key_fails_run() {
    let llm = FakeLlm::scripted(&[DECISION_TRANSIT_20, r#"{"suggestions": []}"#]);
    let planner = planner(FakeSearch::ok(vec![]), llm, PipelineSettings::default());

    let (result, run) = planner.run_traced(PersonaKind::General, &window(90)).await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        PlannerError::MalformedResponse {
            stage: Stage::PlanGeneration,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::UpstreamFailure);
    assert_eq!(err.class().status_code(), 502);
    assert_eq!(run.history()[run.history().len() - 2], PipelineState::PlanReasoningInFlight);
    assert!(matches!(run.state(), PipelineState::Failed(_)));
}

#[tokio::test]
async fn test_japanese_locale_phrasing() {
    let search = FakeSearch::ok(vec![]);
    let llm = FakeLlm::scripted(&[DECISION_TRANSIT_20, TWO_PLANS]);
    let settings = PipelineSettings {
        locale: freeplan::Locale::Ja,
        ..Default::default()
    };
    planner(search.clone(), llm.clone(), settings)
        .run_comprehensive_planner(&window(90))
        .await
        .unwrap();

    let queries = search.queries();
    assert!(queries[0].contains("公共交通機関"));
    assert_eq!(queries[2], "Station AからStation Bの間、またはその周辺で70分で楽しめること");
    assert!(llm.prompts()[1].contains("日本語"));
}

// =============================================================================
// Athletic planner
// =============================================================================

#[tokio::test]
async fn test_athletic_planner_uses_one_reasoning_call() {
    let search = FakeSearch::ok(vec![hit("Riverside track, 2 km loop")]);
    let llm = FakeLlm::scripted(&[TWO_PLANS]);
    let planner = planner(search.clone(), llm.clone(), PipelineSettings::default());

    let set = planner.run_athletic_planner(&window(90)).await.unwrap();

    assert_eq!(llm.prompts().len(), 1);
    assert_eq!(search.queries().len(), 1);
    assert_eq!(set.decision.estimated_minutes, 0);
    assert!(!set.decision.use_public_transport);
    assert!(llm.prompts()[0].contains("Riverside track, 2 km loop"));
}

// =============================================================================
// Tiling enforcement
// =============================================================================

#[tokio::test]
async fn test_enforced_tiling_accepts_tiled_plans() {
    let llm = FakeLlm::scripted(&[DECISION_TRANSIT_20, TWO_PLANS]);
    let settings = PipelineSettings {
        enforce_tiling: true,
        ..Default::default()
    };
    let result = planner(FakeSearch::ok(vec![]), llm, settings)
        .run_comprehensive_planner(&window(90))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_enforced_tiling_rejects_short_plan() {
    // same plans against a longer window leave the last 30 minutes uncovered
    let llm = FakeLlm::scripted(&[DECISION_TRANSIT_20, TWO_PLANS]);
    let settings = PipelineSettings {
        enforce_tiling: true,
        ..Default::default()
    };
    let err = planner(FakeSearch::ok(vec![]), llm, settings)
        .run_comprehensive_planner(&window(120))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("last event ends 30m before arrival"), "{}", err);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let search = FakeSearch::ok(vec![hit("anything")]);
    let llm_a = FakeLlm::scripted(&[TWO_PLANS]);
    let llm_b = FakeLlm::scripted(&[TWO_PLANS]);
    let a = planner(search.clone(), llm_a, PipelineSettings::default());
    let b = planner(search.clone(), llm_b, PipelineSettings::default());

    let q = window(90);
    let (ra, rb) = tokio::join!(a.run_athletic_planner(&q), b.run_athletic_planner(&q));
    assert_eq!(ra.unwrap(), rb.unwrap());
}

//! Query construction
//!
//! Pure functions that turn domain values into provider inputs: search
//! query strings for both stages and rendered prompts. No I/O apart from
//! reading template overrides through the [`PromptLoader`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{MobilityQuery, PlanQuery};
use crate::error::PlannerError;
use crate::prompts::{DECISION_TEMPLATE, DecisionPromptContext, PlanPromptContext, PromptLoader};
use crate::search::SearchContext;

mod persona;

pub use persona::{AthleticPlanner, GeneralPlanner, PersonaKind, PersonaStrategy};

/// Alternative plans requested from the plan stage
pub const PLAN_COUNT: usize = 2;

/// Phrasing for search queries and the language of generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl Locale {
    /// Instruction appended to every prompt
    pub fn language_directive(&self) -> &'static str {
        match self {
            Locale::En => "Write every free-text value (reasoning, titles, descriptions) in English.",
            Locale::Ja => "すべての文字列の値（理由、タイトル、説明）は日本語で書いてください。",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ja => write!(f, "ja"),
        }
    }
}

/// What the route lookup produced, before it is folded into the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum RouteLookup {
    Found(SearchContext),
    /// Every query succeeded but nothing usable came back
    NoResults,
    /// Every query failed
    Failed,
}

/// Queries for the decision stage: one transit-oriented, one walking-oriented
pub fn build_route_search_queries(query: &MobilityQuery, locale: Locale) -> Vec<String> {
    let origin = &query.departure.place;
    let destination = &query.arrival.place;
    debug!(%origin, %destination, %locale, "build_route_search_queries: called");
    match locale {
        Locale::En => vec![
            format!("public transit route from {} to {} fare and travel time", origin, destination),
            format!("walking time and distance from {} to {}", origin, destination),
        ],
        Locale::Ja => vec![
            format!("{}から{}までの公共交通機関での行き方 料金と時間", origin, destination),
            format!("{}から{}までの徒歩での時間と距離", origin, destination),
        ],
    }
}

/// Route context text for the decision prompt, with sentinels for the degraded cases
pub fn route_context_text(lookup: &RouteLookup, locale: Locale) -> String {
    debug!(?locale, "route_context_text: called");
    match (lookup, locale) {
        (RouteLookup::Found(context), Locale::En) => {
            format!("# Route information from web search\n{}", context.render())
        }
        (RouteLookup::Found(context), Locale::Ja) => {
            format!("# Web検索から得られた経路情報\n{}", context.render())
        }
        (RouteLookup::NoResults, Locale::En) => "No useful route information was found on the web.".to_string(),
        (RouteLookup::NoResults, Locale::Ja) => "経路に関する有益なWeb情報は見つかりませんでした。".to_string(),
        (RouteLookup::Failed, Locale::En) => {
            "No reliable route information was found: the web search for the route failed.".to_string()
        }
        (RouteLookup::Failed, Locale::Ja) => "経路に関するWeb情報の検索中にエラーが発生しました。".to_string(),
    }
}

/// Plan search context text, with a placeholder when nothing was found
pub fn plan_context_text(context: &SearchContext, locale: Locale) -> String {
    debug!(entries = context.len(), "plan_context_text: called");
    if !context.is_empty() {
        return context.render();
    }
    match locale {
        Locale::En => "No reference information was found. Rely on general knowledge of the area.".to_string(),
        Locale::Ja => "参考情報は見つかりませんでした。その地域に関する一般的な知識を基にしてください。".to_string(),
    }
}

/// Render the decision-stage prompt
pub fn build_mobility_decision_prompt(
    loader: &PromptLoader,
    route_context: &str,
    query: &MobilityQuery,
    locale: Locale,
) -> Result<String, PlannerError> {
    debug!(context_len = route_context.len(), "build_mobility_decision_prompt: called");
    let context = DecisionPromptContext {
        search_context: route_context.to_string(),
        departure_place: query.departure.place.clone(),
        departure_time: query.departure.time.format("%H:%M").to_string(),
        arrival_place: query.arrival.place.clone(),
        arrival_time: query.arrival.time.format("%H:%M").to_string(),
        available_minutes: query.available_minutes(),
        preference: query.preference.clone(),
        language_directive: locale.language_directive().to_string(),
    };
    loader
        .render(DECISION_TEMPLATE, &context)
        .map_err(|e| PlannerError::Configuration(format!("{:#}", e)))
}

/// Activity search query for the plan stage
///
/// A window with fewer than 15 net minutes always gets the persona's
/// short-activity query, whatever the decision says about transit.
pub fn build_plan_search_query(query: &PlanQuery, persona: &dyn PersonaStrategy, locale: Locale) -> String {
    debug!(
        persona = persona.name(),
        net = query.net_activity_minutes(),
        transit = query.decision.use_public_transport,
        "build_plan_search_query: called"
    );
    if query.is_short_window() {
        debug!("build_plan_search_query: short window branch");
        return persona.short_activity_query(query, locale);
    }
    persona.plan_search_query(query, locale)
}

/// Short nearby activity at the departure location
pub fn short_activity_query(query: &PlanQuery, locale: Locale) -> String {
    let origin = &query.mobility.departure.place;
    match locale {
        Locale::En => format!("things to do within 15 minutes at {}", origin),
        Locale::Ja => format!("{}で15分以内にできること", origin),
    }
}

/// Render the plan-stage prompt through the persona
pub fn build_plan_prompt(
    loader: &PromptLoader,
    query: &PlanQuery,
    search_context: &str,
    persona: &dyn PersonaStrategy,
    locale: Locale,
) -> Result<String, PlannerError> {
    debug!(persona = persona.name(), context_len = search_context.len(), "build_plan_prompt: called");
    let mobility = &query.mobility;
    let decision = &query.decision;
    let context = PlanPromptContext {
        departure_place: mobility.departure.place.clone(),
        departure_time: mobility.departure.time.to_rfc3339(),
        arrival_place: mobility.arrival.place.clone(),
        arrival_time: mobility.arrival.time.to_rfc3339(),
        available_minutes: query.available_minutes(),
        net_activity_minutes: query.net_activity_minutes(),
        preference: mobility.preference.clone(),
        use_public_transport: decision.use_public_transport,
        recommended_mode: decision.recommended_mode.clone(),
        decision_reasoning: decision.reasoning.clone(),
        estimated_minutes: decision.estimated_minutes,
        estimated_cost: decision.estimated_cost.clone(),
        search_context: search_context.to_string(),
        plan_count: PLAN_COUNT,
        language_directive: locale.language_directive().to_string(),
    };
    persona
        .plan_prompt(loader, &context)
        .map_err(|e| PlannerError::Configuration(format!("{:#}", e)))
}

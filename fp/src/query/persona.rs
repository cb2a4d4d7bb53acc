//! Persona strategies for plan generation
//!
//! A persona controls how the plan stage phrases its activity search and
//! which template it renders. It may also supply its own decision and skip
//! the decision stage altogether.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Locale, short_activity_query};
use crate::domain::{MobilityDecision, PlanQuery};
use crate::prompts::{PlanPromptContext, PromptLoader};

/// Query and prompt strategy for one kind of planner
pub trait PersonaStrategy: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Plan template rendered for this persona
    fn template_name(&self) -> &'static str;

    /// Activity search query for a window with room for a real activity
    fn plan_search_query(&self, query: &PlanQuery, locale: Locale) -> String;

    /// Activity search query when fewer than 15 net minutes remain
    fn short_activity_query(&self, query: &PlanQuery, locale: Locale) -> String {
        short_activity_query(query, locale)
    }

    /// Render the plan prompt
    fn plan_prompt(&self, loader: &PromptLoader, context: &PlanPromptContext) -> eyre::Result<String> {
        loader.render(self.template_name(), context)
    }

    /// A fixed decision used instead of running the decision stage
    fn synthetic_decision(&self, _locale: Locale) -> Option<MobilityDecision> {
        None
    }
}

/// Everyday planner: follows the mobility decision
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralPlanner;

impl PersonaStrategy for GeneralPlanner {
    fn name(&self) -> &'static str {
        "general"
    }

    fn template_name(&self) -> &'static str {
        "plan-general"
    }

    fn plan_search_query(&self, query: &PlanQuery, locale: Locale) -> String {
        let origin = &query.mobility.departure.place;
        let destination = &query.mobility.arrival.place;
        let minutes = query.net_activity_minutes();
        debug!(transit = query.decision.use_public_transport, %minutes, "GeneralPlanner::plan_search_query: called");

        match (query.decision.use_public_transport, locale) {
            (true, Locale::En) => format!(
                "things to enjoy in {} minutes between {} and {} or nearby",
                minutes, origin, destination
            ),
            (true, Locale::Ja) => format!(
                "{}から{}の間、またはその周辺で{}分で楽しめること",
                origin, destination, minutes
            ),
            (false, Locale::En) => format!("things to enjoy in {} minutes around {}", minutes, origin),
            (false, Locale::Ja) => format!("{}周辺で{}分で楽しめること", origin, minutes),
        }
    }
}

/// High-intensity training planner: moves under its own power, skips the decision stage
#[derive(Debug, Clone, Copy, Default)]
pub struct AthleticPlanner;

impl PersonaStrategy for AthleticPlanner {
    fn name(&self) -> &'static str {
        "athletic"
    }

    fn template_name(&self) -> &'static str {
        "plan-athletic"
    }

    /// Training venues along or around the route, whatever the decision says
    fn plan_search_query(&self, query: &PlanQuery, locale: Locale) -> String {
        let origin = &query.mobility.departure.place;
        let destination = &query.mobility.arrival.place;
        debug!(%origin, %destination, "AthleticPlanner::plan_search_query: called");
        match locale {
            Locale::En => format!(
                "running courses, open-water swimming spots, hiking and trail-running mountains, gyms and public \
                 training facilities between {} and {} or nearby",
                origin, destination
            ),
            Locale::Ja => format!(
                "{}と{}の間にある、またはその周辺の、ランニングコース、オープンウォータースイミングができる場所、\
                 登山・トレイルランニングができる山。ジムや公共のトレーニング施設も含む。\
                 体を鍛えることができる場所であれば基本的にどこでも良い。",
                origin, destination
            ),
        }
    }

    /// Training spots right at the departure point when the window is short
    fn short_activity_query(&self, query: &PlanQuery, locale: Locale) -> String {
        let origin = &query.mobility.departure.place;
        debug!(%origin, "AthleticPlanner::short_activity_query: called");
        match locale {
            Locale::En => format!(
                "running courses, gyms and public training facilities near {} for a 15-minute workout",
                origin
            ),
            Locale::Ja => format!(
                "{}のすぐ近くにある、15分でトレーニングできるランニングコース、ジムや公共のトレーニング施設",
                origin
            ),
        }
    }

    fn synthetic_decision(&self, locale: Locale) -> Option<MobilityDecision> {
        debug!(%locale, "AthleticPlanner::synthetic_decision: called");
        let (mode, reasoning, cost) = match locale {
            Locale::En => (
                "own body",
                "An athlete needs no machines. Every move is part of the training.",
                "0",
            ),
            Locale::Ja => (
                "己の肉体",
                "アスリートに文明の利器は不要。移動は全てトレーニングの一環である。",
                "0円",
            ),
        };
        Some(MobilityDecision {
            use_public_transport: false,
            recommended_mode: mode.to_string(),
            reasoning: reasoning.to_string(),
            // Travel time is worked out inside the plan itself
            estimated_minutes: 0,
            estimated_cost: cost.to_string(),
        })
    }
}

/// Named personas selectable from config or the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKind {
    #[default]
    General,
    Athletic,
}

impl PersonaKind {
    pub fn strategy(&self) -> Box<dyn PersonaStrategy> {
        debug!(?self, "PersonaKind::strategy: called");
        match self {
            PersonaKind::General => Box::new(GeneralPlanner),
            PersonaKind::Athletic => Box::new(AthleticPlanner),
        }
    }
}

impl std::fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonaKind::General => write!(f, "general"),
            PersonaKind::Athletic => write!(f, "athletic"),
        }
    }
}

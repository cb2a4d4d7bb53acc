//! freeplan - Free-Time Planner
//!
//! Turns the free time between two calendar commitments into concrete,
//! time-boxed action plans. A run chains two externally-dependent stages:
//! decide whether the gap is bridged by public transport or on foot, then
//! generate alternative plans that respect that decision and the remaining
//! time budget.
//!
//! # Core Concepts
//!
//! - **Explicit clients**: search and reasoning clients are passed into the
//!   stages; the pipeline holds no provider state of its own
//! - **Degrade on search, fail on reasoning**: a failed web search only
//!   thins the prompt context; malformed model output aborts the stage
//! - **Strict parsing**: required fields in model output are never defaulted
//! - **Personas as strategies**: the general and athletic planners share one
//!   pipeline and differ only in query phrasing and prompt constraints
//!
//! # Modules
//!
//! - [`domain`] - Anchors, queries, decisions, plans and plan validation
//! - [`query`] - Search query and prompt construction, personas
//! - [`pipeline`] - The two stages and the [`Planner`] facade
//! - [`search`] - Web search client trait and Tavily implementation
//! - [`llm`] - Reasoning client trait and OpenAI implementation
//! - [`prompts`] - Handlebars prompt templates with override directories
//! - [`calendar`] - Calendar lookups used to build a window
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod calendar;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod query;
pub mod search;

pub use domain::{MobilityDecision, MobilityQuery, PlanEvent, PlanPattern, PlanQuery, PlanSet, TimeAnchor};
pub use error::{ErrorClass, PlannerError, Stage};
pub use pipeline::{PipelineRun, PipelineSettings, PipelineState, Planner};
pub use query::{Locale, PersonaKind, PersonaStrategy};

//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for both pipeline stages.
//!
//! Template loading chain:
//! 1. `{prompts-dir}/{name}.pmt` (configured override)
//! 2. `.freeplan/prompts/{name}.pmt` (project override)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{DECISION_TEMPLATE, DecisionPromptContext, PlanPromptContext, PromptLoader};

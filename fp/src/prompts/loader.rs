//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Template for the mobility decision stage
pub const DECISION_TEMPLATE: &str = "mobility-decision";

/// Variables for `mobility-decision.pmt`
#[derive(Debug, Clone, Serialize)]
pub struct DecisionPromptContext {
    /// Rendered route context, header included, or the no-results sentinel
    pub search_context: String,
    pub departure_place: String,
    /// `HH:MM` in the anchor's own offset
    pub departure_time: String,
    pub arrival_place: String,
    pub arrival_time: String,
    pub available_minutes: i64,
    pub preference: String,
    pub language_directive: String,
}

/// Variables for the persona plan templates
#[derive(Debug, Clone, Serialize)]
pub struct PlanPromptContext {
    pub departure_place: String,
    /// RFC 3339, so the model can copy it into event timestamps
    pub departure_time: String,
    pub arrival_place: String,
    pub arrival_time: String,
    pub available_minutes: i64,
    pub net_activity_minutes: i64,
    pub preference: String,
    pub use_public_transport: bool,
    pub recommended_mode: String,
    pub decision_reasoning: String,
    pub estimated_minutes: u32,
    pub estimated_cost: String,
    pub search_context: String,
    /// Number of alternative plans requested
    pub plan_count: usize,
    pub language_directive: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Configured override directory (`planner.prompts-dir`)
    config_dir: Option<PathBuf>,
    /// Project override directory (`.freeplan/prompts/`)
    project_dir: Option<PathBuf>,
}

fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    // Prompts are plain text; HTML escaping would mangle quotes in preferences
    hbs.register_escape_fn(handlebars::no_escape);
    hbs.set_strict_mode(true);
    hbs
}

impl PromptLoader {
    /// Create a loader checking `prompts_dir`, then `{root}/.freeplan/prompts/`
    pub fn new(prompts_dir: Option<&Path>, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?prompts_dir, ?root, "PromptLoader::new: called");
        let project_dir = root.join(".freeplan/prompts");

        let config_dir = match prompts_dir {
            Some(dir) if dir.exists() => Some(dir.to_path_buf()),
            Some(dir) => {
                tracing::warn!("Configured prompts directory {} does not exist, ignoring", dir.display());
                None
            }
            None => None,
        };

        let project_dir_exists = project_dir.exists();
        debug!(?project_dir, %project_dir_exists, "PromptLoader::new: checking project directory");

        Self {
            hbs: engine(),
            config_dir,
            project_dir: if project_dir_exists { Some(project_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: engine(),
            config_dir: None,
            project_dir: None,
        }
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Configured override: `{prompts-dir}/{name}.pmt`
    /// 2. Project override: `.freeplan/prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.config_dir, &self.project_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in override directory");
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        if let Some(content) = embedded::get_embedded(name) {
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision_context() -> DecisionPromptContext {
        DecisionPromptContext {
            search_context: "# Route information from web search\n- 12 minutes by train".to_string(),
            departure_place: "Station A".to_string(),
            departure_time: "10:00".to_string(),
            arrival_place: "Station B".to_string(),
            arrival_time: "11:30".to_string(),
            available_minutes: 90,
            preference: "I'd rather \"not\" walk & save money".to_string(),
            language_directive: "Write all text values in English.".to_string(),
        }
    }

    #[test]
    fn test_render_decision_embedded() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.render(DECISION_TEMPLATE, &decision_context()).unwrap();

        assert!(prompt.contains("Departure point: Station A"));
        assert!(prompt.contains("Total time available for the move: 90 minutes"));
        assert!(prompt.contains("- 12 minutes by train"));
        assert!(prompt.contains("between 0 and 90"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_render_does_not_html_escape() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.render(DECISION_TEMPLATE, &decision_context()).unwrap();
        assert!(prompt.contains(r#"I'd rather "not" walk & save money"#));
    }

    #[test]
    fn test_render_plan_templates() {
        let ctx = PlanPromptContext {
            departure_place: "Station A".to_string(),
            departure_time: "2025-06-01T10:00:00+09:00".to_string(),
            arrival_place: "Station B".to_string(),
            arrival_time: "2025-06-01T11:30:00+09:00".to_string(),
            available_minutes: 90,
            net_activity_minutes: 70,
            preference: "quiet".to_string(),
            use_public_transport: true,
            recommended_mode: "train".to_string(),
            decision_reasoning: "The train is fastest.".to_string(),
            estimated_minutes: 20,
            estimated_cost: "200 yen".to_string(),
            search_context: "- A quiet cafe (Source: https://example.com)".to_string(),
            plan_count: 2,
            language_directive: String::new(),
        };
        let loader = PromptLoader::embedded_only();

        let general = loader.render("plan-general", &ctx).unwrap();
        assert!(general.contains("about 70 minutes remain"));
        assert!(general.contains("The train is fastest."));
        assert!(general.contains("\"start_time\": \"2025-06-01T10:00:00+09:00\""));

        let athletic = loader.render("plan-athletic", &ctx).unwrap();
        assert!(athletic.contains("running, swimming or climbing"));
        assert!(athletic.contains("- A quiet cafe (Source: https://example.com)"));
    }

    #[test]
    fn test_strict_mode_rejects_missing_variable() {
        let loader = PromptLoader::embedded_only();
        let err = loader.render(DECISION_TEMPLATE, &serde_json::json!({ "search_context": "x" }));
        assert!(err.is_err());
    }

    #[test]
    fn test_configured_dir_overrides_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mobility-decision.pmt"), "From {{departure_place}}").unwrap();

        let loader = PromptLoader::new(Some(dir.path()), dir.path());
        let prompt = loader.render(DECISION_TEMPLATE, &decision_context()).unwrap();
        assert_eq!(prompt, "From Station A");
    }

    #[test]
    fn test_project_dir_override_and_precedence() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join(".freeplan/prompts");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("mobility-decision.pmt"), "project {{arrival_place}}").unwrap();

        let loader = PromptLoader::new(None, root.path());
        assert_eq!(loader.render(DECISION_TEMPLATE, &decision_context()).unwrap(), "project Station B");

        let configured = tempfile::tempdir().unwrap();
        std::fs::write(configured.path().join("mobility-decision.pmt"), "configured").unwrap();
        let loader = PromptLoader::new(Some(configured.path()), root.path());
        assert_eq!(loader.render(DECISION_TEMPLATE, &decision_context()).unwrap(), "configured");
    }

    #[test]
    fn test_missing_configured_dir_falls_back() {
        let root = tempfile::tempdir().unwrap();
        let loader = PromptLoader::new(Some(&root.path().join("missing")), root.path());
        let prompt = loader.render(DECISION_TEMPLATE, &decision_context()).unwrap();
        assert!(prompt.contains("use_public_transport"));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}

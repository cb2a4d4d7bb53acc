//! freeplan - free-time planner
//!
//! CLI entry point: resolves the window, builds the provider clients and
//! runs one pipeline.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use freeplan::calendar::{InMemoryCalendar, resolve_window};
use freeplan::cli::{Cli, Command, OutputFormat, WindowArgs, generate_after_help, get_log_path};
use freeplan::config::Config;
use freeplan::domain::{MobilityDecision, MobilityQuery, PlanQuery, PlanSet, TimeAnchor};
use freeplan::error::PlannerError;
use freeplan::query::{Locale, PersonaKind, build_plan_search_query, build_route_search_queries};
use freeplan::{Planner, llm, search};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows credential checks.
    // --config is not parsed yet, so help reflects the project/user config.
    let help_config = Config::load(None).unwrap_or_default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(model = %config.llm.model, locale = %config.planner.locale, "freeplan loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Decide { window, format } => cmd_decide(&config, &window, &format).await,
        Command::Plan {
            window,
            persona,
            validate,
            format,
        } => cmd_plan(&config, &window, persona, validate, &format).await,
        Command::Queries {
            window,
            persona,
            estimated_minutes,
            transit,
        } => cmd_queries(&config, &window, persona, estimated_minutes, transit).await,
    }
}

/// Build the planning window from explicit anchors or a calendar file
async fn resolve_query(window: &WindowArgs, locale: Locale) -> Result<MobilityQuery> {
    debug!(?window, "resolve_query: called");
    if let Some(path) = &window.calendar {
        let (Some(start), Some(end)) = (window.free_start, window.free_end) else {
            return Err(eyre!("--calendar needs --free-start and --free-end"));
        };
        let calendar = InMemoryCalendar::load(path).context(format!("Failed to load calendar {}", path.display()))?;
        return Ok(resolve_window(&calendar, start, end, window.prefer.clone(), locale).await?);
    }

    match (&window.from, window.depart, &window.to, window.arrive) {
        (Some(from), Some(depart), Some(to), Some(arrive)) => Ok(MobilityQuery::new(
            TimeAnchor::new(from.clone(), depart),
            TimeAnchor::new(to.clone(), arrive),
            window.prefer.clone(),
        )),
        _ => Err(eyre!(
            "Give the window as --from/--depart/--to/--arrive, or as --calendar with --free-start/--free-end"
        )),
    }
}

fn build_planner(config: &Config) -> Result<Planner> {
    debug!("build_planner: called");
    let search = search::create_client(&config.search).context("Failed to create search client")?;
    let llm = llm::create_client(&config.llm).context("Failed to create reasoning client")?;
    Ok(Planner::from_config(config, search, llm))
}

/// Attach the caller-facing class to a pipeline failure
fn classify(err: PlannerError) -> eyre::Report {
    let class = err.class();
    eyre!("{} ({}): {}", class, class.status_code(), err)
}

async fn cmd_decide(config: &Config, window: &WindowArgs, format: &OutputFormat) -> Result<()> {
    debug!(%format, "cmd_decide: called");
    let query = resolve_query(window, config.planner.locale).await?;
    let planner = build_planner(config)?;
    let decision = planner.decision_stage().decide(&query).await.map_err(classify)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&decision)?),
        OutputFormat::Text => print_decision(&decision, &query),
    }
    Ok(())
}

async fn cmd_plan(
    config: &Config,
    window: &WindowArgs,
    persona: PersonaKind,
    validate: bool,
    format: &OutputFormat,
) -> Result<()> {
    debug!(%persona, validate, %format, "cmd_plan: called");
    let query = resolve_query(window, config.planner.locale).await?;
    let planner = build_planner(config)?;
    let set = planner.run(persona, &query).await.map_err(classify)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&set)?),
        OutputFormat::Text => print_plan_set(&set, &query),
    }

    if validate {
        match set.validate(&query) {
            Ok(()) => eprintln!("{} every plan tiles the window", "ok:".green()),
            Err(e) => {
                for (plan, violation) in &e.violations {
                    eprintln!("{} plan {}: {}", "warning:".yellow(), plan + 1, violation);
                }
            }
        }
    }
    Ok(())
}

async fn cmd_queries(
    config: &Config,
    window: &WindowArgs,
    persona: PersonaKind,
    estimated_minutes: u32,
    transit: bool,
) -> Result<()> {
    debug!(%persona, estimated_minutes, transit, "cmd_queries: called");
    let locale = config.planner.locale;
    let query = resolve_query(window, locale).await?;
    let strategy = persona.strategy();

    let decision = match strategy.synthetic_decision(locale) {
        Some(decision) => decision,
        None => {
            println!("{}", "Route search:".bold());
            for q in build_route_search_queries(&query, locale) {
                println!("  {}", q);
            }
            MobilityDecision {
                use_public_transport: transit,
                recommended_mode: String::new(),
                reasoning: String::new(),
                estimated_minutes,
                estimated_cost: String::new(),
            }
        }
    };

    let plan_query = PlanQuery::new(query, decision);
    println!("{}", "Plan search:".bold());
    println!("  {}", build_plan_search_query(&plan_query, strategy.as_ref(), locale));
    println!(
        "{} {} available, {} for the activity",
        "Budget:".bold(),
        format_minutes(plan_query.available_minutes()),
        format_minutes(plan_query.net_activity_minutes())
    );
    Ok(())
}

fn format_minutes(minutes: i64) -> String {
    format!("{} min", minutes)
}

fn print_decision(decision: &MobilityDecision, query: &MobilityQuery) {
    let mode = if decision.use_public_transport {
        "public transport".cyan()
    } else {
        "on foot".green()
    };
    println!(
        "{} {} -> {} ({} available)",
        "Window:".bold(),
        query.departure.place,
        query.arrival.place,
        format_minutes(query.available_minutes())
    );
    println!("{} {} ({})", "Decision:".bold(), mode, decision.recommended_mode);
    println!(
        "{} {}, {}",
        "Estimate:".bold(),
        format_minutes(i64::from(decision.estimated_minutes)),
        decision.estimated_cost
    );
    println!("{} {}", "Reasoning:".bold(), decision.reasoning);
}

fn print_plan_set(set: &PlanSet, query: &MobilityQuery) {
    print_decision(&set.decision, query);
    for (idx, plan) in set.plans.iter().enumerate() {
        println!();
        println!("{} {}", format!("Plan {}:", idx + 1).bold(), plan.description);
        for event in &plan.events {
            println!(
                "  {}-{}  {}",
                event.start_time.format("%H:%M"),
                event.end_time.format("%H:%M"),
                event.title
            );
            if let Some(location) = &event.location {
                println!("               {}", location.dimmed());
            }
            if let Some(description) = &event.description {
                println!("               {}", description.dimmed());
            }
        }
    }
}

//! Lexbridge CLI - Command-line interface for the research service
//!
//! Resolves citation links in answers, inspects graph payloads, and calls
//! the research service without the desktop app.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Emoji};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lexbridge_studio::citation::{resolve_with, Citation, ResolutionPolicy, ResolvedDraft, Segment};
use lexbridge_studio::config::AppConfig;
use lexbridge_studio::diagram::{
    build, ForceLayout, FrameInput, GraphNode, GraphPalette, GraphPayload, GraphRenderer,
    GraphSnapshot, LayoutConfig, RecordingCanvas,
};
use lexbridge_studio::service::{ClientConfig, QueryResponse, ServiceClient, Severity};
use lexbridge_studio::viewport::RegimeMode;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "+ ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");
static ARROW: Emoji<'_, '_> = Emoji("→ ", "-> ");
static INFO: Emoji<'_, '_> = Emoji("ℹ ", "i ");
static SCALES: Emoji<'_, '_> = Emoji("⚖ ", "# ");

#[derive(Parser)]
#[command(name = "lexbridge-cli")]
#[command(version)]
#[command(about = "Lexbridge CLI - Legal research from the terminal")]
#[command(long_about = r#"
Lexbridge CLI talks to the research service and works with its output offline.

Features:
  • Ask questions and draft memos with linked citations
  • Audit documents for outdated IPC references
  • Resolve citation links in saved answers
  • Inspect and headlessly render graph payloads

Examples:
  lexbridge-cli ask "What replaced Section 302 IPC?"
  lexbridge-cli draft --file facts.txt
  lexbridge-cli audit petition.pdf
  lexbridge-cli resolve answer.json --policy sequential
  lexbridge-cli graph answer.json --regime current --zoom 2
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the service URL from the config file
    #[arg(long, global = true)]
    pub service_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a legal question
    Ask {
        /// The question (at least 5 characters)
        #[arg(required = true)]
        query: Vec<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Draft a memo from case facts
    Draft {
        /// Facts of the case
        facts: Option<String>,

        /// Read facts from a file instead
        #[arg(short, long, conflicts_with = "facts")]
        file: Option<PathBuf>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Audit a document for outdated provisions
    Audit {
        /// Document to upload (pdf, txt, md)
        file: PathBuf,
    },

    /// Check service health
    Health,

    /// Link entity names in text to their citations
    Resolve {
        /// A saved `/ask` or `/draft` response, or a plain text file
        file: PathBuf,

        /// Citations JSON (required when FILE is plain text)
        #[arg(short, long)]
        citations: Option<PathBuf>,

        /// Override the configured resolution policy
        #[arg(short, long)]
        policy: Option<PolicyArg>,

        /// Print the annotated markup instead of styled text
        #[arg(long)]
        raw: bool,
    },

    /// Inspect a graph payload and render it headlessly
    Graph {
        /// Graph payload JSON, or a saved `/ask` response
        file: PathBuf,

        /// Regime filter for the render pass
        #[arg(short, long, default_value = "compare")]
        regime: RegimeArg,

        /// Zoom for the render pass
        #[arg(short, long, default_value_t = 1.0)]
        zoom: f32,

        /// Maximum layout iterations
        #[arg(long, default_value_t = 500)]
        steps: usize,
    },

    /// Show or initialise the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Sequential,
    SinglePass,
}

impl From<PolicyArg> for ResolutionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Sequential => ResolutionPolicy::Sequential,
            PolicyArg::SinglePass => ResolutionPolicy::SinglePass,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum RegimeArg {
    Legacy,
    Current,
    Compare,
}

impl From<RegimeArg> for RegimeMode {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::Legacy => RegimeMode::Legacy,
            RegimeArg::Current => RegimeMode::Current,
            RegimeArg::Compare => RegimeMode::Compare,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::fallback(), Some(e)),
    };
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_filter()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(e) = config_error {
        eprintln!(
            "{} Config ignored, using defaults: {}",
            style("warning:").yellow().bold(),
            e
        );
    }

    if let Some(url) = cli.service_url {
        config.service_url = url;
    }

    match cli.command {
        Commands::Ask { query, json } => cmd_ask(&config, &query.join(" "), json),
        Commands::Draft { facts, file, json } => cmd_draft(&config, facts, file.as_deref(), json),
        Commands::Audit { file } => cmd_audit(&config, &file),
        Commands::Health => cmd_health(&config),
        Commands::Resolve {
            file,
            citations,
            policy,
            raw,
        } => {
            let policy = policy.map(Into::into).unwrap_or(config.resolution_policy);
            cmd_resolve(&file, citations.as_deref(), policy, raw)
        }
        Commands::Graph {
            file,
            regime,
            zoom,
            steps,
        } => cmd_graph(&config, &file, regime.into(), zoom, steps),
        Commands::Config { action } => cmd_config(&config, action),
    }
}

fn client_for(config: &AppConfig) -> Result<ServiceClient> {
    ServiceClient::new(ClientConfig::from(config)).context("Failed to create HTTP client")
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Ask a question
fn cmd_ask(config: &AppConfig, query: &str, json: bool) -> Result<()> {
    let client = client_for(config)?;
    let pb = spinner(format!("Researching via {}", config.service_url));
    let result = client.ask(query);
    pb.finish_and_clear();

    let response = result.context("Ask request failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    print_response("Answer", &response, config.resolution_policy);

    if let Some(payload) = &response.graph_data {
        match build(payload) {
            Ok(snapshot) => println!(
                "{} Graph: {} nodes, {} edges, {} cited",
                INFO,
                snapshot.nodes().len(),
                snapshot.edges().len(),
                snapshot.cited_count()
            ),
            Err(e) => println!("{} Graph payload rejected: {}", CROSS, style(e).red()),
        }
    }
    Ok(())
}

/// Draft a memo
fn cmd_draft(config: &AppConfig, facts: Option<String>, file: Option<&Path>, json: bool) -> Result<()> {
    let facts = match (facts, file) {
        (Some(facts), _) => facts,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read facts from {}", path.display()))?,
        (None, None) => anyhow::bail!("Provide facts inline or with --file"),
    };

    let client = client_for(config)?;
    let pb = spinner("Drafting memo...".to_string());
    let result = client.draft(&facts);
    pb.finish_and_clear();

    let response = result.context("Draft request failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    print_response("Memo", &response, config.resolution_policy);
    Ok(())
}

/// Audit a document
fn cmd_audit(config: &AppConfig, file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let client = client_for(config)?;
    let pb = spinner(format!("Auditing {}...", file.display()));
    let result = client.audit_file(file);
    pb.finish_and_clear();

    let report = result.context("Audit request failed")?;

    println!();
    println!(
        "{}{} ({} citations checked)",
        SCALES,
        style(&report.filename).bold(),
        report.total_citations
    );
    println!();

    if report.findings.is_empty() {
        println!("{} No outdated references found", CHECK);
        return Ok(());
    }

    for finding in report.by_severity() {
        let severity = match finding.severity {
            Severity::High => style(finding.severity.name()).red().bold(),
            Severity::Medium => style(finding.severity.name()).yellow().bold(),
            _ => style(finding.severity.name()).dim(),
        };
        println!(
            "  {:<8} {} {}",
            severity,
            style(&finding.citation).white().bold(),
            style(&finding.status).dim()
        );
        if !finding.suggestion.is_empty() {
            println!("           {}{}", ARROW, style(&finding.suggestion).green());
        }
        if !finding.reasoning.is_empty() {
            println!("           {}", style(&finding.reasoning).dim());
        }
    }

    let outdated = report.findings.iter().filter(|f| f.is_outdated()).count();
    println!();
    println!(
        "{} {} outdated, {} to review",
        INFO,
        style(outdated).red(),
        style(report.findings.len() - outdated).yellow()
    );
    Ok(())
}

/// Service health
fn cmd_health(config: &AppConfig) -> Result<()> {
    let client = client_for(config)?;
    match client.health() {
        Ok(health) => {
            let status = if health.is_healthy() {
                style(health.status.as_str()).green()
            } else {
                style(health.status.as_str()).yellow()
            };
            println!("{} {} at {}", CHECK, status, style(&config.service_url).dim());
            if let Some(orchestrator) = &health.orchestrator {
                println!("  Orchestrator: {}", orchestrator);
            }
            println!(
                "  Graph loaded: {}",
                if health.graph_loaded {
                    style("yes").green()
                } else {
                    style("no").yellow()
                }
            );
            if let Some(stats) = health.graph_stats {
                println!("  Graph size:   {} nodes, {} edges", stats.nodes, stats.edges);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Service unreachable: {}", CROSS, style(&e).red());
            Err(anyhow::Error::new(e)
                .context(format!("Health check against {} failed", config.service_url)))
        }
    }
}

/// Input for `resolve`: a saved response, or plain text plus citations
fn load_resolve_input(file: &Path, citations: Option<&Path>) -> Result<(String, Vec<Citation>)> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if let Ok(response) = serde_json::from_str::<QueryResponse>(&content) {
        return Ok((response.answer, response.citations));
    }

    let Some(citations_path) = citations else {
        anyhow::bail!(
            "{} is not a saved response; pass --citations with a citations JSON file",
            file.display()
        );
    };
    let raw = std::fs::read_to_string(citations_path)
        .with_context(|| format!("Failed to read {}", citations_path.display()))?;
    let citations: Vec<Citation> = match serde_json::from_str(&raw) {
        Ok(list) => list,
        Err(_) => {
            serde_json::from_str::<QueryResponse>(&raw)
                .with_context(|| format!("{} holds no citations", citations_path.display()))?
                .citations
        }
    };
    Ok((content, citations))
}

/// Resolve citation links offline
fn cmd_resolve(file: &Path, citations: Option<&Path>, policy: ResolutionPolicy, raw: bool) -> Result<()> {
    let (text, citations) = load_resolve_input(file, citations)?;
    let resolved = resolve_with(&text, &citations, policy);

    if raw {
        println!("{}", resolved.annotated);
        return Ok(());
    }

    println!();
    print_resolved(&resolved, &citations);
    println!();
    println!(
        "{} {} substitutions ({})",
        INFO,
        resolved.substitutions.len(),
        style(policy.name()).dim()
    );
    for sub in &resolved.substitutions {
        println!(
            "  {}{} {}",
            ARROW,
            style(&sub.entity).cyan(),
            style(&sub.uuid).dim()
        );
    }
    Ok(())
}

/// Load a payload file: a bare graph payload or a saved `/ask` response
fn load_snapshot(file: &Path) -> Result<GraphSnapshot> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let payload = match serde_json::from_str::<QueryResponse>(&content) {
        Ok(QueryResponse {
            graph_data: Some(payload),
            ..
        }) => payload,
        _ => serde_json::from_str::<GraphPayload>(&content)
            .with_context(|| format!("{} is not a graph payload", file.display()))?,
    };
    build(&payload).context("Graph payload rejected")
}

/// Inspect a graph payload
fn cmd_graph(config: &AppConfig, file: &Path, regime: RegimeMode, zoom: f32, steps: usize) -> Result<()> {
    let snapshot = load_snapshot(file)?;

    println!();
    println!("{}", style("Graph").bold().underlined());
    println!(
        "  {} nodes, {} edges, {} cited",
        snapshot.nodes().len(),
        snapshot.edges().len(),
        snapshot.cited_count()
    );
    if snapshot.dropped_edges > 0 {
        println!(
            "  {} {} edges referenced unknown nodes and were dropped",
            style("⚠").yellow(),
            snapshot.dropped_edges
        );
    }
    if !snapshot.stats.relationship_types.is_empty() {
        println!(
            "  Relations: {}",
            style(snapshot.stats.relationship_types.join(", ")).dim()
        );
    }

    let mut by_type: BTreeMap<&str, Vec<&GraphNode>> = BTreeMap::new();
    for node in snapshot.nodes() {
        by_type.entry(node.entity_type.name()).or_default().push(node);
    }
    println!();
    for (kind, nodes) in &by_type {
        println!("  {} ({})", style(kind).cyan().bold(), nodes.len());
        for node in nodes {
            let regime_tag = node
                .regime
                .map(|r| format!(" [{}]", r.name()))
                .unwrap_or_default();
            let cited = if node.is_cited { " ●" } else { "" };
            println!(
                "    {}{}{}",
                node.label,
                style(regime_tag).dim(),
                style(cited).green()
            );
        }
    }

    // Headless render
    let mut layout = ForceLayout::new(LayoutConfig::default());
    layout.reset_for(&snapshot);
    let mut iterations = 0;
    while iterations < steps && !layout.step(&snapshot) {
        iterations += 1;
    }

    let theme = lexbridge_studio::theme::Theme::by_name(&config.theme);
    let renderer = GraphRenderer::new(GraphPalette::from_theme(&theme), config.render_settings());
    let mut canvas = RecordingCanvas::new();
    let stats = renderer.render_frame(
        &mut canvas,
        &FrameInput {
            snapshot: &snapshot,
            positions: &layout,
            hovered: None,
            regime_mode: regime,
            zoom,
        },
    );

    println!();
    println!(
        "{} Render ({}, zoom {:.1}, layout {} after {} steps)",
        INFO,
        regime.name(),
        zoom,
        if layout.is_converged() {
            "converged"
        } else {
            "unsettled"
        },
        iterations
    );
    println!(
        "  Nodes: {} drawn, {} skipped",
        stats.nodes_drawn, stats.nodes_skipped
    );
    println!(
        "  Edges: {} drawn, {} skipped, {} labelled",
        stats.edges_drawn, stats.edges_skipped, stats.edge_labels_drawn
    );
    println!("  Draw ops: {}", canvas.ops.len());
    Ok(())
}

/// Config file management
fn cmd_config(config: &AppConfig, action: ConfigAction) -> Result<()> {
    let path = AppConfig::config_path();
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{}", style(format!("# {}", path.display())).dim());
            println!("{}", content);
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!(
                    "{} Config already exists at {} (use {} to overwrite)",
                    INFO,
                    style(path.display()).dim(),
                    style("--force").yellow()
                );
                return Ok(());
            }
            AppConfig::default()
                .save_to(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Wrote {}", CHECK, style(path.display()).green());
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════

fn print_response(title: &str, response: &QueryResponse, policy: ResolutionPolicy) {
    let resolved = resolve_with(&response.answer, &response.citations, policy);
    println!();
    println!("{}{}", SCALES, style(title).bold().underlined());
    println!();
    print_resolved(&resolved, &response.citations);

    if !response.citations.is_empty() {
        println!();
        println!("{}", style("Citations").bold());
        for (i, citation) in response.citations.iter().enumerate() {
            println!(
                "  [{}] {} {}",
                i + 1,
                style(citation.entity().unwrap_or("Unnamed provision")).white().bold(),
                style(format!("{:.2}", citation.score)).dim()
            );
            println!("      {}", style(citation.provenance()).dim());
            if !citation.summary.is_empty() {
                println!("      {}", citation.summary);
            }
        }
    }
}

/// Print resolved text with links highlighted and footnoted
fn print_resolved(resolved: &ResolvedDraft, citations: &[Citation]) {
    let mut out = String::new();
    for segment in resolved.segments() {
        match segment {
            Segment::Text(text) => out.push_str(&text),
            Segment::Link { label, uuid } => {
                out.push_str(&style(label).cyan().underlined().to_string());
                if let Some(index) = citations.iter().position(|c| c.uuid == uuid) {
                    out.push_str(&style(format!("[{}]", index + 1)).dim().to_string());
                }
            }
        }
    }
    println!("{}", out);
}

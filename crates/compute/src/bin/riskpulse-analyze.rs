//! riskpulse-analyze: one analysis tick over a file of classified events.
//!
//! Reads JSON-lines `RawClassifiedEvent`s and an optional JSON array of prior
//! stability snapshots, then prints a JSON report to stdout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use riskpulse_compute::pipeline::indicators::{Insights, NationalIndicators, SectorStatus};
use riskpulse_compute::pipeline::scoring::{BandCounts, RejectedEvent};
use riskpulse_compute::{Pipeline, TrendCluster};
use riskpulse_core::collaborator::ensure_ascending;
use riskpulse_core::config::load_dotenv;
use riskpulse_core::{Config, ForecastResult, RawClassifiedEvent, ScoredEvent, StabilitySnapshot};
use riskpulse_rules::{AnalyticsRules, LoadStatus};

// ── CLI ─────────────────────────────────────────────────────────────

/// Score, aggregate, forecast and cluster a batch of classified events.
#[derive(Parser, Debug)]
#[command(name = "riskpulse-analyze", version, about)]
struct Cli {
    /// JSON-lines file with one classified event per line.
    events: PathBuf,

    /// JSON array of earlier stability snapshots.
    #[arg(long)]
    history: Option<PathBuf>,

    /// Directory of YAML rule documents (defaults to RULES_DIR).
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Analysis time, RFC 3339. Defaults to the newest event time.
    #[arg(long)]
    as_of: Option<String>,

    /// Sector for the dashboard section (defaults to DEFAULT_SECTOR).
    #[arg(long)]
    sector: Option<String>,

    /// Pretty-print the report.
    #[arg(long, env = "RISKPULSE_PRETTY", default_value_t = false)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report {
    as_of: DateTime<Utc>,
    snapshot: StabilitySnapshot,
    forecast: Option<ForecastResult>,
    risk_forecast: Option<ForecastResult>,
    themes: Vec<TrendCluster>,
    sector: String,
    indicators: NationalIndicators,
    bands: BandCounts,
    sector_status: Vec<SectorStatus>,
    insights: Insights,
    upcoming: Vec<ScoredEvent>,
    mappable: usize,
    rejected: Vec<RejectedEvent>,
}

fn read_events(path: &Path) -> anyhow::Result<Vec<RawClassifiedEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading events from {}", path.display()))?;
    let mut events = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid event", path.display(), line_no + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn read_history(path: &Path, limit: usize) -> anyhow::Result<Vec<StabilitySnapshot>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading history from {}", path.display()))?;
    let history: Vec<StabilitySnapshot> = serde_json::from_str(&content)
        .with_context(|| format!("parsing history in {}", path.display()))?;
    let mut history = ensure_ascending(history);
    if history.len() > limit {
        history.drain(..history.len() - limit);
    }
    Ok(history)
}

fn load_rules(dir: &Path) -> anyhow::Result<AnalyticsRules> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "rules directory missing, using built-in defaults");
        return Ok(AnalyticsRules::default());
    }
    let (rules, results) = AnalyticsRules::load(dir)
        .with_context(|| format!("loading rules from {}", dir.display()))?;
    for result in &results {
        match &result.status {
            LoadStatus::Loaded { rule_id } => info!(rule_id = %rule_id, "rule loaded"),
            LoadStatus::Skipped { reason } => {
                info!(path = %result.path.display(), reason = %reason, "rule file skipped")
            }
            LoadStatus::Failed { error } => {
                warn!(path = %result.path.display(), error = %error, "rule file failed")
            }
        }
    }
    Ok(rules)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let rules_dir = cli.rules_dir.clone().unwrap_or_else(|| config.rules.dir.clone());
    let rules = load_rules(&rules_dir)?;

    let events = read_events(&cli.events)?;
    let history = match &cli.history {
        Some(path) => read_history(path, config.analysis.history_limit)?,
        None => Vec::new(),
    };

    let as_of = match &cli.as_of {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --as-of '{raw}'"))?
            .with_timezone(&Utc),
        None => match events.iter().map(|e| e.timestamp).max() {
            Some(latest) => latest,
            None => bail!("no events in {} and no --as-of given", cli.events.display()),
        },
    };
    let sector = cli
        .sector
        .clone()
        .unwrap_or_else(|| config.analysis.default_sector.clone());

    info!(
        events = events.len(),
        history = history.len(),
        %as_of,
        sector = %sector,
        "analysis starting"
    );

    let mut pipeline = Pipeline::new(rules);
    let tick = pipeline.tick(&events, &history, as_of);
    let themes = pipeline
        .themes(&tick.scored)
        .context("theme detection failed")?;
    let dashboard = pipeline.dashboard(&tick.scored, as_of, &sector);

    let report = Report {
        as_of,
        snapshot: tick.snapshot,
        forecast: tick.forecast,
        risk_forecast: tick.risk_forecast,
        themes,
        sector: dashboard.sector,
        indicators: dashboard.indicators,
        bands: dashboard.bands,
        sector_status: dashboard.sector_status,
        insights: dashboard.insights,
        upcoming: dashboard.upcoming,
        mappable: dashboard.mappable.len(),
        rejected: tick.rejected,
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    info!(
        ticks = pipeline.metrics.ticks,
        scored = pipeline.metrics.events_scored,
        rejected = pipeline.metrics.events_rejected,
        duration_us = pipeline.metrics.last_tick_duration_us,
        avg_tick_us = pipeline.metrics.avg_tick_us(),
        "analysis complete"
    );
    Ok(())
}

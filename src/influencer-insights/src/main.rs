//! Influencer Insights — campaign ROAS reporting over the influencer,
//! post, tracking and payout tables.
//!
//! `generate` writes a synthetic dataset; `report` runs the
//! load → filter → aggregate pipeline and prints or exports the result.

use anyhow::bail;
use clap::{Parser, Subcommand};
use insights_core::types::{Category, InfluencerType, Platform};
use insights_core::AppConfig;
use insights_dataset::store::{self, DatasetStore, TableOverrides};
use insights_reporting::{FilterOptions, FilterSelection, ReportEngine, ReportSection};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "influencer-insights")]
#[command(about = "Influencer campaign ROAS reporting")]
#[command(version)]
struct Cli {
    /// Data directory holding the default CSVs (overrides config)
    #[arg(long, env = "INFLUENCER_INSIGHTS__DATA_DIR")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the four synthetic CSVs into the data directory
    Generate {
        /// RNG seed (overrides config)
        #[arg(long, env = "INFLUENCER_INSIGHTS__GENERATOR__SEED")]
        seed: Option<u64>,

        /// Number of influencers to generate (overrides config)
        #[arg(long)]
        influencers: Option<usize>,

        /// Number of posts to generate (overrides config)
        #[arg(long)]
        posts: Option<usize>,

        /// Number of tracking events to generate (overrides config)
        #[arg(long)]
        events: Option<usize>,
    },
    /// Compute the campaign report and print or export it
    Report {
        /// CSV file replacing the default influencers table
        #[arg(long)]
        influencers_file: Option<PathBuf>,

        /// CSV file replacing the default posts table
        #[arg(long)]
        posts_file: Option<PathBuf>,

        /// CSV file replacing the default tracking table
        #[arg(long)]
        tracking_file: Option<PathBuf>,

        /// CSV file replacing the default payouts table
        #[arg(long)]
        payouts_file: Option<PathBuf>,

        /// Restrict to these platforms (repeatable)
        #[arg(long = "platform")]
        platforms: Vec<String>,

        /// Restrict to these categories (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Restrict to these products (repeatable)
        #[arg(long = "product")]
        products: Vec<String>,

        /// Restrict to these influencer tiers (repeatable)
        #[arg(long = "influencer-type")]
        influencer_types: Vec<String>,

        /// Output format: text, json, or csv
        #[arg(long, default_value = "text")]
        format: String,

        /// CSV section to export: leaderboard, underperformers,
        /// personas, or engagement
        #[arg(long, default_value = "leaderboard")]
        section: String,

        /// Write the output to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "influencer_insights=info,insights=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Command::Generate {
            seed,
            influencers,
            posts,
            events,
        } => {
            if let Some(seed) = seed {
                config.generator.seed = seed;
            }
            if let Some(influencers) = influencers {
                config.generator.influencers = influencers;
            }
            if let Some(posts) = posts {
                config.generator.posts = posts;
            }
            if let Some(events) = events {
                config.generator.tracking_events = events;
            }

            let tables = insights_dataset::generate(&config.generator);
            store::write_to_dir(&tables, Path::new(&config.data_dir))?;
            info!(dir = %config.data_dir, "synthetic dataset ready");
        }
        Command::Report {
            influencers_file,
            posts_file,
            tracking_file,
            payouts_file,
            platforms,
            categories,
            products,
            influencer_types,
            format,
            section,
            out,
        } => {
            let dataset = DatasetStore::open(&config)?;
            let overrides = TableOverrides::from_paths(
                influencers_file.as_deref(),
                posts_file.as_deref(),
                tracking_file.as_deref(),
                payouts_file.as_deref(),
            )?;
            let tables = dataset.resolve(&overrides)?;

            let options = FilterOptions::from_tables(&tables);
            let mut selection = FilterSelection::all(&options);
            if !platforms.is_empty() {
                selection.platforms = parse_set::<Platform>(&platforms)?;
            }
            if !categories.is_empty() {
                selection.categories = parse_set::<Category>(&categories)?;
            }
            if !products.is_empty() {
                selection.products = products.into_iter().collect();
            }
            if !influencer_types.is_empty() {
                selection.influencer_types = parse_set::<InfluencerType>(&influencer_types)?;
            }

            let engine = ReportEngine::new(config.report.clone());
            let report = engine.build(&tables, &selection);

            let output = match format.as_str() {
                "text" => engine.render_text(&report),
                "json" => engine.export_json(&report)?,
                "csv" => {
                    let section: ReportSection = section.parse()?;
                    engine.export_csv(&report, section)
                }
                other => bail!("unknown output format {other:?} (expected text, json, or csv)"),
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, output)?;
                    info!(path = %path.display(), "report written");
                }
                None => print!("{output}"),
            }
        }
    }

    Ok(())
}

fn parse_set<T>(values: &[String]) -> anyhow::Result<BTreeSet<T>>
where
    T: FromStr + Ord,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    values
        .iter()
        .map(|v| v.parse::<T>().map_err(Into::into))
        .collect()
}

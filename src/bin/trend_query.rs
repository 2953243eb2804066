//! Headless access to the name-trend filter.
//!
//! ```text
//! trend_query nat2022.csv filter --start 1980 --end 2020 --window 3 --threshold 50
//! trend_query nat2022.csv series LÉA CAMILLE --category girl
//! trend_query nat2022.csv search LÉ
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use name_trends::config::Config;
use name_trends::data::cache::DatasetCache;
use name_trends::data::filter::{filter, FilterCriteria, NameTrend, ZeroBaselinePolicy};
use name_trends::data::model::{Category, Series};
use name_trends::data::sample::Xoshiro256;
use serde::Serialize;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Query first-name birth statistics from the command line.
#[derive(Parser)]
#[command(name = "trend_query")]
struct Cli {
    /// Dataset path (falls back to `data.path` from the config).
    file: Option<PathBuf>,

    /// Configuration file (default: ~/.config/name-trends/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List names passing the reference-year bound and growth threshold.
    Filter(FilterArgs),

    /// Print per-year counts for the given names.
    Series {
        names: Vec<String>,
        #[arg(long, default_value = "any")]
        category: Category,
    },

    /// List names starting with a prefix.
    Search {
        prefix: String,
        #[arg(long, default_value = "any")]
        category: Category,
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Every flag overrides the matching `[filter]` config value.
#[derive(clap::Args)]
struct FilterArgs {
    #[arg(long)]
    category: Option<Category>,
    /// Reference year (default: latest year in the dataset).
    #[arg(long)]
    reference_year: Option<u32>,
    #[arg(long)]
    min: Option<u64>,
    #[arg(long)]
    max: Option<u64>,
    /// Start year A.
    #[arg(long)]
    start: Option<u32>,
    /// End year B.
    #[arg(long)]
    end: Option<u32>,
    /// Smoothing window X in years.
    #[arg(long)]
    window: Option<u32>,
    /// Minimum growth in percent.
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f64>,
    /// Require a birth in each of the last N years.
    #[arg(long)]
    recent: Option<u32>,
    #[arg(long, value_parser = parse_policy)]
    zero_baseline: Option<ZeroBaselinePolicy>,
    /// Show a random subset of at most K names (0 shows all).
    #[arg(long)]
    sample: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_policy(s: &str) -> Result<ZeroBaselinePolicy, String> {
    match s {
        "as-zero" | "zero" => Ok(ZeroBaselinePolicy::AsZero),
        "exclude" => Ok(ZeroBaselinePolicy::Exclude),
        "unbounded" | "infinite" => Ok(ZeroBaselinePolicy::Unbounded),
        other => Err(format!("unknown policy '{other}' (as-zero, exclude, unbounded)")),
    }
}

impl FilterArgs {
    fn apply(&self, base: &FilterCriteria) -> FilterCriteria {
        FilterCriteria {
            category: self.category.unwrap_or(base.category),
            reference_year: self.reference_year.or(base.reference_year),
            min_count: self.min.unwrap_or(base.min_count),
            max_count: self.max.unwrap_or(base.max_count),
            start_year: self.start.unwrap_or(base.start_year),
            end_year: self.end.unwrap_or(base.end_year),
            window: self.window.unwrap_or(base.window),
            growth_threshold: self.threshold.unwrap_or(base.growth_threshold),
            recent_activity_years: self.recent.or(base.recent_activity_years),
            zero_baseline: self.zero_baseline.unwrap_or(base.zero_baseline),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FilterOutput<'a> {
    criteria: &'a FilterCriteria,
    reference_year: Option<u32>,
    matched: usize,
    shown: Vec<NameTrend>,
}

#[derive(Serialize)]
struct NamedSeries {
    label: String,
    category: Category,
    series: Series,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let path = cli
        .file
        .clone()
        .or_else(|| config.data.path.clone())
        .context("no dataset given (pass a file or set data.path in the config)")?;

    let mut cache = DatasetCache::new(config.data.load_options()?);
    let dataset = cache
        .get_or_load(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Filter(args) => {
            let criteria = args.apply(&config.filter);
            let result = filter(&dataset, &criteria)?;

            let cap = args.sample.unwrap_or(config.display.sample_cap);
            let mut rng = match args.seed.or(config.display.seed) {
                Some(seed) => Xoshiro256::seeded(seed),
                None => Xoshiro256::from_entropy(),
            };
            let shown = result.display_sample(cap, &mut rng);

            if cli.json {
                let output = FilterOutput {
                    criteria: &criteria,
                    reference_year: result.reference_year,
                    matched: result.len(),
                    shown,
                };
                serde_json::to_writer_pretty(&mut out, &output)?;
                writeln!(out)?;
            } else if result.is_empty() {
                writeln!(out, "No name matches these criteria.")?;
            } else {
                writeln!(
                    out,
                    "{} names match (reference year {}), showing {}:",
                    result.len(),
                    result.reference_year.map(|y| y.to_string()).unwrap_or_default(),
                    shown.len()
                )?;
                for trend in &shown {
                    let current = result
                        .reference_year
                        .and_then(|y| trend.series.count_at(y))
                        .unwrap_or(0);
                    writeln!(
                        out,
                        "  {:<24} {:>+10.1} %  {:>8}",
                        trend.label, trend.growth, current
                    )?;
                }
            }
        }

        Commands::Series { names, category } => {
            let found: Vec<NamedSeries> = names
                .iter()
                .filter_map(|name| {
                    let series = dataset.series(name, *category);
                    if series.is_none() {
                        log::warn!("no data for {name} ({category})");
                    }
                    Some(NamedSeries {
                        label: name.clone(),
                        category: *category,
                        series: series?,
                    })
                })
                .collect();

            if cli.json {
                serde_json::to_writer_pretty(&mut out, &found)?;
                writeln!(out)?;
            } else {
                for named in &found {
                    match named.series.peak() {
                        Some(peak) => writeln!(
                            out,
                            "{} ({}), peak {} in {}",
                            named.label, named.category, peak.count, peak.year
                        )?,
                        None => writeln!(out, "{} ({})", named.label, named.category)?,
                    }
                    for p in named.series.iter() {
                        writeln!(out, "  {}  {:>8}", p.year, p.count)?;
                    }
                }
            }
        }

        Commands::Search {
            prefix,
            category,
            limit,
        } => {
            let limit = limit.unwrap_or(config.display.search_limit);
            let hits = dataset.search(prefix, *category, limit);
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &hits)?;
                writeln!(out)?;
            } else {
                for hit in &hits {
                    writeln!(out, "{hit}")?;
                }
            }
        }
    }

    Ok(())
}

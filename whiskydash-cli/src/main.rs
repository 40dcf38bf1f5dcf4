//! Whiskydash CLI: load WhiskyHunter auction data and print dashboard views.
//!
//! Commands:
//! - `directory`: the distillery directory
//! - `dataset`: combined auction series for the top-N distilleries
//! - `overview`: directory and market headline numbers
//! - `rankings`: top distilleries by rating, mean price and trading volume
//! - `distillery`: one distillery's info and series
//! - `compare`: summary statistics side by side
//!
//! Logs go to stderr; tables go to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use whiskydash_core::data::{
    build_dataset, FetchOutcome, HttpTransport, TracingProgress, WhiskyHunterClient,
};
use whiskydash_core::domain::{DistilleryInfo, MarketObservation};
use whiskydash_runner::{
    compare, distillery_series, market_overview, overview, rankings, ColumnStats, DatasetLoader,
    DirectoryColumn, LoaderConfig, RankingEntry, DEFAULT_RANKING_LIMIT,
};

#[derive(Parser)]
#[command(name = "whiskydash", about = "Whisky auction market dashboard data loader")]
struct Cli {
    /// Path to a TOML loader config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API root (e.g. http://localhost:8000/api).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the distillery directory.
    Directory,
    /// Build and print the combined dataset; the build report goes to stderr.
    Dataset {
        /// Number of highest-rated distilleries to fetch.
        #[arg(long)]
        top_n: Option<usize>,

        /// Pause between series requests, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Directory and market overview.
    Overview {
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Top distilleries by rating, mean price and total volume.
    Rankings {
        #[arg(long)]
        top_n: Option<usize>,

        /// Entries per ranking.
        #[arg(long, default_value_t = DEFAULT_RANKING_LIMIT)]
        limit: usize,
    },
    /// One distillery's directory entry and auction series.
    Distillery {
        slug: String,

        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Compare price, volume and lot statistics across distilleries.
    Compare {
        #[arg(required = true)]
        slugs: Vec<String>,

        #[arg(long)]
        top_n: Option<usize>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }

    match cli.command {
        Commands::Directory => run_directory(&config, cli.format),
        Commands::Dataset { top_n, delay_ms } => {
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(ms) = delay_ms {
                config.request_delay_ms = ms;
            }
            run_dataset(&config, cli.format)
        }
        Commands::Overview { top_n } => run_overview(&with_top_n(config, top_n), cli.format),
        Commands::Rankings { top_n, limit } => {
            run_rankings(&with_top_n(config, top_n), limit, cli.format)
        }
        Commands::Distillery { slug, top_n } => {
            run_distillery(&with_top_n(config, top_n), &slug, cli.format)
        }
        Commands::Compare { slugs, top_n } => {
            run_compare(&with_top_n(config, top_n), &slugs, cli.format)
        }
    }
}

fn with_top_n(mut config: LoaderConfig, top_n: Option<usize>) -> LoaderConfig {
    if let Some(n) = top_n {
        config.top_n = n;
    }
    config
}

fn loader(config: &LoaderConfig) -> Result<DatasetLoader<HttpTransport>> {
    config.validate()?;
    let loader = DatasetLoader::from_config(config)
        .context("failed to build HTTP client")?
        .with_progress(TracingProgress);
    Ok(loader)
}

fn run_directory(config: &LoaderConfig, format: Format) -> Result<()> {
    let loader = loader(config)?;
    let directory = loader.load_directory();
    emit(format, &DIRECTORY_HEADERS, directory.rows(), directory_cells)
}

fn run_dataset(config: &LoaderConfig, format: Format) -> Result<()> {
    config.validate()?;
    let client = WhiskyHunterClient::new(config.http_transport()?, config.base_url.clone());
    let options = config.build_options();

    let build = match build_dataset(&client, &options, &TracingProgress) {
        FetchOutcome::Data(build) => build,
        FetchOutcome::Empty => {
            eprintln!("Directory is empty; nothing to load.");
            return Ok(());
        }
        FetchOutcome::Failed(e) => {
            eprintln!("Directory unavailable: {e}");
            return Ok(());
        }
    };

    let report = &build.report;
    eprintln!(
        "Selected {} distilleries: {} with data, {} empty, {} failed",
        report.selected.len(),
        report.with_data.len(),
        report.empty.len(),
        report.failed.len()
    );
    for (slug, err) in &report.failed {
        eprintln!("  {slug}: {err}");
    }

    emit(format, &SERIES_HEADERS, build.dataset.rows(), series_cells)
}

fn run_overview(config: &LoaderConfig, format: Format) -> Result<()> {
    let loader = loader(config)?;
    let directory = loader.load_directory();
    let dataset = loader.load_dataset(config.top_n)?;

    let o = overview(&directory);
    let m = market_overview(&dataset);

    let mut rows: Vec<(String, String)> = vec![
        ("distilleries".into(), o.distillery_count.to_string()),
        ("mean_rating".into(), opt_f64(o.mean_rating)),
        ("mean_votes".into(), opt_f64(o.mean_votes)),
        ("observations".into(), m.observation_count.to_string()),
        ("distilleries_with_data".into(), m.distilleries_with_data.to_string()),
        ("mean_price".into(), opt_f64(m.mean_price)),
        ("mean_trading_volume".into(), opt_f64(m.mean_trading_volume)),
    ];
    for column in DirectoryColumn::ALL {
        if let Some(stats) = column.describe(&directory) {
            rows.push((format!("{}_median", column.name()), fmt_f64(stats.median)));
        }
    }
    for (country, count) in &o.countries {
        rows.push((format!("country:{country}"), count.to_string()));
    }

    if format == Format::Json {
        let json = serde_json::json!({ "directory": o, "market": m });
        return print_json(&json);
    }
    emit(format, &["metric", "value"], &rows, |(k, v)| vec![k.clone(), v.clone()])
}

fn run_rankings(config: &LoaderConfig, limit: usize, format: Format) -> Result<()> {
    let loader = loader(config)?;
    let directory = loader.load_directory();
    let dataset = loader.load_dataset(config.top_n)?;
    let r = rankings(&directory, &dataset, limit);

    if format == Format::Json {
        return print_json(&r);
    }

    let rows: Vec<(&str, &RankingEntry)> = r
        .by_rating
        .iter()
        .map(|e| ("rating", e))
        .chain(r.by_mean_price.iter().map(|e| ("mean_price", e)))
        .chain(r.by_total_volume.iter().map(|e| ("total_volume", e)))
        .collect();
    emit(
        format,
        &["ranking", "rank", "slug", "name", "value"],
        &rows,
        |(kind, e)| {
            vec![
                kind.to_string(),
                e.rank.to_string(),
                e.slug.clone(),
                e.name.clone(),
                fmt_f64(e.value),
            ]
        },
    )
}

fn run_distillery(config: &LoaderConfig, slug: &str, format: Format) -> Result<()> {
    let loader = loader(config)?;
    let directory = loader.load_directory();
    let dataset = loader.load_dataset(config.top_n)?;

    if let Some(info) = directory.get(slug) {
        eprintln!(
            "{} ({}) rating {} from {} votes",
            info.display_name(),
            info.country.as_deref().unwrap_or("unknown country"),
            opt_f64(info.whiskybase_rating),
            opt_u64(info.whiskybase_votes)
        );
    } else {
        eprintln!("'{slug}' is not in the distillery directory.");
    }

    let series: Vec<MarketObservation> = distillery_series(&dataset, slug).into_iter().cloned().collect();
    if series.is_empty() {
        info!(slug, top_n = config.top_n, "no series in the loaded dataset");
    }
    emit(format, &SERIES_HEADERS, &series, series_cells)
}

fn run_compare(config: &LoaderConfig, slugs: &[String], format: Format) -> Result<()> {
    let loader = loader(config)?;
    let directory = loader.load_directory();
    let dataset = loader.load_dataset(config.top_n)?;

    let refs: Vec<&str> = slugs.iter().map(String::as_str).collect();
    let entries = compare(&directory, &dataset, &refs);

    if format == Format::Json {
        return print_json(&entries);
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .flat_map(|e| {
            [
                ("price", e.price),
                ("trading_volume", e.trading_volume),
                ("lots_count", e.lots_count),
            ]
            .into_iter()
            .map(move |(metric, stats)| stats_row(&e.slug, &e.name, metric, stats))
        })
        .collect();
    emit(
        format,
        &["slug", "name", "metric", "count", "mean", "std", "min", "median", "max"],
        &rows,
        |r| r.clone(),
    )
}

fn stats_row(slug: &str, name: &str, metric: &str, stats: Option<ColumnStats>) -> Vec<String> {
    let mut row = vec![slug.to_string(), name.to_string(), metric.to_string()];
    match stats {
        Some(s) => row.extend([
            s.count.to_string(),
            fmt_f64(s.mean),
            opt_f64(s.std),
            fmt_f64(s.min),
            fmt_f64(s.median),
            fmt_f64(s.max),
        ]),
        None => {
            row.push("0".into());
            row.extend(std::iter::repeat(String::new()).take(5));
        }
    }
    row
}

// ── Rendering ────────────────────────────────────────────────────────

const DIRECTORY_HEADERS: [&str; 6] = [
    "slug",
    "name",
    "country",
    "whiskybase_rating",
    "whiskybase_votes",
    "whiskybase_whiskies",
];

const SERIES_HEADERS: [&str; 8] = [
    "dt",
    "slug",
    "name",
    "winning_bid_mean",
    "winning_bid_min",
    "winning_bid_max",
    "trading_volume",
    "lots_count",
];

fn directory_cells(d: &DistilleryInfo) -> Vec<String> {
    vec![
        d.slug.clone(),
        d.name.clone(),
        d.country.clone().unwrap_or_default(),
        opt_f64(d.whiskybase_rating),
        opt_u64(d.whiskybase_votes),
        opt_u64(d.whiskybase_whiskies),
    ]
}

fn series_cells(o: &MarketObservation) -> Vec<String> {
    vec![
        o.dt.map(|d| d.to_string()).unwrap_or_default(),
        o.slug.clone(),
        o.name.clone().unwrap_or_default(),
        opt_f64(o.winning_bid_mean),
        opt_f64(o.winning_bid_min),
        opt_f64(o.winning_bid_max),
        opt_f64(o.trading_volume),
        opt_u64(o.lots_count),
    ]
}

fn fmt_f64(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn opt_f64(v: Option<f64>) -> String {
    v.map(fmt_f64).unwrap_or_default()
}

fn opt_u64(v: Option<u64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

fn print_json<S: serde::Serialize + ?Sized>(value: &S) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Print `rows` in `format`. JSON goes through the rows' own `Serialize`;
/// table and CSV go through `cells`.
fn emit<R: serde::Serialize>(
    format: Format,
    headers: &[&str],
    rows: &[R],
    cells: impl Fn(&R) -> Vec<String>,
) -> Result<()> {
    if rows.is_empty() {
        eprintln!("No data to show.");
        return Ok(());
    }

    match format {
        Format::Json => print_json(rows),
        Format::Csv => {
            let mut w = csv::Writer::from_writer(std::io::stdout());
            w.write_record(headers)?;
            for row in rows {
                w.write_record(cells(row))?;
            }
            w.flush()?;
            Ok(())
        }
        Format::Table => {
            let body: Vec<Vec<String>> = rows.iter().map(&cells).collect();
            let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
            for row in &body {
                for (w, cell) in widths.iter_mut().zip(row) {
                    *w = (*w).max(cell.chars().count());
                }
            }

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let line = |cols: Vec<&str>| -> String {
                cols.iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{c:<width$}", width = *w))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            };
            writeln!(out, "{}", line(headers.to_vec()))?;
            writeln!(out, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)))?;
            for row in &body {
                writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
            }
            Ok(())
        }
    }
}

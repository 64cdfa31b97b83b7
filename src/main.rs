//! PLACES Report - command line front end
//!
//! Downloads (or reads) the CDC PLACES county export, applies the selection
//! flags and prints lists, summaries, rankings or a Markdown report.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use places_report::config::Settings;
use places_report::data::{
    DataProcessor, Dataset, DatasetCache, Fetch, FileFetcher, HttpFetcher, Selection,
};
use places_report::report::{self, ExportError, RankTable, ReportRequest};
use places_report::stats::{StatsCalculator, CONFIDENCE_LEVEL};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "places_report",
    version,
    about = "Filter CDC PLACES county data and export ranked Markdown reports"
)]
struct Cli {
    /// Read a local CSV export instead of downloading
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Settings file (defaults to ./places.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    selection: SelectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct SelectionArgs {
    /// State abbreviation (defaults to the configured state, else the first one)
    #[arg(long, global = true)]
    state: Option<String>,

    /// Measure name (defaults to the first measure)
    #[arg(long, global = true)]
    measure: Option<String>,

    #[arg(long, global = true)]
    year: Option<i64>,

    #[arg(long, global = true)]
    county: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available states
    States,
    /// List available measures
    Measures,
    /// List years for the selected state and measure
    Years,
    /// List counties for the selected state, measure and year
    Counties,
    /// Average, median, spread and count for the selection
    Summary,
    /// Print the top/bottom tables
    Rank {
        #[arg(long)]
        top: Option<usize>,
        /// Emit JSON instead of Markdown tables
        #[arg(long)]
        json: bool,
    },
    /// Year/value series for the selected county
    Trend,
    /// Generate the Markdown report and save it
    Report {
        /// Interpretation text for the notes section
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        top: Option<usize>,
        /// Directory to write into (overrides reports_dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Also print the report to stdout
        #[arg(long)]
        stdout: bool,
        /// Open the saved file with the system default application
        #[arg(long)]
        open: bool,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    debug!(?settings, "settings loaded");

    match &cli.csv {
        Some(path) => run(&cli, &settings, FileFetcher::new(path)),
        None => {
            let fetcher =
                HttpFetcher::new(settings.source_url.clone()).context("building HTTP client")?;
            run(&cli, &settings, fetcher)
        }
    }
}

fn run<F: Fetch>(cli: &Cli, settings: &Settings, fetcher: F) -> Result<()> {
    let mut cache = DatasetCache::new(fetcher)
        .expiry(settings.expiry())
        .load_options(settings.load_options());
    let dataset = cache.get().context("loading PLACES dataset")?;

    let selection = resolve_selection(&dataset, &cli.selection, settings);
    info!(
        state = selection.state.as_deref().unwrap_or("-"),
        measure = selection.measure.as_deref().unwrap_or("-"),
        year = ?selection.year,
        county = selection.county.as_deref().unwrap_or("-"),
        "selection"
    );

    // Rankings ignore the county filter; it only narrows summaries and trends.
    let ranking_selection = Selection {
        county: None,
        ..selection.clone()
    };

    match &cli.command {
        Command::States => print_lines(DataProcessor::available_states(&dataset)),
        Command::Measures => print_lines(DataProcessor::available_measures(&dataset)),
        Command::Years => {
            let view = DataProcessor::filter(
                &dataset,
                &Selection {
                    year: None,
                    ..ranking_selection
                },
            )?;
            print_lines(DataProcessor::available_years(&view));
        }
        Command::Counties => {
            let view = DataProcessor::filter(&dataset, &ranking_selection)?;
            print_lines(DataProcessor::available_counties(&view));
        }
        Command::Summary => {
            let view = DataProcessor::filter(&dataset, &selection)?;
            print_summary(&view, settings);
        }
        Command::Rank { top, json } => {
            let view = DataProcessor::filter(&dataset, &ranking_selection)?;
            let n = top.unwrap_or(settings.top_n);
            if !DataProcessor::can_rank(&view, &settings.group_column, &settings.value_column) {
                warn!("{}", ExportError::InsufficientData);
                return Ok(());
            }
            let ranking = report::rank(&view, &settings.group_column, &settings.value_column, n)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&ranking)?);
            } else {
                print_table(&format!("Top {}", n), &ranking.top, settings.precision);
                print_table(&format!("Bottom {}", n), &ranking.bottom, settings.precision);
            }
        }
        Command::Trend => {
            let Some(county) = &selection.county else {
                bail!("trend needs --county");
            };
            let view = DataProcessor::filter(&dataset, &selection)?;
            let points = DataProcessor::trend(&view, "year", &settings.value_column)?;
            if points.is_empty() {
                println!("No yearly values available for {}.", county);
            }
            for p in points {
                println!("{}\t{:.*}", p.x, settings.precision, p.y);
            }
        }
        Command::Report {
            notes,
            top,
            out_dir,
            stdout,
            open: open_file,
        } => {
            let view = DataProcessor::filter(&dataset, &ranking_selection)?;
            let request = ReportRequest {
                state: selection.state.clone().unwrap_or_default(),
                measure: selection.measure.clone().unwrap_or_default(),
                year: selection.year,
                notes: notes.clone(),
                group_col: settings.group_column.clone(),
                value_col: settings.value_column.clone(),
                top_n: top.unwrap_or(settings.top_n),
                precision: settings.precision,
            };

            let generated_at = chrono::Local::now().naive_local();
            let doc = match report::build_report(&view, &request, generated_at) {
                Ok(doc) => doc,
                Err(ExportError::InsufficientData) => {
                    warn!("{}", ExportError::InsufficientData);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let dir = out_dir.as_ref().unwrap_or(&settings.reports_dir);
            let path = report::save_report(&doc, dir)?;
            println!("Saved: {}", path.display());

            if *stdout {
                print!("{}", doc.render());
            }
            if *open_file {
                open::that(&path).with_context(|| format!("opening {}", path.display()))?;
            }
        }
    }

    Ok(())
}

/// Fill unset state/measure the way the dashboard preselects them.
fn resolve_selection(dataset: &Dataset, args: &SelectionArgs, settings: &Settings) -> Selection {
    let state = args.state.clone().or_else(|| {
        let states = DataProcessor::available_states(dataset);
        if states.contains(&settings.default_state) {
            Some(settings.default_state.clone())
        } else {
            states.into_iter().next()
        }
    });
    let measure = args
        .measure
        .clone()
        .or_else(|| DataProcessor::available_measures(dataset).into_iter().next());

    Selection {
        state,
        measure,
        year: args.year,
        county: args.county.clone(),
    }
}

fn print_lines<T: std::fmt::Display>(items: Vec<T>) {
    for item in items {
        println!("{}", item);
    }
}

fn print_summary(view: &Dataset, settings: &Settings) {
    let Some(s) = StatsCalculator::summarize(view, &settings.value_column) else {
        println!("No numeric values available for this selection.");
        return;
    };

    let p = settings.precision;
    println!("Count   {}", s.count);
    println!("Average {:.*}", p, s.mean);
    println!("Median  {:.*}", p, s.median);
    println!("Std dev {:.*}", p, s.std);
    println!("Min     {:.*}", p, s.min);
    println!("Max     {:.*}", p, s.max);
    println!("P05     {:.*}", p, s.p05);
    println!("P95     {:.*}", p, s.p95);
    if let Some((lo, hi)) = s.mean_ci {
        println!(
            "{:.0}% CI  {:.*} .. {:.*}",
            CONFIDENCE_LEVEL * 100.0,
            p,
            lo,
            p,
            hi
        );
    }
}

fn print_table(title: &str, table: &RankTable, precision: usize) {
    println!("## {}", title);
    print!("{}", report::markdown_table(table, precision));
    println!();
}

//! Search binary entry point.
//!
//! This binary provides a command-line interface over the conference abstract
//! index. It supports keyword search, nearest-neighbour lookup by abstract
//! number, and an interactive REPL, with table or JSON output.
//!
//! # Examples
//!
//! Keyword search:
//! ```bash
//! search --root /srv/rheumai --query "gout"
//! ```
//!
//! Similar abstracts as JSON:
//! ```bash
//! search --similar 0142 --format json
//! ```
//!
//! Interactive mode:
//! ```bash
//! search --interactive
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use rheumai_site::{
    ingestion::load_conference,
    models::{Abstract, RelevanceLevel, SimilarAbstract},
    query::{AbstractIndex, KeywordQuery, ResultLimit, DEFAULT_SIMILAR_COUNT},
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for results
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table with colored relevance levels
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Search binary CLI for querying the abstract index
#[derive(Parser, Debug)]
#[command(
    name = "search",
    version,
    about = "Search conference abstracts by keyword or find similar abstracts",
    long_about = "Query the conference abstract index from the command line. Supports keyword \
                  search, similar-abstract lookup and an interactive mode.

EXAMPLES:
  Keyword search:
    search --query \"urate lowering\"

  Every match, as JSON:
    search --query \"lupus\" --limit all --format json

  Ten nearest neighbours of an abstract:
    search --similar 0142 --top-k 10

  Interactive mode:
    search --interactive"
)]
struct Args {
    /// Content root holding the conference data directory
    #[arg(long, env = "RHEUMAI_CONTENT_ROOT", default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// Conference data directory, relative to the content root
    #[arg(long, env = "RHEUMAI_CONFERENCE_DATA", default_value = "data/acr/2024", value_name = "PATH")]
    data_path: String,

    /// Keyword query
    #[arg(long, value_name = "TEXT", conflicts_with_all = ["interactive", "similar"])]
    query: Option<String>,

    /// Abstract number to find neighbours for
    #[arg(long, value_name = "NUMBER", conflicts_with = "interactive")]
    similar: Option<String>,

    /// Keyword results to show: a number or "all"
    #[arg(long, value_name = "N|all", default_value = "10")]
    limit: ResultLimit,

    /// Number of similar abstracts to return
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SIMILAR_COUNT)]
    top_k: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Results of the last command, kept for `/detail`
enum Results {
    Keyword(Vec<Abstract>),
    Similar(Vec<SimilarAbstract>),
}

impl Results {
    fn len(&self) -> usize {
        match self {
            Results::Keyword(r) => r.len(),
            Results::Similar(r) => r.len(),
        }
    }

    fn record(&self, rank: usize) -> Option<(&Abstract, Option<&SimilarAbstract>)> {
        match self {
            Results::Keyword(r) => r.get(rank - 1).map(|a| (a, None)),
            Results::Similar(r) => r.get(rank - 1).map(|s| (&s.record, Some(s))),
        }
    }
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

/// Truncate on a character boundary for table display
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format keyword matches as a table
fn format_keyword_table(results: &[Abstract], total: usize) -> String {
    if results.is_empty() {
        return "No matching abstracts found.".to_string();
    }

    let mut table = new_table();
    table.set_header(header(&["Rank", "Number", "Title", "Topic"]));
    for (idx, record) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&record.abstract_number),
            Cell::new(truncate(&record.title, 70)),
            Cell::new(truncate(&record.topic, 30)),
        ]);
    }

    format!("{}\nShowing {} of {} matching abstracts", table, results.len(), total)
}

/// Format similar abstracts as a table
fn format_similar_table(results: &[SimilarAbstract]) -> String {
    if results.is_empty() {
        return "No similar abstracts found.".to_string();
    }

    let mut table = new_table();
    table.set_header(header(&["Rank", "Number", "Title", "Relevance", "Score"]));
    for (idx, result) in results.iter().enumerate() {
        // Color-code relevance
        let color = match result.relevance {
            RelevanceLevel::Identical => Color::Green,
            RelevanceLevel::HighlySimilar => Color::Cyan,
            RelevanceLevel::Similar => Color::Yellow,
            RelevanceLevel::Relevant => Color::White,
        };

        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&result.record.abstract_number),
            Cell::new(truncate(&result.record.title, 60)),
            Cell::new(result.relevance.label()).fg(color),
            Cell::new(format!("{:.4}", result.score)),
        ]);
    }

    table.to_string()
}

fn print_results(results: &Results, total: usize, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => match results {
            Results::Keyword(r) => println!("{}", format_keyword_table(r, total)),
            Results::Similar(r) => println!("{}", format_similar_table(r)),
        },
        OutputFormat::Json => {
            let json = match results {
                Results::Keyword(r) => serde_json::to_string_pretty(r),
                Results::Similar(r) => serde_json::to_string_pretty(r),
            }
            .with_context(|| "Failed to serialize results to JSON")?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Run a keyword search and return owned matches plus the total count
fn keyword(index: &AbstractIndex, text: &str, limit: ResultLimit) -> Result<(Vec<Abstract>, usize)> {
    debug!("Keyword search for: {}", text);
    let matches = index
        .keyword_search(&KeywordQuery::new(text, limit))
        .with_context(|| format!("Failed to search for '{}'", text))?;
    Ok((matches.shown.into_iter().cloned().collect(), matches.total))
}

fn similar(index: &AbstractIndex, number: &str, top_k: usize) -> Result<Vec<SimilarAbstract>> {
    debug!("Similar lookup for abstract {}", number);
    index
        .similar_to(number, top_k)
        .with_context(|| format!("Failed to find abstracts similar to {}", number))
}

/// Display detailed view of a single result
fn display_result_detail(record: &Abstract, similar: Option<&SimilarAbstract>, rank: usize) {
    println!("\n{}", "═".repeat(80));
    println!("Rank: {}", rank);
    println!("Number: {}", record.abstract_number);
    println!("Title: {}", record.title);
    println!("Topic: {}", record.topic);
    println!("Link: {}", record.link);
    if let Some(s) = similar {
        println!("Relevance: {}", s.relevance);
        println!("Score: {:.4}", s.score);
    }
    println!("\nAbstract:\n{}", record.body);
    println!("{}", "═".repeat(80));
}

fn print_help() {
    println!("Commands:");
    println!("  <query>          - Keyword search");
    println!("  /similar N       - Find abstracts similar to abstract number N");
    println!("  /limit N         - Show the first N keyword matches");
    println!("  /limit all       - Show every keyword match");
    println!("  /format table    - Use table output format");
    println!("  /format json     - Use JSON output format");
    println!("  /detail N        - Show full details for result rank N");
    println!("  /help            - Show this help");
    println!("  Ctrl+D or Ctrl+C - Exit");
}

/// Run interactive REPL mode
fn run_interactive(
    index: &AbstractIndex,
    mut limit: ResultLimit,
    top_k: usize,
    mut format: OutputFormat,
) -> Result<()> {
    println!("Interactive Abstract Search ({} abstracts)", index.len());
    print_help();
    println!();

    let mut rl = DefaultEditor::new().with_context(|| "Failed to create readline editor")?;

    let mut last_results = Results::Keyword(Vec::new());

    loop {
        match rl.readline("Search> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line).ok(); // Ignore errors from adding to history

                if !line.starts_with('/') {
                    let start = Instant::now();
                    match keyword(index, line, limit) {
                        Ok((shown, total)) => {
                            last_results = Results::Keyword(shown);
                            if let Err(e) = print_results(&last_results, total, &format) {
                                eprintln!("{:#}", e);
                            }
                            debug!("Search took {:.3}s", start.elapsed().as_secs_f64());
                        }
                        Err(e) => eprintln!("Search failed: {:#}", e),
                    }
                    continue;
                }

                let parts: Vec<&str> = line.split_whitespace().collect();
                match parts[0] {
                    "/help" => print_help(),
                    "/similar" => {
                        if parts.len() != 2 {
                            eprintln!("Usage: /similar N");
                            continue;
                        }
                        match similar(index, parts[1], top_k) {
                            Ok(results) => {
                                let total = results.len();
                                last_results = Results::Similar(results);
                                if let Err(e) = print_results(&last_results, total, &format) {
                                    eprintln!("{:#}", e);
                                }
                            }
                            Err(e) => eprintln!("{:#}", e),
                        }
                    }
                    "/limit" => {
                        if parts.len() != 2 {
                            eprintln!("Usage: /limit N  or  /limit all");
                            continue;
                        }
                        match parts[1].parse::<ResultLimit>() {
                            Ok(l) => {
                                limit = l;
                                println!("Set result limit to {}", limit);
                            }
                            Err(e) => eprintln!("{}", e),
                        }
                    }
                    "/format" => {
                        if parts.len() != 2 {
                            eprintln!("Usage: /format [table|json]");
                            continue;
                        }
                        match parts[1] {
                            "table" => {
                                format = OutputFormat::Table;
                                println!("Set output format to table");
                            }
                            "json" => {
                                format = OutputFormat::Json;
                                println!("Set output format to JSON");
                            }
                            _ => eprintln!("Invalid format: must be 'table' or 'json'"),
                        }
                    }
                    "/detail" => {
                        if parts.len() != 2 {
                            eprintln!("Usage: /detail N");
                            continue;
                        }
                        match parts[1].parse::<usize>() {
                            Ok(rank) if rank > 0 => match last_results.record(rank) {
                                Some((record, similar)) => {
                                    display_result_detail(record, similar, rank)
                                }
                                None => eprintln!(
                                    "Rank {} out of range (last command had {} results)",
                                    rank,
                                    last_results.len()
                                ),
                            },
                            _ => eprintln!("Invalid rank: must be a positive integer"),
                        }
                    }
                    _ => eprintln!(
                        "Unknown command: {}. Type /help for available commands.",
                        parts[0]
                    ),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level);

    if !args.interactive && args.query.is_none() && args.similar.is_none() {
        anyhow::bail!(
            "One of --query, --similar or --interactive must be specified.\n\
             Use --help for usage information."
        );
    }

    let dir = args.root.join(&args.data_path);
    info!("Loading conference data from: {}", dir.display());

    let (data, stats) = load_conference(&dir)
        .await
        .with_context(|| format!("Failed to load conference data from {}", dir.display()))?;
    if data.index.is_empty() {
        anyhow::bail!("No abstracts found in {}", dir.display());
    }
    info!(
        "Index holds {} abstracts, {} with embeddings",
        stats.total, stats.with_embedding
    );

    if args.interactive {
        return run_interactive(&data.index, args.limit, args.top_k, args.format);
    }

    if let Some(text) = &args.query {
        let (shown, total) = keyword(&data.index, text, args.limit)?;
        print_results(&Results::Keyword(shown), total, &args.format)?;
    } else if let Some(number) = &args.similar {
        let results = similar(&data.index, number, args.top_k)?;
        let total = results.len();
        print_results(&Results::Similar(results), total, &args.format)?;
    }

    Ok(())
}

//! Content check binary entry point.
//!
//! This binary loads everything the site serves (posts, projects, conference
//! abstracts, topic summaries and the embedding matrix) and reports what it
//! found. It exits non-zero when any content file fails to load, so it can
//! gate a deploy.
//!
//! # Examples
//!
//! ```bash
//! check --root /srv/rheumai
//! ```

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rheumai_site::{
    config::{ConferenceConfig, SiteConfig},
    ingestion::{load_conference, IngestionStats},
    storage::{fs::FsContentStore, ContentStore},
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Content check CLI
#[derive(Parser, Debug)]
#[command(
    name = "check",
    version,
    about = "Validate site content and conference data before serving"
)]
struct Args {
    /// Directory holding posts/, static/, media/ and data/
    #[arg(long, env = "RHEUMAI_CONTENT_ROOT", default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// Skip the conference data
    #[arg(long, env = "RHEUMAI_NO_CONFERENCE")]
    no_conference: bool,

    /// Conference data directory, relative to the content root
    #[arg(long, env = "RHEUMAI_CONFERENCE_DATA", default_value = "data/acr/2024", value_name = "PATH")]
    conference_data: String,

    /// Treat abstract/embedding count mismatches as failures
    #[arg(long)]
    strict: bool,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Outcome of a check run.
#[derive(Debug, Default)]
struct CheckReport {
    posts: usize,
    post_failures: usize,
    projects: usize,
    conference: Option<IngestionStats>,
    summaries: usize,
    failures: Vec<String>,
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

/// Create a progress bar for post loading
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    match ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} posts | {msg}")
    {
        Ok(style) => pb.set_style(style),
        Err(e) => debug!("Falling back to default progress style: {}", e),
    }
    pb
}

async fn check_posts(store: &FsContentStore, report: &mut CheckReport) {
    let posts = match store.list_posts().await {
        Ok(posts) => posts,
        Err(e) => {
            report.failures.push(format!("posts: {}", e));
            return;
        }
    };

    let progress = create_progress_bar(posts.len());
    for post in &posts {
        progress.set_message(post.slug.clone());
        match store.load_post(&post.slug).await {
            Ok(content) if content.title.is_empty() => {
                warn!("Post '{}' has an empty title line", post.slug);
                report.posts += 1;
            }
            Ok(_) => report.posts += 1,
            Err(e) => {
                error!("Failed to load post '{}': {}", post.slug, e);
                report.post_failures += 1;
                report.failures.push(format!("post '{}': {}", post.slug, e));
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");
}

async fn check_projects(store: &FsContentStore, report: &mut CheckReport) {
    match store.projects().await {
        Ok(projects) => {
            for project in projects.iter().filter(|p| p.internal_link.is_none()) {
                debug!("Project '{}' has no short link", project.name);
            }
            report.projects = projects.len();
        }
        Err(e) => report.failures.push(format!("projects: {}", e)),
    }
}

async fn check_conference(config: &SiteConfig, strict: bool, report: &mut CheckReport) {
    let Some(dir) = config.conference_dir() else {
        return;
    };

    match load_conference(&dir).await {
        Ok((data, stats)) => {
            if strict && !stats.is_aligned() {
                report.failures.push(format!(
                    "conference: {} abstracts but {} embedding rows",
                    stats.total,
                    stats.with_embedding + stats.surplus_embeddings
                ));
            }
            report.summaries = data.summaries.len();
            report.conference = Some(stats);
        }
        Err(e) => report
            .failures
            .push(format!("conference data in {}: {}", dir.display(), e)),
    }
}

fn print_report(report: &CheckReport, elapsed: std::time::Duration) {
    println!("\n╔════════════════════════════════════════╗");
    println!("║      Content Check                     ║");
    println!("╠════════════════════════════════════════╣");
    println!("║ Posts:                {:>16} ║", report.posts);
    println!("║ Post failures:        {:>16} ║", report.post_failures);
    println!("║ Projects:             {:>16} ║", report.projects);
    if let Some(stats) = &report.conference {
        println!("╠════════════════════════════════════════╣");
        println!("║ Abstracts:            {:>16} ║", stats.total);
        println!("║ With embedding:       {:>16} ║", stats.with_embedding);
        println!("║ Without embedding:    {:>16} ║", stats.without_embedding);
        println!("║ Surplus rows:         {:>16} ║", stats.surplus_embeddings);
        println!("║ Duplicate numbers:    {:>16} ║", stats.duplicate_numbers);
        println!("║ Dimension:            {:>16} ║", stats.dimension);
        println!("║ Topic summaries:      {:>16} ║", report.summaries);
    }
    println!("╠════════════════════════════════════════╣");
    println!("║ Elapsed time:         {:>13.2?} ║", elapsed);
    println!("╚════════════════════════════════════════╝");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let config = SiteConfig {
        conference: (!args.no_conference).then(|| ConferenceConfig {
            data_path: args.conference_data.clone(),
            ..ConferenceConfig::default()
        }),
        ..SiteConfig::with_root(&args.root)
    };
    info!("Checking content under {}", config.content_root.display());

    let start = Instant::now();
    let store = FsContentStore::new(config.posts_dir(), config.projects_path());
    let mut report = CheckReport::default();

    check_posts(&store, &mut report).await;
    check_projects(&store, &mut report).await;
    check_conference(&config, args.strict, &mut report).await;

    print_report(&report, start.elapsed());

    if !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("✗ {}", failure);
        }
        anyhow::bail!("{} content problem(s) found", report.failures.len());
    }

    println!("All content loaded successfully");
    Ok(())
}

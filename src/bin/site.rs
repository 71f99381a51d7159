//! Site server binary entry point.
//!
//! This binary loads the site content and conference data, then serves the
//! site over HTTP until Ctrl-C.
//!
//! # Examples
//!
//! Serve the current directory on the default port:
//! ```bash
//! site
//! ```
//!
//! Serve another content root without the conference explorer:
//! ```bash
//! site --root /srv/rheumai --no-conference --port 8080
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rheumai_site::{
    config::{ConferenceConfig, SiteConfig, SiteIdentity},
    query::DEFAULT_SIMILAR_COUNT,
    server::{self, AppState, ServerConfig},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Site server CLI
#[derive(Parser, Debug)]
#[command(
    name = "site",
    version,
    about = "Serve the personal site, blog and conference abstract explorer"
)]
struct Args {
    /// Directory holding posts/, static/, media/ and data/
    #[arg(long, env = "RHEUMAI_CONTENT_ROOT", default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// Address to bind
    #[arg(long, env = "RHEUMAI_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5001)]
    port: u16,

    /// Maximum number of requests handled at once
    #[arg(long, env = "RHEUMAI_MAX_CONCURRENT", default_value_t = 100)]
    max_concurrent_requests: usize,

    /// Request timeout in seconds
    #[arg(long, env = "RHEUMAI_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Short brand used in page titles
    #[arg(long, env = "RHEUMAI_BRAND", default_value = "RheumAI")]
    brand: String,

    /// Name shown on the home page
    #[arg(long, env = "RHEUMAI_OWNER", default_value = "Dr. Chris McMaster")]
    owner: String,

    /// First line under the name
    #[arg(long, env = "RHEUMAI_TAGLINE", default_value = "Rheumatologist and Data Scientist")]
    tagline: String,

    /// Second line under the name
    #[arg(long, env = "RHEUMAI_MISSION", default_value = "Using AI to improve healthcare")]
    mission: String,

    /// Disable the conference abstract explorer
    #[arg(long, env = "RHEUMAI_NO_CONFERENCE")]
    no_conference: bool,

    /// Conference data directory, relative to the content root
    #[arg(long, env = "RHEUMAI_CONFERENCE_DATA", default_value = "data/acr/2024", value_name = "PATH")]
    conference_data: String,

    /// Number of similar abstracts shown by "find similar"
    #[arg(long, env = "RHEUMAI_SIMILAR_COUNT", default_value_t = DEFAULT_SIMILAR_COUNT)]
    similar_count: usize,

    /// Logging verbosity level
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> SiteConfig {
        SiteConfig {
            content_root: self.root,
            site: SiteIdentity {
                brand: self.brand,
                owner: self.owner,
                tagline: self.tagline,
                mission: self.mission,
            },
            conference: (!self.no_conference).then(|| ConferenceConfig {
                data_path: self.conference_data,
                similar_count: self.similar_count,
            }),
            server: ServerConfig {
                host: self.host,
                port: self.port,
                max_concurrent_requests: self.max_concurrent_requests,
                request_timeout_secs: self.request_timeout_secs,
            },
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

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let config = args.into_config();
    if !config.content_root.is_dir() {
        anyhow::bail!(
            "Content root not found: {}",
            config.content_root.display()
        );
    }

    info!(
        "Starting {} site v{} from {}",
        config.site.brand,
        rheumai_site::VERSION,
        config.content_root.display()
    );
    match &config.conference {
        Some(conference) => info!("Conference explorer enabled ({})", conference.data_path),
        None => info!("Conference explorer disabled"),
    }

    let state = AppState::load(&config)
        .await
        .with_context(|| "Failed to load site content")?;

    server::serve(state, &config)
        .await
        .with_context(|| "Server failed")?;

    Ok(())
}

//! ghost-leads: find map-listed businesses with a phone and no website.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tower::Service;
use tracing::{error, info};

use ghost_lead_scraper::{ChromiumClient, LeadConfig, LeadFinderService, RunRequest, ScraperError};

#[derive(Debug, Parser)]
#[command(name = "ghost-leads", version, about = "Find small businesses without a website")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long, env = "GHOST_LEADS_CONFIG")]
    config: Option<PathBuf>,

    /// Output CSV (overwritten)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many leads
    #[arg(short, long)]
    target: Option<usize>,

    /// Concurrent searches
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// CSV of already-contacted businesses to skip
    #[arg(long)]
    exclusions: Option<PathBuf>,

    /// Only accept leads with a personal-provider email
    #[arg(long)]
    require_email: bool,

    /// Web-search each lead's name when its listing shows no email
    #[arg(long)]
    email_search: bool,

    /// Fixed shuffle seed
    #[arg(long)]
    seed: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Debug logging and failure screenshots
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<LeadConfig, ScraperError> {
        let mut config = match &self.config {
            Some(path) => LeadConfig::from_json_file(path)?,
            None => LeadConfig::default(),
        };

        if let Some(output) = &self.output {
            config = config.with_output_path(output);
        }
        if let Some(target) = self.target {
            config = config.with_target(target);
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(exclusions) = &self.exclusions {
            config = config.with_exclusions_path(exclusions);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if self.require_email {
            config = config.with_require_validated_email(true);
        }
        if self.email_search {
            config = config.with_email_search(true);
        }
        if self.headful {
            config = config.with_headless(false);
        }
        if self.debug {
            config = config.with_debug(true);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        "info,ghost_lead_scraper=debug"
    } else {
        "info,ghost_lead_scraper=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt().with_env_filter(env_filter).with_target(false).init();
}

async fn run(cli: Cli) -> Result<(), ScraperError> {
    let config = cli.resolve_config()?;

    let client = Arc::new(ChromiumClient::launch(&config).await?);
    let mut service = LeadFinderService::new(client.clone(), config.clone());

    let summary = service.call(RunRequest::from(&config)).await?;
    info!(
        "Total: {} leads in {:.2} seconds",
        summary.accepted,
        summary.elapsed.as_secs_f64()
    );

    drop(service);
    if let Ok(client) = Arc::try_unwrap(client) {
        if let Err(e) = client.close().await {
            error!("Browser shutdown failed: {}", e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

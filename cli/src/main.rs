//! tally: voter participation for a governance space.

mod app;
mod config;
mod report;

use clap::Parser;
use std::path::PathBuf;

use app::Question;
use config::TallyConfig;
use tally_client::HttpQueryClient;
use tally_utils::LogFormat;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Rank the most frequent voters of a governance space"
)]
struct Cli {
    /// Which report to print.
    #[arg(value_enum, default_value_t = Question::Both)]
    question: Question,

    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// GraphQL endpoint of the registry.
    #[arg(long, env = "TALLY_ENDPOINT")]
    endpoint: Option<String>,

    /// Space to analyse (e.g. "aave.eth").
    #[arg(long, env = "TALLY_SPACE")]
    space: Option<String>,

    /// Address for the single-address rate report.
    #[arg(long, env = "TALLY_ADDRESS")]
    address: Option<String>,

    /// Leaderboard length.
    #[arg(long)]
    top: Option<usize>,

    /// Attempts per proposal before giving up; 0 retries forever.
    #[arg(long, env = "TALLY_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Count an address at most once per proposal.
    #[arg(long)]
    dedupe: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut TallyConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(space) = &self.space {
            config.space = space.clone();
        }
        if let Some(address) = &self.address {
            config.target_address = address.clone();
        }
        if let Some(top) = self.top {
            config.top_k = top;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if self.dedupe {
            config.dedupe_votes = true;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TallyConfig::from_toml_file(path)?,
        None => TallyConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    tally_utils::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }
    tracing::info!(
        space = %config.space,
        endpoint = %config.endpoint,
        max_attempts = config.retry.max_attempts,
        "starting tally"
    );

    let client = HttpQueryClient::with_timeouts(
        config.endpoint.clone(),
        config.request_timeout(),
        config.connect_timeout(),
    )?;
    let output = app::execute(client, &config, cli.question, cli.json).await?;
    print!("{output}");
    if cli.json {
        println!();
    }
    Ok(())
}

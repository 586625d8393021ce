use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cachelimit::config::CacheLimitConfig;
use cachelimit::SlidingWindowLimiter;

/// Run one sliding window admission check against a counter cache.
#[derive(Debug, Parser)]
#[command(name = "cachelimit", version, about)]
struct Cli {
    /// Identifier being rate limited (caller, route, tenant)
    identifier: String,

    /// Requests allowed per window
    #[arg(long)]
    limit: i64,

    /// Window length in seconds
    #[arg(long)]
    window: i64,

    /// Unix time in seconds to check at (defaults to now)
    #[arg(long)]
    at: Option<i64>,

    /// YAML configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Counter cache address, overriding the configuration
    #[arg(long)]
    cache_address: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Admission check failed");
            ExitCode::from(2)
        }
    }
}

/// Initialize tracing on stderr, honouring `RUST_LOG`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = CacheLimitConfig::load(cli.config.as_deref())?;
    if let Some(address) = cli.cache_address {
        config.cache.address = address;
    }
    info!(cache_addr = %config.cache.address, "Configuration loaded");

    let limiter = SlidingWindowLimiter::from_config(&config)?;
    let decision = match cli.at {
        Some(at) => limiter.limit(&cli.identifier, cli.limit, cli.window, at).await?,
        None => limiter.limit_now(&cli.identifier, cli.limit, cli.window).await?,
    };

    let verdict = if decision.allowed { "allowed" } else { "denied" };
    println!("{} (count {})", verdict, decision.current_count);
    Ok(decision.allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "cachelimit",
            "svc",
            "--limit",
            "10",
            "--window",
            "15",
            "--at",
            "47",
            "--cache-address",
            "http://10.88.0.1:1234",
        ])
        .unwrap();

        assert_eq!(cli.identifier, "svc");
        assert_eq!(cli.limit, 10);
        assert_eq!(cli.window, 15);
        assert_eq!(cli.at, Some(47));
        assert_eq!(cli.cache_address.as_deref(), Some("http://10.88.0.1:1234"));
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_requires_limit() {
        assert!(Cli::try_parse_from(["cachelimit", "svc", "--window", "15"]).is_err());
    }
}

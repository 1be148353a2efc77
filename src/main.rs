use anyhow::Context;
use clap::Parser;
use refetch::{FetchConfig, Fetcher, ProxyConfig, WriterSink, DEFAULT_ATTEMPTS};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "refetch")]
#[command(about = "Fetch a URL to a file or stdout, retrying on read timeouts", long_about = None)]
#[command(version)]
struct Args {
    /// URL of the resource to fetch
    url: String,

    /// Output file (body is written to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Per-attempt timeout (e.g. "10s", "500ms")
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Number of attempts before giving up on timeouts
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    attempts: u32,

    /// Proxy to connect through (http://host:port or socks5://host:port)
    #[arg(long)]
    proxy: Option<ProxyConfig>,

    /// Extra request header in "Name: value" form (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; logs go to stderr so the body can go to stdout.
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("refetch={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let mut headers = Vec::new();
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header {header:?} is not in \"Name: value\" form"))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let config = FetchConfig {
        timeout: args.timeout,
        attempts: args.attempts,
        proxy: args.proxy.clone(),
        headers,
    };
    let fetcher = Fetcher::new(config)?;

    match &args.output {
        Some(path) => {
            let transferred = fetcher.save_file(&args.url, path).await?;
            info!(
                "Saved {} bytes from {} to {}",
                transferred,
                args.url,
                path.display()
            );
        }
        None => {
            let mut sink = WriterSink::new(tokio::io::stdout());
            let transferred = fetcher.fetch_str(&args.url, &mut sink).await?;
            info!("Fetched {} bytes from {}", transferred, args.url);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use prompt_assist::{config::Config, run_server, telemetry};

/// Template-driven assistant server.
#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Listen host, overrides API_HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides API_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init_tracing();

    let mut cfg = Config::from_env()?;
    if let Some(host) = args.host {
        cfg.api_host = host;
    }
    if let Some(port) = args.port {
        cfg.api_port = port;
    }

    run_server(cfg).await
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use domhtml::cdp::CdpLauncher;
use domhtml::config::Config;
use domhtml::{logging, server, Gateway, StaticFetcher};

// Requests only suspend at I/O; browser renders run on their own worker
// threads, so one runtime thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init_logger(config.log_level, config.log_format)
        .context("Failed to initialize logger")?;

    let fetcher = StaticFetcher::new(config.fetch_timeout())?;
    let gateway = Gateway::new(fetcher, Arc::new(CdpLauncher), config.launch_config());

    server::serve(&config, Arc::new(gateway)).await?;
    Ok(())
}

use clap::Parser;
use log::info;

use reelbench::api::ReelApi;
use reelbench::conf::Config;
use reelbench::core::{CliArgs, setup_logging};
use reelbench::service::CompareService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();
    info!(args = args; "reelbench starting");

    let config = Config::load(args.config.as_deref())?;
    let service = CompareService::connect(config).await?;
    let addr = service.config().server.addr();
    ReelApi::new(service).serve(&addr).await?;
    Ok(())
}

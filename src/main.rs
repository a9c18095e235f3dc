use std::sync::Arc;

use anyhow::Context;
use inspection::InspectionService;
use intelli_inspect::{config, host};

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::from_env().context("reading configuration")?;
    log::info!(
        "starting inspection service: estimators={}, seed={:?}, snapshot key={:?}",
        config.estimators(),
        config.seed(),
        config.snapshot_key()
    );

    let service = InspectionService::new(config).context("building inspection service")?;
    let addr = host::InspectionActor::start(Arc::new(service));

    host::serve(tokio::io::stdin(), tokio::io::stdout(), addr).await
}

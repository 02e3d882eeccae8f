use anyhow::Result;
use std::sync::Arc;

use cost_agent::{AppConfig, RequestHandler, init_logging, router};

mod args;
use args::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse()?;
    if args.help {
        println!("{}", CliArgs::usage());
        return Ok(());
    }

    init_logging();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    config.validate()?;

    let handler = Arc::new(RequestHandler::from_config(&config)?);

    if args.once {
        let report = handler.handle(args.question).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    log::info!("cost-agent listening on {}", listener.local_addr()?);
    axum::serve(listener, router(handler)).await?;

    Ok(())
}

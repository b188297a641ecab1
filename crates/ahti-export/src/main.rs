mod cli;
mod export;
mod logging;
mod metadata;
mod serve;

use cli::{Command, ServeArgs, Settings};
use std::net::SocketAddr;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Connection settings may live in a local .env file
    dotenvy::dotenv().ok();
    logging::setup_logging();
    metadata::log_version_info();

    let settings = Settings::from_cli();
    let result = match settings.command {
        Command::Export(args) => args
            .into_config()
            .and_then(|config| export::run(&config).map(|_| ())),
        Command::Serve(args) => serve_blocking(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn serve_blocking(args: ServeArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let addr = SocketAddr::new(args.bind, args.port);
    rt.block_on(serve::run(addr, args.root))?;
    Ok(())
}

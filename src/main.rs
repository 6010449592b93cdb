use anyhow::Context;
use clap::Parser;
use reverify::{Args, Settings};
use std::process::ExitCode;

const EXIT_NOT_VERIFIED: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_NOT_VERIFIED),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut settings = Settings::new().context("failed to read config")?;
    if let Some(api_key) = args.api_key {
        settings.provider.api_key = Some(api_key);
    }
    reverify::init_logs(&settings.tracing).context("failed to initialize logs")?;

    let verdict = reverify::run(&settings, &args.address).await?;
    // With logging on, mismatch details were already emitted as warnings
    println!("{}", verdict.report(&args.address, !settings.tracing.enabled));
    Ok(verdict.matched)
}

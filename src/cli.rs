use clap::Parser;

/// Verify that the published source code of a contract compiles to its deployed bytecode.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Address of the contract to verify.
    pub address: String,
    /// Block explorer API key. Overrides the one from the settings.
    #[clap(long, env = "ETHERSCAN_API_KEY")]
    pub api_key: Option<String>,
}

// scripts/deploy/src/main.rs

use common::{load_config, run, AutoInvestParams, DeployClient, EthersRuntime};
use env_logger::Env;
use std::io;

#[tokio::main]
async fn main() {
    // Logs go to stderr, stdout only carries the deployed address
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load .env (RPC_URL, PRIVATE_KEY, ARTIFACTS_DIR) and connect
    let connect = async {
        let cfg = load_config()?;
        EthersRuntime::<DeployClient>::connect(&cfg).await
    };

    // Deploy AutoInvest with its fixed constructor arguments
    let code = run(
        connect,
        AutoInvestParams::default(),
        &mut io::stdout(),
        &mut io::stderr(),
    )
    .await;

    std::process::exit(code);
}

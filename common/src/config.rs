use anyhow::{anyhow, bail, Context, Result};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────── Configuration ───────────────────

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_CONFIRMATIONS: usize = 1;
/// Same as the ethers provider's own polling default.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4_000;

/// Settings consumed by the contract-tooling runtime. The deployment
/// parameters themselves live in [`crate::AutoInvestParams`].
#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    pub private_key: String,
    pub artifacts_dir: PathBuf,
    pub confirmations: usize,
    pub poll_interval: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("artifacts_dir", &self.artifacts_dir)
            .field("confirmations", &self.confirmations)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Config {
    /// Build a config from any key lookup. `load_config` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let private_key = var("PRIVATE_KEY")
            .ok_or_else(|| anyhow!("PRIVATE_KEY must be set to the deployer's hex private key"))?;
        let artifacts_dir = var("ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));

        let confirmations = match var("CONFIRMATIONS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("CONFIRMATIONS is not a number: {raw:?}"))?,
            None => DEFAULT_CONFIRMATIONS,
        };
        if confirmations == 0 {
            bail!("CONFIRMATIONS must be at least 1");
        }
        let poll_ms = match var("POLL_INTERVAL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("POLL_INTERVAL_MS is not a number: {raw:?}"))?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Config {
            rpc_url,
            private_key,
            artifacts_dir,
            confirmations,
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

/// Load `.env` (if any) and read the runtime settings from the environment.
pub fn load_config() -> Result<Config> {
    dotenv().ok();
    Config::from_lookup(|key| env::var(key).ok())
}

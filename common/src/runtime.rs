use crate::artifact::{load_artifact, HardhatArtifact};
use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use ethers::abi::Token;
use ethers::contract::ContractFactory;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TxHash, U64};
use log::{debug, info};
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::sync::Arc;

// ─────────────────── Contract-tooling runtime ───────────────────

/// What a deployment script needs from its tooling: resolve a compiled
/// contract, submit its creation transaction, wait for the address.
#[allow(async_fn_in_trait)]
pub trait ContractRuntime {
    type Factory;
    type Pending;

    async fn get_contract_factory(&self, name: &str) -> Result<Self::Factory>;

    /// Submit the creation transaction. Returns once the node accepted it.
    async fn deploy(&self, factory: &Self::Factory, args: Vec<Token>) -> Result<Self::Pending>;

    /// Wait until the creation transaction is confirmed.
    async fn deployed(&self, pending: Self::Pending) -> Result<Address>;
}

/// Client the `deploy` binary signs with.
pub type DeployClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub fn http_client() -> Result<Client> {
    Ok(Client::builder().build()?)
}

/// An ethers contract factory for a Hardhat artifact.
pub struct ArtifactFactory<M> {
    pub artifact: HardhatArtifact,
    factory: ContractFactory<M>,
}

impl<M: Middleware + 'static> ArtifactFactory<M> {
    pub fn new(artifact: HardhatArtifact, client: Arc<M>) -> Result<Self> {
        let code = artifact.creation_code()?;
        let factory = ContractFactory::new(artifact.abi.clone(), code, client);
        Ok(Self { artifact, factory })
    }

    /// The unsent creation transaction for `args`.
    pub fn deployment_tx(&self, args: Vec<Token>) -> Result<TypedTransaction> {
        let deployer = self.factory.clone().deploy_tokens(args).with_context(|| {
            format!(
                "constructor arguments don't match {}'s ABI",
                self.artifact.contract_name
            )
        })?;
        Ok(deployer.tx)
    }
}

/// A submitted, not yet confirmed, contract creation.
#[derive(Debug, Clone)]
pub struct PendingDeployment {
    pub contract: String,
    pub tx_hash: TxHash,
}

/// JSON-RPC backed runtime: Hardhat artifacts on disk, any ethers middleware
/// able to send transactions.
pub struct EthersRuntime<M> {
    client: Arc<M>,
    artifacts_dir: PathBuf,
    confirmations: usize,
}

impl<M> EthersRuntime<M> {
    pub fn new(client: Arc<M>, artifacts_dir: PathBuf, confirmations: usize) -> Self {
        Self {
            client,
            artifacts_dir,
            confirmations,
        }
    }
}

impl EthersRuntime<DeployClient> {
    pub async fn connect(cfg: &Config) -> Result<Self> {
        debug!("runtime config: {cfg:?}");
        let url: Url = cfg
            .rpc_url
            .parse()
            .with_context(|| format!("RPC_URL is not a valid url: {}", cfg.rpc_url))?;
        let provider =
            Provider::new(Http::new_with_client(url, http_client()?)).interval(cfg.poll_interval);

        let wallet: LocalWallet = cfg
            .private_key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .context("PRIVATE_KEY is not a valid private key")?;

        // the wallet needs the chain id to sign, ask the node for it
        let client = SignerMiddleware::new_with_provider_chain(provider, wallet)
            .await
            .with_context(|| format!("connecting to {}", cfg.rpc_url))?;
        info!(
            "deployer {:?} connected to chain {}",
            client.address(),
            client.signer().chain_id()
        );

        Ok(Self::new(
            Arc::new(client),
            cfg.artifacts_dir.clone(),
            cfg.confirmations,
        ))
    }
}

impl<M: Middleware + 'static> ContractRuntime for EthersRuntime<M> {
    type Factory = ArtifactFactory<M>;
    type Pending = PendingDeployment;

    async fn get_contract_factory(&self, name: &str) -> Result<ArtifactFactory<M>> {
        let artifact = load_artifact(&self.artifacts_dir, name)?;
        info!("using artifact {}", artifact.fully_qualified_name());
        ArtifactFactory::new(artifact, self.client.clone())
    }

    async fn deploy(&self, factory: &ArtifactFactory<M>, args: Vec<Token>) -> Result<PendingDeployment> {
        let tx = factory.deployment_tx(args)?;
        let contract = factory.artifact.contract_name.clone();

        let pending = self.client.send_transaction(tx, None).await?;
        let tx_hash = pending.tx_hash();
        info!("{contract} deployment submitted in tx {tx_hash:?}");

        Ok(PendingDeployment { contract, tx_hash })
    }

    async fn deployed(&self, pending: PendingDeployment) -> Result<Address> {
        debug!(
            "waiting for {} confirmation(s) of {:?}",
            self.confirmations, pending.tx_hash
        );
        let receipt = PendingTransaction::new(pending.tx_hash, self.client.provider())
            .confirmations(self.confirmations)
            .await?
            .ok_or_else(|| anyhow!("deployment tx {:?} was dropped", pending.tx_hash))?;

        if receipt.status == Some(U64::zero()) {
            bail!(
                "{} deployment reverted in tx {:?} (block {:?})",
                pending.contract,
                pending.tx_hash,
                receipt.block_number
            );
        }
        let address = receipt.contract_address.ok_or_else(|| {
            anyhow!("receipt of {:?} has no contract address", pending.tx_hash)
        })?;
        info!(
            "{} confirmed in block {:?}, gas used {:?}",
            pending.contract, receipt.block_number, receipt.gas_used
        );
        Ok(address)
    }
}

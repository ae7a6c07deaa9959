// common/src/lib.rs
use anyhow::{Context, Result};
use ethers::types::Address;
use ethers::utils::to_checksum;
use log::{debug, info, warn};
use std::future::Future;
use std::io::Write;

pub mod artifact;
pub mod config;
pub mod params;
pub mod runtime;

pub use artifact::{find_artifact, load_artifact, HardhatArtifact};
pub use config::{load_config, Config};
pub use params::AutoInvestParams;
pub use runtime::{
    http_client, ArtifactFactory, ContractRuntime, DeployClient, EthersRuntime, PendingDeployment,
};

pub const CONTRACT_NAME: &str = "AutoInvest";

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

// ─────────────────── Deploy Flow (factory -> deploy -> confirm -> report) ───────────────────

/// Deploy one `AutoInvest` instance and write its address to `out`.
///
/// A single attempt: nothing is retried, and every call submits a new
/// contract even if an identical one is already on chain.
pub async fn deploy_flow<R: ContractRuntime>(
    runtime: &R,
    params: AutoInvestParams,
    out: &mut impl Write,
) -> Result<Address> {
    // 1. Resolve the compiled contract
    let factory = runtime
        .get_contract_factory(CONTRACT_NAME)
        .await
        .with_context(|| format!("looking up contract factory for {CONTRACT_NAME}"))?;

    // 2. Submit the creation tx with the constructor arguments
    debug!("constructor arguments: {params:?}");
    let pending = runtime
        .deploy(&factory, params.into_tokens())
        .await
        .with_context(|| format!("submitting {CONTRACT_NAME} deployment"))?;

    // 3. Wait for confirmation
    let address = runtime
        .deployed(pending)
        .await
        .context("waiting for deployment confirmation")?;

    // 4. Report. The contract is on chain by now, so a broken stdout is
    // not a failed deployment.
    let checksummed = to_checksum(&address, None);
    if let Err(e) = writeln!(out, "{CONTRACT_NAME} deployed to: {checksummed}") {
        warn!("{CONTRACT_NAME} deployed to {checksummed}, but printing it failed: {e}");
    }
    Ok(address)
}

/// Connect, deploy, and turn the outcome into a process exit code. Any
/// failure is written to `err` together with its cause chain.
pub async fn run<R, C>(
    connect: C,
    params: AutoInvestParams,
    out: &mut impl Write,
    err: &mut impl Write,
) -> i32
where
    R: ContractRuntime,
    C: Future<Output = Result<R>>,
{
    let result = async {
        let runtime = connect.await.context("setting up the contract runtime")?;
        deploy_flow(&runtime, params, out).await
    }
    .await;

    match result {
        Ok(address) => {
            info!("deployment finished: {address:?}");
            EXIT_SUCCESS
        }
        Err(e) => {
            let _ = writeln!(err, "Error: {e:?}");
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, bail};
    use ethers::abi::Token;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct MockRuntime {
        fail_lookup: bool,
        fail_deploy: bool,
        fail_confirm: bool,
        addresses: Vec<Address>,
        lookups: RefCell<Vec<String>>,
        deploys: RefCell<Vec<Vec<Token>>>,
        confirms: Cell<usize>,
    }

    impl MockRuntime {
        fn with_addresses(addresses: Vec<Address>) -> Self {
            Self {
                addresses,
                ..Default::default()
            }
        }
    }

    impl ContractRuntime for MockRuntime {
        type Factory = String;
        type Pending = usize;

        async fn get_contract_factory(&self, name: &str) -> Result<String> {
            self.lookups.borrow_mut().push(name.to_string());
            if self.fail_lookup {
                bail!("HH700: Artifact for contract \"{name}\" not found.");
            }
            Ok(name.to_string())
        }

        async fn deploy(&self, _factory: &String, args: Vec<Token>) -> Result<usize> {
            let mut deploys = self.deploys.borrow_mut();
            deploys.push(args);
            if self.fail_deploy {
                bail!("connection reset by peer");
            }
            Ok(deploys.len() - 1)
        }

        async fn deployed(&self, pending: usize) -> Result<Address> {
            self.confirms.set(self.confirms.get() + 1);
            if self.fail_confirm {
                bail!("transaction reverted");
            }
            self.addresses
                .get(pending)
                .copied()
                .ok_or_else(|| anyhow!("no address for deployment {pending}"))
        }
    }

    fn router() -> Address {
        "0xE592427A0AEce92De3Edee1F18E0157C05861564".parse().unwrap()
    }

    #[tokio::test]
    async fn success_prints_one_checksummed_line() {
        let runtime = MockRuntime::with_addresses(vec![router()]);
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let code = run(async { Ok(runtime) }, AutoInvestParams::default(), &mut out, &mut err).await;

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "AutoInvest deployed to: 0xE592427A0AEce92De3Edee1F18E0157C05861564\n"
        );
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn arguments_reach_deploy_in_declared_order() {
        let runtime = MockRuntime::with_addresses(vec![Address::from_low_u64_be(7)]);
        let params = AutoInvestParams::default();

        deploy_flow(&runtime, params.clone(), &mut Vec::new()).await.unwrap();

        assert_eq!(*runtime.lookups.borrow(), vec!["AutoInvest".to_string()]);
        let deploys = runtime.deploys.borrow();
        assert_eq!(deploys.len(), 1);
        assert_eq!(
            deploys[0],
            vec![
                Token::Address(params.swap_router),
                Token::Uint(1672502400u64.into()),
                Token::Uint(1735660800u64.into()),
                Token::Uint(15638400u64.into()),
                Token::Uint(604800u64.into()),
                Token::Uint(1814400u64.into()),
                Token::Uint(604800u64.into()),
                Token::Uint(1209600u64.into()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_lookup_exits_one_without_deploying() {
        let runtime = MockRuntime {
            fail_lookup: true,
            ..Default::default()
        };
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let result = deploy_flow(&runtime, AutoInvestParams::default(), &mut out).await;
        assert!(result.is_err());
        assert!(runtime.deploys.borrow().is_empty());

        let code = run(async { Ok(runtime) }, AutoInvestParams::default(), &mut out, &mut err).await;
        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("looking up contract factory for AutoInvest"));
        assert!(err.contains("HH700"));
    }

    #[tokio::test]
    async fn failed_confirmation_prints_no_address() {
        let runtime = MockRuntime {
            fail_confirm: true,
            addresses: vec![router()],
            ..Default::default()
        };
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let code = run(async { Ok(runtime) }, AutoInvestParams::default(), &mut out, &mut err).await;

        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("waiting for deployment confirmation"));
        assert!(err.contains("transaction reverted"));
    }

    #[tokio::test]
    async fn failed_submission_is_not_retried() {
        let runtime = MockRuntime {
            fail_deploy: true,
            ..Default::default()
        };

        let err = deploy_flow(&runtime, AutoInvestParams::default(), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(runtime.deploys.borrow().len(), 1);
        assert_eq!(runtime.confirms.get(), 0);
        assert!(format!("{err:?}").contains("connection reset by peer"));
    }

    #[tokio::test]
    async fn each_run_deploys_a_new_contract() {
        let first = Address::from_low_u64_be(1);
        let second = Address::from_low_u64_be(2);
        let runtime = MockRuntime::with_addresses(vec![first, second]);
        let mut out = Vec::new();

        let a = deploy_flow(&runtime, AutoInvestParams::default(), &mut out).await.unwrap();
        let b = deploy_flow(&runtime, AutoInvestParams::default(), &mut out).await.unwrap();

        assert_eq!((a, b), (first, second));
        assert_eq!(runtime.deploys.borrow().len(), 2);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn confirmed_deployment_exits_zero_even_if_stdout_fails() {
        let runtime = MockRuntime::with_addresses(vec![router()]);
        let mut err = Vec::new();

        let address = deploy_flow(&runtime, AutoInvestParams::default(), &mut BrokenPipe)
            .await
            .unwrap();
        assert_eq!(address, router());

        let runtime = MockRuntime::with_addresses(vec![router()]);
        let code = run(async { Ok(runtime) }, AutoInvestParams::default(), &mut BrokenPipe, &mut err).await;
        assert_eq!(code, EXIT_SUCCESS);
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn setup_failure_exits_one() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let connect = async { Err::<MockRuntime, _>(anyhow!("PRIVATE_KEY must be set")) };

        let code = run(connect, AutoInvestParams::default(), &mut out, &mut err).await;

        assert_eq!(code, EXIT_FAILURE);
        assert!(out.is_empty());
        assert!(String::from_utf8(err).unwrap().contains("PRIVATE_KEY must be set"));
    }
}

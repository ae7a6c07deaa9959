use anyhow::{anyhow, bail, Context, Result};
use ethers::abi::Abi;
use ethers::types::Bytes;
use ethers::utils::hex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

// ─────────────────── Hardhat artifacts ───────────────────

/// The parts of a Hardhat `hh-sol-artifact-1` file needed to deploy.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HardhatArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    /// Kept as text: unlinked libraries show up as `__$…$__` placeholders
    /// which are not valid hex.
    pub bytecode: String,
}

impl HardhatArtifact {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading artifact {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing artifact {}", path.display()))
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Decoded creation bytecode.
    pub fn creation_code(&self) -> Result<Bytes> {
        let code = self.bytecode.trim_start_matches("0x");
        if code.is_empty() {
            bail!(
                "{} is abstract or an interface and can't be deployed",
                self.fully_qualified_name()
            );
        }
        if code.contains("__") {
            bail!(
                "{} references libraries that are not linked",
                self.fully_qualified_name()
            );
        }
        let code = hex::decode(code)
            .with_context(|| format!("bytecode of {} is not hex", self.contract_name))?;
        Ok(code.into())
    }
}

/// Locate the artifact for `name` under `artifacts_dir`.
///
/// `name` is either a bare contract name or a fully qualified
/// `path/To.sol:Name`. Bare names must be unique across the tree.
pub fn find_artifact(artifacts_dir: &Path, name: &str) -> Result<PathBuf> {
    if !artifacts_dir.is_dir() {
        bail!(
            "artifacts directory {} not found, compile the contracts first",
            artifacts_dir.display()
        );
    }

    if let Some((source, contract)) = name.rsplit_once(':') {
        let path = artifacts_dir.join(source).join(format!("{contract}.json"));
        if !path.is_file() {
            bail!("artifact for {name} not found at {}", path.display());
        }
        return Ok(path);
    }

    let file_name = format!("{name}.json");
    let mut found = Vec::new();
    collect_named(artifacts_dir, &file_name, &mut found)?;

    match found.len() {
        0 => Err(anyhow!(
            "artifact for contract {name} not found in {}",
            artifacts_dir.display()
        )),
        1 => Ok(found.remove(0)),
        _ => {
            let candidates: Vec<String> = found
                .iter()
                .filter_map(|p| p.strip_prefix(artifacts_dir).ok())
                .filter_map(|p| p.parent())
                .map(|source| format!("{}:{name}", source.display()))
                .collect();
            bail!(
                "multiple artifacts for contract {name}, use a fully qualified name: {}",
                candidates.join(", ")
            )
        }
    }
}

fn collect_named(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            // build-info holds compiler input/output, never contract artifacts
            if path.file_name().map_or(false, |n| n == "build-info") {
                continue;
            }
            collect_named(&path, file_name, found)?;
        } else if path.file_name().map_or(false, |n| n == file_name) {
            found.push(path);
        }
    }
    Ok(())
}

/// Find, read and check the artifact for `name`.
pub fn load_artifact(artifacts_dir: &Path, name: &str) -> Result<HardhatArtifact> {
    let path = find_artifact(artifacts_dir, name)?;
    let artifact = HardhatArtifact::read(&path)?;
    let expected = name.rsplit_once(':').map_or(name, |(_, contract)| contract);
    if artifact.contract_name != expected {
        bail!(
            "{} holds {}, not {expected}",
            path.display(),
            artifact.contract_name
        );
    }
    Ok(artifact)
}

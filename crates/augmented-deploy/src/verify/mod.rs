pub mod etherscan;
pub mod proxy;

use eyre::{eyre, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    artifacts::load_artifact,
    context::{ContractId, DeployContext},
    registry,
};
use etherscan::{EtherscanClient, SourceVerifyRequest};
use proxy::{ApiProxyVerification, FormProxyVerification, ProxyVerificationBackend};

/// Extracts the solc version pragma-style string the explorer expects,
/// e.g. `v0.8.4+commit.c7e474f2`, from the artifact metadata.
pub fn compiler_version(metadata: &str) -> Option<String> {
    let value: Value = serde_json::from_str(metadata).ok()?;
    let version = value.get("compiler")?.get("version")?.as_str()?;
    Some(format!("v{}", version.trim_start_matches('v')))
}

/// Extracts the fully-qualified `path:Name` the explorer expects from the
/// metadata's compilation target.
pub fn qualified_contract_name(metadata: &str) -> Option<String> {
    let value: Value = serde_json::from_str(metadata).ok()?;
    let target = value.get("settings")?.get("compilationTarget")?;
    let (path, name) = target.as_object()?.iter().next()?;
    Some(format!("{}:{}", path, name.as_str()?))
}

/// Walks the registry and submits source verification for every recorded
/// instance and proxy detection for every proxy entry. `batch_index` /
/// `batch_count` shard the instance list so several verification runs can
/// work a large deployment in parallel invocations.
pub async fn verify_all_contracts(
    ctx: &DeployContext,
    etherscan_key: &str,
    batch_index: usize,
    batch_count: usize,
) -> Result<()> {
    // The proxy→implementation invariant must hold before anything is
    // submitted, otherwise proxy verification would chase unknown
    // implementations.
    registry::validate(ctx.registry.as_ref())?;

    let client = EtherscanClient::new(ctx.network, etherscan_key)?;
    let batch_count = batch_count.max(1);

    let mut submitted = 0usize;
    let mut failed = 0usize;
    for (index, (address, entry)) in ctx.registry.instances().into_iter().enumerate() {
        if index % batch_count != batch_index {
            continue;
        }
        let Some(id) = ContractId::from_registry_id(&entry.id) else {
            warn!(id = entry.id.as_str(), "no artifact mapping, skipping");
            continue;
        };
        let artifact = load_artifact(&ctx.artifacts_dir, id.artifact_name())?;
        let Some(metadata) = artifact.metadata else {
            warn!(id = entry.id.as_str(), "artifact has no metadata, skipping");
            continue;
        };
        let request = SourceVerifyRequest {
            address,
            contract_name: qualified_contract_name(&metadata)
                .unwrap_or_else(|| artifact.name.clone()),
            standard_json: metadata.clone(),
            compiler_version: compiler_version(&metadata)
                .ok_or_else(|| eyre!("artifact metadata for {} lacks a compiler version", id))?,
            constructor_args: entry.verify.and_then(|verify| verify.args),
        };
        submitted += 1;
        if let Err(error) = client.verify_source(&request).await {
            warn!(id = entry.id.as_str(), %error, "source verification failed");
            failed += 1;
        }
    }

    let api_backend = ApiProxyVerification::new(client.clone());
    let form_backend = ctx.network.explorer_url().map(FormProxyVerification::new);
    for (proxy, entry) in ctx.registry.proxies() {
        // validate() guarantees the implementation is present.
        let implementation = entry.verify.implementation.expect("validated above");
        submitted += 1;
        match api_backend.verify_proxy(proxy, implementation).await {
            Ok(()) => continue,
            Err(error) => {
                warn!(id = entry.id.as_str(), %error, "API proxy verification failed");
            }
        }
        // Fall back to driving the explorer's HTML proxy checker.
        match &form_backend {
            Some(backend) => {
                if let Err(error) = backend.verify_proxy(proxy, implementation).await {
                    warn!(id = entry.id.as_str(), %error, "form proxy verification failed");
                    failed += 1;
                }
            }
            None => failed += 1,
        }
    }

    info!(submitted, failed, "verification sweep finished");
    if failed > 0 {
        return Err(eyre!("{} of {} verifications failed", failed, submitted));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"{
        "compiler": {"version": "0.8.4+commit.c7e474f2"},
        "language": "Solidity",
        "settings": {
            "compilationTarget": {"contracts/access/MarketAccessController.sol": "MarketAccessController"}
        }
    }"#;

    #[test]
    fn test_compiler_version_extraction() {
        assert_eq!(
            compiler_version(METADATA).unwrap(),
            "v0.8.4+commit.c7e474f2"
        );
        assert_eq!(compiler_version("not json"), None);
    }

    #[test]
    fn test_qualified_contract_name() {
        assert_eq!(
            qualified_contract_name(METADATA).unwrap(),
            "contracts/access/MarketAccessController.sol:MarketAccessController"
        );
        assert_eq!(qualified_contract_name("{}"), None);
    }
}

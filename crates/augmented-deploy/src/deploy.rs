use std::{future::Future, path::Path, sync::Arc};

use ethers::{
    abi::{self, Abi, Detokenize, Token},
    contract::{ContractCall, ContractFactory},
    types::{Address, Bytes, TransactionReceipt, U256, U64},
    utils::hex,
};
use eyre::{bail, eyre, Result, WrapErr};
use tracing::info;

use augmented_config::flags::AddressSlot;

use crate::{
    artifacts::load_artifact,
    context::{ContractId, DeployContext, SignerClient},
    registry::ContractRegistry,
};

/// ABI-encodes constructor arguments for the registry's verify record.
pub fn encode_args(args: &[Token]) -> Option<String> {
    if args.is_empty() {
        None
    } else {
        Some(hex::encode(abi::encode(args)))
    }
}

/// Encodes a call to a named ABI function, used to build proxy init data.
pub fn encode_call(abi: &Abi, name: &str, args: &[Token]) -> Result<Bytes> {
    let function = abi
        .function(name)
        .wrap_err_with(|| format!("ABI has no function {}", name))?;
    Ok(function.encode_input(args)?.into())
}

/// Rejects dropped and reverted transactions. Registry writes only happen
/// for receipts that pass through here.
pub fn confirmed(receipt: Option<TransactionReceipt>) -> Result<TransactionReceipt> {
    let receipt = receipt.ok_or_else(|| eyre!("transaction was dropped from the mempool"))?;
    if receipt.status != Some(U64::from(1)) {
        bail!("transaction {:?} reverted", receipt.transaction_hash);
    }
    Ok(receipt)
}

/// Sends a contract call, applying the configured gas price, and waits for
/// one confirmation.
pub async fn send_call<D: Detokenize>(
    call: ContractCall<SignerClient, D>,
    gas_price: Option<U256>,
) -> Result<TransactionReceipt> {
    let call = match gas_price {
        Some(gas_price) => call.gas_price(gas_price),
        None => call,
    };
    let pending = call.send().await?;
    confirmed(pending.await?)
}

/// The deployment primitive: loads the artifact, deploys with the given
/// constructor arguments, and waits for one confirmation.
async fn deploy_parts(
    client: &Arc<SignerClient>,
    artifacts_dir: &Path,
    gas_price: Option<U256>,
    artifact_name: &str,
    args: Vec<Token>,
) -> Result<(Address, Option<String>)> {
    let artifact = load_artifact(artifacts_dir, artifact_name)?;
    let encoded = encode_args(&args);
    let factory = ContractFactory::new(artifact.abi, artifact.bytecode, client.clone());
    let mut deployer = factory
        .deploy_tokens(args)
        .wrap_err_with(|| format!("bad constructor arguments for {}", artifact_name))?
        .confirmations(1usize);
    if let Some(gas_price) = gas_price {
        deployer.tx.set_gas_price(gas_price);
    }
    let (contract, receipt) = deployer.send_with_receipt().await?;
    info!(
        contract = artifact_name,
        address = ?contract.address(),
        gas = ?receipt.gas_used,
        "deployed"
    );
    Ok((contract.address(), encoded))
}

/// Deploys a contract and records it under a custom registry id, used for
/// contract types with several live instances (rate strategies, mocks).
pub async fn deploy_with_id(
    ctx: &mut DeployContext,
    id: ContractId,
    reg_id: &str,
    args: Vec<Token>,
    register: bool,
) -> Result<Address> {
    let (address, encoded) = deploy_parts(
        &ctx.client,
        &ctx.artifacts_dir,
        ctx.gas_price,
        id.artifact_name(),
        args,
    )
    .await?;
    ctx.registry
        .add_instance(reg_id, address, register, encoded)?;
    Ok(address)
}

/// Deploys a singleton contract and registers it under its canonical id.
pub async fn deploy(ctx: &mut DeployContext, id: ContractId, args: Vec<Token>) -> Result<Address> {
    deploy_with_id(ctx, id, id.as_str(), args, true).await
}

/// The idempotence primitive: if a named entry already exists, attach to it
/// instead of deploying. The closure runs only when nothing is registered
/// yet; its result is recorded before being returned.
pub async fn deploy_once<F, Fut>(
    registry: &mut dyn ContractRegistry,
    id: &str,
    deploy: F,
) -> Result<Address>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(Address, Option<String>)>>,
{
    if let Some(entry) = registry.named(id) {
        info!(id, address = ?entry.address, "reusing existing deployment");
        return Ok(entry.address);
    }
    let (address, args) = deploy().await?;
    registry.add_instance(id, address, true, args)?;
    Ok(address)
}

/// `deploy_once` over the real deployment path. Used for implementation
/// contracts that must exist exactly once per network no matter how many
/// times the pipeline is re-run.
pub async fn deploy_unique(
    ctx: &mut DeployContext,
    id: ContractId,
    args: Vec<Token>,
) -> Result<Address> {
    deploy_unique_with_id(ctx, id, id.as_str(), args).await
}

pub async fn deploy_unique_with_id(
    ctx: &mut DeployContext,
    id: ContractId,
    reg_id: &str,
    args: Vec<Token>,
) -> Result<Address> {
    let client = ctx.client.clone();
    let artifacts_dir = ctx.artifacts_dir.clone();
    let gas_price = ctx.gas_price;
    deploy_once(ctx.registry.as_mut(), reg_id, || async move {
        deploy_parts(&client, &artifacts_dir, gas_price, id.artifact_name(), args).await
    })
    .await
}

/// Installs an implementation behind the access controller's proxy slot and
/// records the resulting proxy entry. Re-running against an existing slot
/// upgrades the proxy in place.
pub async fn install_proxy(
    ctx: &mut DeployContext,
    slot: AddressSlot,
    reg_id: &str,
    implementation: Address,
    init_data: Bytes,
) -> Result<Address> {
    let controller = ctx.controller()?;
    send_call(
        controller.set_address_as_proxy(slot.to_u256(), implementation),
        ctx.gas_price,
    )
    .await
    .wrap_err_with(|| format!("failed to install {} behind its proxy", reg_id))?;
    let proxy = controller.get_address(slot.to_u256()).call().await?;
    if proxy == Address::zero() {
        bail!("controller reports no proxy for {}", reg_id);
    }
    ctx.registry.add_proxy(
        reg_id,
        proxy,
        implementation,
        Some(hex::encode(&init_data)),
    )?;
    info!(id = reg_id, proxy = ?proxy, implementation = ?implementation, "proxy installed");
    Ok(proxy)
}

/// The per-slot continuation policy in one place: attach to an existing
/// proxy unless the contract is in the always-updated set or the phase
/// allows implementation swaps. Attaching also heals a registry that lost
/// its proxy record.
pub async fn install_or_attach(
    ctx: &mut DeployContext,
    slot: AddressSlot,
    reg_id: &str,
    implementation: Address,
    init_data: Bytes,
    always_update: bool,
) -> Result<Address> {
    let controller = ctx.controller()?;
    let existing: Address = controller.get_address(slot.to_u256()).call().await?;
    if existing != Address::zero() && !always_update && !ctx.phase.redeploys_implementations() {
        if ctx.registry.named(reg_id).is_none() {
            ctx.registry.add_proxy(
                reg_id,
                existing,
                implementation,
                Some(hex::encode(&init_data)),
            )?;
        }
        info!(id = reg_id, proxy = ?existing, "attaching to existing proxy");
        return Ok(existing);
    }
    install_proxy(ctx, slot, reg_id, implementation, init_data).await
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::registry::MemoryRegistry;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    #[tokio::test]
    async fn test_deploy_once_deploys_exactly_once() {
        let mut registry = MemoryRegistry::default();
        let deploys = Cell::new(0u32);

        for _ in 0..2 {
            let address = deploy_once(&mut registry, "SharedImpl", || async {
                deploys.set(deploys.get() + 1);
                Ok((addr(0x42), Some("beef".to_string())))
            })
            .await
            .unwrap();
            assert_eq!(address, addr(0x42));
        }

        assert_eq!(deploys.get(), 1);
        assert_eq!(registry.named("SharedImpl").unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_deploy_once_propagates_failures_without_recording() {
        let mut registry = MemoryRegistry::default();
        let result = deploy_once(&mut registry, "Broken", || async {
            Err(eyre!("deployment reverted"))
        })
        .await;
        assert!(result.is_err());
        assert!(registry.named("Broken").is_none());
    }

    #[test]
    fn test_encode_args() {
        assert_eq!(encode_args(&[]), None);
        let encoded = encode_args(&[Token::Uint(U256::from(1))]).unwrap();
        assert_eq!(encoded.len(), 64);
        assert!(encoded.ends_with('1'));
    }
}

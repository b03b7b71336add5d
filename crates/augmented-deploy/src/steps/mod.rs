pub mod access_test;
pub mod address_provider;
pub mod finalize;
pub mod lending_pool;
pub mod oracles;
pub mod reserves;
pub mod rewards;
pub mod smoke;
pub mod stake;

use std::{collections::BTreeMap, future::Future, pin::Pin};

use ethers::{abi::Token, types::Address};
use eyre::{bail, Result};
use tracing::{error, info, warn};

use crate::{
    context::{ContractId, DeployContext},
    deploy::deploy_unique_with_id,
};

pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a>>;
pub type StepFn = for<'a> fn(&'a mut DeployContext) -> StepFuture<'a>;

pub struct FullStep {
    pub seq: u16,
    pub name: &'static str,
    pub run: StepFn,
}

/// The ordered catalog of deployment steps. Later steps read addresses the
/// earlier ones wrote into the registry or the on-chain controller, so the
/// order is load-bearing.
#[derive(Default)]
pub struct StepRegistry {
    steps: Vec<FullStep>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, seq: u16, name: &'static str, run: StepFn) {
        self.steps.push(FullStep { seq, name, run });
    }

    /// The steps ordered by sequence number, ties broken lexicographically
    /// by name. Deterministic for a given registration set.
    pub fn sorted(mut self) -> Vec<FullStep> {
        self.steps.sort_by(|a, b| (a.seq, a.name).cmp(&(b.seq, b.name)));
        self.steps
    }
}

fn step_address_provider(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(address_provider::run(ctx))
}

fn step_lending_pool(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(lending_pool::run(ctx))
}

fn step_oracles(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(oracles::run(ctx))
}

fn step_reserves(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(reserves::run(ctx))
}

fn step_stake(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(stake::run(ctx))
}

fn step_rewards(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(rewards::run(ctx))
}

fn step_access_test(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(access_test::run(ctx))
}

fn step_smoke(ctx: &mut DeployContext) -> StepFuture<'_> {
    Box::pin(smoke::run(ctx))
}

pub fn full_steps() -> StepRegistry {
    let mut steps = StepRegistry::new();
    steps.add(1, "address-provider", step_address_provider);
    steps.add(2, "lending-pool", step_lending_pool);
    steps.add(3, "oracles", step_oracles);
    steps.add(4, "reserves", step_reserves);
    steps.add(5, "stake-tokens", step_stake);
    steps.add(6, "reward-contracts", step_rewards);
    steps.add(7, "access-test", step_access_test);
    steps.add(8, "smoke-test", step_smoke);
    steps
}

/// Runs the full pipeline in order. A failing step stops the pipeline, but
/// the finalize phase (admin renouncement, summary) still runs before the
/// error is returned so a partial deployment is left in a continuable
/// state.
pub async fn run_migration(ctx: &mut DeployContext) -> Result<()> {
    let mut failure: Option<eyre::Report> = None;
    for step in full_steps().sorted() {
        info!(seq = step.seq, step = step.name, phase = ?ctx.phase, "running step");
        match (step.run)(ctx).await {
            Ok(()) => {}
            Err(err) => {
                error!(step = step.name, "step failed: {:#}", err);
                failure = Some(err.wrap_err(format!("step {:02}-{} failed", step.seq, step.name)));
                break;
            }
        }
    }

    if let Err(err) = finalize::run(ctx, failure.is_none()).await {
        warn!("finalize failed: {:#}", err);
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Resolves every configured reserve to an on-chain asset address. On test
/// networks missing assets are filled with freshly-deployed mocks; on live
/// networks a missing non-optional asset aborts the run.
pub(crate) async fn resolve_reserve_assets(
    ctx: &mut DeployContext,
) -> Result<BTreeMap<&'static str, Address>> {
    let pool = ctx.pool.clone();
    let mut resolved = BTreeMap::new();
    for (symbol, params) in &pool.reserves {
        if let Some(address) = pool.reserve_asset(ctx.network, ctx.mainnet_fork, symbol) {
            resolved.insert(*symbol, address);
            continue;
        }
        if ctx.network.is_test() {
            let address = deploy_unique_with_id(
                ctx,
                ContractId::TestToken,
                &format!("TestToken-{}", symbol),
                vec![
                    Token::String(format!("Mock {}", symbol)),
                    Token::String(symbol.to_string()),
                    Token::Uint(params.decimals.into()),
                    Token::Uint(pool.test_token_supply),
                ],
            )
            .await?;
            resolved.insert(*symbol, address);
        } else if params.optional {
            warn!(symbol, "no address configured, skipping optional reserve");
        } else {
            bail!("reserve {} has no address on {}", symbol, ctx.network);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_ctx: &mut DeployContext) -> StepFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn test_steps_sort_by_seq_then_name() {
        let mut registry = StepRegistry::new();
        registry.add(2, "bravo", noop);
        registry.add(1, "zulu", noop);
        registry.add(2, "alpha", noop);
        registry.add(1, "alpha", noop);

        let order: Vec<(u16, &str)> = registry
            .sorted()
            .iter()
            .map(|step| (step.seq, step.name))
            .collect();
        assert_eq!(
            order,
            vec![(1, "alpha"), (1, "zulu"), (2, "alpha"), (2, "bravo")]
        );
    }

    #[test]
    fn test_step_order_is_deterministic() {
        let build = || {
            let mut registry = StepRegistry::new();
            registry.add(3, "c", noop);
            registry.add(1, "a", noop);
            registry.add(2, "b", noop);
            registry.add(2, "a", noop);
            registry
                .sorted()
                .iter()
                .map(|step| (step.seq, step.name))
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_full_pipeline_is_ordered() {
        let steps = full_steps().sorted();
        let seqs: Vec<u16> = steps.iter().map(|step| step.seq).collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(seqs, sorted);
        assert_eq!(steps.first().map(|s| s.name), Some("address-provider"));
        assert_eq!(steps.last().map(|s| s.name), Some("smoke-test"));
    }
}

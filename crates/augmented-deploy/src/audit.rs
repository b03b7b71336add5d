use std::collections::BTreeMap;

use ethers::{
    abi::{Abi, Function, ParamType, StateMutability, Token},
    providers::Middleware,
    types::{Address, TransactionRequest, U256},
};
use eyre::{bail, Result};
use tracing::{error, info};

use crate::calls::{classify_call, CallOutcome};

/// Revert reasons accepted for any guarded function that has no more
/// specific expectation configured.
pub const DEFAULT_REVERT_REASONS: &[&str] = &[
    "RESTRICTED",
    "Ownable: caller is not the owner",
    "CALLER_NOT_EMERGENCY_ADMIN",
];

/// What an unprivileged caller should observe for one mutable function.
#[derive(Clone, Debug)]
pub enum Expectation {
    /// The function is open to anyone; it is skipped rather than called.
    AllowAnyone,
    /// The call must revert. `Some` pins the exact reason; `None` accepts
    /// the contract-level and global default reason sets.
    Revert(Option<&'static str>),
}

/// An exception entry, keyed by exact signature or bare function name.
#[derive(Clone, Debug)]
pub struct FunctionException {
    pub expect: Expectation,
    /// Call arguments; ABI defaults are synthesized when absent.
    pub args: Option<Vec<Token>>,
}

impl FunctionException {
    pub fn allow() -> Self {
        Self {
            expect: Expectation::AllowAnyone,
            args: None,
        }
    }

    pub fn reverts(reason: &'static str) -> Self {
        Self {
            expect: Expectation::Revert(Some(reason)),
            args: None,
        }
    }

    pub fn reverts_with_args(reason: &'static str, args: Vec<Token>) -> Self {
        Self {
            expect: Expectation::Revert(Some(reason)),
            args: Some(args),
        }
    }
}

/// The expected-behavior oracle for one contract type.
#[derive(Clone, Debug, Default)]
pub struct ContractExceptions {
    pub functions: BTreeMap<&'static str, FunctionException>,
    /// Contract-level default revert reasons, accepted in addition to the
    /// global set for functions without a pinned reason.
    pub reasons: &'static [&'static str],
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditError {
    pub contract: String,
    pub function: String,
    pub message: String,
}

/// Decides whether an observed outcome is acceptable for a function. Pure;
/// the chain interaction lives in [`audit_contract`].
pub fn check_outcome(
    contract: &str,
    function: &str,
    outcome: &CallOutcome,
    expected: Option<&Expectation>,
    contract_reasons: &[&str],
) -> Option<AuditError> {
    let err = |message: String| {
        Some(AuditError {
            contract: contract.to_string(),
            function: function.to_string(),
            message,
        })
    };
    match outcome {
        CallOutcome::Success => match expected {
            Some(Expectation::AllowAnyone) => None,
            _ => err("unexpectedly succeeded for an unprivileged caller".to_string()),
        },
        CallOutcome::Reverted(reason) => match expected {
            Some(Expectation::AllowAnyone) => {
                err(format!("expected to succeed, but reverted with '{}'", reason))
            }
            Some(Expectation::Revert(Some(exact))) => {
                if reason == exact {
                    None
                } else {
                    err(format!(
                        "expected revert reason '{}', got '{}'",
                        exact, reason
                    ))
                }
            }
            Some(Expectation::Revert(None)) | None => {
                if contract_reasons.contains(&reason.as_str())
                    || DEFAULT_REVERT_REASONS.contains(&reason.as_str())
                {
                    None
                } else {
                    err(format!("unexpected revert reason '{}'", reason))
                }
            }
        },
        CallOutcome::Unknown(raw) => err(format!("unclassifiable call failure: {}", raw)),
    }
}

/// Synthesizes zero-value arguments for a function from its ABI types.
pub fn default_args(function: &Function) -> Vec<Token> {
    function
        .inputs
        .iter()
        .map(|param| default_token(&param.kind))
        .collect()
}

fn default_token(kind: &ParamType) -> Token {
    match kind {
        ParamType::Address => Token::Address(Address::zero()),
        ParamType::Bytes => Token::Bytes(Vec::new()),
        ParamType::Int(_) => Token::Int(U256::zero()),
        ParamType::Uint(_) => Token::Uint(U256::zero()),
        ParamType::Bool => Token::Bool(false),
        ParamType::String => Token::String(String::new()),
        ParamType::Array(_) => Token::Array(Vec::new()),
        ParamType::FixedBytes(size) => Token::FixedBytes(vec![0; *size]),
        ParamType::FixedArray(inner, size) => {
            Token::FixedArray(vec![default_token(inner); *size])
        }
        ParamType::Tuple(fields) => Token::Tuple(fields.iter().map(default_token).collect()),
    }
}

fn signature(function: &Function) -> String {
    let inputs = function
        .inputs
        .iter()
        .map(|param| param.kind.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({})", function.name, inputs)
}

fn is_mutable(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::NonPayable | StateMutability::Payable
    )
}

/// Probes every externally-mutable function of a deployed contract as an
/// unprivileged caller and records any function whose access control does
/// not behave as the exception table predicts. With `check_all` unset the
/// first error aborts immediately.
pub async fn audit_contract<M: Middleware>(
    client: &M,
    caller: Address,
    contract: &str,
    address: Address,
    abi: &Abi,
    exceptions: Option<&ContractExceptions>,
    errors: &mut Vec<AuditError>,
    check_all: bool,
) -> Result<()> {
    let empty = ContractExceptions::default();
    let exceptions = exceptions.unwrap_or(&empty);
    for function in abi.functions() {
        if !is_mutable(function) {
            continue;
        }
        let sig = signature(function);
        let exception = exceptions
            .functions
            .get(sig.as_str())
            .or_else(|| exceptions.functions.get(function.name.as_str()));

        // Functions open to anyone are skipped rather than exercised; the
        // auditor only proves that guarded paths stay guarded.
        if matches!(
            exception.map(|e| &e.expect),
            Some(Expectation::AllowAnyone)
        ) {
            continue;
        }

        let args = exception
            .and_then(|e| e.args.clone())
            .unwrap_or_else(|| default_args(function));
        let data = function.encode_input(&args)?;
        let tx = TransactionRequest::new()
            .from(caller)
            .to(address)
            .data(data);
        let outcome = classify_call(client.call(&tx.into(), None).await);

        if let Some(audit_error) = check_outcome(
            contract,
            &sig,
            &outcome,
            exception.map(|e| &e.expect),
            exceptions.reasons,
        ) {
            error!(
                contract,
                function = sig.as_str(),
                "{}",
                audit_error.message
            );
            if !check_all {
                bail!(
                    "access check failed for {}.{}: {}",
                    audit_error.contract,
                    audit_error.function,
                    audit_error.message
                );
            }
            errors.push(audit_error);
        } else {
            info!(contract, function = sig.as_str(), "access check passed");
        }
    }
    Ok(())
}

/// The expected-behavior tables for the deployed market. Only deviations
/// from the default reason sets need an entry; any other mutable function
/// is expected to revert with one of the defaults.
pub fn market_exceptions() -> BTreeMap<&'static str, ContractExceptions> {
    BTreeMap::from([
        (
            "LendingPool",
            ContractExceptions {
                functions: BTreeMap::from([
                    ("setPause", FunctionException::reverts("CALLER_NOT_EMERGENCY_ADMIN")),
                    // Anyone may deposit or repay; the asset checks reject
                    // the zero address before access control is consulted.
                    ("deposit", FunctionException::reverts("VL_INVALID_AMOUNT")),
                    ("repay", FunctionException::reverts("VL_INVALID_AMOUNT")),
                    ("withdraw", FunctionException::reverts("VL_INVALID_AMOUNT")),
                    ("borrow", FunctionException::reverts("VL_INVALID_AMOUNT")),
                ]),
                reasons: &["LP_CALLER_NOT_LENDING_POOL_CONFIGURATOR"],
            },
        ),
        (
            "LendingPoolConfigurator",
            ContractExceptions {
                functions: BTreeMap::new(),
                reasons: &["CALLER_NOT_POOL_ADMIN"],
            },
        ),
        (
            "StakeConfigurator",
            ContractExceptions {
                functions: BTreeMap::new(),
                reasons: &["CALLER_NOT_STAKE_ADMIN"],
            },
        ),
        (
            "RewardBooster",
            ContractExceptions {
                functions: BTreeMap::from([
                    // Claiming is open to any reward holder.
                    ("claimReward", FunctionException::allow()),
                    ("claimRewardTo", FunctionException::reverts("0 address")),
                ]),
                reasons: &["CALLER_NOT_REWARD_CONFIG_ADMIN", "CALLER_NOT_REWARD_RATE_ADMIN"],
            },
        ),
        (
            "OracleRouter",
            ContractExceptions {
                functions: BTreeMap::new(),
                reasons: &["CALLER_NOT_ORACLE_ADMIN"],
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reverted(reason: &str) -> CallOutcome {
        CallOutcome::Reverted(reason.to_string())
    }

    #[test]
    fn test_exact_reason_round_trip() {
        // A pinned reason accepts exactly that reason.
        let expected = Expectation::Revert(Some("CALLER_NOT_EMERGENCY_ADMIN"));
        assert!(check_outcome(
            "Pool",
            "setPaused(bool)",
            &reverted("CALLER_NOT_EMERGENCY_ADMIN"),
            Some(&expected),
            &[],
        )
        .is_none());

        // A different reason or a success is an error.
        assert!(check_outcome(
            "Pool",
            "setPaused(bool)",
            &reverted("RESTRICTED"),
            Some(&expected),
            &[],
        )
        .is_some());
        assert!(check_outcome(
            "Pool",
            "setPaused(bool)",
            &CallOutcome::Success,
            Some(&expected),
            &[],
        )
        .is_some());
    }

    #[test]
    fn test_global_default_reason_set() {
        for reason in ["RESTRICTED", "Ownable: caller is not the owner", "CALLER_NOT_EMERGENCY_ADMIN"] {
            assert!(
                check_outcome("Pool", "sweep()", &reverted(reason), None, &[]).is_none(),
                "default reason rejected: {}",
                reason
            );
        }
        assert!(check_outcome("Pool", "sweep()", &reverted("NOT_A_DEFAULT"), None, &[]).is_some());
        assert!(check_outcome("Pool", "sweep()", &CallOutcome::Success, None, &[]).is_some());
    }

    #[test]
    fn test_contract_level_reasons_extend_defaults() {
        let reasons = &["CALLER_NOT_POOL_ADMIN"];
        assert!(check_outcome(
            "Configurator",
            "freeze(address)",
            &reverted("CALLER_NOT_POOL_ADMIN"),
            None,
            reasons,
        )
        .is_none());
        assert!(check_outcome(
            "Configurator",
            "freeze(address)",
            &reverted("RESTRICTED"),
            None,
            reasons,
        )
        .is_none());
    }

    #[test]
    fn test_allow_anyone_accepts_success() {
        let expected = Expectation::AllowAnyone;
        assert!(check_outcome(
            "Booster",
            "claimReward()",
            &CallOutcome::Success,
            Some(&expected),
            &[],
        )
        .is_none());
        assert!(check_outcome(
            "Booster",
            "claimReward()",
            &reverted("RESTRICTED"),
            Some(&expected),
            &[],
        )
        .is_some());
    }

    #[test]
    fn test_unknown_outcome_is_always_an_error() {
        let outcome = CallOutcome::Unknown("connection refused".to_string());
        assert!(check_outcome("Pool", "setPaused(bool)", &outcome, None, &[]).is_some());
    }

    #[test]
    fn test_set_paused_scenario() {
        // The concrete scenario: setPaused(bool) guarded by the emergency
        // admin, probed by a non-admin.
        let table = ContractExceptions {
            functions: BTreeMap::from([(
                "setPaused",
                FunctionException::reverts("CALLER_NOT_EMERGENCY_ADMIN"),
            )]),
            reasons: &[],
        };
        let exception = table.functions.get("setPaused").unwrap();
        let outcome = reverted("CALLER_NOT_EMERGENCY_ADMIN");

        // With the correct table entry the call passes with zero errors.
        assert!(check_outcome(
            "MockPausable",
            "setPaused(bool)",
            &outcome,
            Some(&exception.expect),
            table.reasons,
        )
        .is_none());

        // Flipping the table entry to the wrong reason produces exactly one
        // error for setPaused.
        let wrong = Expectation::Revert(Some("WRONG_REASON"));
        let errors: Vec<AuditError> = [check_outcome(
            "MockPausable",
            "setPaused(bool)",
            &outcome,
            Some(&wrong),
            table.reasons,
        )]
        .into_iter()
        .flatten()
        .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].function, "setPaused(bool)");
    }

    #[test]
    fn test_default_args_cover_all_types() {
        let function: Function = serde_json::from_str(
            r#"{
                "name": "probe",
                "type": "function",
                "stateMutability": "nonpayable",
                "inputs": [
                    {"name": "a", "type": "address"},
                    {"name": "b", "type": "uint256"},
                    {"name": "c", "type": "bool"},
                    {"name": "d", "type": "bytes32"},
                    {"name": "e", "type": "string"},
                    {"name": "f", "type": "address[]"},
                    {"name": "g", "type": "tuple", "components": [
                        {"name": "x", "type": "uint8"},
                        {"name": "y", "type": "bytes"}
                    ]}
                ],
                "outputs": []
            }"#,
        )
        .unwrap();
        let args = default_args(&function);
        assert_eq!(args.len(), 7);
        // Synthesized defaults must actually encode.
        function.encode_input(&args).unwrap();
    }

    #[test]
    fn test_signature_formatting() {
        let function: Function = serde_json::from_str(
            r#"{
                "name": "grantRoles",
                "type": "function",
                "stateMutability": "nonpayable",
                "inputs": [
                    {"name": "addr", "type": "address"},
                    {"name": "flags", "type": "uint256"}
                ],
                "outputs": []
            }"#,
        )
        .unwrap();
        assert_eq!(signature(&function), "grantRoles(address,uint256)");
    }
}

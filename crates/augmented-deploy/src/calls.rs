use std::fmt;

/// The structured result of probing a mutable function. Classification
/// happens once at the chain-client boundary; everything downstream matches
/// on the variant instead of substring-searching provider errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallOutcome {
    Success,
    /// Reverted with the given reason; empty when the contract reverted
    /// without a reason string.
    Reverted(String),
    /// The provider failed in a way that does not look like a revert.
    Unknown(String),
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Success => write!(f, "succeeded"),
            CallOutcome::Reverted(reason) if reason.is_empty() => {
                write!(f, "reverted without a reason")
            }
            CallOutcome::Reverted(reason) => write!(f, "reverted with '{}'", reason),
            CallOutcome::Unknown(raw) => write!(f, "failed: {}", raw),
        }
    }
}

/// Folds a provider call result into a [`CallOutcome`].
pub fn classify_call<T, E: fmt::Display>(result: Result<T, E>) -> CallOutcome {
    match result {
        Ok(_) => CallOutcome::Success,
        Err(error) => classify_error(&error.to_string()),
    }
}

/// Recovers the revert reason from a provider error message. Both the
/// hardhat-style ("reverted with reason string '…'") and the geth/anvil
/// style ("execution reverted: …") shapes occur in the wild.
pub fn classify_error(message: &str) -> CallOutcome {
    if let Some(reason) = between(message, "reverted with reason string '", "'") {
        return CallOutcome::Reverted(reason.to_string());
    }
    if message.contains("reverted without a reason string") {
        return CallOutcome::Reverted(String::new());
    }
    if let Some(rest) = message
        .find("execution reverted")
        .map(|idx| &message[idx + "execution reverted".len()..])
    {
        let reason = rest
            .strip_prefix(':')
            .unwrap_or("")
            .trim()
            .trim_end_matches(|c| c == '"' || c == ')');
        // The reason may be followed by provider noise, e.g. ", data: …".
        let reason = reason.split(", data:").next().unwrap_or("").trim();
        return CallOutcome::Reverted(reason.to_string());
    }
    CallOutcome::Unknown(message.to_string())
}

fn between<'a>(haystack: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    let start = haystack.find(prefix)? + prefix.len();
    let end = haystack[start..].find(suffix)? + start;
    Some(&haystack[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardhat_reason_string() {
        let outcome = classify_error(
            "call failed: VM Exception while processing transaction: \
             reverted with reason string 'CALLER_NOT_EMERGENCY_ADMIN'",
        );
        assert_eq!(
            outcome,
            CallOutcome::Reverted("CALLER_NOT_EMERGENCY_ADMIN".to_string())
        );
    }

    #[test]
    fn test_reverted_without_reason() {
        let outcome = classify_error(
            "VM Exception while processing transaction: reverted without a reason string",
        );
        assert_eq!(outcome, CallOutcome::Reverted(String::new()));
    }

    #[test]
    fn test_anvil_execution_reverted() {
        let outcome = classify_error("(code: 3, message: execution reverted: RESTRICTED, data: Some(...))");
        assert_eq!(outcome, CallOutcome::Reverted("RESTRICTED".to_string()));

        let bare = classify_error("execution reverted");
        assert_eq!(bare, CallOutcome::Reverted(String::new()));
    }

    #[test]
    fn test_non_revert_is_unknown() {
        let outcome = classify_error("connection refused");
        assert!(matches!(outcome, CallOutcome::Unknown(_)));
    }

    #[test]
    fn test_classify_call_success() {
        let result: Result<(), String> = Ok(());
        assert_eq!(classify_call(result), CallOutcome::Success);
    }
}

use crate::error::{FailureKind, LedgerFailure};

/// Maps a raw ledger or wallet error message onto a known failure kind by
/// substring. Unrecognised messages are `Unknown`; the raw text is kept.
pub fn classify_ledger_error(message: &str) -> LedgerFailure {
    let lower = message.to_lowercase();

    let kind = if lower.contains("kyc") {
        FailureKind::KycRequired
    } else if lower.contains("insufficient funds") {
        FailureKind::InsufficientFunds
    } else if lower.contains("rejected") || lower.contains("denied") {
        FailureKind::Rejected
    } else {
        FailureKind::Unknown
    };

    LedgerFailure {
        kind,
        detail: message.to_string(),
    }
}

//! Maps provider error payloads onto `LedgerErrorKind`.
//!
//! This is the only place that inspects ledger error text.

use domains::{LedgerError, LedgerErrorKind};

/// Solana-style JSON-RPC codes
pub const CODE_SIMULATION_FAILED: i64 = -32002;
pub const CODE_NODE_UNHEALTHY: i64 = -32005;
/// EIP-1193 style wallet rejection
pub const CODE_USER_REJECTED: i64 = 4001;

const INSUFFICIENT: &[&str] = &["insufficient funds", "insufficient lamports", "insufficient balance", "0x1 ", "attempt to debit an account but found no record of a prior credit"];
const REJECTED: &[&str] = &["user rejected", "rejected the request", "request rejected", "cancelled", "canceled", "denied"];
const NETWORK: &[&str] = &["timeout", "timed out", "network", "failed to fetch", "connection", "too many requests", "503", "502", "429"];
/// A stale blockhash fails simulation too, but a resend can succeed.
const EXPIRED: &[&str] = &["blockhash not found", "block height exceeded", "transaction expired"];
const SIMULATION: &[&str] = &["simulation failed", "custom program error", "instruction error", "account already in use", "accountnotinitialized"];

/// Order matters: a failed simulation caused by missing lamports is an
/// insufficient-balance problem for the user, and one caused by an expired
/// blockhash is a network problem.
pub fn classify(code: Option<i64>, message: &str) -> LedgerErrorKind {
    let text = format!("{} ", message.to_lowercase());
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if has(INSUFFICIENT) {
        LedgerErrorKind::InsufficientBalance
    } else if code == Some(CODE_USER_REJECTED) || has(REJECTED) {
        LedgerErrorKind::Rejected
    } else if has(EXPIRED) {
        LedgerErrorKind::Network
    } else if code == Some(CODE_SIMULATION_FAILED) || has(SIMULATION) {
        LedgerErrorKind::SimulationFailed
    } else if code == Some(CODE_NODE_UNHEALTHY) || has(NETWORK) {
        LedgerErrorKind::Network
    } else {
        LedgerErrorKind::Other
    }
}

pub fn ledger_error(code: Option<i64>, message: impl Into<String>) -> LedgerError {
    let message = message.into();
    LedgerError::new(classify(code, &message), message)
}

//! Human-readable failure notices. Raw error text goes to logs, not here.

use domains::{ContentError, DomainError, IndexError, LedgerErrorKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNotice {
    pub title: String,
    pub message: String,
    pub action: String,
}

impl UserNotice {
    fn new(title: &str, message: impl Into<String>, action: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            action: action.to_string(),
        }
    }

    pub fn for_ledger(kind: LedgerErrorKind) -> Self {
        match kind {
            LedgerErrorKind::InsufficientBalance => Self::new(
                "Insufficient balance",
                "Your wallet does not hold enough SOL to pay the transaction and platform fees.",
                "Top up your wallet and try again.",
            ),
            LedgerErrorKind::Rejected => Self::new(
                "Transaction cancelled",
                "The transaction was rejected by the wallet.",
                "Approve the transaction in your wallet to continue.",
            ),
            LedgerErrorKind::Network => Self::new(
                "Network problem",
                "The ledger RPC endpoint could not be reached or timed out.",
                "Check your connection and try again in a moment.",
            ),
            LedgerErrorKind::SimulationFailed => Self::new(
                "Transaction simulation failed",
                "The program refused the transaction during simulation.",
                "Make sure the board exists and has not been created twice, then retry.",
            ),
            LedgerErrorKind::Other => Self::new(
                "Transaction failed",
                "The ledger did not confirm the transaction.",
                "Try again. If it keeps failing, contact support.",
            ),
        }
    }
}

impl From<&DomainError> for UserNotice {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => {
                Self::new("Check your input", msg.clone(), "Fix the highlighted field and submit again.")
            }
            DomainError::NotFound(kind, _) => Self::new(
                "Not found",
                format!("The requested {kind} does not exist."),
                "Check the identifier and try again.",
            ),
            DomainError::Archived(_) => Self::new(
                "Board archived",
                "This board no longer accepts feedback or votes.",
                "Pick an active board.",
            ),
            DomainError::Forbidden(msg) => {
                Self::new("Not allowed", msg.clone(), "Vote on someone else's feedback, once per direction.")
            }
            DomainError::Conflict(_) => Self::new(
                "Board is busy",
                "Other contributions landed while yours was being saved.",
                "Reload the board and submit again.",
            ),
            DomainError::Content(ContentError::Disabled) | DomainError::Index(IndexError::Disabled) => {
                Self::new(
                    "Feature unavailable",
                    "Storage is not configured for this deployment.",
                    "Ask the operator to configure content and index storage.",
                )
            }
            DomainError::Content(_) => Self::new(
                "Upload failed",
                "Your board data could not be stored.",
                "Try again in a moment.",
            ),
            DomainError::Index(_) => Self::new(
                "Board lookup failed",
                "The board index is temporarily unavailable.",
                "Try again in a moment.",
            ),
            DomainError::Ledger(e) => Self::for_ledger(e.kind),
        }
    }
}

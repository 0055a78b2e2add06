//! Advisory balance check run before offering a write action.

use std::sync::Arc;

use domains::BalanceReader;
use serde::Serialize;
use tracing::warn;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Default minimum spendable balance, in SOL.
pub const MIN_SOL_REQUIRED: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceCheck {
    /// Spendable balance in SOL; zero when the read failed
    pub balance: f64,
    pub has_enough_balance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

pub struct BalanceGuard {
    reader: Arc<dyn BalanceReader>,
    min_lamports: u64,
}

impl BalanceGuard {
    pub fn new(reader: Arc<dyn BalanceReader>, min_sol: f64) -> Self {
        Self {
            reader,
            min_lamports: sol_to_lamports(min_sol),
        }
    }

    pub fn min_sol(&self) -> f64 {
        lamports_to_sol(self.min_lamports)
    }

    /// A failed read counts as insufficient.
    pub async fn check_balance(&self, actor: &str) -> BalanceCheck {
        match self.reader.balance_lamports(actor).await {
            Ok(lamports) => BalanceCheck {
                balance: lamports_to_sol(lamports),
                has_enough_balance: lamports >= self.min_lamports,
                error: None,
            },
            Err(e) => {
                warn!(actor = %actor, error = %e, "balance check failed");
                BalanceCheck {
                    balance: 0.0,
                    has_enough_balance: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

//! # chain-adapters
//!
//! `Ledger` and `BalanceReader` implementations.
//!
//! | Module     | Feature    | Purpose                                   |
//! |------------|------------|-------------------------------------------|
//! | `memory`   | always     | in-process ledger for tests              |
//! | `rpc`      | `rpc-http` | JSON-RPC signing relay                    |
//! | `accounts` | always     | board account derivation                  |
//! | `classify` | always     | provider error text → `LedgerErrorKind`   |

pub mod accounts;
pub mod classify;
pub mod memory;

#[cfg(feature = "rpc-http")]
pub mod rpc;

pub use accounts::board_account;
pub use classify::classify;
pub use memory::{InMemoryLedger, LedgerBoard, LedgerCall};

#[cfg(feature = "rpc-http")]
pub use rpc::{JsonRpcLedger, RpcLedgerConfig};

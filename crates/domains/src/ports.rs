//! # Ports
//!
//! The three external systems the write sequence touches, plus the balance
//! reader used by the guard. Every adapter crate implements one or more of
//! these; the services crate only ever sees `Arc<dyn Port>`.

use async_trait::async_trait;

use crate::errors::{ContentError, IndexError, LedgerError};
use crate::models::{
    BoardDocument, DeleteOutcome, IndexRow, LedgerReceipt, NewIndexRow, StoredContent,
    VoteDirection,
};

/// Content-addressed document storage.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Serializes and stores a board document, returning its CID.
    async fn upload(&self, document: &BoardDocument) -> Result<StoredContent, ContentError>;

    /// Retrieves a document. `None` means "no data available"; it is never
    /// an error, whatever the cause.
    async fn fetch(&self, cid: &str) -> Option<BoardDocument>;

    /// Best-effort delete by CID.
    async fn delete_by_cid(&self, cid: &str) -> DeleteOutcome;
}

/// Relational index of board pointers.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn get(&self, board_id: &str) -> Result<Option<IndexRow>, IndexError>;

    async fn insert(&self, row: NewIndexRow) -> Result<IndexRow, IndexError>;

    /// Compare-and-swap of `ipfs_cid`. Returns `false` when the row no
    /// longer points at `expected_cid`.
    async fn swap_cid(
        &self,
        board_id: &str,
        expected_cid: &str,
        new_cid: &str,
    ) -> Result<bool, IndexError>;

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>, IndexError>;
}

/// The three fixed entry points of the board program.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn create_board(
        &self,
        actor: &str,
        board_id: &str,
        cid: &str,
    ) -> Result<LedgerReceipt, LedgerError>;

    async fn submit_feedback(
        &self,
        actor: &str,
        board_creator: &str,
        board_id: &str,
        new_cid: &str,
    ) -> Result<String, LedgerError>;

    async fn vote(
        &self,
        actor: &str,
        board_creator: &str,
        board_id: &str,
        new_cid: &str,
        direction: VoteDirection,
    ) -> Result<String, LedgerError>;
}

/// Spendable balance lookup, in lamports.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn balance_lamports(&self, actor: &str) -> Result<u64, LedgerError>;
}

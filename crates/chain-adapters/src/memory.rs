//! In-process ledger used by tests and local wiring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{BalanceReader, Ledger, LedgerError, LedgerErrorKind, LedgerReceipt, VoteDirection};
use sha2::{Digest, Sha256};

use crate::accounts::board_account;

/// On-chain state of one board account.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerBoard {
    pub creator: String,
    pub board_id: String,
    pub ipfs_cid: String,
    pub feedback_count: u64,
    pub upvotes: u64,
    pub downvotes: u64,
}

/// One accepted instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerCall {
    pub method: &'static str,
    pub signer: String,
    pub board_id: String,
    pub cid: String,
}

pub struct InMemoryLedger {
    program_id: String,
    boards: DashMap<String, LedgerBoard>,
    balances: DashMap<String, u64>,
    calls: Mutex<Vec<LedgerCall>>,
    fail_next: Mutex<Option<LedgerErrorKind>>,
    counter: AtomicU64,
}

impl InMemoryLedger {
    pub fn new(program_id: impl Into<String>) -> Self {
        Self {
            program_id: program_id.into(),
            boards: DashMap::new(),
            balances: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            counter: AtomicU64::new(0),
        }
    }

    /// The next instruction fails with `kind` and changes nothing.
    pub fn fail_next(&self, kind: LedgerErrorKind) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(kind);
        }
    }

    pub fn set_balance(&self, actor: &str, lamports: u64) {
        self.balances.insert(actor.to_string(), lamports);
    }

    pub fn board(&self, creator: &str, board_id: &str) -> Option<LedgerBoard> {
        self.boards
            .get(&board_account(&self.program_id, creator, board_id))
            .map(|b| b.clone())
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn take_failure(&self) -> Result<(), LedgerError> {
        let kind = self.fail_next.lock().ok().and_then(|mut slot| slot.take());
        match kind {
            Some(kind) => Err(LedgerError::new(kind, format!("injected {kind:?} failure"))),
            None => Ok(()),
        }
    }

    fn sign(&self, call: LedgerCall) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Sha256::new();
        hasher.update(n.to_le_bytes());
        hasher.update(call.method.as_bytes());
        hasher.update(call.signer.as_bytes());
        hasher.update(call.cid.as_bytes());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        bs58::encode(hasher.finalize()).into_string()
    }

    fn update(
        &self,
        method: &'static str,
        actor: &str,
        creator: &str,
        board_id: &str,
        cid: &str,
        apply: impl FnOnce(&mut LedgerBoard),
    ) -> Result<String, LedgerError> {
        self.take_failure()?;
        let account = board_account(&self.program_id, creator, board_id);
        let mut board = self.boards.get_mut(&account).ok_or_else(|| {
            LedgerError::new(
                LedgerErrorKind::SimulationFailed,
                format!("AccountNotInitialized: {account}"),
            )
        })?;
        board.ipfs_cid = cid.to_string();
        apply(&mut board);
        drop(board);
        Ok(self.sign(LedgerCall {
            method,
            signer: actor.to_string(),
            board_id: board_id.to_string(),
            cid: cid.to_string(),
        }))
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn create_board(
        &self,
        actor: &str,
        board_id: &str,
        cid: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.take_failure()?;
        let account = board_account(&self.program_id, actor, board_id);
        if self.boards.contains_key(&account) {
            return Err(LedgerError::new(
                LedgerErrorKind::SimulationFailed,
                format!("account already in use: {account}"),
            ));
        }
        self.boards.insert(
            account.clone(),
            LedgerBoard {
                creator: actor.to_string(),
                board_id: board_id.to_string(),
                ipfs_cid: cid.to_string(),
                feedback_count: 0,
                upvotes: 0,
                downvotes: 0,
            },
        );
        let signature = self.sign(LedgerCall {
            method: "createFeedbackBoard",
            signer: actor.to_string(),
            board_id: board_id.to_string(),
            cid: cid.to_string(),
        });
        Ok(LedgerReceipt { signature, account })
    }

    async fn submit_feedback(
        &self,
        actor: &str,
        board_creator: &str,
        board_id: &str,
        new_cid: &str,
    ) -> Result<String, LedgerError> {
        self.update("submitFeedback", actor, board_creator, board_id, new_cid, |b| {
            b.feedback_count += 1
        })
    }

    async fn vote(
        &self,
        actor: &str,
        board_creator: &str,
        board_id: &str,
        new_cid: &str,
        direction: VoteDirection,
    ) -> Result<String, LedgerError> {
        match direction {
            VoteDirection::Up => {
                self.update("upvoteFeedback", actor, board_creator, board_id, new_cid, |b| {
                    b.upvotes += 1
                })
            }
            VoteDirection::Down => {
                self.update("downvoteFeedback", actor, board_creator, board_id, new_cid, |b| {
                    b.downvotes += 1
                })
            }
        }
    }
}

#[async_trait]
impl BalanceReader for InMemoryLedger {
    async fn balance_lamports(&self, actor: &str) -> Result<u64, LedgerError> {
        self.balances.get(actor).map(|b| *b).ok_or_else(|| {
            LedgerError::new(LedgerErrorKind::Network, format!("no balance for {actor}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_submit_moves_head() {
        let ledger = InMemoryLedger::new("Prog");
        let receipt = ledger.create_board("alice", "0xb", "cid1").await.unwrap();
        assert_eq!(receipt.account, board_account("Prog", "alice", "0xb"));

        ledger.submit_feedback("bob", "alice", "0xb", "cid2").await.unwrap();
        let board = ledger.board("alice", "0xb").unwrap();
        assert_eq!(board.ipfs_cid, "cid2");
        assert_eq!(board.feedback_count, 1);
        assert_eq!(ledger.calls().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_board_is_rejected() {
        let ledger = InMemoryLedger::new("Prog");
        ledger.create_board("alice", "0xb", "cid1").await.unwrap();
        let err = ledger.create_board("alice", "0xb", "cid9").await.unwrap_err();
        assert_eq!(err.kind, LedgerErrorKind::SimulationFailed);
        assert_eq!(ledger.board("alice", "0xb").unwrap().ipfs_cid, "cid1");
    }

    #[tokio::test]
    async fn injected_failure_changes_nothing() {
        let ledger = InMemoryLedger::new("Prog");
        ledger.create_board("alice", "0xb", "cid1").await.unwrap();
        ledger.fail_next(LedgerErrorKind::Rejected);

        let err = ledger
            .vote("bob", "alice", "0xb", "cid2", VoteDirection::Up)
            .await
            .unwrap_err();
        assert_eq!(err.kind, LedgerErrorKind::Rejected);
        assert_eq!(ledger.board("alice", "0xb").unwrap().upvotes, 0);

        // one-shot
        ledger
            .vote("bob", "alice", "0xb", "cid2", VoteDirection::Up)
            .await
            .unwrap();
        assert_eq!(ledger.board("alice", "0xb").unwrap().upvotes, 1);
    }

    #[tokio::test]
    async fn unknown_balance_is_an_error() {
        let ledger = InMemoryLedger::new("Prog");
        ledger.set_balance("alice", 42);
        assert_eq!(ledger.balance_lamports("alice").await.unwrap(), 42);
        assert!(ledger.balance_lamports("bob").await.is_err());
    }
}

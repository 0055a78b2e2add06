//! Two writers on the same board. The rival's whole submission is injected
//! at a chosen point of the first writer's sequence.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domains::{
    BoardDocument, ContentError, ContentStore, DeleteOutcome, IndexError, IndexRow, IndexStore,
    NewIndexRow, StoredContent,
};
use integration_tests::{feedback_draft, Harness, ALICE, BOB, OWNER};
use services::{BoardService, FeedbackDraft};

type Rival = (BoardService, String, FeedbackDraft);

fn take(slot: &Mutex<Option<Rival>>) -> Option<Rival> {
    slot.lock().ok().and_then(|mut s| s.take())
}

async fn run_rival(rival: Option<Rival>) {
    if let Some((service, board, draft)) = rival {
        service
            .submit_feedback(BOB, &board, &draft)
            .await
            .unwrap_or_else(|e| panic!("rival submission failed: {e}"));
    }
}

/// Lets the rival land right after the first upload, before the pointer check.
struct RaceOnUpload {
    inner: Arc<dyn ContentStore>,
    rival: Mutex<Option<Rival>>,
}

#[async_trait]
impl ContentStore for RaceOnUpload {
    async fn upload(&self, document: &BoardDocument) -> Result<StoredContent, ContentError> {
        let stored = self.inner.upload(document).await?;
        let rival = take(&self.rival);
        run_rival(rival).await;
        Ok(stored)
    }

    async fn fetch(&self, cid: &str) -> Option<BoardDocument> {
        self.inner.fetch(cid).await
    }

    async fn delete_by_cid(&self, cid: &str) -> DeleteOutcome {
        self.inner.delete_by_cid(cid).await
    }
}

/// Lets the rival land after the first ledger commit, right before the swap.
struct RaceOnSwap {
    inner: Arc<dyn IndexStore>,
    rival: Mutex<Option<Rival>>,
}

#[async_trait]
impl IndexStore for RaceOnSwap {
    async fn get(&self, board_id: &str) -> Result<Option<IndexRow>, IndexError> {
        self.inner.get(board_id).await
    }

    async fn insert(&self, row: NewIndexRow) -> Result<IndexRow, IndexError> {
        self.inner.insert(row).await
    }

    async fn swap_cid(&self, board_id: &str, expected: &str, new: &str) -> Result<bool, IndexError> {
        let rival = take(&self.rival);
        run_rival(rival).await;
        self.inner.swap_cid(board_id, expected, new).await
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>, IndexError> {
        self.inner.list_by_owner(owner).await
    }
}

#[tokio::test]
async fn pointer_move_before_commit_restarts_and_both_feedbacks_survive() {
    let h = Harness::new();
    let board = h.board().await;
    let racer = Arc::new(RaceOnUpload {
        inner: h.content.clone(),
        rival: Mutex::new(Some((h.rival(), board.clone(), feedback_draft(2)))),
    });
    let (index, ledger) = (h.index.clone(), h.ledger.clone());
    let h = h.with_ports(racer, index, ledger);

    let outcome = h
        .service
        .submit_feedback(ALICE, &board, &feedback_draft(1))
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.document.total_feedback_count, 2);
    let authors: Vec<_> = outcome.document.feedbacks.iter().map(|f| f.created_by.as_str()).collect();
    assert_eq!(authors, vec![BOB, ALICE]);

    // The abandoned first upload was cleaned up: only the head remains.
    assert_eq!(h.content.cids(), vec![outcome.cid.clone()]);
    // create + rival + ours; the raced attempt never hit the ledger
    assert_eq!(h.ledger.calls().len(), 3);
    assert_eq!(h.ledger.board(OWNER, &board).unwrap().feedback_count, 2);
}

#[tokio::test]
async fn pointer_move_after_commit_keeps_the_orphan_and_retries() {
    let h = Harness::new();
    let board = h.board().await;
    let racer = Arc::new(RaceOnSwap {
        inner: h.index.clone(),
        rival: Mutex::new(Some((h.rival(), board.clone(), feedback_draft(2)))),
    });
    let (content, ledger) = (h.content.clone(), h.ledger.clone());
    let h = h.with_ports(content, racer, ledger);

    let outcome = h
        .service
        .submit_feedback(ALICE, &board, &feedback_draft(1))
        .await
        .unwrap();

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.document.total_feedback_count, 2);
    assert!(outcome.document.is_consistent());

    let head = h.index.get(&board).await.unwrap().unwrap().ipfs_cid;
    assert_eq!(head, outcome.cid);
    assert_eq!(h.ledger.board(OWNER, &board).unwrap().ipfs_cid, outcome.cid);
    // head + the first attempt's committed document
    assert_eq!(h.content.len(), 2);
    // create + rival + two committed attempts of ours
    assert_eq!(h.ledger.calls().len(), 4);
    // both of our commits were counted on chain; the document holds one
    assert_eq!(h.ledger.board(OWNER, &board).unwrap().feedback_count, 3);
}

#[tokio::test]
async fn exhausted_attempts_report_a_conflict() {
    struct AlwaysMoved {
        inner: Arc<dyn IndexStore>,
        reads: Mutex<u32>,
    }

    #[async_trait]
    impl IndexStore for AlwaysMoved {
        async fn get(&self, board_id: &str) -> Result<Option<IndexRow>, IndexError> {
            let n = {
                let mut reads = self.reads.lock().unwrap();
                *reads += 1;
                *reads
            };
            let mut row = self.inner.get(board_id).await?;
            // every verification read sees a pointer nobody else ever wrote
            if n % 2 == 0 {
                if let Some(r) = row.as_mut() {
                    r.ipfs_cid = format!("bafymoved{n}");
                }
            }
            Ok(row)
        }

        async fn insert(&self, row: NewIndexRow) -> Result<IndexRow, IndexError> {
            self.inner.insert(row).await
        }

        async fn swap_cid(&self, b: &str, e: &str, n: &str) -> Result<bool, IndexError> {
            self.inner.swap_cid(b, e, n).await
        }

        async fn list_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>, IndexError> {
            self.inner.list_by_owner(owner).await
        }
    }

    let h = Harness::new();
    let board = h.board().await;
    let moved = Arc::new(AlwaysMoved {
        inner: h.index.clone(),
        reads: Mutex::new(0),
    });
    let (content, ledger) = (h.content.clone(), h.ledger.clone());
    let h = h.with_ports(content, moved, ledger);

    let err = h
        .service
        .submit_feedback(ALICE, &board, &feedback_draft(1))
        .await
        .unwrap_err();
    assert!(matches!(err, domains::DomainError::Conflict(_)));
    assert_eq!(h.ledger.calls().len(), 1);
    assert_eq!(h.content.len(), 1);
}

//! # BoardService
//!
//! Orchestrates create / submit / vote across content storage, the ledger
//! and the index store. Every write goes through a `WriteSequence`:
//! upload (compensated by delete) → ledger commit → index update →
//! retire the superseded document.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    BoardDocument, ContentStore, DomainError, Feedback, IndexRow, IndexStore, Ledger,
    NewIndexRow, Result, StoredContent, VoteDirection,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::events::{BoardEvent, EventBus};
use crate::identity;
use crate::sentiment;
use crate::sequence::{Compensation, SequenceReport, StepTag, WriteSequence};
use crate::validation::{validate_board, validate_feedback, BoardDraft, FeedbackDraft};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct BoardCreated {
    pub board_id: String,
    pub cid: String,
    pub url: String,
    pub signature: String,
    pub account: String,
    /// `None` when the index write failed after the ledger commit
    pub index: Option<IndexRow>,
    pub report: SequenceReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionOutcome {
    pub board_id: String,
    pub feedback_id: String,
    pub cid: String,
    pub signature: String,
    pub attempts: u32,
    pub document: BoardDocument,
    pub report: SequenceReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub row: IndexRow,
    pub document: BoardDocument,
    /// `false` when the document could not be fetched and a placeholder is shown
    pub content_available: bool,
}

enum Mutation {
    Append(Feedback),
    Vote {
        feedback_id: String,
        direction: VoteDirection,
    },
}

impl Mutation {
    fn label(&self) -> &'static str {
        match self {
            Mutation::Append(_) => "submit_feedback",
            Mutation::Vote { .. } => "vote",
        }
    }

    fn feedback_id(&self) -> &str {
        match self {
            Mutation::Append(f) => &f.feedback_id,
            Mutation::Vote { feedback_id, .. } => feedback_id,
        }
    }
}

enum Attempt {
    Done(ContributionOutcome),
    /// The index pointer moved underneath this attempt
    Raced,
}

pub struct BoardService {
    content: Arc<dyn ContentStore>,
    index: Arc<dyn IndexStore>,
    ledger: Arc<dyn Ledger>,
    events: EventBus,
    max_attempts: u32,
}

impl BoardService {
    pub fn new(
        content: Arc<dyn ContentStore>,
        index: Arc<dyn IndexStore>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            content,
            index,
            ledger,
            events: EventBus::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Creates a board. Success is reported once the ledger confirmed;
    /// a failed index insert only degrades the outcome.
    #[instrument(skip(self, draft), fields(actor = %actor))]
    pub async fn create_board(&self, actor: &str, draft: &BoardDraft) -> Result<BoardCreated> {
        let draft = validate_board(draft)?;
        let board_id = identity::board_id(actor, &draft.title, &draft.category);
        let document = BoardDocument::new(
            board_id.clone(),
            draft.title,
            draft.description,
            draft.category,
            actor.to_string(),
            Utc::now(),
        );

        let mut seq = WriteSequence::begin("create_board", self.content.as_ref());
        let stored: StoredContent = seq
            .stage(
                StepTag::UploadContent,
                self.content.upload(&document),
                |s: &StoredContent| Compensation::DeleteContent(s.cid.clone()),
            )
            .await?;

        let (receipt, mut committed) = seq
            .commit(
                StepTag::LedgerCommit,
                self.ledger.create_board(actor, &board_id, &stored.cid),
            )
            .await?;

        let index = committed
            .follow_up(
                StepTag::IndexWrite,
                self.index.insert(NewIndexRow {
                    board_id: board_id.clone(),
                    owner: actor.to_string(),
                    ipfs_cid: stored.cid.clone(),
                    anchor_pda: Some(receipt.account.clone()),
                    anchor_tx: Some(receipt.signature.clone()),
                    on_chain: true,
                }),
            )
            .await;

        let report = committed.finish();
        info!(board_id = %board_id, cid = %stored.cid, signature = %receipt.signature, "board created");
        self.events.publish(BoardEvent::BoardCreated {
            board_id: board_id.clone(),
            cid: stored.cid.clone(),
            signature: receipt.signature.clone(),
        });
        self.publish_degraded(&board_id, &report);

        Ok(BoardCreated {
            board_id,
            cid: stored.cid,
            url: stored.url,
            signature: receipt.signature,
            account: receipt.account,
            index,
            report,
        })
    }

    #[instrument(skip(self, draft), fields(actor = %actor, board_id = %board_id))]
    pub async fn submit_feedback(
        &self,
        actor: &str,
        board_id: &str,
        draft: &FeedbackDraft,
    ) -> Result<ContributionOutcome> {
        let draft = validate_feedback(draft)?;
        let created_at = Utc::now();
        let feedback = Feedback {
            feedback_id: identity::feedback_id(actor, &draft.text, created_at),
            feedback_type: draft
                .feedback_type
                .unwrap_or_else(|| sentiment::classify(&draft.text)),
            feedback_text: draft.text,
            created_by: actor.to_string(),
            created_at,
            tags: draft.tags,
            upvotes: 0,
            downvotes: 0,
            upvoted_by: Vec::new(),
            downvoted_by: Vec::new(),
        };
        self.contribute(actor, board_id, Mutation::Append(feedback)).await
    }

    #[instrument(skip(self), fields(actor = %actor, board_id = %board_id))]
    pub async fn vote(
        &self,
        actor: &str,
        board_id: &str,
        feedback_id: &str,
        direction: VoteDirection,
    ) -> Result<ContributionOutcome> {
        self.contribute(
            actor,
            board_id,
            Mutation::Vote {
                feedback_id: feedback_id.to_string(),
                direction,
            },
        )
        .await
    }

    /// Reads never fail on content: an unavailable document degrades to a
    /// placeholder.
    pub async fn load_board(&self, board_id: &str) -> Result<BoardView> {
        let row = self
            .index
            .get(board_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("board".into(), board_id.to_string()))?;
        let (document, content_available) = match self.content.fetch(&row.ipfs_cid).await {
            Some(doc) => (doc, true),
            None => (
                BoardDocument::placeholder(board_id, &row.owner, row.created_at),
                false,
            ),
        };
        Ok(BoardView {
            row,
            document,
            content_available,
        })
    }

    pub async fn boards_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>> {
        Ok(self.index.list_by_owner(owner).await?)
    }

    async fn contribute(
        &self,
        actor: &str,
        board_id: &str,
        mutation: Mutation,
    ) -> Result<ContributionOutcome> {
        for attempt in 1..=self.max_attempts {
            match self.contribute_once(actor, board_id, &mutation, attempt).await? {
                Attempt::Done(outcome) => return Ok(outcome),
                Attempt::Raced => {
                    // The index only advances to cids the ledger acknowledged,
                    // so a retry after a post-commit race records on the ledger
                    // again. On-chain counters then run one ahead per such retry.
                    info!(attempt, max_attempts = self.max_attempts, "index pointer moved, retrying");
                }
            }
        }
        Err(DomainError::Conflict(format!(
            "board {board_id} changed during {} attempts",
            self.max_attempts
        )))
    }

    async fn contribute_once(
        &self,
        actor: &str,
        board_id: &str,
        mutation: &Mutation,
        attempt: u32,
    ) -> Result<Attempt> {
        let mut seq = WriteSequence::begin(mutation.label(), self.content.as_ref());

        let row = seq
            .check(StepTag::ReadIndex, self.index.get(board_id))
            .await?
            .ok_or_else(|| DomainError::NotFound("board".into(), board_id.to_string()))?;
        let cid_old = row.ipfs_cid.clone();

        let mut document = match self.content.fetch(&cid_old).await {
            Some(doc) => doc,
            None => {
                warn!(cid = %cid_old, "current document unavailable, rebuilding from empty board");
                BoardDocument::placeholder(board_id, &row.owner, row.created_at)
            }
        };

        match mutation {
            Mutation::Append(feedback) => document.append_feedback(feedback.clone())?,
            Mutation::Vote {
                feedback_id,
                direction,
            } => document.apply_vote(feedback_id, actor, *direction)?,
        }

        let stored: StoredContent = seq
            .stage(
                StepTag::UploadContent,
                self.content.upload(&document),
                |s: &StoredContent| Compensation::DeleteContent(s.cid.clone()),
            )
            .await?;

        let current = seq
            .check(StepTag::VerifyPointer, self.index.get(board_id))
            .await?;
        if current.as_ref().map(|r| r.ipfs_cid.as_str()) != Some(cid_old.as_str()) {
            seq.abandon().await;
            return Ok(Attempt::Raced);
        }

        let ledger_call = async {
            match mutation {
                Mutation::Append(_) => {
                    self.ledger
                        .submit_feedback(actor, &row.owner, board_id, &stored.cid)
                        .await
                }
                Mutation::Vote { direction, .. } => {
                    self.ledger
                        .vote(actor, &row.owner, board_id, &stored.cid, *direction)
                        .await
                }
            }
        };
        let (signature, mut committed) = seq.commit(StepTag::LedgerCommit, ledger_call).await?;

        match committed
            .follow_up(
                StepTag::IndexWrite,
                self.index.swap_cid(board_id, &cid_old, &stored.cid),
            )
            .await
        {
            Some(true) => committed.retire(StepTag::RetireSuperseded, &cid_old).await,
            Some(false) => {
                // The ledger already points at `stored.cid`; it stays as an
                // orphan and the next attempt advances the pointer again.
                warn!(cid = %stored.cid, "index pointer moved after ledger commit");
                committed.finish();
                return Ok(Attempt::Raced);
            }
            // Index still references `cid_old`, so it must survive.
            None => {}
        }

        let report = committed.finish();
        let feedback_id = mutation.feedback_id().to_string();
        info!(
            board_id = %board_id,
            feedback_id = %feedback_id,
            cid = %stored.cid,
            signature = %signature,
            "contribution recorded"
        );
        let event = match mutation {
            Mutation::Append(_) => BoardEvent::FeedbackSubmitted {
                board_id: board_id.to_string(),
                feedback_id: feedback_id.clone(),
                cid: stored.cid.clone(),
                signature: signature.clone(),
            },
            Mutation::Vote { .. } => BoardEvent::VoteRecorded {
                board_id: board_id.to_string(),
                feedback_id: feedback_id.clone(),
                cid: stored.cid.clone(),
                signature: signature.clone(),
            },
        };
        self.events.publish(event);
        self.publish_degraded(board_id, &report);

        Ok(Attempt::Done(ContributionOutcome {
            board_id: board_id.to_string(),
            feedback_id,
            cid: stored.cid,
            signature,
            attempts: attempt,
            document,
            report,
        }))
    }

    fn publish_degraded(&self, board_id: &str, report: &SequenceReport) {
        if report.is_degraded() {
            self.events.publish(BoardEvent::SequenceDegraded {
                board_id: board_id.to_string(),
                degraded: report.degraded.clone(),
            });
        }
    }
}

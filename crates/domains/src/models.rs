//! # Domain Models
//!
//! A board lives in two places: the full JSON document in content storage
//! (`BoardDocument`) and a lightweight pointer row in the index store
//! (`IndexRow`). Content documents are immutable; every mutation below
//! produces the next document version, which the orchestrator uploads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Sentiment bucket of a feedback item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Positive,
    Negative,
    Neutral,
}

impl std::str::FromStr for FeedbackType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(DomainError::Validation(format!(
                "unknown feedback type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// A single contribution to a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub feedback_id: String,
    pub feedback_text: String,
    pub feedback_type: FeedbackType,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    /// Actors that already upvoted; enforces one upvote per actor
    #[serde(default)]
    pub upvoted_by: Vec<String>,
    /// Actors that already downvoted; enforces one downvote per actor
    #[serde(default)]
    pub downvoted_by: Vec<String>,
}

/// The board document as stored in content-addressed storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDocument {
    pub board_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub latest_feedback_by: Option<String>,
    #[serde(default)]
    pub latest_feedback_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_feedback_count: u64,
    #[serde(default)]
    pub feedbacks: Vec<Feedback>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl BoardDocument {
    pub fn new(
        board_id: String,
        title: String,
        description: String,
        category: String,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            board_id,
            title,
            description,
            category,
            created_by,
            created_at,
            latest_feedback_by: None,
            latest_feedback_at: None,
            total_feedback_count: 0,
            feedbacks: Vec::new(),
            is_archived: false,
            archived_at: None,
        }
    }

    /// Empty stand-in used when the current document cannot be fetched.
    pub fn placeholder(board_id: &str, owner: &str, created_at: DateTime<Utc>) -> Self {
        Self::new(
            board_id.to_string(),
            String::new(),
            String::new(),
            String::new(),
            owner.to_string(),
            created_at,
        )
    }

    /// Appends a feedback item and refreshes the denormalized counters.
    pub fn append_feedback(&mut self, feedback: Feedback) -> Result<(), DomainError> {
        if self.is_archived {
            return Err(DomainError::Archived(self.board_id.clone()));
        }
        self.latest_feedback_by = Some(feedback.created_by.clone());
        self.latest_feedback_at = Some(feedback.created_at);
        self.feedbacks.push(feedback);
        self.total_feedback_count = self.feedbacks.len() as u64;
        Ok(())
    }

    /// Records a vote by `voter` on `feedback_id`.
    pub fn apply_vote(
        &mut self,
        feedback_id: &str,
        voter: &str,
        direction: VoteDirection,
    ) -> Result<(), DomainError> {
        if self.is_archived {
            return Err(DomainError::Archived(self.board_id.clone()));
        }
        let feedback = self
            .feedbacks
            .iter_mut()
            .find(|f| f.feedback_id == feedback_id)
            .ok_or_else(|| DomainError::NotFound("feedback".into(), feedback_id.to_string()))?;

        if feedback.created_by == voter {
            return Err(DomainError::Forbidden(
                "cannot vote on your own feedback".into(),
            ));
        }

        let (voters, counter) = match direction {
            VoteDirection::Up => (&mut feedback.upvoted_by, &mut feedback.upvotes),
            VoteDirection::Down => (&mut feedback.downvoted_by, &mut feedback.downvotes),
        };
        if voters.iter().any(|v| v == voter) {
            return Err(DomainError::Forbidden(format!(
                "already voted {direction:?} on feedback {feedback_id}"
            )));
        }
        voters.push(voter.to_string());
        *counter += 1;
        Ok(())
    }

    /// Marks the board archived. Archival is terminal.
    pub fn archive(&mut self, at: DateTime<Utc>) {
        if !self.is_archived {
            self.is_archived = true;
            self.archived_at = Some(at);
        }
    }

    /// `total_feedback_count` must track `feedbacks.len()`.
    pub fn is_consistent(&self) -> bool {
        self.total_feedback_count == self.feedbacks.len() as u64
    }

    pub fn feedback(&self, feedback_id: &str) -> Option<&Feedback> {
        self.feedbacks.iter().find(|f| f.feedback_id == feedback_id)
    }
}

/// Sentinel CID for documents that were never uploaded.
pub const LOCAL_ONLY_CID: &str = "local-only";

/// `true` for the `local-only` sentinel and any `local-` prefixed id.
pub fn is_local_only(cid: &str) -> bool {
    cid == LOCAL_ONLY_CID || cid.starts_with("local-")
}

/// Result of a successful content upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    pub cid: String,
    pub url: String,
}

/// Outcome of a best-effort content deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// The relational side record pointing at a board's current document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub board_id: String,
    pub owner: String,
    pub ipfs_cid: String,
    pub anchor_pda: Option<String>,
    pub anchor_tx: Option<String>,
    pub on_chain: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a fresh index row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIndexRow {
    pub board_id: String,
    pub owner: String,
    pub ipfs_cid: String,
    pub anchor_pda: Option<String>,
    pub anchor_tx: Option<String>,
    pub on_chain: bool,
}

/// Ledger acknowledgment of a board creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub signature: String,
    /// Deterministic board account derived from (creator, board_id)
    pub account: String,
}

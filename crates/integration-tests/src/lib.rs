//! Shared fixtures for the scenario tests: a fully wired in-memory stack.

use std::sync::Arc;

use chain_adapters::InMemoryLedger;
use domains::{ContentStore, IndexStore, Ledger};
use services::{BoardDraft, BoardService, FeedbackDraft};
use storage_adapters::{InMemoryContentStore, InMemoryIndexStore};

pub const PROGRAM_ID: &str = "BoardProg1111111111111111111111111111111111";
pub const OWNER: &str = "OwnerAddr1111111111111111111111111111111111";
pub const ALICE: &str = "AliceAddr1111111111111111111111111111111111";
pub const BOB: &str = "BobAddr11111111111111111111111111111111111";

/// In-memory adapters plus a service wired to them. Tests keep the concrete
/// handles to inspect state and flip fault switches.
pub struct Harness {
    pub content: Arc<InMemoryContentStore>,
    pub index: Arc<InMemoryIndexStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub service: BoardService,
}

impl Harness {
    pub fn new() -> Self {
        let content = Arc::new(InMemoryContentStore::new());
        let index = Arc::new(InMemoryIndexStore::new());
        let ledger = Arc::new(InMemoryLedger::new(PROGRAM_ID));
        let service = BoardService::new(content.clone(), index.clone(), ledger.clone());
        Self {
            content,
            index,
            ledger,
            service,
        }
    }

    /// A second service over the same stores, as another process would see them.
    pub fn rival(&self) -> BoardService {
        BoardService::new(self.content.clone(), self.index.clone(), self.ledger.clone())
    }

    /// Rewires the service through decorated ports.
    pub fn with_ports(
        mut self,
        content: Arc<dyn ContentStore>,
        index: Arc<dyn IndexStore>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        self.service = BoardService::new(content, index, ledger);
        self
    }

    /// Creates the standard test board owned by `OWNER`; returns its id.
    pub async fn board(&self) -> String {
        self.service
            .create_board(OWNER, &board_draft())
            .await
            .map(|created| created.board_id)
            .unwrap_or_else(|e| panic!("fixture board creation failed: {e}"))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn board_draft() -> BoardDraft {
    BoardDraft {
        title: "Product roadmap".into(),
        description: "Tell us what to build next quarter.".into(),
        category: "product".into(),
    }
}

/// A valid feedback draft; `n` keeps texts (and therefore ids) distinct.
pub fn feedback_draft(n: usize) -> FeedbackDraft {
    FeedbackDraft {
        text: format!(
            "Feedback number {n}: the export flow is confusing and needs a clearer final step."
        ),
        feedback_type: None,
        tags: vec!["UX".into()],
    }
}

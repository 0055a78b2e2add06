//! Stand-ins used when a backend is not configured. Reads degrade to
//! "nothing there"; writes fail with a `Disabled` error.

use async_trait::async_trait;
use domains::{
    BoardDocument, ContentError, ContentStore, DeleteOutcome, IndexError, IndexRow, IndexStore,
    NewIndexRow, StoredContent,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledContentStore;

#[async_trait]
impl ContentStore for DisabledContentStore {
    async fn upload(&self, _document: &BoardDocument) -> Result<StoredContent, ContentError> {
        Err(ContentError::Disabled)
    }

    async fn fetch(&self, _cid: &str) -> Option<BoardDocument> {
        None
    }

    async fn delete_by_cid(&self, _cid: &str) -> DeleteOutcome {
        DeleteOutcome::failed("content storage is not configured")
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledIndexStore;

#[async_trait]
impl IndexStore for DisabledIndexStore {
    async fn get(&self, _board_id: &str) -> Result<Option<IndexRow>, IndexError> {
        Ok(None)
    }

    async fn insert(&self, _row: NewIndexRow) -> Result<IndexRow, IndexError> {
        Err(IndexError::Disabled)
    }

    async fn swap_cid(&self, _board_id: &str, _expected: &str, _new: &str) -> Result<bool, IndexError> {
        Err(IndexError::Disabled)
    }

    async fn list_by_owner(&self, _owner: &str) -> Result<Vec<IndexRow>, IndexError> {
        Ok(Vec::new())
    }
}

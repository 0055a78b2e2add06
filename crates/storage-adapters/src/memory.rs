//! # In-memory adapters
//!
//! Process-local content and index stores. Documents are content-addressed
//! by the SHA-256 of their JSON bytes, so identical documents share a CID.
//! Both stores carry fault switches so callers can exercise the failure
//! paths of a write sequence.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use domains::{
    is_local_only, BoardDocument, ContentError, ContentStore, DeleteOutcome, IndexError, IndexRow,
    IndexStore, NewIndexRow, StoredContent,
};
use sha2::{Digest, Sha256};
use tracing::debug;

pub struct InMemoryContentStore {
    documents: DashMap<String, BoardDocument>,
    gateway: String,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::with_gateway("memory.local")
    }

    pub fn with_gateway(gateway: &str) -> Self {
        Self {
            documents: DashMap::new(),
            gateway: gateway.to_string(),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, cid: &str) -> bool {
        self.documents.contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn cids(&self) -> Vec<String> {
        self.documents.iter().map(|e| e.key().clone()).collect()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `bafy` + first 52 hex chars of the SHA-256 of the bytes.
fn content_address(bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("bafy{}", &digest[..52])
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn upload(&self, document: &BoardDocument) -> Result<StoredContent, ContentError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ContentError::Upload("injected upload failure".into()));
        }
        let bytes =
            serde_json::to_vec(document).map_err(|e| ContentError::Serialization(e.to_string()))?;
        let cid = content_address(&bytes);
        self.documents.insert(cid.clone(), document.clone());
        debug!(cid = %cid, size = bytes.len(), "document stored in memory");
        Ok(StoredContent {
            url: format!("https://{}/ipfs/{}", self.gateway, cid),
            cid,
        })
    }

    async fn fetch(&self, cid: &str) -> Option<BoardDocument> {
        if is_local_only(cid) {
            return None;
        }
        self.documents.get(cid).map(|doc| doc.clone())
    }

    async fn delete_by_cid(&self, cid: &str) -> DeleteOutcome {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return DeleteOutcome::failed("injected delete failure");
        }
        match self.documents.remove(cid) {
            Some(_) => DeleteOutcome::ok(),
            None => DeleteOutcome::failed(format!("no file found for cid {cid}")),
        }
    }
}

#[derive(Default)]
pub struct InMemoryIndexStore {
    rows: DashMap<String, IndexRow>,
    fail_writes: AtomicBool,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Direct pointer overwrite, bypassing the compare-and-swap.
    pub fn force_cid(&self, board_id: &str, cid: &str) {
        if let Some(mut row) = self.rows.get_mut(board_id) {
            row.ipfs_cid = cid.to_string();
            row.updated_at = Utc::now();
        }
    }

    fn check_writable(&self) -> Result<(), IndexError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(IndexError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn get(&self, board_id: &str) -> Result<Option<IndexRow>, IndexError> {
        Ok(self.rows.get(board_id).map(|row| row.clone()))
    }

    async fn insert(&self, row: NewIndexRow) -> Result<IndexRow, IndexError> {
        self.check_writable()?;
        let now = Utc::now();
        let stored = IndexRow {
            board_id: row.board_id.clone(),
            owner: row.owner,
            ipfs_cid: row.ipfs_cid,
            anchor_pda: row.anchor_pda,
            anchor_tx: row.anchor_tx,
            on_chain: row.on_chain,
            created_at: now,
            updated_at: now,
        };
        match self.rows.entry(row.board_id) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(IndexError::Duplicate(e.key().clone())),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn swap_cid(
        &self,
        board_id: &str,
        expected_cid: &str,
        new_cid: &str,
    ) -> Result<bool, IndexError> {
        self.check_writable()?;
        match self.rows.get_mut(board_id) {
            Some(mut row) if row.ipfs_cid == expected_cid => {
                row.ipfs_cid = new_cid.to_string();
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>, IndexError> {
        let mut rows: Vec<IndexRow> = self
            .rows
            .iter()
            .filter(|e| e.owner == owner)
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

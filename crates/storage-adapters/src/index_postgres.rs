//! # Postgres index store
//!
//! Maps `feedback_boards` rows to `IndexRow`. The pointer update is a single
//! `UPDATE ... WHERE ipfs_cid = $expected`, so the row lock gives us the
//! compare-and-swap for free.

use async_trait::async_trait;
use domains::{IndexError, IndexRow, IndexStore, NewIndexRow};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

const COLUMNS: &str =
    "board_id, owner, ipfs_cid, anchor_pda, anchor_tx, on_chain, created_at, updated_at";

pub struct PgIndexStore {
    pool: PgPool,
}

fn unavailable(e: sqlx::Error) -> IndexError {
    IndexError::Unavailable(e.to_string())
}

fn map_row(row: &PgRow) -> IndexRow {
    IndexRow {
        board_id: row.get("board_id"),
        owner: row.get("owner"),
        ipfs_cid: row.get("ipfs_cid"),
        anchor_pda: row.get("anchor_pda"),
        anchor_tx: row.get("anchor_tx"),
        on_chain: row.get("on_chain"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl PgIndexStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations.
    pub async fn connect(url: &str) -> Result<Self, IndexError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(unavailable)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| IndexError::Unavailable(format!("migration failed: {e}")))?;
        info!("postgres index store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl IndexStore for PgIndexStore {
    async fn get(&self, board_id: &str) -> Result<Option<IndexRow>, IndexError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM feedback_boards WHERE board_id = $1"
        ))
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(row.as_ref().map(map_row))
    }

    async fn insert(&self, row: NewIndexRow) -> Result<IndexRow, IndexError> {
        let result = sqlx::query(&format!(
            "INSERT INTO feedback_boards (board_id, owner, ipfs_cid, anchor_pda, anchor_tx, on_chain) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        ))
        .bind(&row.board_id)
        .bind(&row.owner)
        .bind(&row.ipfs_cid)
        .bind(&row.anchor_pda)
        .bind(&row.anchor_tx)
        .bind(row.on_chain)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(r) => Ok(map_row(&r)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(IndexError::Duplicate(row.board_id))
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn swap_cid(
        &self,
        board_id: &str,
        expected_cid: &str,
        new_cid: &str,
    ) -> Result<bool, IndexError> {
        let done = sqlx::query(
            "UPDATE feedback_boards SET ipfs_cid = $3, updated_at = now() \
             WHERE board_id = $1 AND ipfs_cid = $2",
        )
        .bind(board_id)
        .bind(expected_cid)
        .bind(new_cid)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(done.rows_affected() == 1)
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>, IndexError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM feedback_boards WHERE owner = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(rows.iter().map(map_row).collect())
    }
}

//! # REST index store
//!
//! Index rows behind a PostgREST-style endpoint: `select/insert/update`
//! on `{url}/rest/v1/{table}` with `eq.` filters. The pointer update is a
//! filtered PATCH on both `board_id` and the expected `ipfs_cid`, so it only
//! lands when nobody moved the pointer first.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use domains::{IndexError, IndexRow, IndexStore, NewIndexRow};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

#[derive(Debug)]
pub struct RestIndexConfig {
    pub url: String,
    pub key: SecretString,
    pub table: String,
    pub timeout: Duration,
}

pub struct RestIndexStore {
    client: Client,
    endpoint: String,
    key: SecretString,
}

#[derive(Serialize)]
struct InsertBody<'a> {
    #[serde(flatten)]
    row: &'a NewIndexRow,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
struct PointerPatch<'a> {
    ipfs_cid: &'a str,
    updated_at: chrono::DateTime<Utc>,
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl RestIndexStore {
    pub fn new(config: RestIndexConfig) -> Result<Self, IndexError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IndexError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        let endpoint = format!(
            "{}/rest/v1/{}",
            config.url.trim_end_matches('/'),
            config.table
        );
        Ok(Self {
            client,
            endpoint,
            key: config.key,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.key.expose_secret();
        builder
            .header("apikey", key)
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
    }

    async fn rows(&self, response: Response) -> Result<Vec<IndexRow>, IndexError> {
        let status = response.status();
        if status == StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_default();
            return Err(IndexError::Duplicate(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IndexError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| IndexError::Unavailable(format!("unreadable index response: {e}")))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Vec<IndexRow>, IndexError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;
        self.rows(response).await
    }
}

#[async_trait]
impl IndexStore for RestIndexStore {
    async fn get(&self, board_id: &str) -> Result<Option<IndexRow>, IndexError> {
        let rows = self
            .send(
                self.client
                    .get(&self.endpoint)
                    .query(&[("board_id", eq(board_id)), ("select", "*".into())]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, row: NewIndexRow) -> Result<IndexRow, IndexError> {
        let now = Utc::now();
        let body = InsertBody {
            row: &row,
            created_at: now,
            updated_at: now,
        };
        let rows = self
            .send(
                self.client
                    .post(&self.endpoint)
                    .header("Prefer", "return=representation")
                    .json(&body),
            )
            .await
            .map_err(|e| match e {
                IndexError::Duplicate(_) => IndexError::Duplicate(row.board_id.clone()),
                other => other,
            })?;
        debug!(board_id = %row.board_id, "index row inserted");
        rows.into_iter()
            .next()
            .ok_or_else(|| IndexError::Unavailable("insert returned no row".into()))
    }

    async fn swap_cid(
        &self,
        board_id: &str,
        expected_cid: &str,
        new_cid: &str,
    ) -> Result<bool, IndexError> {
        let rows = self
            .send(
                self.client
                    .patch(&self.endpoint)
                    .query(&[("board_id", eq(board_id)), ("ipfs_cid", eq(expected_cid))])
                    .header("Prefer", "return=representation")
                    .json(&PointerPatch {
                        ipfs_cid: new_cid,
                        updated_at: Utc::now(),
                    }),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<IndexRow>, IndexError> {
        self.send(self.client.get(&self.endpoint).query(&[
            ("owner", eq(owner)),
            ("select", "*".into()),
            ("order", "created_at.desc".into()),
        ]))
        .await
    }
}

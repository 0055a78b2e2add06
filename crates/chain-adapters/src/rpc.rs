//! # JSON-RPC ledger
//!
//! Talks to a signing relay that exposes the board program as JSON-RPC 2.0
//! methods. The relay holds the key for `signer`, builds the transaction,
//! and returns the signature once it is confirmed.
//!
//! | Port call          | Method               |
//! |--------------------|----------------------|
//! | `create_board`     | `createFeedbackBoard`|
//! | `submit_feedback`  | `submitFeedback`     |
//! | `vote` (up/down)   | `upvoteFeedback` / `downvoteFeedback` |
//! | `balance_lamports` | `getBalance`         |

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use domains::{BalanceReader, Ledger, LedgerError, LedgerErrorKind, LedgerReceipt, VoteDirection};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::accounts::board_account;
use crate::classify::ledger_error;

#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    pub rpc_url: String,
    pub program_id: String,
    /// Receives the program's per-instruction fee
    pub fee_recipient: String,
    pub timeout: Duration,
}

pub struct JsonRpcLedger {
    config: RpcLedgerConfig,
    client: Client,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    /// `null` when the relay could not read the request id
    #[allow(dead_code)]
    #[serde(default)]
    id: Option<u64>,
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    /// Program logs, when the relay ran a simulation
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SignatureResult {
    signature: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstructionParams<'a> {
    program_id: &'a str,
    board_account: String,
    signer: &'a str,
    fee_recipient: &'a str,
    board_id: &'a str,
    ipfs_cid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    board_creator: Option<&'a str>,
}

impl JsonRpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LedgerError::new(
                    LedgerErrorKind::Other,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;
        Ok(Self {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn account_for(&self, creator: &str, board_id: &str) -> String {
        board_account(&self.config.program_id, creator, board_id)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<T, LedgerError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "ledger rpc call");

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "network request failed"
                };
                LedgerError::new(LedgerErrorKind::Network, format!("{reason}: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            LedgerError::new(
                LedgerErrorKind::Network,
                format!("failed to read response: {e}"),
            )
        })?;
        if !status.is_success() {
            // 429 and 5xx read as network trouble through the classifier
            return Err(ledger_error(None, format!("HTTP {status}: {body}")));
        }

        let rpc: JsonRpcResponse<T> = serde_json::from_str(&body).map_err(|e| {
            LedgerError::new(
                LedgerErrorKind::Other,
                format!("failed to parse response: {e}"),
            )
        })?;

        if let Some(error) = rpc.error {
            let detail = match &error.data {
                Some(data) => format!("{} {}", error.message, data),
                None => error.message.clone(),
            };
            let err = ledger_error(Some(error.code), detail);
            warn!(method, code = error.code, kind = ?err.kind, "ledger rpc error");
            return Err(err);
        }

        rpc.result.ok_or_else(|| {
            LedgerError::new(LedgerErrorKind::Other, "missing result in response")
        })
    }

    async fn instruction(
        &self,
        method: &'static str,
        actor: &str,
        creator: &str,
        board_id: &str,
        cid: &str,
    ) -> Result<String, LedgerError> {
        let params = InstructionParams {
            program_id: &self.config.program_id,
            board_account: self.account_for(creator, board_id),
            signer: actor,
            fee_recipient: &self.config.fee_recipient,
            board_id,
            ipfs_cid: cid,
            board_creator: (actor != creator).then_some(creator),
        };
        let params = serde_json::to_value(params).map_err(|e| {
            LedgerError::new(LedgerErrorKind::Other, format!("failed to encode params: {e}"))
        })?;
        let result: SignatureResult = self.call(method, vec![params]).await?;
        Ok(result.signature)
    }
}

#[async_trait]
impl Ledger for JsonRpcLedger {
    async fn create_board(
        &self,
        actor: &str,
        board_id: &str,
        cid: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let signature = self
            .instruction("createFeedbackBoard", actor, actor, board_id, cid)
            .await?;
        Ok(LedgerReceipt {
            signature,
            account: self.account_for(actor, board_id),
        })
    }

    async fn submit_feedback(
        &self,
        actor: &str,
        board_creator: &str,
        board_id: &str,
        new_cid: &str,
    ) -> Result<String, LedgerError> {
        self.instruction("submitFeedback", actor, board_creator, board_id, new_cid)
            .await
    }

    async fn vote(
        &self,
        actor: &str,
        board_creator: &str,
        board_id: &str,
        new_cid: &str,
        direction: VoteDirection,
    ) -> Result<String, LedgerError> {
        let method = match direction {
            VoteDirection::Up => "upvoteFeedback",
            VoteDirection::Down => "downvoteFeedback",
        };
        self.instruction(method, actor, board_creator, board_id, new_cid)
            .await
    }
}

#[async_trait]
impl BalanceReader for JsonRpcLedger {
    async fn balance_lamports(&self, actor: &str) -> Result<u64, LedgerError> {
        let result: BalanceResult = self
            .call("getBalance", vec![json!(actor), json!({ "commitment": "confirmed" })])
            .await?;
        Ok(result.value)
    }
}

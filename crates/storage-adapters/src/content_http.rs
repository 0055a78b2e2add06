//! # HTTP content store
//!
//! Pinning-service client: multipart upload, gateway retrieval and
//! delete-by-CID (look up the file id for a CID, then delete that id).

use std::time::Duration;

use async_trait::async_trait;
use domains::{
    is_local_only, BoardDocument, ContentError, ContentStore, DeleteOutcome, StoredContent,
};
use reqwest::{header, multipart, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct HttpContentConfig {
    /// Gateway hostname used for retrieval URLs, e.g. `gateway.example.cloud`
    pub gateway: String,
    /// Base of the file management API, e.g. `https://api.example.cloud/v3`
    pub api_url: String,
    /// Upload endpoint
    pub upload_url: String,
    pub token: SecretString,
    /// Deadline for gateway reads
    pub fetch_timeout: Duration,
    /// Client-wide deadline for every other request (upload, lookup, delete)
    pub request_timeout: Duration,
}

pub struct HttpContentStore {
    config: HttpContentConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    #[allow(dead_code)]
    id: String,
    cid: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
    cid: String,
}

impl HttpContentStore {
    pub fn new(config: HttpContentConfig) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ContentError::Upload(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Retrieval URL for a CID. A gateway given with a scheme is used as-is.
    pub fn gateway_url(&self, cid: &str) -> String {
        let gateway = self.config.gateway.trim_end_matches('/');
        if gateway.starts_with("http://") || gateway.starts_with("https://") {
            format!("{gateway}/ipfs/{cid}")
        } else {
            format!("https://{gateway}/ipfs/{cid}")
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.token.expose_secret())
    }

    async fn find_file_ids(&self, cid: &str) -> Result<Vec<String>, String> {
        let url = format!("{}/files/public", self.config.api_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.bearer())
            .query(&[("cid", cid)])
            .send()
            .await
            .map_err(|e| format!("list request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("list returned {}", response.status()));
        }
        let list: Envelope<FileList> = response
            .json()
            .await
            .map_err(|e| format!("list response unreadable: {e}"))?;
        Ok(list
            .data
            .files
            .into_iter()
            .filter(|f| f.cid == cid)
            .map(|f| f.id)
            .collect())
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn upload(&self, document: &BoardDocument) -> Result<StoredContent, ContentError> {
        let body = serde_json::to_vec(document)
            .map_err(|e| ContentError::Serialization(e.to_string()))?;
        let size = body.len();

        let file = multipart::Part::bytes(body)
            .file_name(format!("board-{}.json", document.board_id))
            .mime_str(mime::APPLICATION_JSON.as_ref())
            .map_err(|e| ContentError::Upload(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("name", format!("board-{}", document.board_id))
            .text("network", "public");

        let response = self
            .client
            .post(&self.config.upload_url)
            .header(header::AUTHORIZATION, self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ContentError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: Envelope<UploadedFile> = response
            .json()
            .await
            .map_err(|e| ContentError::Serialization(e.to_string()))?;
        let cid = uploaded.data.cid;
        debug!(cid = %cid, size, "document uploaded");
        Ok(StoredContent {
            url: self.gateway_url(&cid),
            cid,
        })
    }

    async fn fetch(&self, cid: &str) -> Option<BoardDocument> {
        if is_local_only(cid) {
            return None;
        }
        let response = match self
            .client
            .get(self.gateway_url(cid))
            .timeout(self.config.fetch_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(cid = %cid, timeout = e.is_timeout(), error = %e, "gateway fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(cid = %cid, status = %response.status(), "gateway returned non-success");
            return None;
        }

        match response.json::<BoardDocument>().await {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(cid = %cid, error = %e, "gateway document unreadable");
                None
            }
        }
    }

    async fn delete_by_cid(&self, cid: &str) -> DeleteOutcome {
        if is_local_only(cid) {
            return DeleteOutcome::ok();
        }
        let ids = match self.find_file_ids(cid).await {
            Ok(ids) if ids.is_empty() => {
                return DeleteOutcome::failed(format!("no file found for cid {cid}"))
            }
            Ok(ids) => ids,
            Err(e) => return DeleteOutcome::failed(e),
        };

        let base = self.config.api_url.trim_end_matches('/');
        for id in ids {
            let result = self
                .client
                .delete(format!("{base}/files/public/{id}"))
                .header(header::AUTHORIZATION, self.bearer())
                .send()
                .await;
            match result {
                Ok(r) if r.status().is_success() => {
                    debug!(cid = %cid, file_id = %id, "document deleted");
                }
                Ok(r) => return DeleteOutcome::failed(format!("delete returned {}", r.status())),
                Err(e) => return DeleteOutcome::failed(format!("delete request failed: {e}")),
            }
        }
        DeleteOutcome::ok()
    }
}

//! Adapter selection. Unconfigured storage falls back to the disabled
//! adapters so read-only commands still work.

use std::sync::Arc;

use chain_adapters::{JsonRpcLedger, RpcLedgerConfig};
use configs::{ContentSettings, IndexBackend, IndexSettings, Settings};
use domains::{ContentStore, DomainError, IndexStore};
use services::{BalanceGuard, BoardService, EventBus};
use storage_adapters::{DisabledContentStore, DisabledIndexStore};
use tracing::{info, warn};

pub struct App {
    pub service: BoardService,
    pub guard: BalanceGuard,
    pub events: EventBus,
}

pub async fn build(settings: Settings) -> anyhow::Result<App> {
    let Settings {
        content,
        index,
        ledger,
        balance,
        sequence,
        ..
    } = settings;

    let content = match content {
        Some(c) => content_store(c)?,
        None => {
            warn!("no [content] section, content storage disabled");
            Arc::new(DisabledContentStore)
        }
    };
    let index = match index {
        Some(i) => index_store(i).await?,
        None => {
            warn!("no [index] section, board index disabled");
            Arc::new(DisabledIndexStore)
        }
    };

    let ledger = Arc::new(
        JsonRpcLedger::new(RpcLedgerConfig {
            timeout: ledger.timeout(),
            rpc_url: ledger.rpc_url,
            program_id: ledger.program_id,
            fee_recipient: ledger.fee_recipient,
        })
        .map_err(DomainError::from)?,
    );

    let events = EventBus::default();
    let service = BoardService::new(content, index, ledger.clone())
        .with_events(events.clone())
        .with_max_attempts(sequence.max_attempts);
    let guard = BalanceGuard::new(ledger, balance.min_sol);
    info!(min_sol = guard.min_sol(), "services ready");

    Ok(App {
        service,
        guard,
        events,
    })
}

#[cfg(feature = "content-http")]
fn content_store(settings: ContentSettings) -> anyhow::Result<Arc<dyn ContentStore>> {
    use storage_adapters::{HttpContentConfig, HttpContentStore};

    let store = HttpContentStore::new(HttpContentConfig {
        fetch_timeout: settings.fetch_timeout(),
        request_timeout: settings.request_timeout(),
        gateway: settings.gateway,
        api_url: settings.api_url,
        upload_url: settings.upload_url,
        token: settings.token,
    })
    .map_err(DomainError::from)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "content-http"))]
fn content_store(_settings: ContentSettings) -> anyhow::Result<Arc<dyn ContentStore>> {
    warn!("built without content-http, content storage disabled");
    Ok(Arc::new(DisabledContentStore))
}

async fn index_store(settings: IndexSettings) -> anyhow::Result<Arc<dyn IndexStore>> {
    match settings.backend {
        IndexBackend::Rest => rest_index(settings),
        IndexBackend::Postgres => postgres_index(settings).await,
    }
}

#[cfg(feature = "index-rest")]
fn rest_index(settings: IndexSettings) -> anyhow::Result<Arc<dyn IndexStore>> {
    use storage_adapters::{RestIndexConfig, RestIndexStore};

    let timeout = settings.timeout();
    let key = settings
        .key
        .ok_or_else(|| anyhow::anyhow!("index.key is required for the rest backend"))?;
    let store = RestIndexStore::new(RestIndexConfig {
        timeout,
        url: settings.url,
        key,
        table: settings.table,
    })
    .map_err(DomainError::from)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "index-rest"))]
fn rest_index(_settings: IndexSettings) -> anyhow::Result<Arc<dyn IndexStore>> {
    warn!("built without index-rest, board index disabled");
    Ok(Arc::new(DisabledIndexStore))
}

#[cfg(feature = "db-postgres")]
async fn postgres_index(settings: IndexSettings) -> anyhow::Result<Arc<dyn IndexStore>> {
    use storage_adapters::PgIndexStore;

    if settings.table != "feedback_boards" {
        warn!(table = %settings.table, "postgres backend always uses the migrated feedback_boards table");
    }
    let store = PgIndexStore::connect(&settings.url)
        .await
        .map_err(DomainError::from)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_index(_settings: IndexSettings) -> anyhow::Result<Arc<dyn IndexStore>> {
    warn!("built without db-postgres, board index disabled");
    Ok(Arc::new(DisabledIndexStore))
}

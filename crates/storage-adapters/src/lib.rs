//! feedback-board/crates/storage-adapters/src/lib.rs
//!
//! Content-store and index-store implementations of the `domains` ports.
//!
//! | Module | Port | Feature |
//! |--------|------|---------|
//! | `memory` | `ContentStore`, `IndexStore` | always |
//! | `disabled` | `ContentStore`, `IndexStore` | always |
//! | `content_http` | `ContentStore` | `content-http` |
//! | `index_rest` | `IndexStore` | `index-rest` |
//! | `index_postgres` | `IndexStore` | `db-postgres` |

pub mod disabled;
pub mod memory;

#[cfg(feature = "content-http")]
pub mod content_http;

#[cfg(feature = "index-rest")]
pub mod index_rest;

#[cfg(feature = "db-postgres")]
pub mod index_postgres;

pub use disabled::{DisabledContentStore, DisabledIndexStore};
pub use memory::{InMemoryContentStore, InMemoryIndexStore};

#[cfg(feature = "content-http")]
pub use content_http::{HttpContentConfig, HttpContentStore};

#[cfg(feature = "index-rest")]
pub use index_rest::{RestIndexConfig, RestIndexStore};

#[cfg(feature = "db-postgres")]
pub use index_postgres::PgIndexStore;

//! # souq-client: REST Client for Souq Back Office
//!
//! Every request the back office makes to its REST backend goes through
//! this crate. Business rules stay in `souq-core`; this crate moves records
//! over the wire and runs the invoice save chain.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        souq-client                                      │
//! │                                                                         │
//! │  ClientConfig ──► Backend ──┬── EntityRepository<T>  drivers, branches │
//! │  (TOML + env)               │                        customers, ...    │
//! │                             ├── CatalogRepository    lookups, rates    │
//! │                             └── InvoiceRepository    show/filter/save  │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                   ApiClient (reqwest, bearer token)    │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                             /{resource}/{index,show,store,...}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Requests are awaited one at a time, except lookup loads and invoice
//! show, which are joined with `tokio::try_join!`. Nothing is retried.
//!
//! ## Modules
//!
//! - [`config`] - Client configuration (file + environment)
//! - [`http`] - JSON request helpers and error mapping
//! - [`resource`] - Resource paths, list queries, paginated responses
//! - [`repository`] - Entity, catalog and invoice repositories
//! - [`backend`] - Configured handle handing out repositories
//! - [`error`] - Client error types and user-facing messages

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod repository;
pub mod resource;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::Backend;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use resource::{DateRange, ListQuery, Page, Resource, SortOrder};

// Repository re-exports for convenience
pub use repository::{
    CatalogRepository, Entity, EntityRepository, FilterLookups, InvoiceRepository,
    InvoiceWithLines, Lookups, SaveOutcome,
};

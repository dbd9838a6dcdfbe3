//! # Repository Module
//!
//! Backend access for Souq, one repository per concern.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  backend.drivers().index(&query)                               │
//! │       ▼                                                                 │
//! │  EntityRepository<Driver>                                              │
//! │  ├── index(&self, query)                                               │
//! │  ├── show(&self, id)                                                   │
//! │  ├── store(&self, record)                                              │
//! │  ├── update(&self, id, record)                                         │
//! │  └── delete(&self, id)                                                 │
//! │       │                                                                 │
//! │       │  /driver/index?page=1&pageSize=10                              │
//! │       ▼                                                                 │
//! │  ApiClient (reqwest)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`EntityRepository`] - Generic CRUD for drivers, branches, customers, ...
//! - [`CatalogRepository`] - Items, units, currencies and form lookups
//! - [`InvoiceRepository`] - Invoice headers, lines and the save chain

pub mod catalog;
pub mod entity;
pub mod invoice;

pub use catalog::{CatalogRepository, FilterLookups, Lookups};
pub use entity::{Entity, EntityRepository};
pub use invoice::{InvoiceRepository, InvoiceWithLines, SaveOutcome};

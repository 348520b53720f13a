//! # jsonrepo - File-backed JSON record store
//!
//! jsonrepo is a small persistence layer that stores a homogeneous
//! collection of records as a single JSON document on disk and exposes
//! create/read/update/delete operations plus a declarative query
//! capability (wildcard field filtering and multi-key, type-aware
//! sorting).
//!
//! ## Key Features
//!
//! - **Embedded**: one JSON file per record type, no server process
//! - **Lazy, write-through**: the collection is loaded at most once per
//!   process lifetime and every mutation is persisted immediately
//! - **Consistency rules**: monotonic identifier assignment and optional
//!   key-field uniqueness enforced on every mutation
//! - **Querying**: anchored `*`-wildcard filters and ordered multi-key
//!   sort directives with locale-aware string comparison
//! - **Extensible reads**: an optional enrichment hook augments records
//!   with computed fields before they are returned
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jsonrepo::model::{Model, ModelProvider};
//! use jsonrepo::query::QueryParams;
//! use jsonrepo::repository::Repository;
//! use jsonrepo::record;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Repository::builder()
//!     .data_dir("./data")
//!     .model(contact_model())
//!     .build()?;
//!
//! // Add a record; the repository assigns the identifier
//! let stored = repository
//!     .add(record! { Name: "Alice", Email: "alice@example.com" })
//!     .expect("valid record");
//!
//! // Query with a wildcard filter and a sort directive
//! let params = QueryParams::new().filter("Name", "Al*").sort("Name,desc");
//! let results = repository.get_all(Some(&params))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! A repository is meant for single-process, cooperative use: one
//! [FileStore](store::FileStore) owns its backing document exclusively and
//! all file I/O is synchronous. Nothing coordinates independent processes
//! sharing one document; concurrent external writers race and the last
//! full-document write wins.
//!
//! ## Module Organization
//!
//! - [`common`] - Shared types: [common::Value], [common::SortOrder], utilities
//! - [`errors`] - Error types and result definitions
//! - [`record`] - The open-ended record type and the [record!] macro
//! - [`model`] - The external model collaborator interface
//! - [`enricher`] - The read-side extra-data enrichment hook
//! - [`store`] - The lazy, write-through file-backed store
//! - [`query`] - Query parameters, wildcard matching, and sorting
//! - [`repository`] - The public CRUD facade

pub mod common;
pub mod enricher;
pub mod errors;
pub mod model;
pub mod query;
pub mod record;
pub mod repository;
pub mod store;

pub use common::{SortOrder, Value};
pub use enricher::{Enricher, EnricherProvider};
pub use errors::{ErrorKind, RepoError, RepoResult};
pub use model::{Model, ModelProvider};
pub use query::QueryParams;
pub use record::{Record, CONFLICT_FIELD, ID_FIELD};
pub use repository::{Repository, RepositoryBuilder, UpdateResult};
pub use store::FileStore;

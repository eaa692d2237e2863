//! kanban-board/crates/kb-core/src/lib.rs
//!
//! The ordered-collection engine for the board: linked list/card chains,
//! cascade removal planned from reads and committed as one batch, and the
//! ports every storage and auth plugin implements.

pub mod audit;
pub mod batch;
pub mod cascade;
pub mod envelope;
pub mod error;
pub mod models;
pub mod path;
pub mod requests;
pub mod schema;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use batch::{Write, WriteBatch, MAX_BATCH_WRITES};
pub use envelope::ResultEnvelope;
pub use error::*;
pub use models::*;
pub use path::{CollectionPath, DocPath};
pub use service::{BoardService, CallContext, Operation};
pub use traits::*;

//! # Write Batches
//!
//! A `WriteBatch` is applied by the store as one unit: every write lands or
//! none does. Batches carry no reads; anything a batch depends on has to be
//! read before it is assembled.

use crate::error::{AppError, Result};
use crate::path::DocPath;
use crate::traits::Document;

/// Upper bound on writes per batch, matching common document stores.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or replace the whole document.
    Set { path: DocPath, data: Document },
    /// Merge top-level fields into an existing document.
    Update { path: DocPath, fields: Document },
    /// Remove the document; absent documents are ignored.
    Delete { path: DocPath },
}

impl Write {
    pub fn path(&self) -> &DocPath {
        match self {
            Write::Set { path, .. } | Write::Update { path, .. } | Write::Delete { path } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocPath, data: Document) -> &mut Self {
        self.writes.push(Write::Set { path, data });
        self
    }

    pub fn update(&mut self, path: DocPath, fields: Document) -> &mut Self {
        self.writes.push(Write::Update { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.writes.push(Write::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    /// Store adapters call this before touching anything.
    pub fn check_size(&self) -> Result<()> {
        if self.writes.len() > MAX_BATCH_WRITES {
            return Err(AppError::store(format!(
                "batch of {} writes exceeds the limit of {MAX_BATCH_WRITES}",
                self.writes.len()
            )));
        }
        Ok(())
    }
}

//! Trait definitions for the retriever module.

use std::path::Path;

use async_trait::async_trait;

use super::error::RetrievalError;
use super::types::{RetrievalRequest, RetrievedFile};

/// A client that fulfils one retrieval request by writing a file.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns the name of this retriever implementation.
    fn name(&self) -> &str;

    /// Retrieves the requested data into `target`.
    ///
    /// The parent directory of `target` already exists. Implementations
    /// overwrite any existing file.
    async fn retrieve(
        &self,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<RetrievedFile, RetrievalError>;
}

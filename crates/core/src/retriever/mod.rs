//! Data provider abstraction.
//!
//! The orchestrator only sees the [`Retriever`] trait. [`CdsClient`] talks to
//! the Copernicus Climate Data Store; tests use
//! [`MockRetriever`](crate::testing::MockRetriever).

mod cds;
mod credentials;
mod error;
mod traits;
mod types;

pub use cds::CdsClient;
pub use credentials::CdsCredentials;
pub use error::RetrievalError;
pub use traits::Retriever;
pub use types::{RetrievalRequest, RetrievedFile};

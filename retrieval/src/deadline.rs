//! Per-call deadlines for external collaborators.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{RagError, Result};

/// The external call a deadline applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Embedding provider call.
    Embed,
    /// Vector store write.
    StoreInsert,
    /// Vector store delete.
    StoreDelete,
    /// Vector store nearest-neighbor query.
    StoreQuery,
    /// Generative model call.
    Generate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Embed => "embedding request",
            Operation::StoreInsert => "store insert",
            Operation::StoreDelete => "store delete",
            Operation::StoreQuery => "store query",
            Operation::Generate => "generation request",
        };
        f.write_str(name)
    }
}

/// Run `fut` to completion, or fail with [`RagError::Timeout`] once
/// `timeout` elapses. With no timeout the call is unbounded.
///
/// The future is dropped on expiry; collaborators must tolerate
/// cancellation at any await point. A timed-out store write has an
/// indeterminate outcome: the store either commits the whole change or
/// none of it, but the caller cannot tell which.
pub(crate) async fn bounded<T, E, F>(
    operation: Operation,
    timeout: Option<Duration>,
    fut: F,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<RagError>,
{
    let Some(after) = timeout else {
        return fut.await.map_err(Into::into);
    };

    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            warn!("{operation} timed out after {after:?}");
            Err(RagError::Timeout { operation, after })
        }
    }
}

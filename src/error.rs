//! Error taxonomy.
//!
//! Host-binding failures propagate out of the render entry points unmodified;
//! there is no retry and no rollback of mutations already applied, so a
//! failed render can leave the host tree partially committed.

use thiserror::Error;

use crate::host::HostError;

/// Failure of a render or re-render pass.
#[derive(Debug, Error)]
pub enum RenderError {
    /// `rerender` was called before any tree was rendered.
    #[error("no tree has been rendered yet")]
    NoRoot,

    /// A dispatch or render entry point was re-entered while a render pass
    /// was still running (e.g. dispatching from inside a component body).
    #[error("a render pass is already in progress")]
    RenderInProgress,

    /// The host binding failed to create, update, or remove an instance.
    #[error(transparent)]
    Host(#[from] HostError),
}

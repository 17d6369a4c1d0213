//! The reconciliation engine.
//!
//! - [`arena`] - fiber storage: one arena per render generation
//! - `reconcile` - the render phase: walk previous fibers and new elements in
//!   lockstep, annotate mutations, tear down mismatches eagerly
//! - `commit` - the commit phase: apply host mutations, collect the
//!   notification order
//! - [`root`] - entry points and the current-generation cursor

pub mod arena;
mod commit;
mod reconcile;
pub mod root;

pub use root::{is_mounted, render, rerender, reset};

//! Identity core: who is using an application instance, and how that changes.
//!
//! ARCHITECTURE
//! ============
//! `model` holds the plain data types; `context` is the single writer that
//! publishes snapshots for route guards to read.

pub mod context;
pub mod model;

pub use context::IdentityContext;

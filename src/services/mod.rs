//! Domain services used by the page and form routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own backend calls and session persistence so route
//! handlers can stay focused on cookies, guards and rendering.

pub mod auth;
pub mod backend;
pub mod feedback;
pub mod session_store;
pub mod sweeper;

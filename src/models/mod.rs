//! Request and Response models for batch cache operations
//!
//! Shapes accepted by `save` and returned by `save` and `load`. All of them
//! are serde types so callers can feed batches straight from JSON.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::SaveItem;
pub use responses::{LoadResponse, LoadedFile, SaveResponse};

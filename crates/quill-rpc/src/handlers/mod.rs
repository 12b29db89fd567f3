// crates/quill-rpc/src/handlers/mod.rs
//
// Handler modules, one per surface, plus the helpers they share.

pub mod feed;
pub mod posts;
pub mod replies;
pub mod trust;
pub mod visit;

use serde::de::DeserializeOwned;

use quill_core::error::QuillError;

use crate::middleware::ApiRequest;

/// Decode a JSON request body. Malformed bodies are the caller's mistake.
pub fn parse_body<T: DeserializeOwned>(req: &ApiRequest) -> Result<T, QuillError> {
    serde_json::from_slice(&req.body)
        .map_err(|e| QuillError::InvalidInput(format!("malformed request body: {}", e)))
}

/// Reject non-admin callers of operator surfaces.
pub fn require_admin(req: &ApiRequest) -> Result<(), QuillError> {
    if req.caller.is_admin() {
        Ok(())
    } else {
        Err(QuillError::Unauthorized("admin credential required".to_string()))
    }
}

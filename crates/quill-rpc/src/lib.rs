// crates/quill-rpc/src/lib.rs
//
// quill-rpc: HTTP/1 server and handlers for Quill.
//
// Exposes the federation surfaces other instances call (trust check, feed
// push), the visit-time hint on post views, reply submission, connection
// establishment, and the collaborator surfaces for posts, feed and operator
// views. Routing is a plain match on method and path segments.

pub mod context;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

// Re-export the main server types for ergonomic access.
pub use context::AppContext;
pub use server::{HttpConfig, QuillHttpServer};

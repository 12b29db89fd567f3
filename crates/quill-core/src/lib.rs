// crates/quill-core/src/lib.rs
//
// quill-core: Core types, traits, and error taxonomy for the Quill protocol.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the trust records (Connection, Subscription), the received feed
// mirror (FeedEntry) and its wire payload, the locally authored content the
// protocol reads (Post, Reply), caller identity, origin helpers, and the
// store traits that every component receives by injection.

pub mod content;
pub mod error;
pub mod feed;
pub mod identity;
pub mod origin;
pub mod traits;
pub mod trust;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use quill_core::FeedPayload;`

// Trust records
pub use trust::{Connection, Subscription};

// Feed types
pub use feed::{FeedEntry, FeedPayload, ReplyRef};

// Content types
pub use content::{slugify, NewPost, Post, PostSummary, Reply};

// Identity
pub use identity::Caller;

// Origins
pub use origin::{normalize_origin, origin_url};

// Error type
pub use error::QuillError;

// Traits
pub use traits::{ContentSanitizer, ContentStore, FeedStore, TrustStore};

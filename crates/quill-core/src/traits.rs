// crates/quill-core/src/traits.rs

use async_trait::async_trait;

use crate::content::{NewPost, Post, PostSummary, Reply};
use crate::error::QuillError;
use crate::feed::{FeedEntry, FeedPayload};
use crate::trust::{Connection, Subscription};

/// Persisted sets of Connections (inbound trust) and Subscriptions
/// (outbound push targets).
///
/// Every operation runs in its own atomic transaction. Inserts are
/// idempotent: concurrent calls for the same origin both succeed and leave
/// exactly one row.
///
/// Implemented by quill-store (RocksDB backend).
#[async_trait]
pub trait TrustStore: Send + Sync {
    /// Insert a Connection if absent. Returns the stored record, existing or new.
    async fn record_connection(&self, origin: &str) -> Result<Connection, QuillError>;

    /// Whether a Connection exists for `origin`.
    async fn has_connection(&self, origin: &str) -> Result<bool, QuillError>;

    /// All Connections, in origin order.
    async fn list_connections(&self) -> Result<Vec<Connection>, QuillError>;

    /// Insert a Subscription if absent. Returns the stored record, existing or new.
    async fn record_subscription(&self, origin: &str) -> Result<Subscription, QuillError>;

    /// Origins of all Subscriptions, in origin order.
    async fn list_subscriptions(&self) -> Result<Vec<String>, QuillError>;
}

/// Received mirrors of remote posts.
///
/// Implemented by quill-store (RocksDB backend).
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Insert or overwrite the FeedEntry for `payload.post_id` in one
    /// transaction. Returns the row as written and, if a row already
    /// existed, the row it replaced.
    async fn upsert_feed_entry(
        &self,
        payload: &FeedPayload,
    ) -> Result<(FeedEntry, Option<FeedEntry>), QuillError>;

    /// Look up a FeedEntry by remote post id.
    async fn get_feed_entry(&self, post_id: &str) -> Result<Option<FeedEntry>, QuillError>;

    /// All FeedEntries, most recently updated first.
    async fn list_feed_entries(&self) -> Result<Vec<FeedEntry>, QuillError>;
}

/// Local posts and replies.
///
/// Implemented by quill-store (RocksDB backend).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a post. Fails with `Conflict` if its slug is already taken.
    async fn create_post(&self, draft: &NewPost) -> Result<Post, QuillError>;

    /// Overwrite title, content and teaser of the post at `slug`.
    /// The slug itself never changes.
    async fn update_post(&self, slug: &str, draft: &NewPost) -> Result<Post, QuillError>;

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>, QuillError>;

    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, QuillError>;

    /// All posts with reply counts, newest first.
    async fn list_posts(&self) -> Result<Vec<PostSummary>, QuillError>;

    /// Persist a reply. The post must exist.
    async fn create_reply(
        &self,
        post_id: &str,
        origin: &str,
        content: &str,
    ) -> Result<Reply, QuillError>;

    /// Replies of a post in creation order.
    async fn list_replies(&self, post_id: &str) -> Result<Vec<Reply>, QuillError>;
}

/// Cleans untrusted reply content before it is persisted.
pub trait ContentSanitizer: Send + Sync {
    fn sanitize(&self, content: &str) -> String;
}

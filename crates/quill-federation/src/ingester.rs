// crates/quill-federation/src/ingester.rs
//
// Receiving side of the feed push: accept payloads only from origins we
// hold a Connection for, and upsert the mirror row.

use std::sync::Arc;

use quill_core::error::QuillError;
use quill_core::feed::{FeedEntry, FeedPayload};
use quill_core::origin::normalize_origin;
use quill_core::traits::{FeedStore, TrustStore};

pub struct FeedIngester {
    trust: Arc<dyn TrustStore>,
    feed: Arc<dyn FeedStore>,
}

impl FeedIngester {
    pub fn new(trust: Arc<dyn TrustStore>, feed: Arc<dyn FeedStore>) -> Self {
        Self { trust, feed }
    }

    /// Authorize and apply one pushed payload.
    ///
    /// Rejects with `Unauthorized` (and writes nothing) unless the payload's
    /// origin holds a Connection. Otherwise the FeedEntry for `post_id` is
    /// inserted or overwritten, last write wins. Out-of-order pushes are
    /// logged but still applied.
    pub async fn ingest(&self, mut payload: FeedPayload) -> Result<FeedEntry, QuillError> {
        if payload.post_id.trim().is_empty() {
            return Err(QuillError::InvalidInput("postId is empty".to_string()));
        }
        let origin = normalize_origin(&payload.origin)
            .map_err(|_| QuillError::Unauthorized(format!("untrusted origin '{}'", payload.origin)))?;

        if !self.trust.has_connection(&origin).await? {
            tracing::warn!(
                "Rejected feed push for post {} from untrusted origin {}",
                payload.post_id,
                origin
            );
            return Err(QuillError::Unauthorized(format!(
                "no connection for origin '{}'",
                origin
            )));
        }
        payload.origin = origin;

        let (entry, previous) = self.feed.upsert_feed_entry(&payload).await?;
        match previous {
            Some(prev) if prev.is_stale(&payload) => {
                tracing::warn!(
                    "Stale push for post {} from {}: payload {:?} older than stored {:?}; overwriting",
                    entry.post_id,
                    entry.origin,
                    payload.updated_at,
                    prev.remote_updated_at
                );
            }
            Some(_) => tracing::info!(
                "Updated feed entry {} from {} ({} replies)",
                entry.post_id,
                entry.origin,
                entry.reply_count
            ),
            None => tracing::info!("New feed entry {} from {}", entry.post_id, entry.origin),
        }

        Ok(entry)
    }

    pub async fn list(&self) -> Result<Vec<FeedEntry>, QuillError> {
        self.feed.list_feed_entries().await
    }

    pub async fn get(&self, post_id: &str) -> Result<Option<FeedEntry>, QuillError> {
        self.feed.get_feed_entry(post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use quill_core::feed::ReplyRef;
    use quill_store::RocksStore;
    use uuid::Uuid;

    fn setup() -> (Arc<RocksStore>, FeedIngester) {
        let path = std::env::temp_dir().join(format!("quill_test_ingester_{}", Uuid::now_v7()));
        let store = Arc::new(RocksStore::open(&path.to_string_lossy()).unwrap());
        let ingester = FeedIngester::new(store.clone(), store.clone());
        (store, ingester)
    }

    fn payload(origin: &str, teaser: &str, reply_ids: &[&str]) -> FeedPayload {
        FeedPayload {
            post_id: "p1".to_string(),
            origin: origin.to_string(),
            path: "/posts/p1".to_string(),
            title: "P1".to_string(),
            teaser: teaser.to_string(),
            replies: reply_ids
                .iter()
                .map(|id| ReplyRef {
                    reply_id: id.to_string(),
                    origin: "c.example".to_string(),
                })
                .collect(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_trusted_pushes_upsert_one_row() {
        let (store, ingester) = setup();
        store.record_connection("a.example").await.unwrap();

        ingester.ingest(payload("a.example", "old", &[])).await.unwrap();
        let entry = ingester
            .ingest(payload("a.example", "new", &["r1", "r2"]))
            .await
            .unwrap();

        assert_eq!(entry.teaser, "new");
        assert_eq!(entry.reply_count, 2);
        let all = ingester.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].post_id, "p1");
    }

    #[tokio::test]
    async fn test_untrusted_push_rejected_without_write() {
        let (_store, ingester) = setup();

        let err = ingester.ingest(payload("a.example", "old", &[])).await.unwrap_err();
        assert!(matches!(err, QuillError::Unauthorized(_)));
        assert!(ingester.get("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_origin_is_normalized_before_lookup() {
        let (store, ingester) = setup();
        store.record_connection("a.example").await.unwrap();

        let entry = ingester
            .ingest(payload("https://A.example/", "t", &[]))
            .await
            .unwrap();
        assert_eq!(entry.origin, "a.example");
    }

    #[tokio::test]
    async fn test_stale_push_still_applies() {
        let (store, ingester) = setup();
        store.record_connection("a.example").await.unwrap();

        let now = Utc::now();
        let mut newer = payload("a.example", "v2", &["r1"]);
        newer.updated_at = Some(now);
        ingester.ingest(newer).await.unwrap();

        let mut older = payload("a.example", "v1", &[]);
        older.updated_at = Some(now - Duration::seconds(10));
        let entry = ingester.ingest(older).await.unwrap();

        assert_eq!(entry.teaser, "v1");
        assert_eq!(entry.reply_count, 0);
    }

    #[tokio::test]
    async fn test_empty_post_id_is_invalid() {
        let (store, ingester) = setup();
        store.record_connection("a.example").await.unwrap();

        let mut p = payload("a.example", "t", &[]);
        p.post_id = " ".to_string();
        let err = ingester.ingest(p).await.unwrap_err();
        assert!(matches!(err, QuillError::InvalidInput(_)));
    }
}

// crates/quill-federation/src/publisher.rs
//
// Best-effort fan-out of a post's summary and reply ledger to every
// Subscription.
//
// Delivery is at-most-once: no retry, no ordering across subscribers or
// across successive publishes of the same post. Each push runs in its own
// task, so one slow or failing subscriber never affects another, and the
// triggering operation never waits on any of them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use quill_core::error::QuillError;
use quill_core::feed::FeedPayload;
use quill_core::traits::{ContentStore, TrustStore};

use crate::client::FederationClient;

/// Default bound on simultaneous outbound pushes.
pub const DEFAULT_MAX_CONCURRENT_PUSHES: usize = 16;

/// Per-publish delivery summary. Logged, and returned to whoever awaits the
/// background task (tests, the CLI status path).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FanOutReport {
    pub post_id: String,
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

impl FanOutReport {
    fn empty(post_id: &str) -> Self {
        Self {
            post_id: post_id.to_string(),
            ..Default::default()
        }
    }
}

struct PublisherInner {
    content: Arc<dyn ContentStore>,
    trust: Arc<dyn TrustStore>,
    client: FederationClient,
    permits: Arc<Semaphore>,
}

/// Pushes post deltas to subscribers. Cheap to clone.
#[derive(Clone)]
pub struct FeedPublisher {
    inner: Arc<PublisherInner>,
}

impl FeedPublisher {
    pub fn new(
        content: Arc<dyn ContentStore>,
        trust: Arc<dyn TrustStore>,
        client: FederationClient,
        max_concurrent_pushes: usize,
    ) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                content,
                trust,
                client,
                permits: Arc::new(Semaphore::new(max_concurrent_pushes.max(1))),
            }),
        }
    }

    /// Build the payload for `post_id` from the current post and all of its
    /// replies.
    pub async fn build_payload(&self, post_id: &str) -> Result<FeedPayload, QuillError> {
        let post = self
            .inner
            .content
            .get_post(post_id)
            .await?
            .ok_or_else(|| QuillError::NotFound(format!("post '{}'", post_id)))?;
        let replies = self.inner.content.list_replies(post_id).await?;
        Ok(post.feed_payload(self.inner.client.my_origin(), &replies))
    }

    /// Publish `post_id` in the background.
    ///
    /// Returns immediately. The handle may be dropped; awaiting it yields
    /// the delivery report.
    pub fn publish_post(&self, post_id: &str) -> JoinHandle<FanOutReport> {
        let publisher = self.clone();
        let post_id = post_id.to_string();

        tokio::spawn(async move {
            match publisher.build_payload(&post_id).await {
                Ok(payload) => publisher.fan_out(payload).await,
                Err(e) => {
                    tracing::warn!("Not publishing post {}: {}", post_id, e);
                    FanOutReport::empty(&post_id)
                }
            }
        })
    }

    /// Push `payload` to every current Subscription and collect the outcome.
    pub async fn fan_out(&self, payload: FeedPayload) -> FanOutReport {
        let mut report = FanOutReport::empty(&payload.post_id);

        let subscribers = match self.inner.trust.list_subscriptions().await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::warn!("Cannot list subscriptions for post {}: {}", payload.post_id, e);
                return report;
            }
        };
        if subscribers.is_empty() {
            return report;
        }

        tracing::debug!(
            "Publishing post {} to {} subscribers",
            payload.post_id,
            subscribers.len()
        );

        let payload = Arc::new(payload);
        let mut tasks = Vec::with_capacity(subscribers.len());
        for subscriber in subscribers {
            let client = self.inner.client.clone();
            let permits = self.inner.permits.clone();
            let payload = payload.clone();
            let target = subscriber.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| QuillError::NetworkUnavailable(e.to_string()))?;
                client.push_feed(&target, &payload).await
            });
            tasks.push((subscriber, handle));
        }

        for (subscriber, handle) in tasks {
            match handle.await {
                Ok(Ok(())) => {
                    tracing::debug!("Pushed post {} to {}", payload.post_id, subscriber);
                    report.delivered.push(subscriber);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Push of post {} to {} failed: {}", payload.post_id, subscriber, e);
                    report.failed.push(subscriber);
                }
                Err(e) => {
                    tracing::warn!("Push task for {} aborted: {}", subscriber, e);
                    report.failed.push(subscriber);
                }
            }
        }

        tracing::info!(
            "Published post {}: {} delivered, {} failed",
            report.post_id,
            report.delivered.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use uuid::Uuid;

    use quill_core::content::NewPost;
    use quill_store::RocksStore;

    fn store() -> Arc<RocksStore> {
        let path = std::env::temp_dir().join(format!("quill_test_publisher_{}", Uuid::now_v7()));
        Arc::new(RocksStore::open(&path.to_string_lossy()).unwrap())
    }

    /// Subscriber that answers every request with 200 and counts them.
    async fn accepting_subscriber(hits: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let hits = hits.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let _ = sock.read(&mut buf).await;
                    hits.fetch_add(1, Ordering::SeqCst);
                    let body = r#"{"status":"ok"}"#;
                    let resp = format!(
                        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = sock.write_all(resp.as_bytes()).await;
                });
            }
        });
        addr.to_string()
    }

    /// Subscriber that accepts connections and never answers.
    async fn hanging_subscriber() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                held.push(sock);
            }
        });
        addr.to_string()
    }

    async fn seeded_post(store: &RocksStore) -> String {
        let post = store
            .create_post(&NewPost {
                title: "Hello".to_string(),
                content: "body".to_string(),
                teaser: "tease".to_string(),
            })
            .await
            .unwrap();
        store
            .create_reply(&post.post_id, "b.example", "hi")
            .await
            .unwrap();
        post.post_id
    }

    #[tokio::test]
    async fn test_build_payload() {
        let store = store();
        let post_id = seeded_post(&store).await;
        let publisher = FeedPublisher::new(
            store.clone(),
            store.clone(),
            FederationClient::new("http", "a.example", Duration::from_secs(1)).unwrap(),
            4,
        );

        let payload = publisher.build_payload(&post_id).await.unwrap();
        assert_eq!(payload.origin, "a.example");
        assert_eq!(payload.path, "/posts/hello");
        assert_eq!(payload.replies.len(), 1);
        assert_eq!(payload.replies[0].origin, "b.example");

        let err = publisher.build_payload("missing").await.unwrap_err();
        assert!(matches!(err, QuillError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_no_subscribers_is_empty_report() {
        let store = store();
        let post_id = seeded_post(&store).await;
        let publisher = FeedPublisher::new(
            store.clone(),
            store.clone(),
            FederationClient::new("http", "a.example", Duration::from_secs(1)).unwrap(),
            4,
        );

        let report = publisher.publish_post(&post_id).await.unwrap();
        assert_eq!(report.post_id, post_id);
        assert!(report.delivered.is_empty());
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_one_hanging_subscriber_does_not_block_others() {
        let store = store();
        let post_id = seeded_post(&store).await;

        let hits = Arc::new(AtomicUsize::new(0));
        let good_a = accepting_subscriber(hits.clone()).await;
        let good_b = accepting_subscriber(hits.clone()).await;
        let bad = hanging_subscriber().await;
        for origin in [&good_a, &good_b, &bad] {
            store.record_subscription(origin).await.unwrap();
        }

        let publisher = FeedPublisher::new(
            store.clone(),
            store.clone(),
            FederationClient::new("http", "a.example", Duration::from_millis(300)).unwrap(),
            4,
        );

        let started = Instant::now();
        let report = publisher.publish_post(&post_id).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(report.delivered.len(), 2);
        assert!(report.delivered.contains(&good_a));
        assert!(report.delivered.contains(&good_b));
        assert_eq!(report.failed, vec![bad]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_subscriber_is_reported_failed() {
        let store = store();
        let post_id = seeded_post(&store).await;
        store.record_subscription("127.0.0.1:1").await.unwrap();

        let publisher = FeedPublisher::new(
            store.clone(),
            store.clone(),
            FederationClient::new("http", "a.example", Duration::from_millis(300)).unwrap(),
            1,
        );

        let report = publisher.publish_post(&post_id).await.unwrap();
        assert_eq!(report.failed, vec!["127.0.0.1:1".to_string()]);
    }
}

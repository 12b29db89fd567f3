// crates/quill-store/src/rocks.rs
//
// RocksDB-backed persistent storage for trust records, feed entries, and
// local content.
//
// Key format:
//   - `conn:{origin}`              -> JSON Connection
//   - `sub:{origin}`               -> JSON Subscription
//   - `feed:{post_id}`             -> JSON FeedEntry (received mirror)
//   - `post:{post_id}`             -> JSON Post
//   - `slug:{slug}`                -> post_id (secondary index)
//   - `reply:{post_id}:{reply_id}` -> JSON Reply
//
// Reply ids are UUID v7, so a prefix scan over `reply:{post_id}:` yields
// replies in creation order.

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{
    Direction, IteratorMode, MultiThreaded, Options, TransactionDB, TransactionDBOptions,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use quill_core::content::{NewPost, Post, PostSummary, Reply};
use quill_core::error::QuillError;
use quill_core::feed::{FeedEntry, FeedPayload};
use quill_core::traits::{ContentStore, FeedStore, TrustStore};
use quill_core::trust::{Connection, Subscription};

/// RocksDB wrapper implementing `TrustStore`, `FeedStore` and `ContentStore`.
pub struct RocksStore {
    db: TransactionDB<MultiThreaded>,
    path: String,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore").field("path", &self.path).finish()
    }
}

impl RocksStore {
    /// Open a RocksDB transaction database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, QuillError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let txn_opts = TransactionDBOptions::default();

        let db = TransactionDB::<MultiThreaded>::open(&opts, &txn_opts, path).map_err(|e| {
            QuillError::Storage(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        Ok(Self {
            db,
            path: path.to_string(),
        })
    }

    fn connection_key(origin: &str) -> Vec<u8> {
        format!("conn:{}", origin).into_bytes()
    }

    fn subscription_key(origin: &str) -> Vec<u8> {
        format!("sub:{}", origin).into_bytes()
    }

    fn feed_key(post_id: &str) -> Vec<u8> {
        format!("feed:{}", post_id).into_bytes()
    }

    fn post_key(post_id: &str) -> Vec<u8> {
        format!("post:{}", post_id).into_bytes()
    }

    fn slug_key(slug: &str) -> Vec<u8> {
        format!("slug:{}", slug).into_bytes()
    }

    fn reply_prefix(post_id: &str) -> String {
        format!("reply:{}:", post_id)
    }

    fn reply_key(post_id: &str, reply_id: &str) -> Vec<u8> {
        format!("reply:{}:{}", post_id, reply_id).into_bytes()
    }

    /// Get and decode a JSON value outside of any transaction.
    fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, QuillError> {
        match self.db.get(key).map_err(storage_err("get"))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Insert `make()` under `key` unless a value is already present.
    ///
    /// The key is locked with `get_for_update` for the duration of the
    /// transaction, so a concurrent caller for the same key waits and then
    /// observes the committed value instead of writing its own.
    fn insert_if_absent<T, F>(&self, key: &[u8], make: F) -> Result<T, QuillError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let txn = self.db.transaction();
        if let Some(bytes) = txn
            .get_for_update(key, true)
            .map_err(storage_err("get_for_update"))?
        {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let value = make();
        txn.put(key, serde_json::to_vec(&value)?)
            .map_err(storage_err("put"))?;
        txn.commit().map_err(storage_err("commit"))?;
        Ok(value)
    }

    /// Decode every value whose key starts with `prefix`, in key order.
    fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, QuillError> {
        let prefix = prefix.as_bytes();
        let mut values = Vec::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(storage_err("iteration"))?;

            // Keys are sorted; stop when the prefix no longer matches.
            if !key.starts_with(prefix) {
                break;
            }
            values.push(serde_json::from_slice(&value)?);
        }

        Ok(values)
    }

    /// Count keys under `prefix` without decoding values.
    fn count_prefix(&self, prefix: &str) -> Result<usize, QuillError> {
        let prefix = prefix.as_bytes();
        let mut count = 0;
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(storage_err("iteration"))?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    pub fn record_connection_sync(&self, origin: &str) -> Result<Connection, QuillError> {
        self.insert_if_absent(&Self::connection_key(origin), || Connection::new(origin))
    }

    pub fn record_subscription_sync(&self, origin: &str) -> Result<Subscription, QuillError> {
        self.insert_if_absent(&Self::subscription_key(origin), || {
            Subscription::new(origin)
        })
    }

    pub fn upsert_feed_entry_sync(
        &self,
        payload: &FeedPayload,
    ) -> Result<(FeedEntry, Option<FeedEntry>), QuillError> {
        let key = Self::feed_key(&payload.post_id);
        let now = Utc::now();

        let txn = self.db.transaction();
        let previous: Option<FeedEntry> = match txn
            .get_for_update(&key, true)
            .map_err(storage_err("get_for_update"))?
        {
            Some(bytes) => Some(serde_json::from_slice(&bytes)?),
            None => None,
        };

        let entry = match &previous {
            Some(existing) => {
                let mut entry = existing.clone();
                entry.apply(payload, now);
                entry
            }
            None => FeedEntry::from_payload(payload, now),
        };

        txn.put(&key, serde_json::to_vec(&entry)?)
            .map_err(storage_err("put"))?;
        txn.commit().map_err(storage_err("commit"))?;

        Ok((entry, previous))
    }

    pub fn create_post_sync(&self, draft: &NewPost) -> Result<Post, QuillError> {
        let post = Post::new(draft);
        let slug_key = Self::slug_key(&post.slug);

        let txn = self.db.transaction();
        if txn
            .get_for_update(&slug_key, true)
            .map_err(storage_err("get_for_update"))?
            .is_some()
        {
            return Err(QuillError::Conflict(format!(
                "slug '{}' is already taken",
                post.slug
            )));
        }

        txn.put(Self::post_key(&post.post_id), serde_json::to_vec(&post)?)
            .map_err(storage_err("put"))?;
        txn.put(&slug_key, post.post_id.as_bytes())
            .map_err(storage_err("put"))?;
        txn.commit().map_err(storage_err("commit"))?;

        Ok(post)
    }

    pub fn update_post_sync(&self, slug: &str, draft: &NewPost) -> Result<Post, QuillError> {
        let txn = self.db.transaction();
        let post_id = match txn
            .get_for_update(Self::slug_key(slug), false)
            .map_err(storage_err("get_for_update"))?
        {
            Some(bytes) => String::from_utf8(bytes)
                .map_err(|e| QuillError::Storage(format!("corrupt slug index: {}", e)))?,
            None => return Err(QuillError::NotFound(format!("post '{}'", slug))),
        };

        let post_key = Self::post_key(&post_id);
        let mut post: Post = match txn
            .get_for_update(&post_key, true)
            .map_err(storage_err("get_for_update"))?
        {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => return Err(QuillError::NotFound(format!("post '{}'", slug))),
        };

        post.title = draft.title.clone();
        post.content = draft.content.clone();
        post.teaser = draft.teaser.clone();
        post.updated_at = Utc::now();

        txn.put(&post_key, serde_json::to_vec(&post)?)
            .map_err(storage_err("put"))?;
        txn.commit().map_err(storage_err("commit"))?;

        Ok(post)
    }

    pub fn get_post_sync(&self, post_id: &str) -> Result<Option<Post>, QuillError> {
        self.get_json(&Self::post_key(post_id))
    }

    pub fn get_post_by_slug_sync(&self, slug: &str) -> Result<Option<Post>, QuillError> {
        match self.db.get(Self::slug_key(slug)).map_err(storage_err("get"))? {
            Some(bytes) => {
                let post_id = String::from_utf8(bytes)
                    .map_err(|e| QuillError::Storage(format!("corrupt slug index: {}", e)))?;
                self.get_post_sync(&post_id)
            }
            None => Ok(None),
        }
    }

    pub fn create_reply_sync(
        &self,
        post_id: &str,
        origin: &str,
        content: &str,
    ) -> Result<Reply, QuillError> {
        let txn = self.db.transaction();
        // Shared lock: the post must not disappear underneath the reply.
        if txn
            .get_for_update(Self::post_key(post_id), false)
            .map_err(storage_err("get_for_update"))?
            .is_none()
        {
            return Err(QuillError::NotFound(format!("post '{}'", post_id)));
        }

        let reply = Reply::new(post_id, origin, content.to_string());
        txn.put(
            Self::reply_key(post_id, &reply.reply_id),
            serde_json::to_vec(&reply)?,
        )
        .map_err(storage_err("put"))?;
        txn.commit().map_err(storage_err("commit"))?;

        Ok(reply)
    }
}

fn storage_err(op: &'static str) -> impl Fn(rocksdb::Error) -> QuillError {
    move |e| QuillError::Storage(format!("RocksDB {} failed: {}", op, e))
}

#[async_trait]
impl TrustStore for RocksStore {
    async fn record_connection(&self, origin: &str) -> Result<Connection, QuillError> {
        self.record_connection_sync(origin)
    }

    async fn has_connection(&self, origin: &str) -> Result<bool, QuillError> {
        let found = self
            .db
            .get(Self::connection_key(origin))
            .map_err(storage_err("get"))?;
        Ok(found.is_some())
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, QuillError> {
        self.scan_prefix("conn:")
    }

    async fn record_subscription(&self, origin: &str) -> Result<Subscription, QuillError> {
        self.record_subscription_sync(origin)
    }

    async fn list_subscriptions(&self) -> Result<Vec<String>, QuillError> {
        let subs: Vec<Subscription> = self.scan_prefix("sub:")?;
        Ok(subs.into_iter().map(|s| s.origin).collect())
    }
}

#[async_trait]
impl FeedStore for RocksStore {
    async fn upsert_feed_entry(
        &self,
        payload: &FeedPayload,
    ) -> Result<(FeedEntry, Option<FeedEntry>), QuillError> {
        self.upsert_feed_entry_sync(payload)
    }

    async fn get_feed_entry(&self, post_id: &str) -> Result<Option<FeedEntry>, QuillError> {
        self.get_json(&Self::feed_key(post_id))
    }

    async fn list_feed_entries(&self) -> Result<Vec<FeedEntry>, QuillError> {
        let mut entries: Vec<FeedEntry> = self.scan_prefix("feed:")?;
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }
}

#[async_trait]
impl ContentStore for RocksStore {
    async fn create_post(&self, draft: &NewPost) -> Result<Post, QuillError> {
        self.create_post_sync(draft)
    }

    async fn update_post(&self, slug: &str, draft: &NewPost) -> Result<Post, QuillError> {
        self.update_post_sync(slug, draft)
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>, QuillError> {
        self.get_post_sync(post_id)
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, QuillError> {
        self.get_post_by_slug_sync(slug)
    }

    async fn list_posts(&self) -> Result<Vec<PostSummary>, QuillError> {
        let posts: Vec<Post> = self.scan_prefix("post:")?;
        let mut summaries = Vec::with_capacity(posts.len());
        for post in posts {
            let reply_count = self.count_prefix(&Self::reply_prefix(&post.post_id))?;
            summaries.push(PostSummary { post, reply_count });
        }
        summaries.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(summaries)
    }

    async fn create_reply(
        &self,
        post_id: &str,
        origin: &str,
        content: &str,
    ) -> Result<Reply, QuillError> {
        self.create_reply_sync(post_id, origin, content)
    }

    async fn list_replies(&self, post_id: &str) -> Result<Vec<Reply>, QuillError> {
        self.scan_prefix(&Self::reply_prefix(post_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    use quill_core::feed::ReplyRef;

    fn temp_db_path(label: &str) -> String {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("quill_test_{}_{}", label, Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    fn open_store(label: &str) -> RocksStore {
        RocksStore::open(&temp_db_path(label)).unwrap()
    }

    fn draft(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "<p>body</p>".to_string(),
            teaser: "body".to_string(),
        }
    }

    fn payload(post_id: &str, teaser: &str, replies: usize) -> FeedPayload {
        FeedPayload {
            post_id: post_id.to_string(),
            origin: "a.example".to_string(),
            path: "/posts/hello".to_string(),
            title: "Hello".to_string(),
            teaser: teaser.to_string(),
            replies: (0..replies)
                .map(|i| ReplyRef {
                    reply_id: format!("r{}", i + 1),
                    origin: "b.example".to_string(),
                })
                .collect(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_connection_is_idempotent() {
        let store = open_store("conn_idem");

        let first = store.record_connection("b.example").await.unwrap();
        let second = store.record_connection("b.example").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_connections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_has_connection_only_after_record() {
        let store = open_store("conn_has");

        assert!(!store.has_connection("b.example").await.unwrap());
        store.record_connection("b.example").await.unwrap();
        assert!(store.has_connection("b.example").await.unwrap());
        assert!(!store.has_connection("c.example").await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_and_subscription_are_independent() {
        let store = open_store("independent");

        store.record_subscription("b.example").await.unwrap();
        assert!(!store.has_connection("b.example").await.unwrap());

        store.record_connection("c.example").await.unwrap();
        assert_eq!(store.list_subscriptions().await.unwrap(), vec!["b.example"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_record_leaves_one_row() {
        let store = Arc::new(open_store("conn_race"));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let conn = store.record_connection("b.example").await.unwrap();
                let sub = store.record_subscription("b.example").await.unwrap();
                (conn, sub)
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(store.list_connections().await.unwrap().len(), 1);
        assert_eq!(store.list_subscriptions().await.unwrap().len(), 1);
        // Every caller observes the same stored record.
        let (first_conn, first_sub) = &results[0];
        for (conn, sub) in &results {
            assert_eq!(conn, first_conn);
            assert_eq!(sub, first_sub);
        }
    }

    #[tokio::test]
    async fn test_list_subscriptions_in_origin_order() {
        let store = open_store("subs");

        store.record_subscription("c.example").await.unwrap();
        store.record_subscription("a.example").await.unwrap();
        store.record_subscription("b.example:8080").await.unwrap();

        assert_eq!(
            store.list_subscriptions().await.unwrap(),
            vec!["a.example", "b.example:8080", "c.example"]
        );
    }

    #[tokio::test]
    async fn test_feed_upsert_overwrites_single_row() {
        let store = open_store("feed_upsert");

        let (first, previous) = store
            .upsert_feed_entry(&payload("p1", "old", 0))
            .await
            .unwrap();
        assert!(previous.is_none());
        assert_eq!(first.reply_count, 0);

        let (second, previous) = store
            .upsert_feed_entry(&payload("p1", "new", 2))
            .await
            .unwrap();
        assert_eq!(previous.unwrap().teaser, "old");
        assert_eq!(second.teaser, "new");
        assert_eq!(second.reply_count, 2);
        assert_eq!(second.created_at, first.created_at);

        let entries = store.list_feed_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reply_count, entries[0].replies.len());
    }

    #[tokio::test]
    async fn test_feed_entries_newest_first() {
        let store = open_store("feed_order");

        store.upsert_feed_entry(&payload("p1", "a", 0)).await.unwrap();
        store.upsert_feed_entry(&payload("p2", "b", 0)).await.unwrap();
        store.upsert_feed_entry(&payload("p1", "c", 1)).await.unwrap();

        let entries = store.list_feed_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].post_id, "p1");
        assert!(store.get_feed_entry("p2").await.unwrap().is_some());
        assert!(store.get_feed_entry("p3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_post_rejects_duplicate_slug() {
        let store = open_store("slug");

        let post = store.create_post(&draft("Hello World")).await.unwrap();
        assert_eq!(post.slug, "hello-world");

        let err = store.create_post(&draft("hello, world")).await.unwrap_err();
        assert!(matches!(err, QuillError::Conflict(_)));

        let by_slug = store.get_post_by_slug("hello-world").await.unwrap().unwrap();
        assert_eq!(by_slug.post_id, post.post_id);
    }

    #[tokio::test]
    async fn test_update_post_keeps_slug() {
        let store = open_store("update");

        let post = store.create_post(&draft("Draft Title")).await.unwrap();
        let updated = store
            .update_post(
                "draft-title",
                &NewPost {
                    title: "Final Title".to_string(),
                    content: "new".to_string(),
                    teaser: "new teaser".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.post_id, post.post_id);
        assert_eq!(updated.slug, "draft-title");
        assert_eq!(updated.teaser, "new teaser");

        let missing = store.update_post("nope", &draft("x")).await.unwrap_err();
        assert!(matches!(missing, QuillError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replies_in_creation_order_and_counted() {
        let store = open_store("replies");

        let post = store.create_post(&draft("Thread")).await.unwrap();
        let r1 = store
            .create_reply(&post.post_id, "b.example", "first")
            .await
            .unwrap();
        let r2 = store
            .create_reply(&post.post_id, "c.example", "second")
            .await
            .unwrap();

        let replies = store.list_replies(&post.post_id).await.unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].reply_id, r1.reply_id);
        assert_eq!(replies[1].reply_id, r2.reply_id);

        let posts = store.list_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].reply_count, 2);
    }

    #[tokio::test]
    async fn test_reply_to_missing_post() {
        let store = open_store("reply_missing");

        let err = store
            .create_reply("no-such-post", "b.example", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, QuillError::NotFound(_)));
    }
}

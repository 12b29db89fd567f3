// crates/quill-core/src/feed.rs
//
// Feed types: the payload one instance pushes to its subscribers, and the
// FeedEntry mirror the receiving instance keeps of each remote post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in a post's reply ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    pub reply_id: String,
    /// Origin the reply was written from.
    pub origin: String,
}

/// Wire payload pushed to a subscriber's feed-push surface.
///
/// `updated_at` is the sender's own timestamp for this snapshot. It is
/// optional on the wire so older senders remain accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPayload {
    pub post_id: String,
    /// Origin of the publishing instance.
    pub origin: String,
    /// Path of the post on the publishing instance, e.g. `/posts/hello`.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub teaser: String,
    #[serde(default)]
    pub replies: Vec<ReplyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Local mirror of a remote post, received via push.
///
/// Never a locally authored post. One row per `post_id`; every accepted
/// push overwrites the mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub post_id: String,
    pub origin: String,
    pub path: String,
    pub title: String,
    pub teaser: String,
    pub replies: Vec<ReplyRef>,
    /// Always `replies.len()` at time of write.
    pub reply_count: usize,
    /// Sender timestamp of the snapshot last written, when provided.
    #[serde(default)]
    pub remote_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedEntry {
    /// Build the row for a first push of this post.
    pub fn from_payload(payload: &FeedPayload, now: DateTime<Utc>) -> Self {
        Self {
            post_id: payload.post_id.clone(),
            origin: payload.origin.clone(),
            path: payload.path.clone(),
            title: payload.title.clone(),
            teaser: payload.teaser.clone(),
            replies: payload.replies.clone(),
            reply_count: payload.replies.len(),
            remote_updated_at: payload.updated_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite all mutable fields from a later push (last write wins).
    ///
    /// `created_at` and `post_id` are preserved; `reply_count` is derived.
    pub fn apply(&mut self, payload: &FeedPayload, now: DateTime<Utc>) {
        self.origin = payload.origin.clone();
        self.path = payload.path.clone();
        self.title = payload.title.clone();
        self.teaser = payload.teaser.clone();
        self.replies = payload.replies.clone();
        self.reply_count = self.replies.len();
        self.remote_updated_at = payload.updated_at;
        self.updated_at = now;
    }

    /// True when `payload` carries a sender timestamp older than the one
    /// already stored, i.e. the push arrived out of order.
    pub fn is_stale(&self, payload: &FeedPayload) -> bool {
        match (self.remote_updated_at, payload.updated_at) {
            (Some(stored), Some(incoming)) => incoming < stored,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload(teaser: &str, replies: usize) -> FeedPayload {
        FeedPayload {
            post_id: "p1".to_string(),
            origin: "a.example".to_string(),
            path: "/posts/hello".to_string(),
            title: "Hello".to_string(),
            teaser: teaser.to_string(),
            replies: (0..replies)
                .map(|i| ReplyRef {
                    reply_id: format!("r{}", i),
                    origin: "b.example".to_string(),
                })
                .collect(),
            updated_at: None,
        }
    }

    #[test]
    fn test_apply_keeps_created_at_and_derives_count() {
        let t0 = Utc::now();
        let mut entry = FeedEntry::from_payload(&payload("old", 0), t0);
        assert_eq!(entry.reply_count, 0);

        let t1 = t0 + Duration::seconds(5);
        entry.apply(&payload("new", 2), t1);
        assert_eq!(entry.teaser, "new");
        assert_eq!(entry.reply_count, 2);
        assert_eq!(entry.created_at, t0);
        assert_eq!(entry.updated_at, t1);
    }

    #[test]
    fn test_stale_detection() {
        let now = Utc::now();
        let mut newer = payload("v2", 1);
        newer.updated_at = Some(now);
        let entry = FeedEntry::from_payload(&newer, now);

        let mut older = payload("v1", 0);
        older.updated_at = Some(now - Duration::seconds(30));
        assert!(entry.is_stale(&older));

        let untimed = payload("v3", 0);
        assert!(!entry.is_stale(&untimed));
    }

    #[test]
    fn test_payload_wire_format_is_camel_case() {
        let json = serde_json::to_value(payload("t", 1)).unwrap();
        assert!(json.get("postId").is_some());
        assert_eq!(json["replies"][0]["replyId"], "r0");
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_payload_missing_optional_fields() {
        let p: FeedPayload =
            serde_json::from_str(r#"{"postId":"p1","origin":"a.example","teaser":"old"}"#).unwrap();
        assert_eq!(p.teaser, "old");
        assert!(p.replies.is_empty());
        assert!(p.title.is_empty());
    }
}

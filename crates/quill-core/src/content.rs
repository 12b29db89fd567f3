// crates/quill-core/src/content.rs
//
// Locally authored content. Posts and replies are owned by the content
// store; the protocol only reads them to build publish payloads and writes
// replies through the reply authorizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feed::{FeedPayload, ReplyRef};

/// A post authored on this instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// UUID v7 string; lexical order is creation order.
    pub post_id: String,
    pub slug: String,
    pub title: String,
    pub teaser: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the admin when creating or updating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub teaser: String,
}

/// Post listing row with its reply count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub reply_count: usize,
}

/// A reply to a local post, possibly written from another origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub reply_id: String,
    pub post_id: String,
    /// Origin the reply was written from.
    pub origin: String,
    /// Sanitized content.
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with a fresh UUID v7 id and a slug derived from the title.
    pub fn new(draft: &NewPost) -> Self {
        let now = Utc::now();
        Self {
            post_id: Uuid::now_v7().to_string(),
            slug: slugify(&draft.title),
            title: draft.title.clone(),
            teaser: draft.teaser.clone(),
            content: draft.content.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Path of this post on its home instance.
    pub fn path(&self) -> String {
        format!("/posts/{}", self.slug)
    }

    /// Build the feed payload announcing this post and its reply ledger.
    pub fn feed_payload(&self, my_origin: &str, replies: &[Reply]) -> FeedPayload {
        FeedPayload {
            post_id: self.post_id.clone(),
            origin: my_origin.to_string(),
            path: self.path(),
            title: self.title.clone(),
            teaser: self.teaser.clone(),
            replies: replies
                .iter()
                .map(|r| ReplyRef {
                    reply_id: r.reply_id.clone(),
                    origin: r.origin.clone(),
                })
                .collect(),
            updated_at: Some(Utc::now()),
        }
    }
}

impl Reply {
    pub fn new(post_id: &str, origin: &str, content: String) -> Self {
        Self {
            reply_id: Uuid::now_v7().to_string(),
            post_id: post_id.to_string(),
            origin: origin.to_string(),
            content,
            created_at: Utc::now(),
        }
    }
}

/// Derive a URL slug from a title: transliterated to ASCII, lowercased,
/// alphanumeric runs joined by single dashes. Titles with no usable
/// characters yield `"post"`.
pub fn slugify(title: &str) -> String {
    let out = slug::slugify(title);
    if out.is_empty() {
        "post".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust   & Federation  "), "rust-federation");
        assert_eq!(slugify("2024 in review"), "2024-in-review");
        assert_eq!(slugify("???"), "post");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Café"), "cafe");
        assert_eq!(slugify("Über Crème Brûlée"), "uber-creme-brulee");
        let cjk = slugify("日本語");
        assert_ne!(cjk, "post");
        assert!(cjk.is_ascii());
    }

    #[test]
    fn test_feed_payload_from_post() {
        let post = Post::new(&NewPost {
            title: "First Post".to_string(),
            content: "<p>body</p>".to_string(),
            teaser: "body".to_string(),
        });
        let replies = vec![
            Reply::new(&post.post_id, "b.example", "hi".to_string()),
            Reply::new(&post.post_id, "c.example", "yo".to_string()),
        ];

        let payload = post.feed_payload("a.example", &replies);
        assert_eq!(payload.origin, "a.example");
        assert_eq!(payload.path, "/posts/first-post");
        assert_eq!(payload.replies.len(), 2);
        assert_eq!(payload.replies[1].origin, "c.example");
        assert!(payload.updated_at.is_some());
    }
}

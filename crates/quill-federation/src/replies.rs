// crates/quill-federation/src/replies.rs
//
// ReplyAuthorizer: gate for reply submissions.
//
// The local admin replies as this instance without a probe. A visitor must
// claim a home origin, and that origin must trust us (reverse-trust probe)
// before the reply is persisted. An accepted reply triggers a background
// publish of the owning post.

use std::sync::Arc;

use tokio::task::JoinHandle;

use quill_core::content::Reply;
use quill_core::error::QuillError;
use quill_core::identity::Caller;
use quill_core::origin::normalize_origin;
use quill_core::traits::{ContentSanitizer, ContentStore};

use crate::prober::TrustProber;
use crate::publisher::{FanOutReport, FeedPublisher};

/// A persisted reply and the handle of the fan-out it triggered.
///
/// Callers that only need the reply drop `fan_out`; the publish continues
/// in the background.
#[derive(Debug)]
pub struct AcceptedReply {
    pub reply: Reply,
    pub fan_out: JoinHandle<FanOutReport>,
}

pub struct ReplyAuthorizer {
    content: Arc<dyn ContentStore>,
    prober: Arc<dyn TrustProber>,
    sanitizer: Arc<dyn ContentSanitizer>,
    publisher: FeedPublisher,
    my_origin: String,
}

impl ReplyAuthorizer {
    pub fn new(
        content: Arc<dyn ContentStore>,
        prober: Arc<dyn TrustProber>,
        sanitizer: Arc<dyn ContentSanitizer>,
        publisher: FeedPublisher,
        my_origin: impl Into<String>,
    ) -> Self {
        Self {
            content,
            prober,
            sanitizer,
            publisher,
            my_origin: my_origin.into(),
        }
    }

    /// Authorize, persist and publish a reply to `post_id`.
    ///
    /// Errors:
    /// - `InvalidInput` for empty content or a malformed claimed origin
    /// - `NotFound` if the post does not exist
    /// - `Unauthorized` for a visitor with no claimed origin
    /// - `Forbidden("not connected")` when the claimed origin does not trust us
    ///
    /// The fan-out outcome never affects the result.
    pub async fn submit(
        &self,
        caller: &Caller,
        post_id: &str,
        content: &str,
    ) -> Result<AcceptedReply, QuillError> {
        let clean = self.sanitizer.sanitize(content);
        if clean.is_empty() {
            return Err(QuillError::InvalidInput("reply content is empty".to_string()));
        }

        if self.content.get_post(post_id).await?.is_none() {
            return Err(QuillError::NotFound(format!("post '{}'", post_id)));
        }

        let origin = self.authorize(caller).await?;
        let reply = self.content.create_reply(post_id, &origin, &clean).await?;
        tracing::info!("Reply {} from {} on post {}", reply.reply_id, origin, post_id);

        let fan_out = self.publisher.publish_post(post_id);
        Ok(AcceptedReply { reply, fan_out })
    }

    /// Resolve the origin a reply is written from, probing when needed.
    async fn authorize(&self, caller: &Caller) -> Result<String, QuillError> {
        if caller.is_admin() {
            return Ok(self.my_origin.clone());
        }

        let claimed = caller
            .home_origin()
            .ok_or_else(|| QuillError::Unauthorized("no origin claimed".to_string()))?;
        let claimed = normalize_origin(claimed)?;

        if claimed == self.my_origin {
            // Only the admin may write as this instance.
            return Err(QuillError::Forbidden("not connected".to_string()));
        }
        if !self.prober.probe(&claimed, &self.my_origin).await {
            tracing::warn!("Reply from {} rejected: it does not trust {}", claimed, self.my_origin);
            return Err(QuillError::Forbidden("not connected".to_string()));
        }
        Ok(claimed)
    }
}

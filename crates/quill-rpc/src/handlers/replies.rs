// crates/quill-rpc/src/handlers/replies.rs
//
// Reply submission and the per-post reply thread.

use serde::{Deserialize, Serialize};

use quill_core::content::{Post, Reply};
use quill_core::error::QuillError;
use quill_core::identity::Caller;

use crate::context::AppContext;
use crate::handlers::parse_body;
use crate::middleware::ApiRequest;
use crate::response::{ApiReply, HandlerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReplyRequest {
    pub post_id: String,
    /// Claimed home origin. Visitors fall back to the `as` cookie.
    #[serde(default)]
    pub replying_origin: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReplyResponse {
    pub reply_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub post: Post,
    pub replies: Vec<Reply>,
}

/// POST /api/replies
///
/// Fan-out runs in the background; its outcome never changes this response.
pub async fn handle_submit_reply(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    let body: SubmitReplyRequest = parse_body(req)?;

    let caller = match &req.caller {
        Caller::Admin => Caller::Admin,
        Caller::Visitor { home_origin } => Caller::Visitor {
            home_origin: body
                .replying_origin
                .clone()
                .filter(|o| !o.trim().is_empty())
                .or_else(|| home_origin.clone()),
        },
    };

    let accepted = ctx.replies.submit(&caller, &body.post_id, &body.content).await?;
    ApiReply::ok(&SubmitReplyResponse {
        reply_id: accepted.reply.reply_id,
    })
}

/// GET /api/replies/{postId}
pub async fn handle_get_thread(ctx: &AppContext, post_id: &str) -> HandlerResult {
    let post = ctx
        .content
        .get_post(post_id)
        .await?
        .ok_or_else(|| QuillError::NotFound(format!("post '{}'", post_id)))?;
    let replies = ctx.content.list_replies(post_id).await?;
    ApiReply::ok(&ThreadResponse { post, replies })
}

// crates/quill-rpc/src/handlers/visit.rs
//
// Content view with the visit-time trust hint.
//
// A visitor arriving with `?as=<origin>` has that claim persisted in the
// `as` cookie; later views read it back from the cookie. Any claim runs the
// subscription handshake before the page is returned. The handshake outcome
// never changes the response.

use serde::{Deserialize, Serialize};

use quill_core::content::{Post, Reply};
use quill_core::error::QuillError;
use quill_core::origin::normalize_origin;

use crate::context::AppContext;
use crate::middleware::{as_cookie, ApiRequest, AS_COOKIE};
use crate::response::{ApiReply, HandlerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub post: Post,
    pub replies: Vec<Reply>,
    /// The visitor's claimed home origin, if any.
    #[serde(rename = "as")]
    pub claimed_origin: Option<String>,
}

/// GET /posts/{slug}[?as=<origin>]
pub async fn handle_view_post(ctx: &AppContext, req: &ApiRequest, slug: &str) -> HandlerResult {
    let post = ctx
        .content
        .get_post_by_slug(slug)
        .await?
        .ok_or_else(|| QuillError::NotFound(format!("post '{}'", slug)))?;

    // A fresh hint wins over the cookie and replaces it.
    let hinted = req
        .query_param(AS_COOKIE)
        .and_then(|o| normalize_origin(o).ok());
    let claimed = hinted
        .clone()
        .or_else(|| req.caller.home_origin().map(str::to_string));

    if let Some(origin) = &claimed {
        if !req.caller.is_admin() {
            let outcome = ctx.registrar.register_visit(origin).await;
            tracing::debug!("Visit from {} on {}: {:?}", origin, slug, outcome);
        }
    }

    let replies = ctx.content.list_replies(&post.post_id).await?;
    let reply = ApiReply::ok(&PostView {
        post,
        replies,
        claimed_origin: claimed,
    })?;

    Ok(match hinted {
        Some(origin) => reply.with_cookie(as_cookie(&origin)),
        None => reply,
    })
}

// crates/quill-rpc/src/handlers/posts.rs
//
// Local post authoring. Every create or update is published to
// subscribers in the background.

use serde::{Deserialize, Serialize};

use quill_core::content::{NewPost, Post};
use quill_core::error::QuillError;

use crate::context::AppContext;
use crate::handlers::{parse_body, require_admin};
use crate::middleware::ApiRequest;
use crate::response::{ApiReply, HandlerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRef {
    pub post_id: String,
    pub slug: String,
}

impl From<&Post> for PostRef {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.post_id.clone(),
            slug: post.slug.clone(),
        }
    }
}

fn validated_draft(req: &ApiRequest) -> Result<NewPost, QuillError> {
    let draft: NewPost = parse_body(req)?;
    if draft.title.trim().is_empty() {
        return Err(QuillError::InvalidInput("title is empty".to_string()));
    }
    Ok(draft)
}

/// GET /api/posts
pub async fn handle_list_posts(ctx: &AppContext, _req: &ApiRequest) -> HandlerResult {
    ApiReply::ok(&ctx.content.list_posts().await?)
}

/// POST /api/posts (admin)
pub async fn handle_create_post(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    require_admin(req)?;
    let draft = validated_draft(req)?;

    let post = ctx.content.create_post(&draft).await?;
    tracing::info!("Created post {} ({})", post.post_id, post.slug);
    ctx.publisher.publish_post(&post.post_id);

    ApiReply::ok(&PostRef::from(&post))
}

/// PUT /api/posts/{slug} (admin)
pub async fn handle_update_post(ctx: &AppContext, req: &ApiRequest, slug: &str) -> HandlerResult {
    require_admin(req)?;
    let draft = validated_draft(req)?;

    let post = ctx.content.update_post(slug, &draft).await?;
    tracing::info!("Updated post {} ({})", post.post_id, post.slug);
    ctx.publisher.publish_post(&post.post_id);

    ApiReply::ok(&PostRef::from(&post))
}

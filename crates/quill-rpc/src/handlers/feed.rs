// crates/quill-rpc/src/handlers/feed.rs

use serde_json::json;

use quill_core::feed::FeedPayload;

use crate::context::AppContext;
use crate::handlers::parse_body;
use crate::middleware::ApiRequest;
use crate::response::{ApiReply, HandlerResult};

/// POST /api/update-feed: accept a push from a trusted origin.
pub async fn handle_update_feed(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    let payload: FeedPayload = parse_body(req)?;
    ctx.ingester.ingest(payload).await?;
    ApiReply::ok(&json!({ "status": "ok" }))
}

/// GET /api/feed: received entries, most recently updated first.
pub async fn handle_list_feed(ctx: &AppContext, _req: &ApiRequest) -> HandlerResult {
    ApiReply::ok(&ctx.ingester.list().await?)
}

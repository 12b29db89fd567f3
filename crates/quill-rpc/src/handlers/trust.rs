// crates/quill-rpc/src/handlers/trust.rs
//
// Trust surfaces: the public trust check, admin connection establishment,
// and operator listings of Connections and Subscriptions.

use serde::{Deserialize, Serialize};
use url::Url;

use quill_core::error::QuillError;
use quill_core::origin::{normalize_origin, origin_url};

use crate::context::AppContext;
use crate::handlers::{parse_body, require_admin};
use crate::middleware::{ApiRequest, AS_COOKIE};
use crate::response::{ApiReply, HandlerResult};

// ---------------------------------------------------------------------------
// GET /api/check-connection?origin=
// ---------------------------------------------------------------------------

/// `true` iff we hold a Connection for the subject origin. Missing or
/// malformed subjects, and store failures, answer `false`.
pub async fn handle_check_connection(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    let subject = req.query_param("origin").and_then(|o| normalize_origin(o).ok());

    let trusted = match subject {
        Some(origin) => match ctx.trust.has_connection(&origin).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Trust check for {} failed: {}", origin, e);
                false
            }
        },
        None => false,
    };
    tracing::debug!("Trust check for {:?}: {}", req.query_param("origin"), trusted);
    ApiReply::ok(&trusted)
}

// ---------------------------------------------------------------------------
// POST /api/connect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub origin: String,
    pub password: String,
    /// Page on the remote instance to hand the browser back to.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub connected: bool,
    pub origin: String,
    /// `{scheme}://{origin}{path}?as={my_origin}`.
    pub redirect: String,
}

pub async fn handle_connect(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    let body: ConnectRequest = parse_body(req)?;
    let connection = ctx.establisher.establish(&body.origin, &body.password).await?;

    let path = match body.path.as_deref().map(str::trim) {
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) if !p.is_empty() => format!("/{}", p),
        _ => "/".to_string(),
    };
    let redirect = Url::parse_with_params(
        &origin_url(&ctx.scheme, &connection.origin, &path),
        &[(AS_COOKIE, ctx.my_origin.as_str())],
    )
    .map_err(|e| QuillError::InvalidInput(format!("bad redirect path '{}': {}", path, e)))?;

    ApiReply::ok(&ConnectResponse {
        connected: true,
        origin: connection.origin,
        redirect: redirect.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Operator views
// ---------------------------------------------------------------------------

pub async fn handle_list_connections(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    require_admin(req)?;
    ApiReply::ok(&ctx.trust.list_connections().await?)
}

pub async fn handle_list_subscriptions(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    require_admin(req)?;
    ApiReply::ok(&ctx.trust.list_subscriptions().await?)
}

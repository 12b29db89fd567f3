// crates/quill-rpc/src/server.rs
//
// HTTP server setup: QuillHttpServer and HttpConfig.
//
// One hyper HTTP/1 connection task per accepted socket. Each request body is
// collected in full, preprocessed into an `ApiRequest`, and dispatched on
// (method, path segments) to a handler returning `HandlerResult`.

use std::convert::Infallible;
use std::time::Instant;

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use quill_core::error::QuillError;

use crate::context::AppContext;
use crate::handlers;
use crate::middleware::{self, ApiRequest};
use crate::response::{self, ApiReply, HandlerResult};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// HttpConfig
// ---------------------------------------------------------------------------

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// ---------------------------------------------------------------------------
// QuillHttpServer
// ---------------------------------------------------------------------------

/// The HTTP server for a Quill instance.
#[derive(Debug, Clone)]
pub struct QuillHttpServer {
    config: HttpConfig,
    ctx: AppContext,
}

impl QuillHttpServer {
    pub fn new(config: HttpConfig, ctx: AppContext) -> Self {
        Self { config, ctx }
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await?;
        Ok(())
    }

    /// Serve on an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!(
            "Quill HTTP server for {} listening on {}",
            self.ctx.my_origin,
            listener.local_addr()?
        );

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let ctx = self.ctx.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| handle(ctx.clone(), req));
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!("Error serving connection from {}: {:?}", peer, err);
                }
            });
        }
    }
}

/// Per-request entry point: collect, preprocess, dispatch, render, log.
async fn handle(ctx: AppContext, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let response = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => {
            let api_req = ApiRequest::from_parts(
                parts.method.clone(),
                &parts.uri,
                &parts.headers,
                collected.to_bytes(),
                &ctx.establisher,
            );
            response::render(dispatch(&ctx, &api_req).await)
        }
        Err(e) => response::error_response(&QuillError::InvalidInput(format!(
            "unreadable request body: {}",
            e
        ))),
    };

    middleware::log_request(&parts.method, parts.uri.path(), response.status(), started.elapsed());
    Ok(response)
}

/// Route a preprocessed request to its handler.
pub async fn dispatch(ctx: &AppContext, req: &ApiRequest) -> HandlerResult {
    let segments: Vec<&str> = req
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (&req.method, segments.as_slice()) {
        (&Method::GET, ["health"]) => ApiReply::ok(&serde_json::json!({
            "status": "ok",
            "origin": ctx.my_origin,
        })),

        // Federation surfaces
        (&Method::GET, ["api", "check-connection"]) => {
            handlers::trust::handle_check_connection(ctx, req).await
        }
        (&Method::POST, ["api", "update-feed"]) => handlers::feed::handle_update_feed(ctx, req).await,

        // Trust management
        (&Method::POST, ["api", "connect"]) => handlers::trust::handle_connect(ctx, req).await,
        (&Method::GET, ["api", "connections"]) => {
            handlers::trust::handle_list_connections(ctx, req).await
        }
        (&Method::GET, ["api", "subscriptions"]) => {
            handlers::trust::handle_list_subscriptions(ctx, req).await
        }

        // Replies
        (&Method::POST, ["api", "replies"]) => handlers::replies::handle_submit_reply(ctx, req).await,
        (&Method::GET, ["api", "replies", post_id]) => {
            handlers::replies::handle_get_thread(ctx, post_id).await
        }

        // Posts and feed
        (&Method::GET, ["api", "posts"]) => handlers::posts::handle_list_posts(ctx, req).await,
        (&Method::POST, ["api", "posts"]) => handlers::posts::handle_create_post(ctx, req).await,
        (&Method::PUT, ["api", "posts", slug]) => {
            handlers::posts::handle_update_post(ctx, req, slug).await
        }
        (&Method::GET, ["api", "feed"]) => handlers::feed::handle_list_feed(ctx, req).await,

        // Content view with visit-time hint
        (&Method::GET, ["posts", slug]) => handlers::visit::handle_view_post(ctx, req, slug).await,

        _ => Err(QuillError::NotFound(format!("{} {}", req.method, req.path))),
    }
}

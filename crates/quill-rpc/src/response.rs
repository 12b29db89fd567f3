// crates/quill-rpc/src/response.rs
//
// Handler results and their HTTP rendering. Every error body has the shape
// `{"error": CODE, "message": text}`.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderValue, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

use quill_core::error::QuillError;

/// A successful handler result, rendered as JSON.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: serde_json::Value,
    /// Optional `Set-Cookie` header value.
    pub set_cookie: Option<String>,
}

impl ApiReply {
    /// 200 with `value` serialized as the body.
    pub fn ok<T: Serialize>(value: &T) -> Result<Self, QuillError> {
        Ok(Self {
            status: StatusCode::OK,
            body: serde_json::to_value(value)?,
            set_cookie: None,
        })
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.set_cookie = Some(cookie);
        self
    }
}

pub type HandlerResult = Result<ApiReply, QuillError>;

/// HTTP status for each error kind.
pub fn status_for(err: &QuillError) -> StatusCode {
    match err {
        QuillError::AuthenticationFailed | QuillError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        QuillError::Forbidden(_) => StatusCode::FORBIDDEN,
        QuillError::NotFound(_) => StatusCode::NOT_FOUND,
        QuillError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        QuillError::Conflict(_) => StatusCode::CONFLICT,
        QuillError::NetworkUnavailable(_) => StatusCode::BAD_GATEWAY,
        QuillError::Storage(_) | QuillError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to the caller. Internal failures are not echoed verbatim.
fn public_message(err: &QuillError) -> String {
    match err {
        QuillError::Storage(_) => "storage error".to_string(),
        QuillError::Serialization(_) => "serialization error".to_string(),
        QuillError::Forbidden(msg) => msg.clone(),
        other => other.to_string(),
    }
}

pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"null".to_vec());
    let mut resp = Response::new(Full::new(Bytes::from(bytes)));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

pub fn error_response(err: &QuillError) -> Response<Full<Bytes>> {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else if err.is_rejection() {
        tracing::info!("Request rejected: {}", err);
    }
    json_response(
        status,
        &serde_json::json!({
            "error": err.code(),
            "message": public_message(err),
        }),
    )
}

/// Render a handler result.
pub fn render(result: HandlerResult) -> Response<Full<Bytes>> {
    match result {
        Ok(reply) => {
            let mut resp = json_response(reply.status, &reply.body);
            if let Some(cookie) = reply.set_cookie {
                match HeaderValue::from_str(&cookie) {
                    Ok(v) => {
                        resp.headers_mut().insert(SET_COOKIE, v);
                    }
                    Err(e) => tracing::warn!("Dropping unencodable cookie: {}", e),
                }
            }
            resp
        }
        Err(e) => error_response(&e),
    }
}

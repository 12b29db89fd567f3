// crates/quill-core/src/identity.rs

use serde::{Deserialize, Serialize};

/// Who is asking, computed once per request and passed explicitly to
/// every handler that needs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Caller {
    /// The local admin (presented the admin secret).
    Admin,
    /// Anyone else. `home_origin` is the origin the visitor claims to come
    /// from, taken from the request body, the `as` query parameter, or the
    /// `as` cookie.
    Visitor { home_origin: Option<String> },
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin)
    }

    /// The claimed home origin, if this is a visitor that claimed one.
    pub fn home_origin(&self) -> Option<&str> {
        match self {
            Caller::Admin => None,
            Caller::Visitor { home_origin } => home_origin.as_deref(),
        }
    }
}

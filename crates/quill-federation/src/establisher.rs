// crates/quill-federation/src/establisher.rs
//
// Admin-gated, unilateral grant of inbound trust.

use std::sync::Arc;

use quill_core::error::QuillError;
use quill_core::origin::normalize_origin;
use quill_core::traits::TrustStore;
use quill_core::trust::Connection;

/// Records Connections on behalf of the local admin.
pub struct ConnectionEstablisher {
    trust: Arc<dyn TrustStore>,
    admin_secret: String,
}

impl ConnectionEstablisher {
    pub fn new(trust: Arc<dyn TrustStore>, admin_secret: impl Into<String>) -> Self {
        Self {
            trust,
            admin_secret: admin_secret.into(),
        }
    }

    /// Whether `credential` matches the configured admin secret.
    ///
    /// An unset (empty) secret never matches anything.
    pub fn verify(&self, credential: &str) -> bool {
        !self.admin_secret.is_empty() && credential == self.admin_secret
    }

    /// Trust `origin`. Idempotent: an already-trusted origin returns its
    /// existing record.
    pub async fn establish(&self, origin: &str, credential: &str) -> Result<Connection, QuillError> {
        if !self.verify(credential) {
            tracing::warn!("Rejected connection request for {}: bad credential", origin.trim());
            return Err(QuillError::AuthenticationFailed);
        }

        let origin = normalize_origin(origin)?;
        let connection = self.trust.record_connection(&origin).await?;
        tracing::info!("Connection established: now trusting {}", connection.origin);
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_store::RocksStore;
    use uuid::Uuid;

    fn store() -> Arc<RocksStore> {
        let path = std::env::temp_dir().join(format!("quill_test_establish_{}", Uuid::now_v7()));
        Arc::new(RocksStore::open(&path.to_string_lossy()).unwrap())
    }

    #[tokio::test]
    async fn test_establish_with_secret() {
        let store = store();
        let establisher = ConnectionEstablisher::new(store.clone(), "hunter2");

        let conn = establisher.establish("https://B.example/", "hunter2").await.unwrap();
        assert_eq!(conn.origin, "b.example");
        assert!(store.has_connection("b.example").await.unwrap());

        let again = establisher.establish("b.example", "hunter2").await.unwrap();
        assert_eq!(again, conn);
        assert_eq!(store.list_connections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_credential_writes_nothing() {
        let store = store();
        let establisher = ConnectionEstablisher::new(store.clone(), "hunter2");

        let err = establisher.establish("b.example", "hunter3").await.unwrap_err();
        assert!(matches!(err, QuillError::AuthenticationFailed));
        assert!(!store.has_connection("b.example").await.unwrap());
    }

    #[tokio::test]
    async fn test_unset_secret_rejects_everything() {
        let establisher = ConnectionEstablisher::new(store(), "");
        assert!(!establisher.verify(""));
        let err = establisher.establish("b.example", "").await.unwrap_err();
        assert!(matches!(err, QuillError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_invalid_origin() {
        let establisher = ConnectionEstablisher::new(store(), "s");
        let err = establisher.establish("b.example/posts", "s").await.unwrap_err();
        assert!(matches!(err, QuillError::InvalidInput(_)));
    }
}

// crates/quill-federation/src/registrar.rs
//
// Visit-time handshake: a visitor claiming a home origin makes us probe
// that origin's trust of us, and a positive answer records a Subscription.
// Nothing here is ever surfaced to the visitor.

use std::sync::Arc;

use quill_core::origin::normalize_origin;
use quill_core::traits::TrustStore;

use crate::prober::TrustProber;

/// What a registration attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The claimed origin trusts us; a Subscription exists now.
    Registered,
    /// The probe said no (or failed), or the store write failed.
    NotTrusted,
    /// Nothing to probe: own origin or an unusable claim.
    Skipped,
}

pub struct SubscriptionRegistrar {
    trust: Arc<dyn TrustStore>,
    prober: Arc<dyn TrustProber>,
    my_origin: String,
}

impl SubscriptionRegistrar {
    pub fn new(
        trust: Arc<dyn TrustStore>,
        prober: Arc<dyn TrustProber>,
        my_origin: impl Into<String>,
    ) -> Self {
        Self {
            trust,
            prober,
            my_origin: my_origin.into(),
        }
    }

    pub async fn register_visit(&self, claimed_origin: &str) -> RegistrationOutcome {
        let claimed = match normalize_origin(claimed_origin) {
            Ok(o) => o,
            Err(e) => {
                tracing::debug!("Ignoring visit hint '{}': {}", claimed_origin, e);
                return RegistrationOutcome::Skipped;
            }
        };
        if claimed == self.my_origin {
            return RegistrationOutcome::Skipped;
        }

        if !self.prober.probe(&claimed, &self.my_origin).await {
            tracing::debug!("{} does not trust {}; no subscription", claimed, self.my_origin);
            return RegistrationOutcome::NotTrusted;
        }

        match self.trust.record_subscription(&claimed).await {
            Ok(sub) => {
                tracing::info!("Subscription registered for {}", sub.origin);
                RegistrationOutcome::Registered
            }
            Err(e) => {
                tracing::warn!("Failed to record subscription for {}: {}", claimed, e);
                RegistrationOutcome::NotTrusted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quill_store::RocksStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct FixedProber {
        trusted: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TrustProber for FixedProber {
        async fn probe(&self, _remote: &str, me: &str) -> bool {
            assert_eq!(me, "a.example");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.trusted
        }
    }

    fn setup(trusted: bool) -> (Arc<RocksStore>, Arc<FixedProber>, SubscriptionRegistrar) {
        let path = std::env::temp_dir().join(format!("quill_test_registrar_{}", Uuid::now_v7()));
        let store = Arc::new(RocksStore::open(&path.to_string_lossy()).unwrap());
        let prober = Arc::new(FixedProber {
            trusted,
            calls: AtomicUsize::new(0),
        });
        let registrar = SubscriptionRegistrar::new(store.clone(), prober.clone(), "a.example");
        (store, prober, registrar)
    }

    #[tokio::test]
    async fn test_trusted_visit_registers_once() {
        let (store, _, registrar) = setup(true);

        assert_eq!(
            registrar.register_visit("https://B.example").await,
            RegistrationOutcome::Registered
        );
        assert_eq!(
            registrar.register_visit("b.example").await,
            RegistrationOutcome::Registered
        );
        assert_eq!(store.list_subscriptions().await.unwrap(), vec!["b.example"]);
    }

    #[tokio::test]
    async fn test_untrusted_visit_records_nothing() {
        let (store, _, registrar) = setup(false);

        assert_eq!(
            registrar.register_visit("b.example").await,
            RegistrationOutcome::NotTrusted
        );
        assert!(store.list_subscriptions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_and_garbage_are_skipped_without_probing() {
        let (_, prober, registrar) = setup(true);

        assert_eq!(
            registrar.register_visit("A.example").await,
            RegistrationOutcome::Skipped
        );
        assert_eq!(
            registrar.register_visit("not an origin").await,
            RegistrationOutcome::Skipped
        );
        assert_eq!(registrar.register_visit("").await, RegistrationOutcome::Skipped);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }
}

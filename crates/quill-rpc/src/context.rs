// crates/quill-rpc/src/context.rs
//
// AppContext: everything a handler needs, assembled once at startup and
// shared by every connection.

use std::sync::Arc;

use quill_core::traits::{ContentStore, FeedStore, TrustStore};
use quill_federation::{
    ConnectionEstablisher, FederationClient, FeedIngester, FeedPublisher, HtmlSanitizer,
    ReplyAuthorizer, SubscriptionRegistrar, TrustProber,
};

/// Shared, cheaply clonable handler state.
#[derive(Clone)]
pub struct AppContext {
    /// This instance's origin.
    pub my_origin: String,
    /// Scheme used to address remote instances.
    pub scheme: String,
    pub trust: Arc<dyn TrustStore>,
    pub feed: Arc<dyn FeedStore>,
    pub content: Arc<dyn ContentStore>,
    pub establisher: Arc<ConnectionEstablisher>,
    pub registrar: Arc<SubscriptionRegistrar>,
    pub ingester: Arc<FeedIngester>,
    pub replies: Arc<ReplyAuthorizer>,
    pub publisher: FeedPublisher,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("my_origin", &self.my_origin)
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl AppContext {
    /// Wire every protocol component over a single store that implements
    /// all three store traits.
    ///
    /// `client` carries this instance's origin, scheme and outbound timeout;
    /// `prober` is usually a `CachedTrustProber` over an `HttpTrustProber`
    /// built from the same client.
    pub fn wire<S>(
        store: Arc<S>,
        prober: Arc<dyn TrustProber>,
        client: FederationClient,
        admin_secret: &str,
        max_concurrent_pushes: usize,
    ) -> Self
    where
        S: TrustStore + FeedStore + ContentStore + 'static,
    {
        let trust: Arc<dyn TrustStore> = store.clone();
        let feed: Arc<dyn FeedStore> = store.clone();
        let content: Arc<dyn ContentStore> = store;
        let my_origin = client.my_origin().to_string();
        let scheme = client.scheme().to_string();

        let publisher = FeedPublisher::new(
            content.clone(),
            trust.clone(),
            client,
            max_concurrent_pushes,
        );

        Self {
            establisher: Arc::new(ConnectionEstablisher::new(trust.clone(), admin_secret)),
            registrar: Arc::new(SubscriptionRegistrar::new(
                trust.clone(),
                prober.clone(),
                my_origin.clone(),
            )),
            ingester: Arc::new(FeedIngester::new(trust.clone(), feed.clone())),
            replies: Arc::new(ReplyAuthorizer::new(
                content.clone(),
                prober,
                Arc::new(HtmlSanitizer),
                publisher.clone(),
                my_origin.clone(),
            )),
            publisher,
            my_origin,
            scheme,
            trust,
            feed,
            content,
        }
    }
}

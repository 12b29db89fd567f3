// crates/quill-federation/src/lib.rs
//
// quill-federation: the trust protocol between Quill instances.
//
// Inbound trust is granted by the admin through the ConnectionEstablisher.
// Outbound push targets are registered opportunistically by the
// SubscriptionRegistrar after a reverse-trust probe. The FeedPublisher fans
// post and reply deltas out to every Subscription; the FeedIngester accepts
// them on the receiving side only from trusted origins. The ReplyAuthorizer
// gates cross-origin replies on the same reverse-trust probe.

pub mod client;
pub mod establisher;
pub mod ingester;
pub mod prober;
pub mod publisher;
pub mod registrar;
pub mod replies;
pub mod sanitizer;

pub use client::FederationClient;
pub use establisher::ConnectionEstablisher;
pub use ingester::FeedIngester;
pub use prober::{json_truthy, CachedTrustProber, HttpTrustProber, TrustProber};
pub use publisher::{FanOutReport, FeedPublisher};
pub use registrar::{RegistrationOutcome, SubscriptionRegistrar};
pub use replies::{AcceptedReply, ReplyAuthorizer};
pub use sanitizer::HtmlSanitizer;

// crates/quill-federation/src/client.rs
//
// FederationClient: the shared outbound HTTP client for instance-to-instance
// calls (reverse-trust probes and feed pushes).

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use quill_core::error::QuillError;
use quill_core::feed::FeedPayload;
use quill_core::origin::origin_url;

/// Path of the trust-check surface on every instance.
pub const CHECK_CONNECTION_PATH: &str = "/api/check-connection";

/// Path of the feed-push surface on every instance.
pub const UPDATE_FEED_PATH: &str = "/api/update-feed";

/// Outbound client bound to this instance's identity.
///
/// Cheap to clone: `reqwest::Client` is reference counted internally, so all
/// clones share one connection pool.
#[derive(Debug, Clone)]
pub struct FederationClient {
    client: reqwest::Client,
    scheme: String,
    my_origin: String,
}

impl FederationClient {
    /// Create a client for `my_origin`, reaching remotes over `scheme`.
    ///
    /// Every request carries `timeout`; a timeout is reported like any
    /// other network failure. Fails if the TLS backend cannot initialize.
    pub fn new(scheme: &str, my_origin: &str, timeout: Duration) -> Result<Self, QuillError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuillError::NetworkUnavailable(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            scheme: scheme.to_string(),
            my_origin: my_origin.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn my_origin(&self) -> &str {
        &self.my_origin
    }

    /// `{scheme}://{origin}{path}` for a remote instance.
    pub fn url_for(&self, origin: &str, path: &str) -> String {
        origin_url(&self.scheme, origin, path)
    }

    /// Ask `remote` whether it holds a Connection for `subject`.
    ///
    /// Returns the decoded JSON body of a 2xx response. Transport failures,
    /// timeouts and non-success statuses become `NetworkUnavailable`;
    /// undecodable bodies become `Serialization`.
    pub async fn check_connection(
        &self,
        remote: &str,
        subject: &str,
    ) -> Result<serde_json::Value, QuillError> {
        let url = Url::parse_with_params(
            &self.url_for(remote, CHECK_CONNECTION_PATH),
            &[("origin", subject)],
        )
        .map_err(|e| QuillError::InvalidInput(format!("bad remote origin '{}': {}", remote, e)))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QuillError::NetworkUnavailable(format!("{}: {}", remote, e)))?;

        if !resp.status().is_success() {
            return Err(QuillError::NetworkUnavailable(format!(
                "{} answered {}",
                remote,
                resp.status()
            )));
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| QuillError::Serialization(format!("{}: {}", remote, e)))
    }

    /// Push a feed payload to `subscriber`'s feed-push surface.
    ///
    /// A 401 from the subscriber means it holds no Connection for us and is
    /// reported as `Unauthorized`; every other failure is
    /// `NetworkUnavailable`.
    pub async fn push_feed(&self, subscriber: &str, payload: &FeedPayload) -> Result<(), QuillError> {
        let url = self.url_for(subscriber, UPDATE_FEED_PATH);

        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| QuillError::NetworkUnavailable(format!("{}: {}", subscriber, e)))?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(QuillError::Unauthorized(format!(
                "{} does not trust {}",
                subscriber, self.my_origin
            ))),
            s => Err(QuillError::NetworkUnavailable(format!(
                "{} answered {}",
                subscriber, s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_uses_configured_scheme() {
        let client = FederationClient::new("http", "a.example", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url_for("127.0.0.1:9000", UPDATE_FEED_PATH),
            "http://127.0.0.1:9000/api/update-feed"
        );
        assert_eq!(client.my_origin(), "a.example");
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_network_unavailable() {
        // Port 1 on loopback is never listening in the test environment.
        let client = FederationClient::new("http", "a.example", Duration::from_millis(500)).unwrap();
        let err = client.check_connection("127.0.0.1:1", "a.example").await.unwrap_err();
        assert!(matches!(err, QuillError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn test_silent_remote_is_cut_off_at_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                held.push(sock);
            }
        });

        let client = FederationClient::new("http", "a.example", Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        let err = client.check_connection(&addr, "a.example").await.unwrap_err();
        assert!(matches!(err, QuillError::NetworkUnavailable(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}

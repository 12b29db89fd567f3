// crates/quill-cli/src/api_client.rs
//
// Thin JSON client for the quilld HTTP surfaces.

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("{status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

pub struct ApiClient {
    base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str, token: Option<String>) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let req = self.authorize(self.client.get(self.url(path)));
        decode(req.send().await?).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CliError> {
        let req = self.authorize(self.client.get(self.url(path)).query(query));
        decode(req.send().await?).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        let req = self.authorize(self.client.post(self.url(path)).json(body));
        decode(req.send().await?).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CliError> {
        let req = self.authorize(self.client.put(self.url(path)).json(body));
        decode(req.send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, CliError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
    Err(CliError::Api {
        status: status.as_u16(),
        code: body["error"].as_str().unwrap_or("UNKNOWN").to_string(),
        message: body["message"].as_str().unwrap_or("").to_string(),
    })
}

use crate::config::Config;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Header names are case-insensitive; `HeaderName::from_static` wants lowercase.
pub const API_KEY_HEADER: &str = "x-redmine-api-key";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to tracker failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Tracker returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Tracker response was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("Invalid API key header value")]
    InvalidApiKey,
}

/// Query string as ordered key/value pairs.
pub type Query = Vec<(String, String)>;

/// Read access to the tracker's REST API.
#[async_trait]
pub trait RedmineApi: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClientError>;
}

pub struct RedmineClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedmineClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::HeaderName::from_static(API_KEY_HEADER),
            config
                .api_key
                .parse::<reqwest::header::HeaderValue>()
                .map_err(|_| ClientError::InvalidApiKey)?,
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .map_err(ClientError::Transport)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl RedmineApi for RedmineClient {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response.json::<Value>().await.map_err(ClientError::Decode)
    }
}

/// Builds an owned query from borrowed pairs.
pub fn query<I, K, V>(pairs: I) -> Query
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

//! OpenSearch REST client implementing [`SearchBackend`].

use super::{SearchBackend, SearchRequest, SearchResponse, WriteOp};
use crate::config::BackendConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, trace};

/// Error type OpenSearch reports when creating an index that exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// Client for an OpenSearch (or Elasticsearch-compatible) cluster.
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    http_client: Client,
    base_url: Url,
    credentials: Option<(String, Option<String>)>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    #[serde(rename = "_id")]
    id: String,
}

impl OpenSearchClient {
    /// Creates a client for the cluster described by `config`.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.url.clone()));
        }

        let http_client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
        })
    }

    /// Builds `<base>/<segment>/<segment>...`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                error!("Request to search backend timed out");
                return BackendError::Timeout;
            }
            error!(error = %e, "Network error during search backend request");
            BackendError::Network(e)
        })
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, BackendError> {
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read response body");
            BackendError::Network(e)
        })?;
        trace!(body = %body, "Response body");

        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse search backend response");
            BackendError::InvalidResponse(format!("JSON parse error: {e}"))
        })
    }
}

/// Turn a non-success response into an error.
async fn api_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    error!(status, body = %message, "Search backend error");
    BackendError::Api { status, message }
}

#[async_trait]
impl SearchBackend for OpenSearchClient {
    #[instrument(skip(self))]
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        let url = self.endpoint(&[index])?;
        let response = self.send(self.request(Method::HEAD, url)).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(api_error(response).await),
        }
    }

    #[instrument(skip(self, body))]
    async fn create_index(&self, index: &str, body: &Value) -> Result<(), BackendError> {
        let url = self.endpoint(&[index])?;
        let response = self.send(self.request(Method::PUT, url).json(body)).await?;

        if response.status().is_success() {
            return Ok(());
        }
        match api_error(response).await {
            BackendError::Api { status: 400, message } if message.contains(ALREADY_EXISTS_ERROR) => {
                Err(BackendError::IndexAlreadyExists(index.to_string()))
            }
            other => Err(other),
        }
    }

    #[instrument(skip(self, document))]
    async fn index_document(
        &self,
        index: &str,
        document: &Value,
        op: WriteOp,
    ) -> Result<String, BackendError> {
        let builder = match &op {
            WriteOp::Index => self.request(Method::POST, self.endpoint(&[index, "_doc"])?),
            WriteOp::CreateIfAbsent(handle) => {
                self.request(Method::PUT, self.endpoint(&[index, "_create", handle])?)
            }
        };
        let response = self.send(builder.json(document)).await?;
        let status = response.status();
        debug!(status = %status, "Received write response");

        if status == StatusCode::CONFLICT
            && let WriteOp::CreateIfAbsent(handle) = op
        {
            return Err(BackendError::DocumentExists(handle));
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        let written: WriteResponse = Self::read_json(response).await?;
        Ok(written.id)
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, index: &str, handle: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&[index, "_doc", handle])?;
        let response = self.send(self.request(Method::DELETE, url)).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!("Document was already gone");
                Ok(())
            }
            _ => Err(api_error(response).await),
        }
    }

    #[instrument(skip(self, request), fields(size = request.size))]
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, BackendError> {
        let url = self.endpoint(&[index, "_search"])?;
        let response = self.send(self.request(Method::POST, url).json(request)).await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: SearchResponse = Self::read_json(response).await?;
        debug!(
            total = parsed.total(),
            returned = parsed.hits.hits.len(),
            "Search completed"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn client(url: &str) -> OpenSearchClient {
        OpenSearchClient::new(&BackendConfig {
            url: url.to_string(),
            ..BackendConfig::default()
        })
        .unwrap()
    }

    #[rstest]
    #[case("http://localhost:9200", &["snippets", "_search"], "http://localhost:9200/snippets/_search")]
    #[case("http://localhost:9200/", &["snippets"], "http://localhost:9200/snippets")]
    #[case("https://search.internal/os/", &["snippets", "_doc", "abc"], "https://search.internal/os/snippets/_doc/abc")]
    fn test_endpoint_joins_segments(
        #[case] base: &str,
        #[case] segments: &[&str],
        #[case] expected: &str,
    ) {
        check!(client(base).endpoint(segments).unwrap().as_str() == expected);
    }

    #[test]
    fn test_endpoint_encodes_document_ids() {
        let url = client("http://localhost:9200")
            .endpoint(&["snippets", "_create", "https://example.com/a b#c"])
            .unwrap();
        check!(url.as_str() == "http://localhost:9200/snippets/_create/https:%2F%2Fexample.com%2Fa%20b%23c");
    }

    #[rstest]
    #[case("not a url")]
    #[case("mailto:search@example.com")]
    fn test_rejects_unusable_base_url(#[case] url: &str) {
        let result = OpenSearchClient::new(&BackendConfig {
            url: url.to_string(),
            ..BackendConfig::default()
        });
        let_assert!(Err(BackendError::InvalidUrl(_)) = result);
    }

    #[test]
    fn test_credentials_require_username() {
        let anonymous = client("http://localhost:9200");
        check!(anonymous.credentials.is_none());

        let authenticated = OpenSearchClient::new(&BackendConfig {
            username: Some("admin".into()),
            password: Some("secret".into()),
            ..BackendConfig::default()
        })
        .unwrap();
        check!(authenticated.credentials == Some(("admin".into(), Some("secret".into()))));
    }
}

//! Minimal search-service client: single-hit exact-term lookups.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use pubtools_shared::{ConnectionConfig, PubtoolsError, Result};

use crate::types::{Hit, SearchResponse};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("pubtools/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed back in a diagnostic.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client bound to one search service.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    base: String,
    user: Option<String>,
    password: Option<String>,
}

impl SearchClient {
    /// Build a client from resolved connection settings.
    pub fn new(conn: &ConnectionConfig) -> Result<Self> {
        let parsed = Url::parse(&conn.host)
            .map_err(|e| PubtoolsError::config(format!("invalid search host '{}': {e}", conn.host)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PubtoolsError::config(format!(
                "search host must be http or https: {}",
                conn.host
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(conn.timeout_secs))
            .build()
            .map_err(|e| PubtoolsError::ServiceUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base: conn.host.trim_end_matches('/').to_string(),
            user: conn.user.clone(),
            password: conn.password.clone(),
        })
    }

    /// Exact-term query on `field`, asking for one hit with its version.
    ///
    /// Returns the (possibly empty) hit list; callers decide whether zero
    /// hits is an error.
    #[instrument(skip(self), fields(host = %self.base))]
    pub async fn search_term(&self, index: &str, field: &str, value: &str) -> Result<Vec<Hit>> {
        let url = format!("{}/{index}/_search", self.base);
        let body = json!({ "query": { "term": { field: value } } });

        let mut request = self
            .http
            .post(&url)
            .query(&[("version", "true"), ("size", "1")])
            .json(&body);
        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| PubtoolsError::ServiceUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PubtoolsError::AuthenticationFailure(format!("{url}: HTTP {status}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(PubtoolsError::ServiceUnavailable(format!(
                "{url}: HTTP {status}: {snippet}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PubtoolsError::ServiceUnavailable(format!("{url}: failed to read body: {e}")))?;
        let parsed: SearchResponse = serde_json::from_slice(&bytes)
            .map_err(|e| PubtoolsError::parse(format!("{url}: unexpected search response: {e}")))?;

        debug!(hits = parsed.hits.hits.len(), "search complete");
        Ok(parsed.hits.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn conn(host: &str, user: Option<&str>, password: Option<&str>) -> ConnectionConfig {
        ConnectionConfig {
            host: host.into(),
            user: user.map(String::from),
            password: password.map(String::from),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn sends_term_query_with_basic_auth() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sequence/_search"))
            .and(query_param("version", "true"))
            .and(query_param("size", "1"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .and(body_json(json!({ "query": { "term": { "_id": "PublishingPlan-Production" } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "hits": [ { "_id": "PublishingPlan-Production", "_version": 12 } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(&conn(&server.uri(), Some("user"), Some("pass"))).unwrap();
        let hits = client
            .search_term("sequence", "_id", "PublishingPlan-Production")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].version, Some(12));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = SearchClient::new(&conn(&server.uri(), Some("user"), Some("wrong"))).unwrap();
        let err = client.search_term("sequence", "_id", "x").await.unwrap_err();
        assert!(matches!(err, PubtoolsError::AuthenticationFailure(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_service_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("cluster red"))
            .mount(&server)
            .await;

        let client = SearchClient::new(&conn(&server.uri(), None, None)).unwrap();
        let err = client.search_term("sequence", "_id", "x").await.unwrap_err();
        match err {
            PubtoolsError::ServiceUnavailable(msg) => assert!(msg.contains("cluster red")),
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_maps_to_service_unavailable() {
        let client = SearchClient::new(&conn("http://127.0.0.1:1", None, None)).unwrap();
        let err = client.search_term("sequence", "_id", "x").await.unwrap_err();
        assert!(matches!(err, PubtoolsError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = SearchClient::new(&conn(&server.uri(), None, None)).unwrap();
        let err = client.search_term("sequence", "_id", "x").await.unwrap_err();
        assert!(matches!(err, PubtoolsError::Parse { .. }));
    }

    #[test]
    fn rejects_non_http_host() {
        assert!(SearchClient::new(&conn("ftp://search", None, None)).is_err());
        assert!(SearchClient::new(&conn("not a url", None, None)).is_err());
    }
}

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::error::{Result, ShoppingError};

const SEARCH_ENGINE: &str = "google";

/// One entry of the `organic_results` array. Every field is optional on the
/// wire; missing ones are surfaced as empty strings by the dispatcher.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OrganicResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
}

/// A web search backend that can run one query and hand back its organic
/// results in rank order.
#[async_trait]
pub trait SiteSearch: Send + Sync {
    async fn search(&self, api_key: &SecretString, query: &str, num: usize) -> Result<Vec<OrganicResult>>;
}

pub struct SerpClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl SerpClient {
    pub fn new(endpoint: Url, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }
}

#[async_trait]
impl SiteSearch for SerpClient {
    async fn search(&self, api_key: &SecretString, query: &str, num: usize) -> Result<Vec<OrganicResult>> {
        debug!("Sending search request: engine={} q={:?} num={}", SEARCH_ENGINE, query, num);

        let num_param = num.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("engine", SEARCH_ENGINE),
                ("q", query),
                ("api_key", api_key.expose_secret()),
                ("num", num_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Search request failed with status {}: {}", status, body);
            return Err(ShoppingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_organic_results(&body, num)
    }
}

/// Pulls the first `num` entries of `organic_results` out of a search
/// response body. A body without the field is a valid empty result, and
/// entries past `num` are never looked at.
pub fn parse_organic_results(body: &str, num: usize) -> Result<Vec<OrganicResult>> {
    let response_json: Value = serde_json::from_str(body)
        .map_err(|e| ShoppingError::MalformedResponse(format!("search response is not JSON: {}", e)))?;

    let results = match response_json.get("organic_results") {
        None => {
            debug!("Search response has no organic_results");
            return Ok(Vec::new());
        }
        Some(Value::Array(results)) => results,
        Some(_) => {
            return Err(ShoppingError::MalformedResponse(
                "organic_results is not an array".to_string(),
            ))
        }
    };

    results
        .iter()
        .take(num)
        .map(|result| {
            OrganicResult::deserialize(result)
                .map_err(|e| ShoppingError::MalformedResponse(format!("organic_results entry: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;

    fn client_for(server: &MockServer) -> SerpClient {
        let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();
        SerpClient::new(endpoint, reqwest::Client::new())
    }

    fn key() -> SecretString {
        SecretString::from("serp-test-key")
    }

    #[tokio::test]
    async fn sends_engine_query_key_and_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "site:flipkart.com running shoes"))
            .and(query_param("api_key", "serp-test-key"))
            .and(query_param("num", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    {"title": "Shoe A", "link": "https://www.flipkart.com/a", "snippet": "Light"},
                    {"title": "Shoe B", "link": "https://www.flipkart.com/b"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server)
            .search(&key(), "site:flipkart.com running shoes", 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title.as_deref(), Some("Shoe A"));
        assert_eq!(results[1].snippet, None);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let err = client_for(&server).search(&key(), "site:amazon.in tv", 3).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn html_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).search(&key(), "site:amazon.in tv", 3).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let endpoint = Url::parse("http://127.0.0.1:9/search").unwrap();
        let client = SerpClient::new(endpoint, reqwest::Client::new());

        let err = client.search(&key(), "site:amazon.in tv", 3).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn network_error_does_not_expose_key() {
        let endpoint = Url::parse("http://127.0.0.1:9/search").unwrap();
        let client = SerpClient::new(endpoint, reqwest::Client::new());
        let key = SecretString::from("SUPER-SECRET-SERP");

        let err = client.search(&key, "site:amazon.in tv", 3).await.unwrap_err();

        let rendered = format!("Error ({}): {}", err.kind(), err);
        assert!(!rendered.contains("SUPER-SECRET-SERP"), "key leaked: {}", rendered);
        assert!(!format!("{:?}", err).contains("SUPER-SECRET-SERP"));
    }

    #[test]
    fn entries_past_the_cap_are_not_parsed() {
        let body = r#"{"organic_results": [
            {"title": "a"}, {"title": "b"}, {"title": "c"}, "not an object"
        ]}"#;

        let results = parse_organic_results(body, 3).unwrap();

        let titles: Vec<_> = results.iter().map(|r| r.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn malformed_entry_within_the_cap_is_malformed() {
        let err = parse_organic_results(r#"{"organic_results": [{"title": "a"}, 42]}"#, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn missing_organic_results_is_empty() {
        let results = parse_organic_results(r#"{"search_metadata": {"status": "Success"}}"#, 3).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn non_array_organic_results_is_malformed() {
        let err = parse_organic_results(r#"{"organic_results": "nope"}"#, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn null_fields_are_tolerated() {
        let results = parse_organic_results(r#"{"organic_results": [{"title": null, "link": "x"}]}"#, 3).unwrap();
        assert_eq!(results[0], OrganicResult { title: None, link: Some("x".into()), snippet: None });
    }
}

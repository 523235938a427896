use crate::domain::model::CatalogRecord;
use crate::domain::ports::{CardCatalog, CollectionPage, ConfigProvider};
use crate::utils::error::{Result, ValidatorError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_COLLECTION_ENDPOINT: &str = "https://api.scryfall.com/cards/collection";
pub const DEFAULT_NAMED_ENDPOINT: &str = "https://api.scryfall.com/cards/named";

#[derive(Serialize)]
struct Identifier<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CollectionRequest<'a> {
    identifiers: Vec<Identifier<'a>>,
}

#[derive(Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    data: Vec<CatalogRecord>,
    #[serde(default)]
    not_found: Vec<serde_json::Value>,
}

/// not_found 通常是 identifier 物件，偶爾是純字串
fn not_found_name(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(identifier) => identifier
            .get("name")
            .and_then(|name| name.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        serde_json::Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

/// HTTP client for the Scryfall card API.
pub struct ScryfallClient {
    client: Client,
    collection_endpoint: String,
    named_endpoint: String,
    timeout: Option<Duration>,
}

impl ScryfallClient {
    pub fn new(
        collection_endpoint: impl Into<String>,
        named_endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            collection_endpoint: collection_endpoint.into(),
            named_endpoint: named_endpoint.into(),
            timeout,
        })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::new(
            config.collection_endpoint(),
            config.named_endpoint(),
            config.user_agent(),
            config.request_timeout(),
        )
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

async fn status_error(response: reqwest::Response) -> ValidatorError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ValidatorError::CatalogStatusError { status, message }
}

#[async_trait]
impl CardCatalog for ScryfallClient {
    async fn fetch_collection(&self, names: &[String]) -> Result<CollectionPage> {
        let body = CollectionRequest {
            identifiers: names
                .iter()
                .map(|name| Identifier { name: name.as_str() })
                .collect(),
        };

        tracing::debug!(
            "POST {} with {} identifiers",
            self.collection_endpoint,
            names.len()
        );
        let response = self
            .prepare(self.client.post(&self.collection_endpoint))
            .json(&body)
            .send()
            .await?;
        tracing::debug!("Collection response status: {}", response.status());

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: CollectionResponse = response.json().await?;
        Ok(CollectionPage {
            found: parsed.data,
            not_found: parsed.not_found.iter().map(not_found_name).collect(),
        })
    }

    async fn fetch_named_fuzzy(&self, name: &str) -> Result<Option<CatalogRecord>> {
        tracing::debug!("GET {} fuzzy='{}'", self.named_endpoint, name);
        let response = self
            .prepare(self.client.get(&self.named_endpoint))
            .query(&[("fuzzy", name)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(status_error(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> ScryfallClient {
        ScryfallClient::new(
            server.url("/cards/collection"),
            server.url("/cards/named"),
            "deck-validator-test/0.1",
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_collection_posts_identifiers() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/cards/collection")
                .json_body(serde_json::json!({
                    "identifiers": [{"name": "Sol Ring"}, {"name": "Lightning Blot"}]
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "object": "list",
                    "not_found": [{"name": "Lightning Blot"}],
                    "data": [{
                        "object": "card",
                        "name": "Sol Ring",
                        "color_identity": [],
                        "type_line": "Artifact",
                        "legalities": {"commander": "legal"},
                        "game_changer": true
                    }]
                }));
        });

        let page = client(&server)
            .fetch_collection(&["Sol Ring".to_string(), "Lightning Blot".to_string()])
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(page.found.len(), 1);
        assert!(page.found[0].is_game_changer());
        assert_eq!(page.not_found, vec!["Lightning Blot".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_collection_surfaces_http_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/cards/collection");
            then.status(429).body("slow down");
        });

        let err = client(&server)
            .fetch_collection(&["Sol Ring".to_string()])
            .await
            .unwrap_err();

        api_mock.assert();
        match err {
            ValidatorError::CatalogStatusError { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fuzzy_lookup_found_and_not_found() {
        let server = MockServer::start();
        let found_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/cards/named")
                .query_param("fuzzy", "lightning blot");
            then.status(200).json_body(serde_json::json!({
                "name": "Lightning Bolt",
                "color_identity": ["R"],
                "type_line": "Instant",
                "legalities": {"commander": "legal"}
            }));
        });
        let missing_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/cards/named")
                .query_param("fuzzy", "zzzz");
            then.status(404).json_body(serde_json::json!({
                "object": "error",
                "code": "not_found",
                "status": 404
            }));
        });

        let scryfall = client(&server);
        let bolt = scryfall.fetch_named_fuzzy("lightning blot").await.unwrap();
        let nothing = scryfall.fetch_named_fuzzy("zzzz").await.unwrap();

        found_mock.assert();
        missing_mock.assert();
        assert_eq!(bolt.unwrap().name, "Lightning Bolt");
        assert!(nothing.is_none());
    }

    #[tokio::test]
    async fn test_fuzzy_lookup_server_error_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cards/named");
            then.status(500);
        });

        let result = client(&server).fetch_named_fuzzy("anything").await;
        assert!(matches!(
            result,
            Err(ValidatorError::CatalogStatusError { status: 500, .. })
        ));
    }

    #[test]
    fn test_not_found_name_variants() {
        assert_eq!(not_found_name(&serde_json::json!({"name": "Foo"})), "Foo");
        assert_eq!(not_found_name(&serde_json::json!("Bar")), "Bar");
    }
}

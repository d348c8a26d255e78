use futures::future::BoxFuture;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::{
    config::{Config, ConfigError},
    entity::FetchError,
};

pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

const METAOBJECTS_QUERY: &str = r#"query Vehicles($type: String!, $first: Int!, $after: String) {
  metaobjects(type: $type, first: $first, after: $after) {
    nodes {
      id
      fields { key value }
    }
    pageInfo { hasNextPage endCursor }
  }
}"#;

/// Variables of one paginated metaobject query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    #[serde(rename = "type")]
    pub type_name: String,
    pub first: u32,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaobjectPage {
    #[serde(default)]
    pub nodes: Vec<MetaobjectNode>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaobjectNode {
    pub id: String,
    #[serde(default)]
    pub fields: Vec<MetaobjectField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaobjectField {
    pub key: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: Option<String>,
}

impl MetaobjectNode {
    /// `(key, value)` tuples of the fields that carry a value.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|f| f.value.as_deref().map(|v| (f.key.as_str(), v)))
    }
}

// year is sometimes stored as a number
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Paginated access to the remote metaobject store.
pub trait MetaobjectSource: Send + Sync {
    fn page<'a>(
        &'a self,
        request: &'a PageRequest,
    ) -> BoxFuture<'a, Result<MetaobjectPage, FetchError>>;
}

/// Shared HTTP client backed by rustls with the ring provider.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    // a provider may already be installed by an earlier call
    let _ = rustls::crypto::ring::default_provider().install_default();
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// GraphQL storefront client.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http_client: reqwest::Client,
    endpoint: Url,
    token: HeaderValue,
}

impl StorefrontClient {
    /// Fails before any request is made when the credential or domain is unusable.
    pub fn new(http_client: reqwest::Client, config: &Config) -> Result<Self, ConfigError> {
        let mut token =
            HeaderValue::from_str(config.access_token()?).map_err(|_| ConfigError::InvalidCredential)?;
        token.set_sensitive(true);

        let base = config.store_url()?;
        let endpoint = base
            .join(&format!("api/{}/graphql.json", config.api_version))
            .map_err(|_| ConfigError::InvalidStoreDomain(base.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl MetaobjectSource for StorefrontClient {
    fn page<'a>(
        &'a self,
        request: &'a PageRequest,
    ) -> BoxFuture<'a, Result<MetaobjectPage, FetchError>> {
        Box::pin(async move {
            let body = serde_json::json!({
                "query": METAOBJECTS_QUERY,
                "variables": request,
            });

            debug!(
                "querying '{}' after {:?} from {}",
                request.type_name, request.after, self.endpoint
            );

            let resp = self
                .http_client
                .post(self.endpoint.clone())
                .header(ACCESS_TOKEN_HEADER, self.token.clone())
                .json(&body)
                .send()
                .await?;

            if !resp.status().is_success() {
                error!(
                    "storefront returned {} for '{}'",
                    resp.status(),
                    request.type_name
                );
                return Err(FetchError::Status(resp.status().to_string()));
            }

            let text = resp.text().await?;
            decode_response(&text)
        })
    }
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct ResponseData {
    metaobjects: Option<MetaobjectPage>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// Decode a GraphQL response body into one page of nodes.
///
/// Any entry in `errors` fails the page, even if `data` is also present.
pub fn decode_response(body: &str) -> Result<MetaobjectPage, FetchError> {
    let response: GraphqlResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(FetchError::Query(messages.join("; ")));
    }

    response
        .data
        .and_then(|d| d.metaobjects)
        .ok_or_else(|| FetchError::Decode("missing data.metaobjects".to_string()))
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use super::*;

    type PageKey = (String, Option<String>);

    /// In-memory store keyed by (type name, cursor).
    #[derive(Default)]
    pub struct FakeSource {
        pages: HashMap<PageKey, Result<MetaobjectPage, String>>,
        pub requests: Mutex<Vec<PageRequest>>,
        hold: Option<Arc<Notify>>,
    }

    pub fn node(id: &str, fields: &[(&str, &str)]) -> MetaobjectNode {
        MetaobjectNode {
            id: id.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| MetaobjectField {
                    key: k.to_string(),
                    value: Some(v.to_string()),
                })
                .collect(),
        }
    }

    pub fn vehicle(id: &str, year: &str, make: &str, model: &str) -> MetaobjectNode {
        node(id, &[("year", year), ("make", make), ("model", model)])
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(
            mut self,
            type_name: &str,
            after: Option<&str>,
            nodes: Vec<MetaobjectNode>,
            next: Option<&str>,
        ) -> Self {
            let page = MetaobjectPage {
                nodes,
                page_info: PageInfo {
                    has_next_page: next.is_some(),
                    end_cursor: next.map(String::from),
                },
            };
            self.pages.insert(
                (type_name.to_string(), after.map(String::from)),
                Ok(page),
            );
            self
        }

        pub fn with_failure(mut self, type_name: &str, after: Option<&str>, message: &str) -> Self {
            self.pages.insert(
                (type_name.to_string(), after.map(String::from)),
                Err(message.to_string()),
            );
            self
        }

        /// Block every page until the returned handle is notified.
        pub fn held(mut self) -> (Self, Arc<Notify>) {
            let notify = Arc::new(Notify::new());
            self.hold = Some(notify.clone());
            (self, notify)
        }

        pub fn request_count(&self, type_name: &str) -> usize {
            self.requests
                .lock()
                .iter()
                .filter(|r| r.type_name == type_name)
                .count()
        }
    }

    impl MetaobjectSource for FakeSource {
        fn page<'a>(
            &'a self,
            request: &'a PageRequest,
        ) -> BoxFuture<'a, Result<MetaobjectPage, FetchError>> {
            Box::pin(async move {
                if let Some(hold) = &self.hold {
                    hold.notified().await;
                }
                self.requests.lock().push(request.clone());
                match self
                    .pages
                    .get(&(request.type_name.clone(), request.after.clone()))
                {
                    Some(Ok(page)) => Ok(page.clone()),
                    Some(Err(message)) => Err(FetchError::Query(message.clone())),
                    None => Ok(MetaobjectPage::default()),
                }
            })
        }
    }
}

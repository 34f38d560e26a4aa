// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::document::DocumentBody;
use crate::models::health::EngineInfo;
use crate::services::engine::{
    BulkResponse, EngineError, FieldMappings, RawSearchResponse, SearchEngine,
};
use crate::services::logging::redact_url;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// URL parsing drops `.` and `..` path segments, so such ids cannot be
/// addressed through `/{index}/_doc/{id}`.
fn is_addressable(id: &str) -> bool {
    !matches!(id, "." | "..")
}

/// Connection settings for an Elasticsearch cluster
#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_certs: bool,
}

impl ElasticsearchConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            verify_certs: true,
        }
    }
}

/// Elasticsearch REST client.
///
/// Wraps a single `reqwest::Client`, whose connection pool is shared by all
/// in-flight requests.
pub struct ElasticsearchEngine {
    client: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl ElasticsearchEngine {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self, EngineError> {
        // Construct the full URL if only host:port is provided
        let raw = if config.host.starts_with("http://") || config.host.starts_with("https://") {
            config.host.clone()
        } else {
            format!("http://{}", config.host)
        };

        let base_url = Url::parse(raw.trim_end_matches('/')).map_err(|e| {
            EngineError::InvalidRequest(format!("Invalid engine URL '{}': {}", config.host, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::InvalidRequest(format!(
                "Invalid engine URL '{}'",
                config.host
            )));
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()
            .map_err(|e| EngineError::Unreachable(format!("Failed to build HTTP client: {e}")))?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };

        tracing::info!(
            url = %redact_url(base_url.as_str()),
            authenticated = credentials.is_some(),
            "Configured Elasticsearch client"
        );

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Build an endpoint URL from path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if segments.is_empty() {
            return url;
        }
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(segments));
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, EngineError> {
        builder
            .send()
            .await
            .map_err(|e| EngineError::Unreachable(e.to_string()))
    }
}

#[derive(Deserialize)]
struct InfoBody {
    cluster_name: String,
    version: VersionBody,
}

#[derive(Deserialize)]
struct VersionBody {
    number: String,
}

#[derive(Deserialize)]
struct IndexedBody {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Deserialize)]
struct GetBody {
    #[serde(rename = "_source", default)]
    source: DocumentBody,
}

/// Error body shape: `{"error": {"type": "...", "reason": "..."}, "status": 400}`.
/// Older nodes and proxies may send a plain string instead.
#[derive(Debug, PartialEq)]
struct EngineFailure {
    status: u16,
    kind: Option<String>,
    reason: String,
}

impl EngineFailure {
    fn parse(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let kind = error
            .and_then(|e| e.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let reason = match error {
            Some(Value::String(s)) => s.clone(),
            Some(e) => e
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
            None if body.is_empty() => format!("HTTP {status}"),
            None => body.to_string(),
        };

        Self {
            status,
            kind,
            reason,
        }
    }

    fn into_error(self) -> EngineError {
        EngineError::Engine {
            status: self.status,
            reason: match self.kind {
                Some(kind) => format!("{kind}: {}", self.reason),
                None => self.reason,
            },
        }
    }
}

async fn failure(response: Response) -> EngineFailure {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(status, error = %e, "Failed to read engine error body");
            String::new()
        }
    };
    EngineFailure::parse(status, &body)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, EngineError> {
    response
        .json::<T>()
        .await
        .map_err(|e| EngineError::Decode(e.to_string()))
}

/// Pull `properties.<field>.type` out of a `GET /{index}/_mapping` body.
fn parse_field_mappings(body: &Value) -> FieldMappings {
    // Keyed by concrete index name, which differs from the request when it was an alias
    let properties = body
        .as_object()
        .and_then(|indices| indices.values().next())
        .and_then(|index| index.pointer("/mappings/properties"))
        .and_then(Value::as_object);

    properties
        .map(|props| {
            props
                .iter()
                .map(|(field, spec)| {
                    let kind = spec
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("object")
                        .to_string();
                    (field.clone(), kind)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Serialize bulk operations as newline-delimited JSON, including the trailing newline.
fn to_ndjson(operations: &[Value]) -> Result<String, EngineError> {
    let mut body = String::new();
    for op in operations {
        let line = serde_json::to_string(op).map_err(|e| EngineError::Encode(e.to_string()))?;
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl SearchEngine for ElasticsearchEngine {
    async fn ping(&self) -> Result<bool, EngineError> {
        let response = self.send(self.request(Method::HEAD, &[])).await?;
        Ok(response.status().is_success())
    }

    async fn info(&self) -> Result<EngineInfo, EngineError> {
        let response = self.send(self.request(Method::GET, &[])).await?;
        if !response.status().is_success() {
            return Err(failure(response).await.into_error());
        }
        let info: InfoBody = decode(response).await?;
        Ok(EngineInfo {
            cluster_name: info.cluster_name,
            version: info.version.number,
        })
    }

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let response = self.send(self.request(Method::HEAD, &[index])).await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(failure(response).await.into_error()),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), EngineError> {
        let response = self
            .send(self.request(Method::PUT, &[index]).json(body))
            .await?;
        if response.status().is_success() {
            return Ok(());
        }

        let failure = failure(response).await;
        if failure.kind.as_deref() == Some(ALREADY_EXISTS) {
            return Err(EngineError::IndexAlreadyExists(index.to_string()));
        }
        Err(failure.into_error())
    }

    async fn field_mappings(&self, index: &str) -> Result<FieldMappings, EngineError> {
        let response = self
            .send(self.request(Method::GET, &[index, "_mapping"]))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response).await.into_error());
        }
        let body: Value = decode(response).await?;
        Ok(parse_field_mappings(&body))
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        body: &Value,
    ) -> Result<String, EngineError> {
        let builder = match id {
            Some(id) if !is_addressable(id) => {
                return Err(EngineError::InvalidRequest(format!(
                    "document id '{id}' cannot be used in a request path"
                )));
            }
            Some(id) => self.request(Method::PUT, &[index, "_doc", id]),
            None => self.request(Method::POST, &[index, "_doc"]),
        };
        let response = self.send(builder.json(body)).await?;
        if !response.status().is_success() {
            return Err(failure(response).await.into_error());
        }
        let indexed: IndexedBody = decode(response).await?;
        Ok(indexed.id)
    }

    async fn bulk(&self, operations: &[Value]) -> Result<BulkResponse, EngineError> {
        let body = to_ndjson(operations)?;
        let builder = self
            .request(Method::POST, &["_bulk"])
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(failure(response).await.into_error());
        }
        decode(response).await
    }

    async fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<DocumentBody>, EngineError> {
        if !is_addressable(id) {
            return Ok(None);
        }
        let response = self
            .send(self.request(Method::GET, &[index, "_doc", id]))
            .await?;
        match response.status() {
            s if s.is_success() => {
                let found: GetBody = decode(response).await?;
                Ok(Some(found.source))
            }
            // Missing document and missing index both mean "absent"
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(failure(response).await.into_error()),
        }
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        fields: &DocumentBody,
    ) -> Result<bool, EngineError> {
        if !is_addressable(id) {
            return Ok(false);
        }
        let response = self
            .send(
                self.request(Method::POST, &[index, "_update", id])
                    .json(&json!({ "doc": fields })),
            )
            .await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(failure(response).await.into_error()),
        }
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, EngineError> {
        if !is_addressable(id) {
            return Ok(false);
        }
        let response = self
            .send(self.request(Method::DELETE, &[index, "_doc", id]))
            .await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(failure(response).await.into_error()),
        }
    }

    async fn search(&self, index: &str, body: &Value) -> Result<RawSearchResponse, EngineError> {
        let response = self
            .send(self.request(Method::POST, &[index, "_search"]).json(body))
            .await?;
        if !response.status().is_success() {
            return Err(failure(response).await.into_error());
        }
        decode(response).await
    }
}

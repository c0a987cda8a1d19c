//! HTTP transport for the node's JSON-RPC endpoint and the exchange API

use super::classify::{JsonRpcClassifier, ResponseClassifier, StatusClassifier};
use crate::auth::TokenGenerator;
use crate::config::{ClassifierKind, ClientConfig, Settings};
use crate::error::{ClientError, ClientResult};

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Which endpoint a request went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Rpc,
    Api,
}

/// Shared transport for both call shapes.
///
/// Holds no per-call state besides the JSON-RPC id counter, so one instance
/// can serve concurrent callers.
pub struct RpcClient {
    http: reqwest::Client,
    rpc_url: String,
    api_base_url: String,
    classifier: Arc<dyn ResponseClassifier>,
    tokens: TokenGenerator,
    next_id: AtomicU64,
    debug: bool,
}

impl RpcClient {
    /// Create a new transport
    pub fn new(config: &ClientConfig, tokens: TokenGenerator) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {}", e)))?;

        let classifier: Arc<dyn ResponseClassifier> = match config.classifier {
            ClassifierKind::Status => Arc::new(StatusClassifier),
            ClassifierKind::Jsonrpc => Arc::new(JsonRpcClassifier),
        };

        Ok(Self {
            http,
            rpc_url: config.rpc_url().to_string(),
            api_base_url: config.base_url.clone(),
            classifier,
            tokens,
            next_id: AtomicU64::new(1),
            debug: config.debug,
        })
    }

    /// Create a transport from loaded settings
    pub fn from_settings(settings: &Settings) -> ClientResult<Self> {
        let tokens = TokenGenerator::new(settings.auth.token_key.as_bytes())?;
        Self::new(&settings.client, tokens)
    }

    /// Replace the response classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn tokens(&self) -> &TokenGenerator {
        &self.tokens
    }

    /// JSON-RPC call with the next request id; returns the `result` member
    pub async fn call(&self, method: &str, params: Vec<Value>) -> ClientResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.call_with_id(method, id, params).await
    }

    /// JSON-RPC call with an explicit request id; returns the `result` member
    pub async fn call_with_id(
        &self,
        method: &str,
        id: u64,
        params: Vec<Value>,
    ) -> ClientResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut resp = self
            .post(Surface::Rpc, method, &self.rpc_url, &body)
            .await?;
        Ok(resp
            .as_object_mut()
            .and_then(|o| o.remove("result"))
            .unwrap_or(Value::Null))
    }

    /// Exchange API call posting `body` to `base_url + method`; returns the
    /// `data` member
    pub async fn api_call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> ClientResult<Value> {
        let url = format!("{}{}", self.api_base_url, method);
        let mut resp = self.post(Surface::Api, method, &url, body).await?;
        Ok(resp
            .as_object_mut()
            .and_then(|o| o.remove("data"))
            .unwrap_or(Value::Null))
    }

    /// Exchange API call stamped with the current time and its token
    pub async fn signed_api_call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> ClientResult<Value> {
        self.signed_api_call_at(method, body, chrono::Utc::now().timestamp())
            .await
    }

    /// Exchange API call stamped with `timestamp` and its token
    pub async fn signed_api_call_at<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
        timestamp: i64,
    ) -> ClientResult<Value> {
        let signed = self.sign_body(body, timestamp)?;
        self.api_call(method, &signed).await
    }

    /// Merge `time` and `token` into an object body
    fn sign_body<B: Serialize + ?Sized>(&self, body: &B, timestamp: i64) -> ClientResult<Value> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::Decode {
            what: "request body".to_string(),
            message: e.to_string(),
        })?;
        let mut fields = match value {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                return Err(ClientError::InvalidArgument(format!(
                    "exchange API body must be an object, got {}",
                    other
                )))
            }
        };
        fields.insert("time".to_string(), Value::String(timestamp.to_string()));
        fields.insert(
            "token".to_string(),
            Value::String(self.tokens.generate(timestamp)),
        );
        Ok(Value::Object(fields))
    }

    /// POST, parse and classify; returns the whole response body
    async fn post<B: Serialize + ?Sized>(
        &self,
        surface: Surface,
        method: &str,
        url: &str,
        body: &B,
    ) -> ClientResult<Value> {
        let started = Instant::now();
        let result = self.post_inner(surface, method, url, body).await;
        crate::metrics::record_request(
            method,
            crate::metrics::outcome_label(&result),
            started.elapsed().as_secs_f64(),
        );
        result
    }

    async fn post_inner<B: Serialize + ?Sized>(
        &self,
        surface: Surface,
        method: &str,
        url: &str,
        body: &B,
    ) -> ClientResult<Value> {
        if self.debug {
            debug!("Start request {} to {}", method, url);
        }

        let response = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                method: method.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ClientError::Transport {
            method: method.to_string(),
            message: e.to_string(),
        })?;

        if self.debug {
            debug!(
                "Request {} completed with HTTP {}: {}",
                method,
                status,
                String::from_utf8_lossy(&bytes)
            );
        }

        let parsed: Value = serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            what: format!("{} response (HTTP {})", method, status),
            message: e.to_string(),
        })?;

        let classified = match surface {
            Surface::Rpc => self.classifier.classify_rpc(&parsed),
            Surface::Api => self.classifier.classify_api(&parsed),
        };
        if let Err(e) = classified {
            warn!("{} rejected: {}", method, e);
            return Err(e);
        }

        Ok(parsed)
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.rpc_url)
            .field("api_base_url", &self.api_base_url)
            .field("classifier", &self.classifier)
            .finish()
    }
}

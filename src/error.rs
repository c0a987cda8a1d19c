//! Error types for the FM chain client

use std::fmt;
use thiserror::Error;

/// Tag of a decoded JSON value, used to report shape mismatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Object,
    Array,
}

impl JsonKind {
    pub fn of(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Object(_) => JsonKind::Object,
            Value::Array(_) => JsonKind::Array,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Call-data encoder failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("length of address error: expected 40 hex characters, got {len}")]
    AddressLength { len: usize },

    #[error("invalid hex in {field}: {value}")]
    InvalidHex { field: &'static str, value: String },

    #[error("integer overflow: {hex_len} hex characters do not fit in 32 bytes")]
    Overflow { hex_len: usize },

    #[error("not support solidity type: {0}")]
    UnsupportedType(String),
}

/// Main error type for the client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error calling {method}: {message}")]
    Transport { method: String, message: String },

    #[error("[{code}]{msg}")]
    Protocol { code: i64, msg: String },

    #[error("Response is empty")]
    EmptyResponse,

    #[error("Decode error for {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Unexpected result type: expected {expected}, got {found}, raw: {raw}")]
    Shape {
        expected: JsonKind,
        found: JsonKind,
        raw: String,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Failed to parse {what} from '{input}'")]
    Parse { what: &'static str, input: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Innermost error, skipping any context layers
    pub fn root(&self) -> &ClientError {
        let mut current = self;
        while let ClientError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Whether the server rejected the request (as opposed to the
    /// request never reaching it or the answer being unreadable)
    pub fn is_protocol(&self) -> bool {
        matches!(
            self.root(),
            ClientError::Protocol { .. } | ClientError::EmptyResponse
        )
    }

    pub fn shape(expected: JsonKind, value: &serde_json::Value) -> Self {
        ClientError::Shape {
            expected,
            found: JsonKind::of(value),
            raw: value.to_string(),
        }
    }

    pub fn parse(what: &'static str, input: impl Into<String>) -> Self {
        ClientError::Parse {
            what,
            input: input.into(),
        }
    }
}

/// Adds caller context to an error while keeping the original as source
pub trait ResultExt<T> {
    fn context<C: fmt::Display>(self, context: C) -> ClientResult<T>;

    fn with_context<C: fmt::Display, F: FnOnce() -> C>(self, f: F) -> ClientResult<T>;
}

impl<T, E: Into<ClientError>> ResultExt<T> for Result<T, E> {
    fn context<C: fmt::Display>(self, context: C) -> ClientResult<T> {
        self.map_err(|e| ClientError::Context {
            context: context.to_string(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<C: fmt::Display, F: FnOnce() -> C>(self, f: F) -> ClientResult<T> {
        self.map_err(|e| ClientError::Context {
            context: f().to_string(),
            source: Box::new(e.into()),
        })
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

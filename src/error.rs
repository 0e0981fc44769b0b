use http::Method;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Read,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Read => "read",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpClientErrorCode {
    InvalidUri,
    RequestBuild,
    InvalidHeaderName,
    InvalidHeaderValue,
    Transport,
    Timeout,
    Cancelled,
    DeadlineExceeded,
    ReadBody,
    HttpStatus,
    Deserialize,
    RetriesExhausted,
}

impl HttpClientErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUri => "invalid_uri",
            Self::RequestBuild => "request_build",
            Self::InvalidHeaderName => "invalid_header_name",
            Self::InvalidHeaderValue => "invalid_header_value",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::ReadBody => "read_body",
            Self::HttpStatus => "http_status",
            Self::Deserialize => "deserialize",
            Self::RetriesExhausted => "retries_exhausted",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpClientError {
    #[error("invalid request uri: {uri}")]
    InvalidUri { uri: String },
    #[error("failed to build http request: {source}")]
    RequestBuild {
        #[source]
        source: http::Error,
    },
    #[error("invalid header name {name}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("http transport error ({kind}) for {method} {uri}: {source}")]
    Transport {
        kind: TransportErrorKind,
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("http request timed out after {timeout_ms}ms for {method} {uri}")]
    Timeout {
        timeout_ms: u128,
        method: Method,
        uri: String,
    },
    #[error("http request cancelled for {method} {uri}")]
    Cancelled { method: Method, uri: String },
    #[error("http request deadline exceeded for {method} {uri}")]
    DeadlineExceeded { method: Method, uri: String },
    #[error("failed to read response body: {source}")]
    ReadBody {
        #[source]
        source: BoxError,
    },
    #[error("http status error {status} for {method} {uri}: {body}")]
    HttpStatus {
        status: u16,
        method: Method,
        uri: String,
        body: String,
    },
    #[error("failed to decode response json: {source}; body={body}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("retries exhausted after {attempts} attempts for {method} {uri}")]
    RetriesExhausted {
        attempts: usize,
        method: Method,
        uri: String,
    },
}

impl HttpClientError {
    pub const fn code(&self) -> HttpClientErrorCode {
        match self {
            Self::InvalidUri { .. } => HttpClientErrorCode::InvalidUri,
            Self::RequestBuild { .. } => HttpClientErrorCode::RequestBuild,
            Self::InvalidHeaderName { .. } => HttpClientErrorCode::InvalidHeaderName,
            Self::InvalidHeaderValue { .. } => HttpClientErrorCode::InvalidHeaderValue,
            Self::Transport { .. } => HttpClientErrorCode::Transport,
            Self::Timeout { .. } => HttpClientErrorCode::Timeout,
            Self::Cancelled { .. } => HttpClientErrorCode::Cancelled,
            Self::DeadlineExceeded { .. } => HttpClientErrorCode::DeadlineExceeded,
            Self::ReadBody { .. } => HttpClientErrorCode::ReadBody,
            Self::HttpStatus { .. } => HttpClientErrorCode::HttpStatus,
            Self::Deserialize { .. } => HttpClientErrorCode::Deserialize,
            Self::RetriesExhausted { .. } => HttpClientErrorCode::RetriesExhausted,
        }
    }
}

use thiserror::Error;

/// Errors raised while talking to the search endpoints or decoding their payloads.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network or body-read failure from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint answered with a non-success status code.
    #[error("request to {path} failed with status {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    /// The endpoint answered 2xx but flagged the payload with `status: "fail"`.
    #[error("request to {path} was rejected: {message}")]
    ApiFail { path: String, message: String },
    /// An expected key was absent or had the wrong JSON type.
    #[error("malformed {context}: missing or invalid `{field}`")]
    MissingField {
        context: &'static str,
        field: &'static str,
    },
    /// A record could not be built from its JSON object.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    StatusGate(String),
    /// The remote stopped handing out cursors before the requested count was reached.
    #[error("web top search ran out of pages after {collected} media")]
    PaginationExhausted { collected: usize },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SearchError {
    pub(crate) fn missing(context: &'static str, field: &'static str) -> Self {
        SearchError::MissingField { context, field }
    }

    pub(crate) fn decode(what: &'static str, source: serde_json::Error) -> Self {
        SearchError::Decode { what, source }
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

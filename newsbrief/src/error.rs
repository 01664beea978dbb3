use thiserror::Error;

/// Failures of one aggregation pass. Any of them aborts the whole search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Please add at least one topic")]
    EmptyTopicSet,

    #[error("Failed to fetch articles for \"{topic}\"")]
    UpstreamFetch { topic: String, cause: String },

    #[error("Malformed search response for \"{topic}\": {cause}")]
    UpstreamDecode { topic: String, cause: String },
}

impl SearchError {
    /// Topic whose request failed, if the error is tied to one.
    pub fn topic(&self) -> Option<&str> {
        match self {
            SearchError::EmptyTopicSet => None,
            SearchError::UpstreamFetch { topic, .. } | SearchError::UpstreamDecode { topic, .. } => {
                Some(topic)
            }
        }
    }
}

/// Failures of a single article's summarization. Scoped to that article; it stays retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummarizeError {
    /// Transport failure or non-success status without an error payload.
    #[error("{0}")]
    Request(String),

    /// Well-formed body that carries `error` or lacks `summary`.
    #[error("{0}")]
    Payload(String),

    /// Body that is not JSON of the expected shape.
    #[error("Invalid JSON response from backend server")]
    Decode(String),
}

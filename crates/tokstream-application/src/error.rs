use thiserror::Error;
use tokstream_core::TokstreamError;

/// Reasons a query was not submitted at all.
///
/// Once a session exists, failures are recorded on the session instead.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("A query is already streaming")]
    Busy,

    #[error(transparent)]
    Session(#[from] TokstreamError),
}

impl SearchError {
    pub fn is_busy(&self) -> bool {
        matches!(self, SearchError::Busy)
    }

    pub fn is_empty_query(&self) -> bool {
        matches!(self, SearchError::EmptyQuery)
    }
}

//! Error types for the market crate.

use std::fmt;

/// Errors from market data retrieval.
///
/// Retrieval failures are never retried here; they propagate to the caller,
/// which decides what the user sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// The data source does not know the ticker.
    UnknownTicker { ticker: String },
    /// The request never produced a response.
    RequestFailed { reason: String },
    /// The data source answered with a non-success status.
    UpstreamRejected { status: u16, message: String },
    /// The response body could not be interpreted.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTicker { ticker } => {
                write!(f, "unknown ticker symbol: {ticker}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "market data request failed: {reason}")
            }
            Self::UpstreamRejected { status, message } => {
                write!(f, "market data source rejected the request ({status}): {message}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse market data response: {reason}")
            }
        }
    }
}

impl std::error::Error for MarketError {}

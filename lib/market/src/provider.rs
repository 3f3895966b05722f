//! The market data provider capability.

use crate::error::MarketError;
use crate::types::{FinancialInfo, PriceHistory};
use async_trait::async_trait;

/// Name-indexed lookup of company financial data.
///
/// Implementations do no validation of the ticker, period, or interval;
/// malformed values surface as retrieval failures from the data source.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetches the company name and the three financial statements.
    async fn financial_info(&self, ticker: &str) -> Result<FinancialInfo, MarketError>;

    /// Fetches the company name, current price, and historical prices over
    /// the requested period at the requested interval.
    async fn price_history(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceHistory, MarketError>;
}
